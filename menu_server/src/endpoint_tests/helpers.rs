use actix_web::{
    http::{header::AUTHORIZATION, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{Duration, Utc};
use log::debug;
use menu_engine::{
    db_types::{Role, User},
    test_utils::{prepare_test_env, random_db_path},
    SqliteDatabase,
};
use serde_json::Value;

use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    middleware::AuthenticationMiddlewareFactory,
    server::{json_config, path_config, query_config},
};

// Only ever used to sign tokens in tests
const TEST_JWT_SECRET: &str = "menu-server-endpoint-tests-secret";

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(&AuthConfig::new(TEST_JWT_SECRET))
}

pub fn token_for(id: i64, username: &str, role: Role) -> String {
    let user = User { id, username: username.to_string(), role, created_at: Utc::now() };
    issuer().issue_token(&user).expect("Failed to sign token")
}

pub fn owner_token() -> String {
    token_for(1, "olivia", Role::Owner)
}

pub fn employee_token() -> String {
    token_for(2, "eddie", Role::Employee)
}

pub fn expired_token() -> String {
    let user = User { id: 2, username: "eddie".into(), role: Role::Employee, created_at: Utc::now() };
    issuer().with_lifetime(Duration::hours(-2)).issue_token(&user).expect("Failed to sign token")
}

pub fn with_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header((AUTHORIZATION, format!("Bearer {token}")))
    }
}

/// Builds an app with the same middleware and extractor configuration as the server, lets `configure` add routes and
/// data, and sends `req` to it.
pub async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .wrap(AuthenticationMiddlewareFactory::new(issuer()))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .app_data(web::Data::new(issuer()))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}

pub fn error_message(body: &str) -> String {
    json(body)["error"].as_str().unwrap_or_else(|| panic!("No error field in {body}")).to_string()
}

/// A fresh, migrated database for a single test.
pub async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database")
}
