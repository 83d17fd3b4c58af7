use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use menu_engine::{
    db_types::{Role, User},
    AuthApi,
    SqliteDatabase,
};
use serde_json::json;

use super::helpers::{error_message, expired_token, issuer, json, send, test_db, token_for, with_token};
use crate::routes::{LoginRoute, MeRoute};

const FAST_HASH_COST: u32 = 4;

async fn seeded_db() -> (SqliteDatabase, User, User) {
    let db = test_db().await;
    let api = AuthApi::new(db.clone()).with_hash_cost(FAST_HASH_COST);
    let owner = api.create_user("olivia", "correct horse", Role::Owner).await.expect("Could not create owner");
    let employee = api.create_user("eddie", "battery staple", Role::Employee).await.expect("Could not create employee");
    (db, owner, employee)
}

fn configure_with(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(LoginRoute::<SqliteDatabase>::new())
            .service(MeRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(AuthApi::new(db)));
    }
}

#[actix_web::test]
async fn login_returns_a_token_and_the_user() {
    let _ = env_logger::try_init();
    let (db, owner, _) = seeded_db().await;
    let req = TestRequest::post().uri("/auth/login").set_json(json!({"username": "olivia", "password": "correct horse"}));
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let res = json(&body);
    assert_eq!(res["user"]["id"], owner.id);
    assert_eq!(res["user"]["username"], "olivia");
    assert_eq!(res["user"]["role"], "owner");
    assert!(res["user"].get("password_hash").is_none());
    let token = res["token"].as_str().expect("token is a string");
    let claims = issuer().verify_token(token).expect("Issued token did not verify");
    assert_eq!(claims.id, owner.id);
    assert_eq!(claims.role, Role::Owner);
}

#[actix_web::test]
async fn wrong_passwords_and_unknown_users_look_the_same() {
    let _ = env_logger::try_init();
    let (db, _, _) = seeded_db().await;
    let req = TestRequest::post().uri("/auth/login").set_json(json!({"username": "eddie", "password": "hunter2"}));
    let (status, wrong_password) = send(req, configure_with(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&wrong_password), "Invalid credentials");

    let req = TestRequest::post().uri("/auth/login").set_json(json!({"username": "mallory", "password": "hunter2"}));
    let (status, unknown_user) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
}

#[actix_web::test]
async fn login_needs_both_fields() {
    let _ = env_logger::try_init();
    let (db, _, _) = seeded_db().await;
    let req = TestRequest::post().uri("/auth/login").set_json(json!({"username": "", "password": "battery staple"}));
    let (status, body) = send(req, configure_with(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Username and password are required");

    let req = TestRequest::post().uri("/auth/login").set_json(json!({"username": "eddie"}));
    let (status, body) = send(req, configure_with(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Invalid request body"), "{body}");

    let req = TestRequest::post()
        .uri("/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"username\": \"eddie\", ");
    let (status, _) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn me_returns_the_caller() {
    let _ = env_logger::try_init();
    let (db, _, employee) = seeded_db().await;
    let token = token_for(employee.id, &employee.username, employee.role);
    let req = with_token(TestRequest::get().uri("/auth/me"), &token);
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let user = json(&body);
    assert_eq!(user["id"], employee.id);
    assert_eq!(user["username"], "eddie");
    assert_eq!(user["role"], "employee");
    assert!(user["created_at"].is_string());
}

#[actix_web::test]
async fn me_needs_a_valid_token() {
    let _ = env_logger::try_init();
    let (db, _, _) = seeded_db().await;
    let (status, body) = send(TestRequest::get().uri("/auth/me"), configure_with(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&body), "Access token required");

    let req = with_token(TestRequest::get().uri("/auth/me"), "not.a.jwt");
    let (status, body) = send(req, configure_with(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), "Invalid or expired token");

    let req = with_token(TestRequest::get().uri("/auth/me"), &expired_token());
    let (status, body) = send(req, configure_with(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), "Invalid or expired token");

    // Signed with someone else's key
    let forged = crate::auth::TokenIssuer::new(&crate::config::AuthConfig::new("another-secret"))
        .issue_token(&User { id: 1, username: "olivia".into(), role: Role::Owner, created_at: chrono::Utc::now() })
        .unwrap();
    let req = with_token(TestRequest::get().uri("/auth/me"), &forged);
    let (status, _) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn me_for_a_deleted_account() {
    let _ = env_logger::try_init();
    let (db, _, _) = seeded_db().await;
    let req = with_token(TestRequest::get().uri("/auth/me"), &token_for(999, "ghost", Role::Employee));
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "User not found");
}
