use std::time::Duration;

use actix_web::{
    dev::Server,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    Error,
    HttpRequest,
    HttpServer,
};
use log::*;
use menu_engine::{AnalyticsApi, AuthApi, NotificationHub, OrderFlowApi, ProductApi, SqliteDatabase};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    middleware::AuthenticationMiddlewareFactory,
    routes::{
        health,
        AnalyticsRoute,
        AveragesRoute,
        CreateOrderRoute,
        CreateProductRoute,
        DeleteProductRoute,
        EventsRoute,
        LoginRoute,
        MeRoute,
        OrderByIdRoute,
        OrdersRoute,
        ProductByIdRoute,
        ProductsRoute,
        UpdateOrderStatusRoute,
        UpdateProductRoute,
        UpdateStockRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migrations failed. {e}")))?;
    info!("🗃️ Database is ready at {}", db.url());
    if let Some(owner) = &config.bootstrap_owner {
        let auth_api = AuthApi::new(db.clone());
        match auth_api.ensure_bootstrap_owner(&owner.username, owner.password.reveal()).await {
            Ok(Some(user)) => info!("🔑️ Created the first owner account, {}", user.username),
            Ok(None) => debug!("🔑️ Staff accounts already exist. No bootstrap owner was created"),
            Err(e) => return Err(ServerError::InitializeError(format!("Could not create the owner account. {e}"))),
        }
    }
    let hub = NotificationHub::new(config.event_buffer_size);
    let srv = create_server_instance(config, db, hub)?;
    srv.await.map_err(ServerError::from)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    hub: NotificationHub,
) -> Result<Server, ServerError> {
    let policies = config.order_policies();
    let auth_config = config.auth.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), hub.clone()).with_policies(policies);
        let products_api = ProductApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let analytics_api = AnalyticsApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&auth_config);
        let api_scope = web::scope("/api")
            .service(health)
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(MeRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(UpdateStockRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(EventsRoute::<SqliteDatabase>::new())
            .service(AnalyticsRoute::<SqliteDatabase>::new())
            .service(AveragesRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(AuthenticationMiddlewareFactory::new(TokenIssuer::new(&auth_config)))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("menu::access_log"))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(products_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(analytics_api))
            .app_data(web::Data::new(jwt_signer))
            .service(health)
            .service(api_scope)
            .default_service(web::to(not_found))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ Listening on {}:{}", config.host, config.port);
    Ok(srv)
}

pub async fn not_found(req: HttpRequest) -> Result<&'static str, ServerError> {
    debug!("💻️ No route for {} {}", req.method(), req.path());
    Err(ServerError::NoRecordFound("Not found".to_string()))
}

/// Malformed or mistyped JSON bodies are the caller's fault, and get a 400 with the `{"error": ...}` body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| -> Error {
        debug!("💻️ Rejected request body on {}. {err}", req.path());
        ServerError::InvalidRequestBody(format!("Invalid request body. {err}")).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, req: &HttpRequest| -> Error {
        debug!("💻️ Rejected query string on {}. {err}", req.path());
        ServerError::InvalidQuery(format!("Invalid query string. {err}")).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: PathError, req: &HttpRequest| -> Error {
        debug!("💻️ Rejected path {}. {err}", req.path());
        ServerError::InvalidRequestPath(format!("Invalid request path. {err}")).into()
    })
}
