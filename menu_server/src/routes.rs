//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Anything slow (database calls, password hashing) is expressed as
//! futures so that the worker can get on with other requests in the meantime.
//!
//! All routes below are mounted under `/api` by the server. Routes declared with `requires [...]` only admit callers
//! with a verified access token whose role is in the list. `requires []` admits any authenticated staff member.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use menu_engine::{
    analytics_objects::AnalyticsQuery,
    db_types::{NewOrder, NewProduct, ProductUpdate, Role},
    traits::{AnalyticsManagement, AuthManagement, OrderManagement, ProductManagement},
    AnalyticsApi,
    AuthApi,
    OrderFlowApi,
    ProductApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        AnalyticsParams,
        JsonResponse,
        LoginRequest,
        LoginResponse,
        OrderListQuery,
        StatusUpdateRequest,
        StockUpdateRequest,
    },
    errors::ServerError,
    event_stream::{event_stream, HEARTBEAT_INTERVAL},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),*]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(login => Post "/auth/login" impl AuthManagement);
/// Route handler for the login endpoint
///
/// Staff exchange a username and password for an access token. The token is valid for 24 hours and is not refreshed;
/// staff log in again when it runs out.
pub async fn login<A: AuthManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<A>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { username, password } = body.into_inner();
    if username.trim().is_empty() || password.is_empty() {
        return Err(ServerError::InvalidRequestBody("Username and password are required".into()));
    }
    debug!("💻️ Login request for {username}");
    let user = api.login(&username, password.reveal()).await.map_err(|e| {
        debug!("💻️ Login failed for {username}. {e}");
        e
    })?;
    let token = signer.issue_token(&user)?;
    trace!("💻️ Issued access token for {}", user.username);
    Ok(HttpResponse::Ok().json(LoginResponse { token, user: user.into() }))
}

route!(me => Get "/auth/me" impl AuthManagement where requires []);
pub async fn me<A: AuthManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET me for {}", claims.username);
    let user = api.fetch_user(claims.id).await?;
    Ok(HttpResponse::Ok().json(user))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl ProductManagement);
/// The full menu, sorted by category and then by name. Out-of-stock products are included so that the menu can show
/// them as unavailable.
pub async fn products<B: ProductManagement>(api: web::Data<ProductApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET products");
    let products = api.fetch_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_by_id => Get "/products/{id}" impl ProductManagement);
pub async fn product_by_id<B: ProductManagement>(
    path: web::Path<i64>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET product {id}");
    let product = api.fetch_product(id).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(create_product => Post "/products" impl ProductManagement where requires [Role::Owner]);
pub async fn create_product<B: ProductManagement>(
    claims: JwtClaims,
    body: web::Json<NewProduct>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = body.into_inner();
    debug!("💻️ {} is adding {} to the menu", claims.username, product.name);
    let product = api.create_product(product).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(update_product => Put "/products/{id}" impl ProductManagement where requires [Role::Owner]);
pub async fn update_product<B: ProductManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ {} is updating product {id}", claims.username);
    let product = api.update_product(id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(update_stock => Patch "/products/{id}/stock" impl ProductManagement where requires []);
/// Any member of staff may mark a product as sold out, or back in stock.
pub async fn update_stock<B: ProductManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StockUpdateRequest>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let in_stock = body.in_stock;
    debug!("💻️ {} set product {id} in_stock={in_stock}", claims.username);
    let product = api.set_stock(id, in_stock).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/products/{id}" impl ProductManagement where requires [Role::Owner]);
/// Removes a product from the menu. Past orders keep their snapshot of the product's name and price.
pub async fn delete_product<B: ProductManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ {} is deleting product {id}", claims.username);
    api.delete_product(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::new("Product deleted successfully")))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders => Get "/orders" impl OrderManagement, ProductManagement where requires []);
/// All orders with their items, newest first. Use `?status=` to restrict the list to a single status.
pub async fn orders<B: OrderManagement + ProductManagement>(
    query: web::Query<OrderListQuery>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let status = query.into_inner().status;
    trace!("💻️ GET orders. Status filter: {status:?}");
    let orders = api.list_orders(status).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement, ProductManagement where requires []);
pub async fn order_by_id<B: OrderManagement + ProductManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET order {id}");
    let order = api.fetch_order(id).await?.ok_or_else(|| ServerError::NoRecordFound("Order not found".into()))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(create_order => Post "/orders" impl OrderManagement, ProductManagement);
/// Customers place orders from their table. This route is unauthenticated.
///
/// On success the order is returned with its items, and every connected viewer is sent an `order:created` event.
pub async fn create_order<B: OrderManagement + ProductManagement>(
    body: web::Json<NewOrder>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner();
    debug!("💻️ New order for table {} with {} lines", order.table_number, order.items.len());
    let order = api.create_order(order).await.map_err(|e| {
        debug!("💻️ Order was not placed. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(order))
}

route!(update_order_status => Patch "/orders/{id}/status" impl OrderManagement, ProductManagement where requires []);
pub async fn update_order_status<B: OrderManagement + ProductManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let status = body.status;
    debug!("💻️ {} is moving order {id} to {status}", claims.username);
    let order = api.set_order_status(id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Events  ----------------------------------------------------
route!(events => Get "/events" impl OrderManagement);
/// The live order feed, as server-sent events. See [`crate::event_stream`] for the frame format.
pub async fn events<B: OrderManagement>(api: web::Data<OrderFlowApi<B>>) -> HttpResponse {
    let subscription = api.subscribe();
    debug!("💻️ {subscription:?} opened the live order feed");
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(event_stream(subscription, HEARTBEAT_INTERVAL))
}

//----------------------------------------------   Analytics  ----------------------------------------------------
route!(analytics => Get "/analytics" impl AnalyticsManagement where requires []);
/// Sales figures for a named period (`?period=today|week|month|year|shift1|shift2`), an inclusive date range
/// (`?start_date=2024-05-01&end_date=2024-05-07`), or, with neither, all time.
///
/// Employees may only ask for `shift1` and `shift2`. Owners may ask for anything and also get the top sellers.
pub async fn analytics<B: AnalyticsManagement>(
    claims: JwtClaims,
    query: web::Query<AnalyticsParams>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AnalyticsParams { period, start_date, end_date } = query.into_inner();
    let query = AnalyticsQuery::from_params(period.as_deref(), start_date.as_deref(), end_date.as_deref())?;
    debug!("💻️ {} ({}) asked for analytics: {query:?}", claims.username, claims.role);
    let report = api.report_for(claims.role, query).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(averages => Get "/analytics/averages" impl AnalyticsManagement where requires [Role::Owner]);
pub async fn averages<B: AnalyticsManagement>(api: web::Data<AnalyticsApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET analytics averages");
    let averages = api.averages().await?;
    Ok(HttpResponse::Ok().json(averages))
}
