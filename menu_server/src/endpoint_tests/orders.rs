use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use menu_engine::{
    db_types::{Money, NewProduct, Product},
    NotificationHub,
    OrderFlowApi,
    OrderPolicies,
    ProductApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::{employee_token, error_message, json, owner_token, send, test_db, with_token};
use crate::routes::{CreateOrderRoute, OrderByIdRoute, OrdersRoute, UpdateOrderStatusRoute};

async fn seeded_db() -> (SqliteDatabase, Product, Product) {
    let db = test_db().await;
    let products = ProductApi::new(db.clone());
    let espresso = products
        .create_product(NewProduct::new("Espresso", "Coffee", Money::from_cents(350)).popular())
        .await
        .expect("Could not add espresso");
    let cake = products
        .create_product(NewProduct::new("Cheesecake", "Desserts", Money::from_cents(525)))
        .await
        .expect("Could not add cheesecake");
    (db, espresso, cake)
}

fn configure_with(db: SqliteDatabase, policies: OrderPolicies) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(db, NotificationHub::new(16)).with_policies(policies);
        cfg.service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(api));
    }
}

fn two_espressos(espresso: &Product, table: i64) -> Value {
    json!({
        "table_number": table,
        "payment_method": "cash",
        "items": [{"id": espresso.id, "name": "Espresso", "price": 3.5, "quantity": 2}]
    })
}

async fn place(db: &SqliteDatabase, body: Value) -> Value {
    let req = TestRequest::post().uri("/orders").set_json(body);
    let (status, res) = send(req, configure_with(db.clone(), OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::CREATED, "{res}");
    json(&res)
}

async fn set_status(db: &SqliteDatabase, policies: OrderPolicies, id: i64, status: &str) -> (StatusCode, String) {
    let req = with_token(
        TestRequest::patch().uri(&format!("/orders/{id}/status")).set_json(json!({ "status": status })),
        &employee_token(),
    );
    send(req, configure_with(db.clone(), policies)).await
}

#[actix_web::test]
async fn customers_place_orders_without_logging_in() {
    let _ = env_logger::try_init();
    let (db, espresso, cake) = seeded_db().await;
    let order = place(
        &db,
        json!({
            "table_number": 4,
            "payment_method": "card",
            "items": [
                {"id": espresso.id, "name": "Espresso", "price": 3.5, "quantity": 2},
                {"id": cake.id, "name": "Cheesecake", "price": "5.25", "quantity": 1}
            ],
            "additional_info": "No sugar"
        }),
    )
    .await;
    assert_eq!(order["table_number"], 4);
    assert_eq!(order["status"], "new");
    assert_eq!(order["payment_method"], "card");
    assert_eq!(order["total_amount"], 12.25);
    assert_eq!(order["additional_info"], "No sugar");
    assert!(order["completed_at"].is_null());
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["product_name"], "Espresso");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["price_at_time"], 3.5);
    assert_eq!(items[1]["product_id"], cake.id);
}

#[actix_web::test]
async fn the_submitted_price_is_snapshotted() {
    let _ = env_logger::try_init();
    let (db, espresso, _) = seeded_db().await;
    let order = place(&db, two_espressos(&espresso, 7)).await;
    assert_eq!(order["total_amount"], 7.0);
    let id = order["id"].as_i64().unwrap();

    // Later price changes don't touch existing orders
    ProductApi::new(db.clone())
        .update_product(
            espresso.id,
            NewProduct::new("Double espresso", "Coffee", Money::from_cents(500)).into(),
        )
        .await
        .unwrap();
    let req = with_token(TestRequest::get().uri(&format!("/orders/{id}")), &employee_token());
    let (status, body) = send(req, configure_with(db, OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::OK);
    let order = json(&body);
    assert_eq!(order["total_amount"], 7.0);
    assert_eq!(order["items"][0]["product_name"], "Espresso");
    assert_eq!(order["items"][0]["price_at_time"], 3.5);
}

#[actix_web::test]
async fn catalog_pricing_ignores_the_submitted_price() {
    let _ = env_logger::try_init();
    let (db, espresso, _) = seeded_db().await;
    let body = json!({
        "table_number": 2,
        "payment_method": "cash",
        "items": [{"id": espresso.id, "name": "Cheap coffee", "price": 0.01, "quantity": 2}]
    });
    let req = TestRequest::post().uri("/orders").set_json(body);
    let (status, res) = send(req, configure_with(db, OrderPolicies::default().catalog_pricing())).await;
    assert_eq!(status, StatusCode::CREATED, "{res}");
    let order = json(&res);
    assert_eq!(order["total_amount"], 7.0);
    assert_eq!(order["items"][0]["product_name"], "Espresso");
}

#[actix_web::test]
async fn invalid_orders_are_rejected() {
    let _ = env_logger::try_init();
    let (db, espresso, _) = seeded_db().await;
    let cases = [
        json!({"table_number": 0, "payment_method": "cash",
               "items": [{"id": espresso.id, "name": "Espresso", "price": 3.5, "quantity": 1}]}),
        json!({"table_number": 3, "payment_method": "cash", "items": []}),
        json!({"table_number": 3, "payment_method": "cash",
               "items": [{"id": espresso.id, "name": "Espresso", "price": 3.5, "quantity": 0}]}),
        json!({"table_number": 3, "payment_method": "cash",
               "items": [{"id": espresso.id, "name": "Espresso", "price": -3.5, "quantity": 1}]}),
        json!({"table_number": 3, "payment_method": "bitcoin",
               "items": [{"id": espresso.id, "name": "Espresso", "price": 3.5, "quantity": 1}]}),
        json!({"table_number": 3, "payment_method": "cash",
               "items": [{"id": 9999, "name": "Mystery", "price": 3.5, "quantity": 1}]}),
    ];
    for body in cases {
        let req = TestRequest::post().uri("/orders").set_json(&body);
        let (status, res) = send(req, configure_with(db.clone(), OrderPolicies::default())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {res}");
        assert!(!error_message(&res).is_empty());
    }
    // Nothing was written
    let req = with_token(TestRequest::get().uri("/orders"), &owner_token());
    let (_, body) = send(req, configure_with(db, OrderPolicies::default())).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn totals_too_large_to_store_are_rejected() {
    let _ = env_logger::try_init();
    let (db, espresso, _) = seeded_db().await;
    let body = json!({
        "table_number": 3,
        "payment_method": "cash",
        "items": [{"id": espresso.id, "name": "Espresso", "price": 3.5, "quantity": 92_233_720_368_547_758_i64}]
    });
    let req = TestRequest::post().uri("/orders").set_json(&body);
    let (status, res) = send(req, configure_with(db.clone(), OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{res}");
    assert_eq!(error_message(&res), "Order total is too large");

    let req = with_token(TestRequest::get().uri("/orders"), &owner_token());
    let (_, body) = send(req, configure_with(db, OrderPolicies::default())).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn staff_list_orders_newest_first() {
    let _ = env_logger::try_init();
    let (db, espresso, _) = seeded_db().await;
    let first = place(&db, two_espressos(&espresso, 1)).await;
    let second = place(&db, two_espressos(&espresso, 2)).await;
    set_status(&db, OrderPolicies::default(), first["id"].as_i64().unwrap(), "ready").await;

    let (status, body) = send(TestRequest::get().uri("/orders"), configure_with(db.clone(), OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&body), "Access token required");

    let req = with_token(TestRequest::get().uri("/orders"), &employee_token());
    let (status, body) = send(req, configure_with(db.clone(), OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json(&body);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], second["id"]);
    assert_eq!(orders[1]["id"], first["id"]);
    assert_eq!(orders[1]["items"].as_array().unwrap().len(), 1);

    let req = with_token(TestRequest::get().uri("/orders?status=ready"), &employee_token());
    let (status, body) = send(req, configure_with(db.clone(), OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::OK);
    let ready = json(&body);
    assert_eq!(ready.as_array().unwrap().len(), 1);
    assert_eq!(ready[0]["id"], first["id"]);

    let req = with_token(TestRequest::get().uri("/orders?status=lost"), &employee_token());
    let (status, body) = send(req, configure_with(db, OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Invalid query string"), "{body}");
}

#[actix_web::test]
async fn unknown_orders() {
    let _ = env_logger::try_init();
    let (db, _, _) = seeded_db().await;
    let (status, body) = set_status(&db, OrderPolicies::default(), 404, "ready").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Order not found");

    let req = with_token(TestRequest::get().uri("/orders/404"), &employee_token());
    let (status, body) = send(req, configure_with(db, OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Order not found");
}

#[actix_web::test]
async fn completing_an_order_stamps_it() {
    let _ = env_logger::try_init();
    let (db, espresso, _) = seeded_db().await;
    let id = place(&db, two_espressos(&espresso, 5)).await["id"].as_i64().unwrap();

    let (status, body) = set_status(&db, OrderPolicies::default(), id, "completed").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let completed = json(&body);
    assert_eq!(completed["status"], "completed");
    assert!(completed["completed_at"].is_string());

    // Completing again keeps the original stamp
    let (_, body) = set_status(&db, OrderPolicies::default(), id, "completed").await;
    assert_eq!(json(&body)["completed_at"], completed["completed_at"]);

    // Lenient by default: a completed order can be reopened, which clears the stamp
    let (status, body) = set_status(&db, OrderPolicies::default(), id, "in_progress").await;
    assert_eq!(status, StatusCode::OK);
    let reopened = json(&body);
    assert_eq!(reopened["status"], "in_progress");
    assert!(reopened["completed_at"].is_null());
}

#[actix_web::test]
async fn status_updates_need_a_known_status() {
    let _ = env_logger::try_init();
    let (db, espresso, _) = seeded_db().await;
    let id = place(&db, two_espressos(&espresso, 5)).await["id"].as_i64().unwrap();
    let (status, body) = set_status(&db, OrderPolicies::default(), id, "cancelled").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Invalid request body"), "{body}");

    let req = TestRequest::patch().uri(&format!("/orders/{id}/status")).set_json(json!({"status": "ready"}));
    let (status, _) = send(req, configure_with(db, OrderPolicies::default())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn strict_transitions_only_move_forward() {
    let _ = env_logger::try_init();
    let (db, espresso, _) = seeded_db().await;
    let strict = OrderPolicies::default().strict_transitions();
    let id = place(&db, two_espressos(&espresso, 8)).await["id"].as_i64().unwrap();

    let (status, body) = set_status(&db, strict, id, "ready").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_message(&body), format!("Order #{id} cannot move from new to ready"));

    let (status, _) = set_status(&db, strict, id, "in_progress").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = set_status(&db, strict, id, "in_progress").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = set_status(&db, strict, id, "new").await;
    assert_eq!(status, StatusCode::CONFLICT);
}
