use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use menu_engine::{
    db_types::{Money, Product},
    ProductApi,
};
use serde_json::json;

use super::{
    helpers::{employee_token, error_message, expired_token, json, owner_token, send, with_token},
    mocks::MockProductManager,
};
use crate::routes::{
    CreateProductRoute,
    DeleteProductRoute,
    ProductByIdRoute,
    ProductsRoute,
    UpdateProductRoute,
    UpdateStockRoute,
};

fn espresso() -> Product {
    Product {
        id: 1,
        name: "Espresso".into(),
        category: "Coffee".into(),
        price: Money::from_cents(350),
        image_url: None,
        in_stock: true,
        popular: true,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
    }
}

fn cheesecake() -> Product {
    Product {
        id: 2,
        name: "Cheesecake".into(),
        category: "Desserts".into(),
        price: Money::from_cents(525),
        image_url: Some("/img/cheesecake.jpg".into()),
        in_stock: false,
        popular: false,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 5, 0).unwrap(),
    }
}

fn configure_with(db: MockProductManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(ProductsRoute::<MockProductManager>::new())
            .service(ProductByIdRoute::<MockProductManager>::new())
            .service(CreateProductRoute::<MockProductManager>::new())
            .service(UpdateProductRoute::<MockProductManager>::new())
            .service(UpdateStockRoute::<MockProductManager>::new())
            .service(DeleteProductRoute::<MockProductManager>::new())
            .app_data(web::Data::new(ProductApi::new(db)));
    }
}

#[actix_web::test]
async fn the_menu_is_public() {
    let _ = env_logger::try_init();
    let mut db = MockProductManager::new();
    db.expect_fetch_products().times(1).returning(|| Ok(vec![espresso(), cheesecake()]));
    let (status, body) = send(TestRequest::get().uri("/products"), configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let products = json(&body);
    assert_eq!(products.as_array().unwrap().len(), 2);
    assert_eq!(products[0]["name"], "Espresso");
    assert_eq!(products[0]["price"], 3.5);
    assert_eq!(products[1]["in_stock"], false);
    assert_eq!(products[1]["image_url"], "/img/cheesecake.jpg");
}

#[actix_web::test]
async fn fetch_one_product() {
    let _ = env_logger::try_init();
    let mut db = MockProductManager::new();
    db.expect_fetch_product().withf(|id| *id == 1).returning(|_| Ok(Some(espresso())));
    db.expect_fetch_product().withf(|id| *id == 99).returning(|_| Ok(None));
    let (status, body) = send(TestRequest::get().uri("/products/1"), configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["category"], "Coffee");

    let mut db = MockProductManager::new();
    db.expect_fetch_product().returning(|_| Ok(None));
    let (status, body) = send(TestRequest::get().uri("/products/99"), configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Product not found");
}

#[actix_web::test]
async fn non_numeric_ids_are_bad_requests() {
    let _ = env_logger::try_init();
    let db = MockProductManager::new();
    let (status, body) = send(TestRequest::get().uri("/products/espresso"), configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Invalid request path"), "{body}");
}

#[actix_web::test]
async fn only_owners_create_products() {
    let _ = env_logger::try_init();
    let body = json!({"name": "Flat white", "category": "Coffee", "price": 4.2});

    let req = TestRequest::post().uri("/products").set_json(&body);
    let (status, res) = send(req, configure_with(MockProductManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&res), "Access token required");

    let req = with_token(TestRequest::post().uri("/products").set_json(&body), &employee_token());
    let (status, res) = send(req, configure_with(MockProductManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&res), "Insufficient permissions");

    let req = with_token(TestRequest::post().uri("/products").set_json(&body), &expired_token());
    let (status, res) = send(req, configure_with(MockProductManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&res), "Invalid or expired token");

    let mut db = MockProductManager::new();
    db.expect_insert_product()
        .withf(|p, _| p.name == "Flat white" && p.price == Money::from_cents(420) && p.in_stock && !p.popular)
        .times(1)
        .returning(|p, created_at| {
            Ok(Product {
                id: 3,
                name: p.name,
                category: p.category,
                price: p.price,
                image_url: p.image_url,
                in_stock: p.in_stock,
                popular: p.popular,
                created_at,
            })
        });
    let req = with_token(TestRequest::post().uri("/products").set_json(&body), &owner_token());
    let (status, res) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    let product = json(&res);
    assert_eq!(product["id"], 3);
    assert_eq!(product["price"], 4.2);
    assert_eq!(product["in_stock"], true);
}

#[actix_web::test]
async fn invalid_products_are_rejected() {
    let _ = env_logger::try_init();
    // The backend must not be called for any of these
    let cases = [
        json!({"name": "", "category": "Coffee", "price": 4.2}),
        json!({"name": "Mocha", "category": "Coffee", "price": -1}),
    ];
    for body in cases {
        let req = with_token(TestRequest::post().uri("/products").set_json(&body), &owner_token());
        let (status, _) = send(req, configure_with(MockProductManager::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
    let req = with_token(TestRequest::post().uri("/products").set_json(json!({"name": "Mocha"})), &owner_token());
    let (status, res) = send(req, configure_with(MockProductManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&res).starts_with("Invalid request body"), "{res}");
}

#[actix_web::test]
async fn update_a_product() {
    let _ = env_logger::try_init();
    let mut db = MockProductManager::new();
    db.expect_update_product().withf(|id, u| *id == 1 && u.price == Money::from_cents(380) && u.in_stock.is_none()).returning(
        |_, u| {
            let mut p = espresso();
            p.price = u.price;
            Ok(Some(p))
        },
    );
    let body = json!({"name": "Espresso", "category": "Coffee", "price": "3.80"});
    let req = with_token(TestRequest::put().uri("/products/1").set_json(&body), &owner_token());
    let (status, res) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&res)["price"], 3.8);

    let mut db = MockProductManager::new();
    db.expect_update_product().returning(|_, _| Ok(None));
    let req = with_token(TestRequest::put().uri("/products/42").set_json(&body), &owner_token());
    let (status, res) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&res), "Product not found");
}

#[actix_web::test]
async fn any_staff_member_can_change_stock() {
    let _ = env_logger::try_init();
    let mut db = MockProductManager::new();
    db.expect_update_stock().withf(|id, in_stock| *id == 1 && !*in_stock).times(1).returning(|_, in_stock| {
        let mut p = espresso();
        p.in_stock = in_stock;
        Ok(Some(p))
    });
    let req = with_token(
        TestRequest::patch().uri("/products/1/stock").set_json(json!({"in_stock": false})),
        &employee_token(),
    );
    let (status, res) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&res)["in_stock"], false);

    let req = TestRequest::patch().uri("/products/1/stock").set_json(json!({"in_stock": false}));
    let (status, _) = send(req, configure_with(MockProductManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn delete_a_product() {
    let _ = env_logger::try_init();
    let mut db = MockProductManager::new();
    db.expect_delete_product().withf(|id| *id == 2).times(1).returning(|_| Ok(true));
    let req = with_token(TestRequest::delete().uri("/products/2"), &owner_token());
    let (status, res) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&res)["message"], "Product deleted successfully");

    let mut db = MockProductManager::new();
    db.expect_delete_product().returning(|_| Ok(false));
    let req = with_token(TestRequest::delete().uri("/products/2"), &owner_token());
    let (status, _) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = with_token(TestRequest::delete().uri("/products/2"), &employee_token());
    let (status, _) = send(req, configure_with(MockProductManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn backend_failures_are_not_leaked() {
    let _ = env_logger::try_init();
    let mut db = MockProductManager::new();
    db.expect_fetch_products()
        .returning(|| Err(menu_engine::ProductApiError::DatabaseError("database is locked".into())));
    let (status, body) = send(TestRequest::get().uri("/products"), configure_with(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), "Internal server error");
}
