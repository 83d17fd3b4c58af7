use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use menu_engine::{
    analytics_objects::{OrderAverages, OrderStatistics, TopProduct},
    db_types::Money,
    AnalyticsApi,
};

use super::{
    helpers::{employee_token, error_message, json, owner_token, send, with_token},
    mocks::MockAnalyticsManager,
};
use crate::routes::{AnalyticsRoute, AveragesRoute};

fn configure_with(db: MockAnalyticsManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(AnalyticsRoute::<MockAnalyticsManager>::new())
            .service(AveragesRoute::<MockAnalyticsManager>::new())
            .app_data(web::Data::new(AnalyticsApi::new(db)));
    }
}

fn lunch_rush() -> OrderStatistics {
    OrderStatistics {
        total_orders: 4,
        total_revenue: Money::from_cents(3000),
        avg_order_value: Money::from_cents(750),
        cash_orders: 1,
        card_orders: 3,
    }
}

fn best_sellers() -> Vec<TopProduct> {
    vec![
        TopProduct { product_name: "Espresso".into(), total_quantity: 9, order_count: 4 },
        TopProduct { product_name: "Cheesecake".into(), total_quantity: 2, order_count: 2 },
    ]
}

#[actix_web::test]
async fn employees_see_their_shift() {
    let _ = env_logger::try_init();
    let mut db = MockAnalyticsManager::new();
    db.expect_order_statistics()
        .withf(|w| w.map(|w| w.end.is_some()).unwrap_or(false))
        .times(1)
        .returning(|_| Ok(lunch_rush()));
    db.expect_top_products().never();
    let req = with_token(TestRequest::get().uri("/analytics?period=shift1"), &employee_token());
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = json(&body);
    assert_eq!(report["period"], "shift1");
    assert_eq!(report["statistics"]["total_orders"], 4);
    assert_eq!(report["statistics"]["total_revenue"], 30.0);
    assert_eq!(report["statistics"]["avg_order_value"], 7.5);
    assert_eq!(report["statistics"]["card_orders"], 3);
    assert!(report.get("top_products").is_none());
}

#[actix_web::test]
async fn employees_cannot_see_other_periods() {
    let _ = env_logger::try_init();
    for uri in ["/analytics?period=month", "/analytics", "/analytics?start_date=2024-05-01&end_date=2024-05-07"] {
        let mut db = MockAnalyticsManager::new();
        db.expect_order_statistics().never();
        let req = with_token(TestRequest::get().uri(uri), &employee_token());
        let (status, body) = send(req, configure_with(db)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(error_message(&body), "Employees can only access shift analytics");
    }
}

#[actix_web::test]
async fn owners_see_everything_and_the_top_sellers() {
    let _ = env_logger::try_init();
    let mut db = MockAnalyticsManager::new();
    db.expect_order_statistics().withf(|w| w.is_none()).times(1).returning(|_| Ok(lunch_rush()));
    db.expect_top_products().withf(|w, limit| w.is_none() && *limit == 5).times(1).returning(|_, _| Ok(best_sellers()));
    let req = with_token(TestRequest::get().uri("/analytics"), &owner_token());
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = json(&body);
    assert!(report.get("period").is_none());
    let top = report["top_products"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["product_name"], "Espresso");
    assert_eq!(top[0]["total_quantity"], 9);
    assert_eq!(top[1]["order_count"], 2);
}

#[actix_web::test]
async fn date_ranges_use_the_same_window_for_top_sellers() {
    let _ = env_logger::try_init();
    let mut db = MockAnalyticsManager::new();
    db.expect_order_statistics().times(1).returning(|_| Ok(OrderStatistics::default()));
    db.expect_top_products()
        .withf(|w, _| w.map(|w| w.end.is_some()).unwrap_or(false))
        .times(1)
        .returning(|_, _| Ok(vec![]));
    let req = with_token(
        TestRequest::get().uri("/analytics?period=week&start_date=2024-05-01&end_date=2024-05-07"),
        &owner_token(),
    );
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = json(&body);
    assert!(report.get("period").is_none(), "The range takes precedence over the period");
    assert_eq!(report["statistics"]["total_orders"], 0);
    assert_eq!(report["statistics"]["total_revenue"], 0.0);
    assert_eq!(report["top_products"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn bad_queries() {
    let _ = env_logger::try_init();
    let cases = [
        ("/analytics?period=fortnight", "Invalid analytics period: fortnight"),
        ("/analytics?start_date=2024-05-01", "Invalid date range: both start_date and end_date are required"),
        ("/analytics?start_date=2024-05-07&end_date=2024-05-01", "Invalid date range: start_date is after end_date"),
        ("/analytics?start_date=yesterday&end_date=2024-05-01", "Invalid date range"),
    ];
    for (uri, message) in cases {
        let req = with_token(TestRequest::get().uri(uri), &owner_token());
        let (status, body) = send(req, configure_with(MockAnalyticsManager::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(error_message(&body).starts_with(message), "{uri}: {body}");
    }
}

#[actix_web::test]
async fn analytics_need_a_token() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri("/analytics?period=shift2");
    let (status, _) = send(req, configure_with(MockAnalyticsManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn averages_are_for_owners() {
    let _ = env_logger::try_init();
    let req = with_token(TestRequest::get().uri("/analytics/averages"), &employee_token());
    let (status, body) = send(req, configure_with(MockAnalyticsManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), "Insufficient permissions");

    let mut db = MockAnalyticsManager::new();
    db.expect_order_averages().withf(|week, month| month < week).times(1).returning(|_, _| {
        Ok(OrderAverages {
            overall_avg: Money::from_cents(812),
            weekly_avg: Money::from_cents(750),
            monthly_avg: Money::default(),
        })
    });
    let req = with_token(TestRequest::get().uri("/analytics/averages"), &owner_token());
    let (status, body) = send(req, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let averages = json(&body);
    assert_eq!(averages["overall_avg"], 8.12);
    assert_eq!(averages["weekly_avg"], 7.5);
    assert_eq!(averages["monthly_avg"], 0.0);
}
