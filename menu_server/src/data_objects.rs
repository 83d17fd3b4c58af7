use std::fmt::Display;

use menu_common::Secret;
use menu_engine::db_types::{OrderStatusType, Role, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(deserialize_with = "secret_string")]
    pub password: Secret<String>,
}

fn secret_string<'de, D>(deserializer: D) -> Result<Secret<String>, D::Error>
where D: serde::Deserializer<'de> {
    String::deserialize(deserializer).map(Secret::new)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self { id: user.id, username: user.username, role: user.role }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockUpdateRequest {
    pub in_stock: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatusType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsParams {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub message: String,
}

impl JsonResponse {
    pub fn new<S: Display>(message: S) -> Self {
        Self { message: message.to_string() }
    }
}
