use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use menu_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::menu_api::order_objects::TransitionPolicy;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

impl ConversionError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

//--------------------------------------        Role        ---------------------------------------------------------
/// Staff roles. `Owner` is the elevated role; `Employee` is the restricted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Owner,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Employee => write!(f, "employee"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(Self::Employee),
            "owner" => Ok(Self::Owner),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has just been placed from a table and nobody has picked it up yet.
    #[default]
    New,
    /// Staff are preparing the order.
    InProgress,
    /// The order is ready to be served.
    Ready,
    /// The order has been served. This is the terminal state.
    Completed,
}

impl OrderStatusType {
    /// The single forward step in the `new → in_progress → ready → completed` pipeline.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::New => Some(Self::InProgress),
            Self::InProgress => Some(Self::Ready),
            Self::Ready => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn can_transition_to(&self, target: Self, policy: TransitionPolicy) -> bool {
        policy.allows(*self, target)
    }

    pub fn all() -> [Self; 4] {
        [Self::New, Self::InProgress, Self::Ready, Self::Completed]
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "new"),
            OrderStatusType::InProgress => write!(f, "in_progress"),
            OrderStatusType::Ready => write!(f, "ready"),
            OrderStatusType::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Free-text grouping key used by the menu, e.g. "Coffee" or "Desserts"
    pub category: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub in_stock: bool,
    pub popular: bool,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       NewProduct      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: Money,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub popular: bool,
}

fn default_in_stock() -> bool {
    true
}

impl NewProduct {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, category: S2, price: Money) -> Self {
        Self { name: name.into(), category: category.into(), price, image_url: None, in_stock: true, popular: false }
    }

    pub fn with_image_url<S: Into<String>>(mut self, url: S) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn popular(mut self) -> Self {
        self.popular = true;
        self
    }

    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }
}

//--------------------------------------     ProductUpdate     ---------------------------------------------------------
/// A full replacement of a product's editable fields. `in_stock` is only changed when supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub category: String,
    pub price: Money,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub popular: bool,
}

impl From<NewProduct> for ProductUpdate {
    fn from(p: NewProduct) -> Self {
        Self {
            name: p.name,
            category: p.category,
            price: p.price,
            image_url: p.image_url,
            in_stock: Some(p.in_stock),
            popular: p.popular,
        }
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
/// A line on an order. `product_name` and `price_at_time` are snapshots taken when the order was placed and never
/// follow later catalog edits. `product_id` becomes `None` if the product is deleted.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub price_at_time: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.price_at_time * self.quantity
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub table_number: i64,
    pub status: OrderStatusType,
    pub payment_method: PaymentMethod,
    /// Sum of the line totals at creation time. Never recomputed.
    pub total_amount: Money,
    pub additional_info: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set if and only if `status` is `completed`
    pub completed_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

//--------------------------------------      NewOrderItem     ---------------------------------------------------------
/// A line on an incoming order, as submitted by the table-side menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    /// The catalog product this line was picked from
    #[serde(rename = "id", default)]
    pub product_id: Option<i64>,
    pub name: String,
    /// Unit price
    pub price: Money,
    pub quantity: i64,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(product_id: i64, name: S, price: Money, quantity: i64) -> Self {
        Self { product_id: Some(product_id), name: name.into(), price, quantity }
    }

    /// `price * quantity`, or `None` if that does not fit in a [`Money`].
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub table_number: i64,
    pub payment_method: PaymentMethod,
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

impl NewOrder {
    pub fn new(table_number: i64, payment_method: PaymentMethod) -> Self {
        Self { table_number, payment_method, items: Vec::new(), additional_info: None }
    }

    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_additional_info<S: Into<String>>(mut self, info: S) -> Self {
        self.additional_info = Some(info.into());
        self
    }

    /// The order total as computed from the submitted unit prices. `None` if any line, or the sum, overflows.
    pub fn total(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::default(), |total, item| total.checked_add(item.line_total()?))
    }
}

//--------------------------------------          User         ---------------------------------------------------------
/// The public view of a staff account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A staff account including its password hash. Never leaves the engine.
#[derive(Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserCredentials({}, {}, {})", self.id, self.username, self.role)
    }
}

impl From<UserCredentials> for User {
    fn from(c: UserCredentials) -> Self {
        Self { id: c.id, username: c.username, role: c.role, created_at: c.created_at }
    }
}
