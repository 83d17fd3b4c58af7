use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::db_types::{ConversionError, OrderStatusType};

/// How strictly status changes are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may be written at any time, including moving a completed order back.
    #[default]
    Lenient,
    /// Orders may only stay where they are or advance a single step along `new → in_progress → ready → completed`.
    Strict,
}

impl TransitionPolicy {
    /// True if no transition is ever rejected, so the current status need not be looked up.
    pub fn allows_all(&self) -> bool {
        matches!(self, TransitionPolicy::Lenient)
    }

    pub fn allows(&self, from: OrderStatusType, to: OrderStatusType) -> bool {
        match self {
            TransitionPolicy::Lenient => true,
            TransitionPolicy::Strict => from == to || from.next() == Some(to),
        }
    }
}

/// Where the unit price and name of an order line come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPolicy {
    /// The submitted name and unit price are snapshotted as-is.
    #[default]
    ClientSupplied,
    /// Name and unit price are taken from the catalog. Lines must refer to an existing product that is in stock.
    Catalog,
}

impl Display for PricingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingPolicy::ClientSupplied => write!(f, "client"),
            PricingPolicy::Catalog => write!(f, "catalog"),
        }
    }
}

impl FromStr for PricingPolicy {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "client_supplied" => Ok(Self::ClientSupplied),
            "catalog" => Ok(Self::Catalog),
            _ => Err(ConversionError::new(format!("Invalid pricing policy: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderPolicies {
    pub transitions: TransitionPolicy,
    pub pricing: PricingPolicy,
}

impl OrderPolicies {
    pub fn strict_transitions(mut self) -> Self {
        self.transitions = TransitionPolicy::Strict;
        self
    }

    pub fn catalog_pricing(mut self) -> Self {
        self.pricing = PricingPolicy::Catalog;
        self
    }
}
