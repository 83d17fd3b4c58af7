use std::env;

use log::*;
use menu_common::{
    helpers::{parse_boolean_flag, parse_or_default},
    Secret,
};
use menu_engine::{events::DEFAULT_BUFFER_SIZE, OrderPolicies, PricingPolicy, TransitionPolicy};

use crate::errors::ServerError;

const DEFAULT_MENU_HOST: &str = "127.0.0.1";
const DEFAULT_MENU_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub auth: AuthConfig,
    /// When true, orders may only stay where they are or move one step forward through the status pipeline.
    pub strict_transitions: bool,
    /// Whether order lines are priced from the request or from the catalog.
    pub pricing_policy: PricingPolicy,
    /// How many undelivered events a single viewer may have queued before it starts missing events.
    pub event_buffer_size: usize,
    /// Created as the first owner account when the users table is empty.
    pub bootstrap_owner: Option<BootstrapOwner>,
}

#[derive(Clone, Debug)]
pub struct BootstrapOwner {
    pub username: String,
    pub password: Secret<String>,
}

impl ServerConfig {
    /// Test and development configuration. Nothing in here is suitable for production.
    pub fn new(host: &str, port: u16, database_url: &str, jwt_secret: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            database_url: database_url.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auth: AuthConfig::new(jwt_secret),
            strict_transitions: false,
            pricing_policy: PricingPolicy::default(),
            event_buffer_size: DEFAULT_BUFFER_SIZE,
            bootstrap_owner: None,
        }
    }

    /// Reads the configuration from `MENU_*` environment variables.
    ///
    /// `MENU_DATABASE_URL` and `MENU_JWT_SECRET` are required, and their absence is an error. Everything else falls
    /// back to a default, with a warning if a value was supplied but could not be understood.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where F: Fn(&str) -> Option<String> {
        let database_url = required(&lookup, "MENU_DATABASE_URL")?;
        let auth = AuthConfig::try_from_lookup(&lookup)?;
        let host = lookup("MENU_HOST").filter(|s| !s.trim().is_empty()).unwrap_or_else(|| DEFAULT_MENU_HOST.into());
        let port = or_default(&lookup, "MENU_PORT", DEFAULT_MENU_PORT);
        let max_connections = or_default(&lookup, "MENU_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let strict_transitions = parse_boolean_flag(lookup("MENU_STRICT_TRANSITIONS"), false);
        let pricing_policy = or_default(&lookup, "MENU_PRICING_POLICY", PricingPolicy::default());
        let event_buffer_size = or_default(&lookup, "MENU_EVENT_BUFFER", DEFAULT_BUFFER_SIZE);
        let bootstrap_owner = match (lookup("MENU_OWNER_USERNAME"), lookup("MENU_OWNER_PASSWORD")) {
            (Some(username), Some(password)) if !username.trim().is_empty() && !password.is_empty() => {
                Some(BootstrapOwner { username: username.trim().to_string(), password: Secret::new(password) })
            },
            (Some(_), _) | (_, Some(_)) => {
                warn!("🪛️ MENU_OWNER_USERNAME and MENU_OWNER_PASSWORD must both be set. Ignoring the bootstrap owner.");
                None
            },
            (None, None) => None,
        };
        if strict_transitions {
            info!("🪛️ Strict order status transitions are enabled");
        }
        info!("🪛️ Order lines are priced using the {pricing_policy} pricing policy");
        Ok(Self {
            host,
            port,
            database_url,
            max_connections,
            auth,
            strict_transitions,
            pricing_policy,
            event_buffer_size,
            bootstrap_owner,
        })
    }

    pub fn order_policies(&self) -> OrderPolicies {
        let transitions = if self.strict_transitions { TransitionPolicy::Strict } else { TransitionPolicy::Lenient };
        OrderPolicies { transitions, pricing: self.pricing_policy }
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String, ServerError>
where F: Fn(&str) -> Option<String> {
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => {
            error!("🪛️ {name} is not set. The server cannot start without it.");
            Err(ServerError::ConfigurationError(format!("{name} is required")))
        },
    }
}

fn or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display + Clone,
{
    parse_or_default(lookup(name), default.clone()).unwrap_or_else(|v| {
        warn!("🪛️ {v} is not a valid value for {name}. Using the default, {default}, instead.");
        default
    })
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self { jwt_secret: Secret::new(secret.to_string()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        Self::try_from_lookup(&|name: &str| env::var(name).ok())
    }

    fn try_from_lookup<F>(lookup: &F) -> Result<Self, ServerError>
    where F: Fn(&str) -> Option<String> {
        let secret = required(lookup, "MENU_JWT_SECRET")?;
        if secret.len() < 16 {
            warn!("🪛️ MENU_JWT_SECRET is very short. Use at least 32 random characters in production.");
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}
