use std::fmt::Display;

use anyhow::{anyhow, Result};
use futures::{stream, Stream, StreamExt};
use log::*;
use menu_engine::{
    analytics_objects::{AnalyticsReport, OrderAverages},
    db_types::{NewOrder, Order, OrderStatusType, Product, User},
};
use menu_server::data_objects::{AnalyticsParams, LoginResponse, StatusUpdateRequest, StockUpdateRequest};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
    RequestBuilder,
    Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::sse::{SseEvent, SseParser};

/// The two things that can happen to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEventKind {
    Created,
    Updated,
}

impl Display for OrderEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventKind::Created => write!(f, "order:created"),
            OrderEventKind::Updated => write!(f, "order:updated"),
        }
    }
}

/// What the live feed tells us: which order changed, and how. Clients re-fetch rather than trust the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderEventNotice {
    pub event: OrderEventKind,
    pub order_id: i64,
}

impl OrderEventNotice {
    /// Reads a notice from an SSE event. Events other than order events give `Ok(None)`.
    pub fn from_sse(event: &SseEvent) -> Result<Option<Self>> {
        let kind = match event.event.as_deref() {
            Some("order:created") => OrderEventKind::Created,
            Some("order:updated") => OrderEventKind::Updated,
            other => {
                trace!("Ignoring event {other:?}");
                return Ok(None);
            },
        };
        let payload: Value = serde_json::from_str(&event.data)
            .map_err(|e| anyhow!("The {kind} event did not carry JSON. {e}"))?;
        let order_id = payload["id"].as_i64().ok_or_else(|| anyhow!("The {kind} event has no order id"))?;
        Ok(Some(Self { event: kind, order_id }))
    }
}

pub struct MenuClient {
    client: Client,
    server: Url,
    access_token: Option<String>,
}

impl MenuClient {
    pub fn new(server: Url) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent("menutools")
            .default_headers(headers)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client. {e}"))?;
        Ok(Self { client, server, access_token: None })
    }

    pub fn server(&self) -> &str {
        self.server.as_str()
    }

    pub fn is_logged_in(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.server.join(path).map_err(|e| anyhow!("Failed to join URL: {e}"))
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token.as_ref().ok_or_else(|| anyhow!("Log in first"))?;
        Ok(req.bearer_auth(token))
    }

    pub async fn health(&self) -> Result<String> {
        let res = self.client.get(self.url("/api/health")?).send().await?;
        Ok(res.text().await?)
    }

    /// Logs in and keeps the access token for the calls that need it.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<LoginResponse> {
        let url = self.url("/api/auth/login")?;
        let res = self.client.post(url).json(&json!({ "username": username, "password": password })).send().await?;
        let login: LoginResponse = parse_response("/api/auth/login", res).await?;
        info!("Logged in to {} as {} ({})", self.server, login.user.username, login.user.role);
        self.access_token = Some(login.token.clone());
        Ok(login)
    }

    pub async fn me(&self) -> Result<User> {
        self.auth_get_request("/api/auth/me").await
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        let res = self.client.get(self.url("/api/products")?).send().await?;
        parse_response("/api/products", res).await
    }

    /// Places an order as a customer. No login needed.
    pub async fn place_order(&self, order: &NewOrder) -> Result<Order> {
        let res = self.client.post(self.url("/api/orders")?).json(order).send().await?;
        parse_response("/api/orders", res).await
    }

    pub async fn orders(&self, status: Option<OrderStatusType>) -> Result<Vec<Order>> {
        match status {
            Some(s) => self.auth_get_request(&format!("/api/orders?status={s}")).await,
            None => self.auth_get_request("/api/orders").await,
        }
    }

    pub async fn set_status(&self, id: i64, status: OrderStatusType) -> Result<Order> {
        let path = format!("/api/orders/{id}/status");
        let req = self.authorized(self.client.patch(self.url(&path)?))?;
        let res = req.json(&StatusUpdateRequest { status }).send().await?;
        parse_response(&path, res).await
    }

    pub async fn set_stock(&self, id: i64, in_stock: bool) -> Result<Product> {
        let path = format!("/api/products/{id}/stock");
        let req = self.authorized(self.client.patch(self.url(&path)?))?;
        let res = req.json(&StockUpdateRequest { in_stock }).send().await?;
        parse_response(&path, res).await
    }

    pub async fn analytics(&self, params: &AnalyticsParams) -> Result<AnalyticsReport> {
        let req = self.authorized(self.client.get(self.url("/api/analytics")?))?;
        let res = req.query(params).send().await?;
        parse_response("/api/analytics", res).await
    }

    pub async fn averages(&self) -> Result<OrderAverages> {
        self.auth_get_request("/api/analytics/averages").await
    }

    /// Opens the live order feed. The stream ends when the server closes the connection.
    pub async fn subscribe(&self) -> Result<impl Stream<Item = Result<OrderEventNotice>>> {
        let res = self.client.get(self.url("/api/events")?).header(ACCEPT, "text/event-stream").send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let msg = res.text().await?;
            return Err(anyhow!("Could not subscribe to order events: {status}, {msg}"));
        }
        debug!("Subscribed to order events on {}", self.server);
        let mut parser = SseParser::new();
        let notices = res
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => parser
                    .push(&bytes)
                    .iter()
                    .filter_map(|event| OrderEventNotice::from_sse(event).transpose())
                    .collect::<Vec<_>>(),
                Err(e) => vec![Err(anyhow!("The event stream failed. {e}"))],
            })
            .flat_map(stream::iter);
        Ok(notices)
    }

    async fn auth_get_request<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let req = self.authorized(self.client.get(self.url(path)?))?;
        let res = req.send().await?;
        parse_response(path, res).await
    }
}

async fn parse_response<T: DeserializeOwned>(path: &str, res: Response) -> Result<T> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }
    let body = res.text().await?;
    let msg = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);
    Err(anyhow!("Error calling {path}: {status}, {msg}"))
}
