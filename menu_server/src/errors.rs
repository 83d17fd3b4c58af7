use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use menu_engine::{AnalyticsError, AuthApiError, OrderFlowError, ProductApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    InvalidRequestPath(String),
    #[error("{0}")]
    InvalidQuery(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not issue access token. {0}")]
    CouldNotIssueAccessToken(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
}

impl ServerError {
    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::FORBIDDEN,
                AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
                AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotIssueAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            error!("💻️ {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken(String),
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("{0}")]
    Forbidden(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::UserAlreadyExists(_) => Self::Conflict(e.to_string()),
            AuthApiError::ValidationError(s) => Self::InvalidRequestBody(s),
            AuthApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            AuthApiError::PasswordHashError(s) => Self::BackendError(format!("Password hashing failed: {s}")),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ValidationError(s) => Self::InvalidRequestBody(s),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::IllegalTransition { .. } => Self::Conflict(e.to_string()),
            OrderFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<ProductApiError> for ServerError {
    fn from(e: ProductApiError) -> Self {
        match e {
            ProductApiError::ValidationError(s) => Self::InvalidRequestBody(s),
            ProductApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            ProductApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<AnalyticsError> for ServerError {
    fn from(e: AnalyticsError) -> Self {
        match e {
            AnalyticsError::InvalidPeriod(_) | AnalyticsError::InvalidDateRange(_) => Self::InvalidQuery(e.to_string()),
            AnalyticsError::ShiftAnalyticsOnly => Self::AuthenticationError(AuthError::Forbidden(e.to_string())),
            AnalyticsError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}
