//! Errors shared by the HTTP client and the reactive bindings
//!
//! Every failure is classified into one [`ServiceError`] variant. Errors
//! raised around an HTTP exchange are wrapped with an [`ErrorContext`]
//! naming the endpoint, status and Google error reason; the wrapper is
//! transparent to `Display`. [`mapping`] turns Google error bodies into
//! variants.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod mapping;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request never got an HTTP answer (DNS, TLS, connection reset)
    #[error("network failure: {0}")]
    Network(String),

    /// Missing, expired or revoked access token
    #[error("access token rejected: {0}")]
    Authentication(String),

    /// The signed-in user cannot access the view or resource
    #[error("access denied: {0}")]
    Authorization(String),

    /// Daily or per-user quota exhausted
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("analytics service error: {0}")]
    Service(String),

    /// Rejected report request (unknown field names, bad date ranges, ...)
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("unreadable response: {0}")]
    Parsing(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

macro_rules! constructors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        impl ServiceError {
            $(
                pub fn $name(message: impl Into<String>) -> Self {
                    ServiceError::$variant(message.into())
                }
            )*
        }
    };
}

constructors! {
    network => Network,
    authentication => Authentication,
    authorization => Authorization,
    quota_exceeded => QuotaExceeded,
    service => Service,
    validation => Validation,
    parsing => Parsing,
    configuration => Configuration,
    timeout => Timeout,
    not_found => NotFound,
    internal => Internal,
}

impl ServiceError {
    pub fn with_context(self, context: ErrorContext) -> Self {
        ServiceError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Wrap with a context holding a single detail
    pub fn with_detail(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.with_context(ErrorContext::default().detail(key, value))
    }

    /// The classified error below every context layer
    pub fn root(&self) -> &ServiceError {
        match self {
            ServiceError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Outermost context, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ServiceError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    fn find_in_context<'a, T: ?Sized>(
        &'a self,
        get: impl Fn(&'a ErrorContext) -> Option<&'a T>,
    ) -> Option<&'a T> {
        let mut current = self;
        while let ServiceError::WithContext { inner, context } = current {
            if let Some(found) = get(context) {
                return Some(found);
            }
            current = inner;
        }
        None
    }

    /// Google error reason such as `dailyLimitExceeded`, from any context layer
    pub fn reason(&self) -> Option<&str> {
        self.find_in_context(|c| c.reason.as_deref())
    }

    pub fn http_status(&self) -> Option<u16> {
        self.find_in_context(|c| c.status.as_ref()).copied()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.context().map(|c| c.service.as_str())
    }

    /// True when the access token behind the handle was rejected.
    ///
    /// Hosts usually answer this by signing the session out.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.root(), ServiceError::Authentication(_))
    }

    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self.root(), ServiceError::QuotaExceeded(_))
    }
}

/// Where and when an error happened
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Component that raised the error (`google_analytics`, `http`, `json`)
    pub service: String,

    pub at: DateTime<Utc>,

    /// HTTP status of the failed response
    pub status: Option<u16>,

    /// First `errors[].reason` of a Google error body, or the OAuth error code
    pub reason: Option<String>,

    pub request_id: Option<String>,

    pub endpoint: Option<String>,

    pub details: BTreeMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::for_service("analytics")
    }
}

impl ErrorContext {
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            at: Utc::now(),
            status: None,
            reason: None,
            request_id: None,
            endpoint: None,
            details: BTreeMap::new(),
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert_detail(key, value);
        self
    }

    pub fn insert_detail(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.details.insert(key.into(), value.to_string());
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        let error = if err.is_timeout() {
            ServiceError::Timeout(message)
        } else if err.is_connect() || err.is_request() || err.is_redirect() {
            ServiceError::Network(message)
        } else if err.is_decode() || err.is_body() {
            ServiceError::Parsing(message)
        } else if err.is_builder() {
            ServiceError::Validation(message)
        } else {
            ServiceError::Internal(message)
        };

        let mut context = ErrorContext::for_service("http");
        context.status = err.status().map(|s| s.as_u16());
        context.endpoint = err.url().map(|url| url.path().to_string());
        error.with_context(context)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Parsing(format!("line {} column {}: {}", err.line(), err.column(), err))
            .with_context(ErrorContext::for_service("json"))
    }
}
