//! HTTP transport for the analytics client
//!
//! Every request of a [`GoogleAnalyticsClient`](crate::services::google_analytics::GoogleAnalyticsClient)
//! goes through one `reqwest::Client` built here, with the bearer token and
//! user agent installed as default headers.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::error::{Result, ServiceError};
use crate::services::UserAgent;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ClientBuilder {
    access_token: Option<String>,
    extra_headers: Vec<(String, String)>,
    timeout: Duration,
    user_agent: UserAgent,
    gzip: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            access_token: None,
            extra_headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: UserAgent::default(),
            gzip: true,
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// OAuth access token, sent as `Authorization: Bearer <token>`
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Extra header sent with every request (e.g. `X-Goog-User-Project`)
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.extra_headers.len() + 1);

        for (name, value) in &self.extra_headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| ServiceError::configuration(format!("bad header name {:?}: {}", name, e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| ServiceError::configuration(format!("bad value for header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        if let Some(token) = &self.access_token {
            let mut bearer = HeaderValue::try_from(format!("Bearer {}", token))
                .map_err(|_| ServiceError::configuration("access token contains characters not allowed in a header"))?;
            bearer.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, bearer);
        }

        Ok(headers)
    }

    pub fn build_http_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(self.user_agent.to_string())
            .default_headers(self.default_headers()?)
            .timeout(self.timeout)
            .gzip(self.gzip)
            .build()
            .map_err(|e| ServiceError::configuration(format!("cannot build HTTP client: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header_is_sensitive() {
        let headers = ClientBuilder::new()
            .access_token("ya29.secret")
            .header("X-Goog-User-Project", "composer-demo")
            .default_headers()
            .unwrap();

        let auth = &headers[header::AUTHORIZATION];
        assert!(auth.is_sensitive());
        assert_eq!(auth.to_str().unwrap(), "Bearer ya29.secret");
        assert_eq!(headers["x-goog-user-project"], "composer-demo");
    }

    #[test]
    fn test_rejects_invalid_header() {
        let result = ClientBuilder::new().header("bad header", "v").build_http_client();
        assert!(matches!(result, Err(ServiceError::Configuration(_))));

        let result = ClientBuilder::new().access_token("line\nbreak").build_http_client();
        assert!(result.is_err());
    }
}
