//! Configuration management for the analytics client and bindings
//!
//! Values come from layered providers (environment variables, in-memory
//! maps, or a composite of both) and are loaded into typed, validated
//! configuration structs.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::util::parse_duration;

/// Default base URL of the Analytics Reporting API v4
pub const DEFAULT_REPORTING_BASE_URL: &str = "https://analyticsreporting.googleapis.com/v4";

/// Default base URL of the Analytics API v3 (metadata and management)
pub const DEFAULT_ANALYTICS_BASE_URL: &str = "https://www.googleapis.com/analytics/v3";

/// Source of raw string settings
pub trait ConfigProvider: Send + Sync {
    /// Raw value of `key`, `Ok(None)` when this source does not hold it
    fn lookup(&self, key: &str) -> Result<Option<String>>;

    fn get_string(&self, key: &str) -> Result<String> {
        self.lookup(key)?
            .ok_or_else(|| ServiceError::configuration(format!("missing setting {}", key)))
    }
}

fn invalid(key: &str, value: &str, why: impl std::fmt::Display) -> ServiceError {
    ServiceError::configuration(format!("{} = {:?} is not valid: {}", key, value, why))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| invalid(key, raw, e))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, raw, "expected a boolean")),
    }
}

fn parse_duration_value(key: &str, raw: &str) -> Result<Duration> {
    parse_duration(raw).ok_or_else(|| invalid(key, raw, "expected a duration"))
}

/// Typed reads over any [`ConfigProvider`]
///
/// The `*_or` variants fall back to the default only when the key is absent.
/// A value that is present but malformed is still an error.
pub trait ConfigProviderExt: ConfigProvider {
    /// Parse the value with `FromStr`
    fn get<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        parse_value(key, &self.get_string(key)?)
    }

    /// Like [`get`](Self::get), with `Ok(None)` for an absent key
    fn get_opt<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.lookup(key)?.map(|raw| parse_value(key, &raw)).transpose()
    }

    fn get_int(&self, key: &str) -> Result<i64> {
        self.get(key)
    }

    /// Accepts `true/false`, `yes/no`, `on/off` and `1/0`
    fn get_bool(&self, key: &str) -> Result<bool> {
        parse_bool(key, &self.get_string(key)?)
    }

    /// Durations such as `300ms`, `2s` or `5m`; a bare number is milliseconds
    fn get_duration(&self, key: &str) -> Result<Duration> {
        parse_duration_value(key, &self.get_string(key)?)
    }

    fn get_string_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.lookup(key)?.unwrap_or_else(|| default.to_owned()))
    }

    fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self.get_opt(key)?.unwrap_or(default))
    }

    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.lookup(key)? {
            Some(raw) => parse_bool(key, &raw),
            None => Ok(default),
        }
    }

    fn get_duration_or(&self, key: &str, default: Duration) -> Result<Duration> {
        match self.lookup(key)? {
            Some(raw) => parse_duration_value(key, &raw),
            None => Ok(default),
        }
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Reads `PREFIX_NAMESPACE_KEY` environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    prefix: Option<String>,
    namespace: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(self, prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..self
        }
    }

    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..self
        }
    }

    /// `detector-grace` with prefix `GA` becomes `GA_DETECTOR_GRACE`
    pub(crate) fn format_key(&self, key: &str) -> String {
        let key = key
            .to_ascii_uppercase()
            .replace(|c: char| !c.is_ascii_alphanumeric(), "_");

        [self.prefix.as_deref(), self.namespace.as_deref(), Some(key.as_str())]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn lookup(&self, key: &str) -> Result<Option<String>> {
        let var = self.format_key(key);
        match env::var(&var) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(ServiceError::configuration(format!("{} is not valid UTF-8", var)))
            }
        }
    }

    fn get_string(&self, key: &str) -> Result<String> {
        let var = self.format_key(key);
        self.lookup(key)?
            .ok_or_else(|| ServiceError::configuration(format!("{} is not set", var)))
    }
}

/// Fixed key/value settings, mostly for tests and embedding hosts
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn lookup(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }
}

/// Providers consulted in insertion order; the first one holding a key wins.
/// A provider that fails to read a key stops the lookup.
#[derive(Default)]
pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.providers.push(Box::new(provider));
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn lookup(&self, key: &str) -> Result<Option<String>> {
        for provider in &self.providers {
            if let Some(value) = provider.lookup(key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn get_string(&self, key: &str) -> Result<String> {
        self.lookup(key)?
            .ok_or_else(|| ServiceError::configuration(format!("no provider holds {}", key)))
    }
}

/// Global default configuration provider, reading `GA_*` environment variables
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("GA")));

/// A typed settings section that can check itself after loading
pub trait ServiceConfig: Debug + Send + Sync {
    fn validate(&self) -> Result<()>;

    /// Component the section configures
    fn service_name(&self) -> &str;
}

/// Connection settings for [`GoogleAnalyticsClient`](crate::services::google_analytics::GoogleAnalyticsClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// OAuth 2.0 access token issued to the signed-in user
    pub access_token: String,

    /// Analytics Reporting API v4 base URL
    pub reporting_base_url: String,

    /// Analytics API v3 base URL (metadata, management)
    pub analytics_base_url: String,

    /// Transport timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            reporting_base_url: DEFAULT_REPORTING_BASE_URL.to_string(),
            analytics_base_url: DEFAULT_ANALYTICS_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl AnalyticsConfig {
    /// Read `access_token` (required) and the optional URL and timeout keys
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            access_token: provider.get_string("access_token")?,
            ..Self::read_optional(provider)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Read every key except the token, leaving `access_token` empty.
    ///
    /// Malformed values are errors; absent ones take their defaults.
    pub(crate) fn read_optional<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let timeout: i64 = provider.get_int_or("timeout_seconds", 30)?;

        Ok(Self {
            access_token: String::new(),
            reporting_base_url: provider.get_string_or("reporting_base_url", DEFAULT_REPORTING_BASE_URL)?,
            analytics_base_url: provider.get_string_or("analytics_base_url", DEFAULT_ANALYTICS_BASE_URL)?,
            timeout_seconds: timeout.max(1) as u64,
        })
    }
}

impl ServiceConfig for AnalyticsConfig {
    fn validate(&self) -> Result<()> {
        if self.access_token.is_empty() {
            return Err(ServiceError::configuration("Analytics access token is required"));
        }

        for (name, value) in [
            ("reporting", &self.reporting_base_url),
            ("analytics", &self.analytics_base_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                ServiceError::configuration(format!("Invalid {} base URL {}: {}", name, value, e))
            })?;
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "google_analytics"
    }
}

/// Timings of the long-running-request detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// A call still pending after this long is flagged as slow
    pub slow_after: Duration,

    /// How long the slow flag stays raised after the call settles
    pub grace: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            slow_after: Duration::from_millis(300),
            grace: Duration::from_millis(500),
        }
    }
}

impl DetectorConfig {
    /// Load detector timings, falling back to the defaults for missing keys
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            slow_after: provider.get_duration_or("detector_slow_after", defaults.slow_after)?,
            grace: provider.get_duration_or("detector_grace", defaults.grace)?,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for DetectorConfig {
    fn validate(&self) -> Result<()> {
        if self.slow_after.is_zero() {
            return Err(ServiceError::configuration(
                "Detector slow_after must be greater than zero",
            ));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "detector"
    }
}
