//! Tests for the configuration providers and typed config sections

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env;
    use std::time::Duration;

    use crate::config::{
        AnalyticsConfig, CompositeConfigProvider, ConfigProvider, ConfigProviderExt, DetectorConfig,
        EnvConfigProvider, MemoryConfigProvider, ServiceConfig,
    };
    use crate::error::ServiceError;

    #[test]
    fn test_memory_provider_typed_getters() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("timeout_seconds", 45);
        provider.set("use_resource_quotas", "yes");
        provider.set("detector_grace", "2s");
        provider.set("page_size", "not-a-number");

        assert_eq!(provider.get_int("timeout_seconds").unwrap(), 45);
        assert!(provider.get_bool("use_resource_quotas").unwrap());
        assert_eq!(provider.get_duration("detector_grace").unwrap(), Duration::from_secs(2));
        assert_eq!(provider.get::<u16>("timeout_seconds").unwrap(), 45);

        assert!(matches!(provider.get_int("page_size"), Err(ServiceError::Configuration(_))));
        assert!(matches!(provider.get_string("missing"), Err(ServiceError::Configuration(_))));
        assert_eq!(provider.get_int_or("missing", 1000).unwrap(), 1000);
        assert!(!provider.get_bool_or("missing", false).unwrap());
        assert_eq!(provider.get_opt::<i64>("missing").unwrap(), None);
        assert_eq!(provider.get_opt::<i64>("timeout_seconds").unwrap(), Some(45));
    }

    #[test]
    fn test_defaults_only_cover_absent_keys() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("page_size", "not-a-number");
        provider.set("use_resource_quotas", "maybe");
        provider.set("detector_grace", "soon");

        assert!(matches!(provider.get_int_or("page_size", 1000), Err(ServiceError::Configuration(_))));
        assert!(provider.get_bool_or("use_resource_quotas", false).is_err());
        assert!(provider.get_duration_or("detector_grace", Duration::ZERO).is_err());
        assert!(provider.get_opt::<i64>("page_size").is_err());
    }

    #[test]
    fn test_malformed_settings_are_rejected() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("detector_grace", "abc");

        let err = DetectorConfig::from_provider(&provider).unwrap_err();
        assert!(err.to_string().contains("detector_grace"));

        let mut provider = MemoryConfigProvider::new();
        provider.set("access_token", "ya29.token");
        provider.set("timeout_seconds", "thirty");

        assert!(matches!(
            AnalyticsConfig::from_provider(&provider),
            Err(ServiceError::Configuration(_))
        ));
    }

    #[test]
    fn test_env_provider() {
        let provider = EnvConfigProvider::new()
            .with_prefix("GA")
            .with_namespace("CONFIG_TESTS_ENV");

        env::set_var("GA_CONFIG_TESTS_ENV_ACCESS_TOKEN", "ya29.from-env");
        env::set_var("GA_CONFIG_TESTS_ENV_DETECTOR_SLOW_AFTER", "150ms");

        assert_eq!(provider.get_string("access_token").unwrap(), "ya29.from-env");
        assert_eq!(
            provider.get_duration("detector_slow_after").unwrap(),
            Duration::from_millis(150)
        );
        assert!(provider.get_string("analytics_base_url").is_err());

        env::remove_var("GA_CONFIG_TESTS_ENV_ACCESS_TOKEN");
        env::remove_var("GA_CONFIG_TESTS_ENV_DETECTOR_SLOW_AFTER");

        assert!(provider.get_string("access_token").is_err());
    }

    #[test]
    fn test_composite_provider_order() {
        let mut overrides = MemoryConfigProvider::new();
        overrides.set("access_token", "override-token");

        let mut defaults = MemoryConfigProvider::new();
        defaults.set("access_token", "default-token");
        defaults.set("timeout_seconds", "10");

        let mut composite = CompositeConfigProvider::new();
        composite.add_provider(overrides);
        composite.add_provider(defaults);

        assert_eq!(composite.get_string("access_token").unwrap(), "override-token");
        assert_eq!(composite.lookup("missing").unwrap(), None);
        assert_eq!(composite.get_int("timeout_seconds").unwrap(), 10);
        assert!(composite.get_string("reporting_base_url").is_err());

        let config = AnalyticsConfig::from_provider(&composite).unwrap();
        assert_eq!(config.access_token, "override-token");
        assert_eq!(config.timeout_seconds, 10);
    }

    #[test]
    fn test_analytics_config_rejects_bad_base_url() {
        let provider = MemoryConfigProvider::with_values(HashMap::from([
            ("access_token".to_string(), "token".to_string()),
            ("analytics_base_url".to_string(), "::not a url".to_string()),
        ]));

        let err = AnalyticsConfig::from_provider(&provider).unwrap_err();
        assert!(err.to_string().contains("analytics base URL"));
    }

    #[test]
    fn test_detector_config_defaults() {
        let config = DetectorConfig::from_provider(&MemoryConfigProvider::new()).unwrap();

        assert_eq!(config, DetectorConfig::default());
        assert_eq!(config.slow_after, Duration::from_millis(300));
        assert_eq!(config.grace, Duration::from_millis(500));
        assert_eq!(config.service_name(), "detector");
    }

    #[test]
    fn test_detector_config_overrides() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("detector_slow_after", "150ms");
        provider.set("detector_grace", "1s");

        let config = DetectorConfig::from_provider(&provider).unwrap();
        assert_eq!(config.slow_after, Duration::from_millis(150));
        assert_eq!(config.grace, Duration::from_secs(1));

        // a bare number is milliseconds
        provider.set("detector_grace", "250");
        let config = DetectorConfig::from_provider(&provider).unwrap();
        assert_eq!(config.grace, Duration::from_millis(250));
    }

    #[test]
    fn test_detector_config_rejects_zero_threshold() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("detector_slow_after", "0ms");

        assert!(matches!(
            DetectorConfig::from_provider(&provider),
            Err(ServiceError::Configuration(_))
        ));

        // zero grace is allowed: the flag drops as soon as the call settles
        let config = DetectorConfig {
            slow_after: Duration::from_millis(1),
            grace: Duration::ZERO,
        };
        assert!(config.validate().is_ok());
    }
}
