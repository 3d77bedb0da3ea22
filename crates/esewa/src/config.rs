//! Gateway configuration
//!
//! Loaded once at startup, from the environment or a TOML file, and passed
//! explicitly to the signer, initiator and verifier. Missing values are
//! fatal.

use std::env;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// eSewa's public test merchant code
pub const SANDBOX_PRODUCT_CODE: &str = "EPAYTEST";

/// eSewa's public test secret key
pub const SANDBOX_SECRET_KEY: &str = "8gBm/:&EnhH.1/q";

const TEST_FORM_URL: &str = "https://rc-epay.esewa.com.np/api/epay/main/v2/form";
const TEST_STATUS_URL: &str = "https://rc.esewa.com.np/api/epay/transaction/status/";
const PRODUCTION_FORM_URL: &str = "https://epay.esewa.com.np/api/epay/main/v2/form";
const PRODUCTION_STATUS_URL: &str = "https://epay.esewa.com.np/api/epay/transaction/status/";

/// Gateway environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// eSewa UAT / release-candidate endpoints
    #[default]
    #[serde(alias = "uat")]
    Test,
    /// Live endpoints
    #[serde(alias = "prod", alias = "live")]
    Production,
}

impl Environment {
    /// Parse from `ESEWA_ENV`-style strings
    ///
    /// # Errors
    /// [`ConfigError::InvalidEnvironment`] for anything other than
    /// `test`, `uat`, `production`, `prod` or `live`.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "test" | "uat" => Ok(Self::Test),
            "production" | "prod" | "live" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(value.to_string())),
        }
    }

    /// Default payment form URL
    #[must_use]
    pub fn form_url(self) -> &'static str {
        match self {
            Self::Test => TEST_FORM_URL,
            Self::Production => PRODUCTION_FORM_URL,
        }
    }

    /// Default status-check URL
    #[must_use]
    pub fn status_url(self) -> &'static str {
        match self {
            Self::Test => TEST_STATUS_URL,
            Self::Production => PRODUCTION_STATUS_URL,
        }
    }
}

/// Merchant configuration for eSewa ePay v2
#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    /// Target environment
    #[serde(default)]
    pub environment: Environment,
    /// Merchant product code
    pub product_code: String,
    /// Shared HMAC secret
    secret_key: SecretString,
    /// Payment form endpoint
    #[serde(default)]
    pub form_url: String,
    /// Transaction status endpoint
    #[serde(default)]
    pub status_url: String,
    /// Where the gateway redirects after a completed payment
    pub success_url: String,
    /// Where the gateway redirects after a failed or cancelled payment
    pub failure_url: String,
}

impl GatewayConfig {
    /// Create configuration with environment default endpoints
    pub fn new(
        environment: Environment,
        product_code: impl Into<String>,
        secret_key: impl Into<String>,
        success_url: impl Into<String>,
        failure_url: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            product_code: product_code.into(),
            secret_key: SecretString::new(secret_key.into()),
            form_url: environment.form_url().to_string(),
            status_url: environment.status_url().to_string(),
            success_url: success_url.into(),
            failure_url: failure_url.into(),
        }
    }

    /// Public test merchant with local redirect URLs
    #[must_use]
    pub fn sandbox() -> Self {
        Self::new(
            Environment::Test,
            SANDBOX_PRODUCT_CODE,
            SANDBOX_SECRET_KEY,
            "http://localhost:3000/payment/esewa/success",
            "http://localhost:3000/payment/esewa/failure",
        )
    }

    /// Create configuration from environment variables
    ///
    /// Reads:
    /// - `ESEWA_ENV`: `test` (default) or `production`
    /// - `ESEWA_PRODUCT_CODE`, `ESEWA_SECRET_KEY`: required
    /// - `ESEWA_SUCCESS_URL`, `ESEWA_FAILURE_URL`: required
    /// - `ESEWA_FORM_URL`, `ESEWA_STATUS_URL`: optional overrides
    ///
    /// # Errors
    /// [`ConfigError::MissingEnvVar`] for an absent required variable, or
    /// any [`GatewayConfig::validate`] failure.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`GatewayConfig::from_env`] with a custom variable source
    ///
    /// # Errors
    /// See [`GatewayConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let environment = match lookup("ESEWA_ENV").filter(|v| !v.is_empty()) {
            Some(v) => Environment::parse(&v)?,
            None => Environment::default(),
        };

        let mut config = Self::new(
            environment,
            required("ESEWA_PRODUCT_CODE")?,
            required("ESEWA_SECRET_KEY")?,
            required("ESEWA_SUCCESS_URL")?,
            required("ESEWA_FAILURE_URL")?,
        );
        if let Some(url) = lookup("ESEWA_FORM_URL") {
            config.form_url = url;
        }
        if let Some(url) = lookup("ESEWA_STATUS_URL") {
            config.status_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    ///
    /// # Errors
    /// Read, parse, or validation failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text; empty endpoint URLs take the
    /// environment defaults
    ///
    /// # Errors
    /// Parse or validation failure.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        if config.form_url.is_empty() {
            config.form_url = config.environment.form_url().to_string();
        }
        if config.status_url.is_empty() {
            config.status_url = config.environment.status_url().to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// The shared secret. Callers must never log the result.
    #[must_use]
    pub fn expose_secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    /// Builder-style method to set the secret key
    #[must_use]
    pub fn with_secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = SecretString::new(key.into());
        self
    }

    /// Builder-style method to set the product code
    #[must_use]
    pub fn with_product_code(mut self, code: impl Into<String>) -> Self {
        self.product_code = code.into();
        self
    }

    /// Builder-style method to set the form URL
    #[must_use]
    pub fn with_form_url(mut self, url: impl Into<String>) -> Self {
        self.form_url = url.into();
        self
    }

    /// Builder-style method to set both redirect URLs
    #[must_use]
    pub fn with_redirects(mut self, success: impl Into<String>, failure: impl Into<String>) -> Self {
        self.success_url = success.into();
        self.failure_url = failure.into();
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Empty secret or product code, or a URL that is not absolute
    /// `http`/`https`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.product_code.trim().is_empty() {
            return Err(ConfigError::MissingProductCode);
        }
        if self.secret_key.expose_secret().is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        for (field, value) in [
            ("form_url", &self.form_url),
            ("status_url", &self.status_url),
            ("success_url", &self.success_url),
            ("failure_url", &self.failure_url),
        ] {
            let ok = Url::parse(value)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !ok {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("ESEWA_PRODUCT_CODE", "THRIFTLY"),
        ("ESEWA_SECRET_KEY", "s3cret"),
        ("ESEWA_SUCCESS_URL", "https://thriftly.app/pay/success"),
        ("ESEWA_FAILURE_URL", "https://thriftly.app/pay/failure"),
    ];

    #[test]
    fn test_sandbox_is_valid() {
        let config = GatewayConfig::sandbox();
        assert!(config.validate().is_ok());
        assert_eq!(config.product_code, "EPAYTEST");
        assert!(config.form_url.contains("rc-epay"));
    }

    #[test]
    fn test_from_lookup_defaults_to_test_urls() {
        let env = vars(REQUIRED);
        let config = GatewayConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.form_url, TEST_FORM_URL);
        assert_eq!(config.expose_secret_key(), "s3cret");
    }

    #[test]
    fn test_from_lookup_production() {
        let mut env = vars(REQUIRED);
        env.insert("ESEWA_ENV".into(), "production".into());
        let config = GatewayConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.form_url, PRODUCTION_FORM_URL);
        assert_eq!(config.status_url, PRODUCTION_STATUS_URL);
    }

    #[test]
    fn test_from_lookup_rejects_unknown_environment() {
        let mut env = vars(REQUIRED);
        env.insert("ESEWA_ENV".into(), "prodution".into());
        let err = GatewayConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvironment(ref v) if v == "prodution"));
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("UAT").unwrap(), Environment::Test);
        assert_eq!(Environment::parse("test").unwrap(), Environment::Test);
        assert_eq!(Environment::parse("Live").unwrap(), Environment::Production);
        assert!(Environment::parse("staging").is_err());
    }

    #[test]
    fn test_from_lookup_missing_secret_is_fatal() {
        let env = vars(&REQUIRED[..1]);
        let err = GatewayConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "ESEWA_SECRET_KEY"));
    }

    #[test]
    fn test_from_lookup_empty_value_counts_as_missing() {
        let mut env = vars(REQUIRED);
        env.insert("ESEWA_PRODUCT_CODE".into(), String::new());
        let err = GatewayConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            GatewayConfig::sandbox().with_secret_key("").validate(),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            GatewayConfig::sandbox().with_product_code(" ").validate(),
            Err(ConfigError::MissingProductCode)
        ));
        assert!(matches!(
            GatewayConfig::sandbox().with_form_url("ftp://esewa").validate(),
            Err(ConfigError::InvalidUrl { field: "form_url", .. })
        ));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let config = GatewayConfig::sandbox();
        let debug = format!("{config:?}");
        assert!(!debug.contains(SANDBOX_SECRET_KEY));
    }

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
environment = "production"
product_code = "THRIFTLY"
secret_key = "from-file"
success_url = "https://thriftly.app/pay/success"
failure_url = "https://thriftly.app/pay/failure"
"#
        )
        .unwrap();

        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.form_url, PRODUCTION_FORM_URL);
        assert_eq!(config.expose_secret_key(), "from-file");
    }

    #[test]
    fn test_load_missing_file() {
        let err = GatewayConfig::load("/nonexistent/esewa.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_toml_missing_secret() {
        let err = GatewayConfig::from_toml(
            r#"
product_code = "THRIFTLY"
success_url = "https://thriftly.app/s"
failure_url = "https://thriftly.app/f"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
