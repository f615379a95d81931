use std::time::Duration;

use crate::error::ErpError;

/// ERP connection settings.
#[derive(Debug, Clone)]
pub struct ErpConfig {
    pub enabled: bool,
    /// Base URL of the ERP, e.g. `https://erp.example.com`.
    pub url: Option<String>,
    pub db: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Minimum spacing between two outbound calls.
    pub min_call_interval: Duration,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            db: None,
            username: None,
            password: None,
            min_call_interval: Duration::from_millis(100),
        }
    }
}

impl ErpConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `ERP_ENABLED`              | `false` |
    /// | `ERP_URL`                  | unset   |
    /// | `ERP_DB`                   | unset   |
    /// | `ERP_USERNAME`             | unset   |
    /// | `ERP_PASSWORD`             | unset   |
    /// | `ERP_MIN_CALL_INTERVAL_MS` | `100`   |
    pub fn from_env() -> Self {
        let enabled = std::env::var("ERP_ENABLED")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let min_call_interval_ms: u64 = std::env::var("ERP_MIN_CALL_INTERVAL_MS")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("ERP_MIN_CALL_INTERVAL_MS must be a valid u64");

        Self {
            enabled,
            url: non_empty("ERP_URL"),
            db: non_empty("ERP_DB"),
            username: non_empty("ERP_USERNAME"),
            password: non_empty("ERP_PASSWORD"),
            min_call_interval: Duration::from_millis(min_call_interval_ms),
        }
    }

    /// Connection parameters, or `NotConfigured` if the integration is
    /// disabled or incomplete.
    pub fn credentials(&self) -> Result<Credentials<'_>, ErpError> {
        if !self.enabled {
            return Err(ErpError::NotConfigured(
                "ERP integration is disabled (set ERP_ENABLED=true)".into(),
            ));
        }
        match (&self.url, &self.db, &self.username, &self.password) {
            (Some(url), Some(db), Some(username), Some(password)) => Ok(Credentials {
                url,
                db,
                username,
                password,
            }),
            _ => Err(ErpError::NotConfigured(
                "Missing ERP configuration, check ERP_URL, ERP_DB, ERP_USERNAME, ERP_PASSWORD"
                    .into(),
            )),
        }
    }
}

/// Borrowed, complete connection parameters.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub url: &'a str,
    pub db: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn disabled_by_default() {
        assert_matches!(
            ErpConfig::default().credentials(),
            Err(ErpError::NotConfigured(_))
        );
    }

    #[test]
    fn enabled_but_incomplete_is_not_configured() {
        let config = ErpConfig {
            enabled: true,
            url: Some("https://erp.local".into()),
            ..Default::default()
        };
        assert_matches!(config.credentials(), Err(ErpError::NotConfigured(m)) if m.contains("ERP_DB"));
    }

    #[test]
    fn complete_config_yields_credentials() {
        let config = ErpConfig {
            enabled: true,
            url: Some("https://erp.local".into()),
            db: Some("prod".into()),
            username: Some("sync".into()),
            password: Some("secret".into()),
            ..Default::default()
        };
        let creds = config.credentials().unwrap();
        assert_eq!(creds.db, "prod");
        assert_eq!(config.min_call_interval, Duration::from_millis(100));
    }
}
