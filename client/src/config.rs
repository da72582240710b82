use std::{env::VarError, time::Duration};

use shared::POLL_INTERVAL_MS;

use crate::error::ClientError;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    pub geocoder_url: String,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            poll_interval: Duration::from_millis(u64::from(POLL_INTERVAL_MS)),
        }
    }
}

impl ClientConfig {
    /// Reads `ROUTE_SERVER_URL`, `GEOCODER_URL` and `POLL_INTERVAL_MS`, falling
    /// back to the defaults for unset variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Result<String, VarError>) -> Result<Self, ClientError> {
        let mut config = Self::default();
        if let Some(url) = optional(&lookup, "ROUTE_SERVER_URL")? {
            config.server_url = url;
        }
        if let Some(url) = optional(&lookup, "GEOCODER_URL")? {
            config.geocoder_url = url;
        }
        if let Some(raw) = optional(&lookup, "POLL_INTERVAL_MS")? {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                ClientError::Config(format!("POLL_INTERVAL_MS `{raw}` is not a number"))
            })?;
            config = config.with_poll_interval_ms(millis)?;
        }
        Ok(config)
    }

    pub fn with_poll_interval_ms(mut self, millis: u64) -> Result<Self, ClientError> {
        if millis == 0 {
            return Err(ClientError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        self.poll_interval = Duration::from_millis(millis);
        Ok(self)
    }
}

fn optional(
    lookup: &impl Fn(&str) -> Result<String, VarError>,
    name: &str,
) -> Result<Option<String>, ClientError> {
    match lookup(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ClientError::Config(format!(
            "{name} value is not valid unicode"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.server_url, "http://localhost:5000");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ROUTE_SERVER_URL", "http://routes.internal:9000"),
            ("GEOCODER_URL", "http://geo.internal"),
            ("POLL_INTERVAL_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "http://routes.internal:9000");
        assert_eq!(config.geocoder_url, "http://geo.internal");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_poll_interval() {
        for raw in ["soon", "0"] {
            let err = ClientConfig::from_lookup(lookup(&[("POLL_INTERVAL_MS", raw)])).unwrap_err();
            assert!(matches!(err, ClientError::Config(_)), "{raw}: {err}");
        }
    }
}
