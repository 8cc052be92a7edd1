//! Client configuration.
//!
//! `ClientConfig` can be deserialized from any serde source or read from the
//! `AMOCRM_*` environment variables.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default amoCRM domain.
pub const DEFAULT_DOMAIN: &str = "amocrm.ru";

/// API version segment in every URL.
pub const API_VERSION: &str = "v4";

/// Page ceiling used when the caller passes 0.
pub const DEFAULT_CEILING: u32 = 100_000;

/// Replace a zero ceiling with `DEFAULT_CEILING`.
pub fn normalize_ceiling(ceiling: u32) -> u32 {
    if ceiling == 0 {
        DEFAULT_CEILING
    } else {
        ceiling
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub subdomain: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Long-lived bearer token. OAuth flows are left to the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Page ceiling for boundary searches; 0 means `DEFAULT_CEILING`.
    #[serde(default)]
    pub ceiling: u32,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl ClientConfig {
    pub fn new(subdomain: &str) -> Self {
        Self {
            subdomain: subdomain.to_string(),
            domain: default_domain(),
            token: None,
            ceiling: 0,
        }
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.{}/api/{API_VERSION}", self.subdomain, self.domain)
    }

    pub fn effective_ceiling(&self) -> u32 {
        normalize_ceiling(self.ceiling)
    }

    /// Read `AMOCRM_SUBDOMAIN` (required), `AMOCRM_DOMAIN`, `AMOCRM_TOKEN`
    /// and `AMOCRM_MAX_PAGES` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let subdomain = lookup("AMOCRM_SUBDOMAIN")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("AMOCRM_SUBDOMAIN"))?;
        let domain = lookup("AMOCRM_DOMAIN")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_domain);
        let token = lookup("AMOCRM_TOKEN").filter(|s| !s.is_empty());
        let ceiling = match lookup("AMOCRM_MAX_PAGES") {
            Some(raw) => parse_ceiling(&raw).ok_or(ConfigError::Invalid {
                key: "AMOCRM_MAX_PAGES",
                value: raw,
            })?,
            None => 0,
        };
        Ok(Self {
            subdomain,
            domain,
            token,
            ceiling,
        })
    }
}

/// Non-positive values mean "use the default" and collapse to 0.
fn parse_ceiling(raw: &str) -> Option<u32> {
    let value = raw.trim().parse::<i64>().ok()?;
    if value <= 0 {
        return Some(0);
    }
    u32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn zero_ceiling_normalizes_to_default() {
        assert_eq!(normalize_ceiling(0), DEFAULT_CEILING);
        assert_eq!(normalize_ceiling(42), 42);
    }

    #[test]
    fn base_url_uses_subdomain_and_domain() {
        let cfg = ClientConfig::new("acme");
        assert_eq!(cfg.base_url(), "https://acme.amocrm.ru/api/v4");
    }

    #[test]
    fn from_lookup_reads_all_keys() {
        let cfg = ClientConfig::from_lookup(env(&[
            ("AMOCRM_SUBDOMAIN", "acme"),
            ("AMOCRM_DOMAIN", "kommo.com"),
            ("AMOCRM_TOKEN", "secret"),
            ("AMOCRM_MAX_PAGES", "5000"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url(), "https://acme.kommo.com/api/v4");
        assert_eq!(cfg.token.as_deref(), Some("secret"));
        assert_eq!(cfg.effective_ceiling(), 5000);
    }

    #[test]
    fn from_lookup_requires_subdomain() {
        let err = ClientConfig::from_lookup(env(&[("AMOCRM_TOKEN", "t")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AMOCRM_SUBDOMAIN")));
    }

    #[test]
    fn from_lookup_rejects_bad_ceiling() {
        let err = ClientConfig::from_lookup(env(&[
            ("AMOCRM_SUBDOMAIN", "acme"),
            ("AMOCRM_MAX_PAGES", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "AMOCRM_MAX_PAGES", .. }));
    }

    #[test]
    fn from_lookup_negative_ceiling_uses_default() {
        for raw in ["-1", "0", " -250 "] {
            let cfg = ClientConfig::from_lookup(env(&[
                ("AMOCRM_SUBDOMAIN", "acme"),
                ("AMOCRM_MAX_PAGES", raw),
            ]))
            .unwrap();
            assert_eq!(cfg.ceiling, 0, "{raw:?}");
            assert_eq!(cfg.effective_ceiling(), DEFAULT_CEILING, "{raw:?}");
        }
    }

    #[test]
    fn from_lookup_rejects_ceiling_above_u32() {
        let err = ClientConfig::from_lookup(env(&[
            ("AMOCRM_SUBDOMAIN", "acme"),
            ("AMOCRM_MAX_PAGES", "4294967296"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "AMOCRM_MAX_PAGES", .. }));

        let cfg = ClientConfig::from_lookup(env(&[
            ("AMOCRM_SUBDOMAIN", "acme"),
            ("AMOCRM_MAX_PAGES", "4294967295"),
        ]))
        .unwrap();
        assert_eq!(cfg.effective_ceiling(), u32::MAX);
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: ClientConfig = serde_json::from_str(r#"{"subdomain":"acme"}"#).unwrap();
        assert_eq!(cfg, ClientConfig::new("acme"));
        assert_eq!(cfg.effective_ceiling(), DEFAULT_CEILING);
    }
}
