//! Bridge configuration loaded via OrthoConfig.
//!
//! [`BridgeSettings`] is the raw layer merged from CLI flags, `SCIM_BRIDGE_*`
//! environment variables and config files. [`BridgeConfig`] is the validated
//! form the server is built from. [`RoleSyncSettings`] and
//! [`RoleSyncConfig`] play the same parts for the `sync-roles` binary.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{RetryPolicy, RoleGrant, RoleSynchroniser};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_ORGANIZATION_ROLE: &str = "scim-management-organization";
const DEFAULT_ORGANIZATION_GROUP: &str = "identity-management-organization";
const DEFAULT_CLUSTER_ROLE: &str = "scim-management-cluster";
const DEFAULT_CLUSTER_GROUP: &str = "identity-management-cluster";

/// Raw configuration values. Every field is optional here so that missing
/// values are reported together by [`BridgeConfig::try_from`].
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SCIM_BRIDGE")]
pub struct BridgeSettings {
    /// Remote GraphQL endpoint.
    pub graphql_url: Option<String>,
    /// Bearer credential presented to the remote.
    pub graphql_token: Option<String>,
    /// Shared secret identity providers must present.
    pub scim_token: Option<String>,
    /// Prefix every SCIM route is mounted under.
    pub path_prefix: Option<String>,
    /// Listen address.
    pub bind_addr: Option<String>,
    pub retry_interval_ms: Option<u64>,
    pub max_retry_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

/// Reasons a [`BridgeSettings`] value cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("graphql_url is not a valid http(s) URL: {0}")]
    InvalidUrl(String),
    #[error("bind_addr is not a socket address: {0}")]
    InvalidBindAddr(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validated bridge configuration.
#[derive(Clone)]
pub struct BridgeConfig {
    pub graphql_url: Url,
    pub graphql_token: String,
    pub scim_token: String,
    /// Empty, or `/segment[/segment..]` without a trailing slash.
    pub path_prefix: String,
    pub bind_addr: SocketAddr,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("graphql_url", &self.graphql_url.as_str())
            .field("graphql_token", &"<redacted>")
            .field("scim_token", &"<redacted>")
            .field("path_prefix", &self.path_prefix)
            .field("bind_addr", &self.bind_addr)
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Normalise a configured prefix to `""` or `/a/b`.
///
/// # Examples
/// ```
/// use scim_bridge::config::normalise_path_prefix;
///
/// assert_eq!(normalise_path_prefix("scim/v2/"), "/scim/v2");
/// assert_eq!(normalise_path_prefix("/"), "");
/// ```
pub fn normalise_path_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn positive_millis(
    value: Option<u64>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(0) => Err(ConfigError::Zero(name)),
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

fn parse_graphql_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .ok_or_else(|| ConfigError::InvalidUrl(raw.to_owned()))
}

fn retry_policy(
    interval_ms: Option<u64>,
    max_retry_ms: Option<u64>,
) -> Result<RetryPolicy, ConfigError> {
    Ok(RetryPolicy {
        interval: positive_millis(interval_ms, "retry_interval_ms", RetryPolicy::DEFAULT_INTERVAL)?,
        max_elapsed: positive_millis(
            max_retry_ms,
            "max_retry_ms",
            RetryPolicy::DEFAULT_MAX_ELAPSED,
        )?,
    })
}

fn missing(required: &[(&'static str, bool)]) -> ConfigError {
    ConfigError::Missing(
        required
            .iter()
            .filter_map(|(name, absent)| absent.then_some(*name))
            .collect(),
    )
}

impl TryFrom<BridgeSettings> for BridgeConfig {
    type Error = ConfigError;

    fn try_from(settings: BridgeSettings) -> Result<Self, Self::Error> {
        let graphql_url = non_blank(settings.graphql_url);
        let graphql_token = non_blank(settings.graphql_token);
        let scim_token = non_blank(settings.scim_token);

        let (Some(raw_url), Some(graphql_token), Some(scim_token)) =
            (graphql_url.as_ref(), graphql_token.as_ref(), scim_token.as_ref())
        else {
            return Err(missing(&[
                ("graphql_url", graphql_url.is_none()),
                ("graphql_token", graphql_token.is_none()),
                ("scim_token", scim_token.is_none()),
            ]));
        };

        let graphql_url = parse_graphql_url(raw_url)?;

        let raw_bind = settings
            .bind_addr
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = raw_bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_bind.clone()))?;

        let retry = retry_policy(settings.retry_interval_ms, settings.max_retry_ms)?;
        let request_timeout = positive_millis(
            settings.request_timeout_ms,
            "request_timeout_ms",
            DEFAULT_REQUEST_TIMEOUT,
        )?;

        Ok(Self {
            graphql_url,
            graphql_token: graphql_token.clone(),
            scim_token: scim_token.clone(),
            path_prefix: normalise_path_prefix(settings.path_prefix.as_deref().unwrap_or("")),
            bind_addr,
            retry,
            request_timeout,
        })
    }
}

/// Raw settings for the `sync-roles` binary. The remote and retry keys are
/// shared with [`BridgeSettings`].
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SCIM_BRIDGE")]
pub struct RoleSyncSettings {
    pub graphql_url: Option<String>,
    pub graphql_token: Option<String>,
    pub retry_interval_ms: Option<u64>,
    pub max_retry_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    /// Role granted organization management permissions.
    pub organization_role: Option<String>,
    /// Group the organization role is assigned to.
    pub organization_group: Option<String>,
    /// Role granted cluster (system) management permissions.
    pub cluster_role: Option<String>,
    /// Group the cluster role is assigned to.
    pub cluster_group: Option<String>,
    /// Pause between lookups of a group that is not provisioned yet.
    pub group_poll_ms: Option<u64>,
    /// How long to wait for a group before giving up.
    pub group_wait_ms: Option<u64>,
}

/// Validated `sync-roles` configuration.
#[derive(Clone)]
pub struct RoleSyncConfig {
    pub graphql_url: Url,
    pub graphql_token: String,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    /// Organization grant first, then cluster.
    pub grants: Vec<RoleGrant>,
    pub group_wait: RetryPolicy,
}

impl std::fmt::Debug for RoleSyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleSyncConfig")
            .field("graphql_url", &self.graphql_url.as_str())
            .field("graphql_token", &"<redacted>")
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .field("grants", &self.grants)
            .field("group_wait", &self.group_wait)
            .finish()
    }
}

fn name_or(value: Option<String>, default: &str) -> String {
    non_blank(value).map_or_else(|| default.to_owned(), |name| name.trim().to_owned())
}

impl TryFrom<RoleSyncSettings> for RoleSyncConfig {
    type Error = ConfigError;

    fn try_from(settings: RoleSyncSettings) -> Result<Self, Self::Error> {
        let raw_url = non_blank(settings.graphql_url);
        let token = non_blank(settings.graphql_token);
        let (Some(url), Some(graphql_token)) = (raw_url.as_deref(), token.as_ref()) else {
            return Err(missing(&[
                ("graphql_url", raw_url.is_none()),
                ("graphql_token", token.is_none()),
            ]));
        };

        let grants = vec![
            RoleGrant::organization_management(
                name_or(settings.organization_role, DEFAULT_ORGANIZATION_ROLE),
                name_or(settings.organization_group, DEFAULT_ORGANIZATION_GROUP),
            ),
            RoleGrant::cluster_management(
                name_or(settings.cluster_role, DEFAULT_CLUSTER_ROLE),
                name_or(settings.cluster_group, DEFAULT_CLUSTER_GROUP),
            ),
        ];
        let group_wait = RetryPolicy {
            interval: positive_millis(
                settings.group_poll_ms,
                "group_poll_ms",
                RoleSynchroniser::DEFAULT_GROUP_POLL,
            )?,
            max_elapsed: positive_millis(
                settings.group_wait_ms,
                "group_wait_ms",
                RoleSynchroniser::DEFAULT_GROUP_WAIT,
            )?,
        };

        Ok(Self {
            graphql_url: parse_graphql_url(url)?,
            graphql_token: graphql_token.clone(),
            retry: retry_policy(settings.retry_interval_ms, settings.max_retry_ms)?,
            request_timeout: positive_millis(
                settings.request_timeout_ms,
                "request_timeout_ms",
                DEFAULT_REQUEST_TIMEOUT,
            )?,
            grants,
            group_wait,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for bridge configuration parsing.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const KEYS: [&str; 8] = [
        "SCIM_BRIDGE_GRAPHQL_URL",
        "SCIM_BRIDGE_GRAPHQL_TOKEN",
        "SCIM_BRIDGE_SCIM_TOKEN",
        "SCIM_BRIDGE_PATH_PREFIX",
        "SCIM_BRIDGE_BIND_ADDR",
        "SCIM_BRIDGE_RETRY_INTERVAL_MS",
        "SCIM_BRIDGE_MAX_RETRY_MS",
        "SCIM_BRIDGE_REQUEST_TIMEOUT_MS",
    ];

    fn env_with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        KEYS.iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| (*value).to_owned());
                (*key, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> BridgeSettings {
        BridgeSettings::load_from_iter([OsString::from("scim-bridge")])
            .expect("config should load")
    }

    fn empty() -> BridgeSettings {
        BridgeSettings {
            graphql_url: None,
            graphql_token: None,
            scim_token: None,
            path_prefix: None,
            bind_addr: None,
            retry_interval_ms: None,
            max_retry_ms: None,
            request_timeout_ms: None,
        }
    }

    fn complete() -> BridgeSettings {
        BridgeSettings {
            graphql_url: Some("https://graph.example.test/graphql".to_owned()),
            graphql_token: Some("remote-token".to_owned()),
            scim_token: Some("provisioning-secret".to_owned()),
            ..empty()
        }
    }

    #[rstest]
    fn environment_values_are_loaded() {
        let _guard = lock_env(env_with(&[
            ("SCIM_BRIDGE_GRAPHQL_URL", "https://graph.example.test/graphql"),
            ("SCIM_BRIDGE_GRAPHQL_TOKEN", "remote-token"),
            ("SCIM_BRIDGE_SCIM_TOKEN", "provisioning-secret"),
            ("SCIM_BRIDGE_PATH_PREFIX", "api/ext/scim/v2/"),
            ("SCIM_BRIDGE_RETRY_INTERVAL_MS", "250"),
        ]));

        let config = BridgeConfig::try_from(load_from_empty_args()).expect("valid config");

        assert_eq!(config.graphql_url.as_str(), "https://graph.example.test/graphql");
        assert_eq!(config.path_prefix, "/api/ext/scim/v2");
        assert_eq!(config.retry.interval, Duration::from_millis(250));
        assert_eq!(config.retry.max_elapsed, RetryPolicy::DEFAULT_MAX_ELAPSED);
    }

    #[rstest]
    fn defaults_fill_optional_values() {
        let config = BridgeConfig::try_from(complete()).expect("valid config");

        assert_eq!(config.path_prefix, "");
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().expect("addr"));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[rstest]
    fn every_missing_required_value_is_reported() {
        let settings = BridgeSettings {
            graphql_token: Some("   ".to_owned()),
            ..empty()
        };

        let err = BridgeConfig::try_from(settings).expect_err("incomplete config");

        assert_eq!(
            err,
            ConfigError::Missing(vec!["graphql_url", "graphql_token", "scim_token"])
        );
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://graph.example.test/graphql")]
    fn rejects_non_http_urls(#[case] raw: &str) {
        let settings = BridgeSettings {
            graphql_url: Some(raw.to_owned()),
            ..complete()
        };

        assert!(matches!(
            BridgeConfig::try_from(settings),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[rstest]
    fn rejects_zero_retry_interval() {
        let settings = BridgeSettings {
            retry_interval_ms: Some(0),
            ..complete()
        };

        assert!(matches!(
            BridgeConfig::try_from(settings),
            Err(ConfigError::Zero("retry_interval_ms"))
        ));
    }

    #[rstest]
    fn debug_output_redacts_secrets() {
        let config = BridgeConfig::try_from(complete()).expect("valid config");
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("remote-token"));
        assert!(!rendered.contains("provisioning-secret"));
    }

    fn role_sync_empty() -> RoleSyncSettings {
        RoleSyncSettings {
            graphql_url: None,
            graphql_token: None,
            retry_interval_ms: None,
            max_retry_ms: None,
            request_timeout_ms: None,
            organization_role: None,
            organization_group: None,
            cluster_role: None,
            cluster_group: None,
            group_poll_ms: None,
            group_wait_ms: None,
        }
    }

    fn role_sync_complete() -> RoleSyncSettings {
        RoleSyncSettings {
            graphql_url: Some("https://graph.example.test/graphql".to_owned()),
            graphql_token: Some("remote-token".to_owned()),
            ..role_sync_empty()
        }
    }

    #[rstest]
    fn role_sync_defaults_grant_organization_then_cluster() {
        let config = RoleSyncConfig::try_from(role_sync_complete()).expect("valid config");

        let names: Vec<(&str, &str)> = config
            .grants
            .iter()
            .map(|grant| (grant.role_name.as_str(), grant.group_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("scim-management-organization", "identity-management-organization"),
                ("scim-management-cluster", "identity-management-cluster"),
            ]
        );
        assert_eq!(config.group_wait.interval, Duration::from_secs(10));
        assert_eq!(config.group_wait.max_elapsed, Duration::from_secs(300));
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(!format!("{config:?}").contains("remote-token"));
    }

    #[rstest]
    fn role_sync_reports_missing_remote_settings() {
        let err = RoleSyncConfig::try_from(role_sync_empty()).expect_err("incomplete config");

        assert_eq!(
            err,
            ConfigError::Missing(vec!["graphql_url", "graphql_token"])
        );
    }

    #[rstest]
    fn role_sync_rejects_zero_group_poll() {
        let settings = RoleSyncSettings {
            group_poll_ms: Some(0),
            ..role_sync_complete()
        };

        assert!(matches!(
            RoleSyncConfig::try_from(settings),
            Err(ConfigError::Zero("group_poll_ms"))
        ));
    }

    #[rstest]
    fn role_sync_names_come_from_the_environment() {
        let _guard = lock_env([
            ("SCIM_BRIDGE_GRAPHQL_URL", Some("https://graph.example.test/graphql")),
            ("SCIM_BRIDGE_GRAPHQL_TOKEN", Some("remote-token")),
            ("SCIM_BRIDGE_CLUSTER_ROLE", Some("ops-cluster")),
            ("SCIM_BRIDGE_CLUSTER_GROUP", Some("ops")),
            ("SCIM_BRIDGE_ORGANIZATION_ROLE", None),
            ("SCIM_BRIDGE_ORGANIZATION_GROUP", None),
            ("SCIM_BRIDGE_GROUP_POLL_MS", None),
            ("SCIM_BRIDGE_GROUP_WAIT_MS", None),
            ("SCIM_BRIDGE_RETRY_INTERVAL_MS", None),
            ("SCIM_BRIDGE_MAX_RETRY_MS", None),
            ("SCIM_BRIDGE_REQUEST_TIMEOUT_MS", None),
        ]);

        let settings = RoleSyncSettings::load_from_iter([OsString::from("sync-roles")])
            .expect("config should load");
        let config = RoleSyncConfig::try_from(settings).expect("valid config");

        let cluster = config.grants.last().expect("cluster grant");
        assert_eq!(cluster.role_name, "ops-cluster");
        assert_eq!(cluster.group_name, "ops");
    }

    #[rstest]
    #[case("", "")]
    #[case("/", "")]
    #[case("scim", "/scim")]
    #[case("/scim/v2/", "/scim/v2")]
    fn prefixes_are_normalised(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalise_path_prefix(raw), expected);
    }
}
