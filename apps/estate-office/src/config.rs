//! Layered application configuration: optional YAML file, then `ESTATE_*`
//! environment variables.

use std::path::Path;

use anyhow::Context;
use backoffice::BackofficeConfig;
use estate_kit::BackendConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use role_resolver::RoleResolverConfig;
use serde::Deserialize;
use static_role_plugin::StaticRolePluginConfig;

/// Prefix of nested overrides, e.g. `ESTATE_BACKEND__REQUEST_TIMEOUT=5s`.
pub const ENV_PREFIX: &str = "ESTATE_";

/// Shorthand for `backend.base_url`.
pub const BASE_URL_ENV: &str = "ESTATE_API_BASE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub roles: RoleResolverConfig,
    pub backoffice: BackofficeConfig,
    pub static_roles: StaticRolePluginConfig,
}

impl AppConfig {
    /// # Errors
    ///
    /// Fails when `path` does not exist or a layer does not match the
    /// config structs.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            anyhow::ensure!(path.is_file(), "config file {} not found", path.display());
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&[BASE_URL_ENV])
                    .map(|_| "backend.base_url".into()),
            )
            .extract()
            .context("invalid configuration")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use estate_kit::{DEFAULT_API_BASE_URL, ResponseOrdering};

    use super::*;

    #[test]
    fn defaults_without_file_or_env() {
        temp_env::with_vars_unset([BASE_URL_ENV], || {
            let cfg = AppConfig::load(None).unwrap();
            assert_eq!(cfg.backend.base_url, DEFAULT_API_BASE_URL);
            assert_eq!(cfg.backoffice.dashboard_poll_interval, Duration::from_secs(30));
            assert!(cfg.static_roles.users.is_empty());
        });
    }

    #[test]
    fn env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
backend:
  base_url: "http://from-file/api"
roles:
  ordering: latest_completion
static_roles:
  signed_in: user_admin
  users:
    - external_user_id: user_admin
      role: admin
"#
        )
        .unwrap();

        temp_env::with_vars(
            [
                (BASE_URL_ENV, Some("http://from-env:8080/api")),
                ("ESTATE_BACKOFFICE__DASHBOARD_POLL_INTERVAL", Some("5s")),
            ],
            || {
                let cfg = AppConfig::load(Some(file.path())).unwrap();
                assert_eq!(cfg.backend.base_url, "http://from-env:8080/api");
                assert_eq!(cfg.backoffice.dashboard_poll_interval, Duration::from_secs(5));
                assert_eq!(cfg.roles.ordering, ResponseOrdering::LatestCompletion);
                assert_eq!(cfg.static_roles.signed_in.as_deref(), Some("user_admin"));
                assert_eq!(cfg.static_roles.users.len(), 1);
            },
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/here.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_is_rejected() {
        temp_env::with_var("ESTATE_BACKEND__RETRIES", Some("3"), || {
            assert!(AppConfig::load(None).is_err());
        });
    }
}
