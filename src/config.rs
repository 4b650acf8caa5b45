//! Environment-driven configuration.
//!
//! Everything is resolved from the process environment (and `.env` via
//! `dotenvy` in `main`) exactly once at startup. Domain-location variables
//! such as `PARA_HOME` and `PARA_ARCHIVE` are deliberately *not* parsed here:
//! the gateway forwards its environment to the external process opaquely.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default wall-clock budget per external invocation.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default cap on concurrent external invocations.
const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the para executable (`PARA_CLI_PATH`, default `para`).
    pub para_cli_path: PathBuf,
    /// Wall-clock budget per external invocation (`PARA_TIMEOUT_SECS`).
    pub timeout: Duration,
    /// Maximum concurrent external invocations (`GATEWAY_MAX_CONCURRENCY`).
    pub max_concurrency: usize,
    /// Credential delegated to the child process environment, if configured.
    pub credential: Option<Credential>,
    /// HTTP transport settings; `None` means stdio mode.
    pub http: Option<HttpConfig>,
}

/// A credential forwarded to the external process.
///
/// `PARA_API_KEY_VAR` names the variable per deployment; its value is read
/// once and re-exported to the child under the same name. The value is held
/// as a [`SecretString`] so it never appears in `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct Credential {
    pub var: String,
    pub value: SecretString,
}

/// HTTP channel configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Config {
    /// Resolve the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let para_cli_path = optional_env("PARA_CLI_PATH")?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("para"));

        let timeout =
            Duration::from_secs(parse_optional_env("PARA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);

        let max_concurrency =
            parse_optional_env("GATEWAY_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?;

        let credential = match optional_env("PARA_API_KEY_VAR")? {
            Some(var) => {
                let value = optional_env(&var)?.ok_or_else(|| ConfigError::MissingRequired {
                    key: var.clone(),
                    hint: "PARA_API_KEY_VAR names this variable but it is not set".to_string(),
                })?;
                Some(Credential {
                    var,
                    value: SecretString::from(value),
                })
            }
            None => None,
        };

        let http = if parse_bool_env("USE_HTTP", false)? {
            // Default to loopback; opting into all interfaces is explicit.
            let host = if parse_bool_env("BIND_ALL_INTERFACES", false)? {
                "0.0.0.0".to_string()
            } else {
                "127.0.0.1".to_string()
            };
            Some(HttpConfig {
                host,
                port: parse_optional_env("PORT", 8000)?,
            })
        } else {
            None
        };

        Ok(Self {
            para_cli_path,
            timeout,
            max_concurrency,
            credential,
            http,
        })
    }
}

fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}

/// Parse a boolean from an env var with a default.
///
/// Accepts "true"/"1" as true, "false"/"0" as false.
fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(key)? {
        Some(s) => match s.to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("must be 'true' or 'false', got '{s}'"),
            }),
        },
        None => Ok(default),
    }
}
