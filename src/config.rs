// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup and passed
//! by reference into the components that need it (token issuer, content
//! store, payment ledger). Nothing reads the environment after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HS256 signing key for session tokens | Required |
//! | `TOKEN_TTL_DAYS` | Session token validity window | `7` |
//! | `IPFS_GATEWAY` | Base URL for content retrieval redirects | `https://ipfs.io/ipfs/` |
//! | `RPC_URL` | EVM JSON-RPC endpoint for payment verification | Optional |
//! | `DATA_DIR` | Directory for the embedded database | Optional (in-memory if unset) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

/// Default session token lifetime in days.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Default content gateway used when `IPFS_GATEWAY` is not set.
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Configuration error raised during startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

/// Process-wide configuration, resolved once in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// HS256 signing secret for session tokens. Never logged.
    pub jwt_secret: Vec<u8>,
    /// Session token validity window in days.
    pub token_ttl_days: i64,
    /// Base URL that content hashes resolve against.
    pub content_gateway: url::Url,
    /// JSON-RPC endpoint used to verify purchase payments. When absent,
    /// payment references are accepted without on-chain lookup.
    pub rpc_url: Option<url::Url>,
    /// Directory for the embedded registry database. When absent the
    /// registry runs in memory.
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|e| ConfigError::InvalidVar {
                var: "PORT",
                reason: format!("{e}"),
            })?,
            Err(_) => 8080,
        };

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?
            .into_bytes();
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidVar {
                var: "JWT_SECRET",
                reason: "must not be empty".to_string(),
            });
        }

        let token_ttl_days = match env::var("TOKEN_TTL_DAYS") {
            Ok(raw) => {
                let days: i64 = raw.parse().map_err(|e| ConfigError::InvalidVar {
                    var: "TOKEN_TTL_DAYS",
                    reason: format!("{e}"),
                })?;
                if days <= 0 {
                    return Err(ConfigError::InvalidVar {
                        var: "TOKEN_TTL_DAYS",
                        reason: "must be positive".to_string(),
                    });
                }
                days
            }
            Err(_) => DEFAULT_TOKEN_TTL_DAYS,
        };

        let gateway_raw = env::var("IPFS_GATEWAY").unwrap_or_else(|_| DEFAULT_GATEWAY.to_string());
        let content_gateway =
            gateway_raw
                .parse()
                .map_err(|e: url::ParseError| ConfigError::InvalidVar {
                    var: "IPFS_GATEWAY",
                    reason: format!("{e}"),
                })?;

        let rpc_url = match env::var("RPC_URL") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|e: url::ParseError| ConfigError::InvalidVar {
                        var: "RPC_URL",
                        reason: format!("{e}"),
                    })?,
            ),
            Err(_) => None,
        };

        let data_dir = env::var("DATA_DIR").ok().map(PathBuf::from);

        Ok(Self {
            host,
            port,
            jwt_secret,
            token_ttl_days,
            content_gateway,
            rpc_url,
            data_dir,
        })
    }

    /// Configuration for tests: in-memory registry, no RPC, fixed secret.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: b"test-secret".to_vec(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            content_gateway: DEFAULT_GATEWAY.parse().expect("default gateway parses"),
            rpc_url: None,
            data_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_has_defaults() {
        let config = AppConfig::for_tests();
        assert_eq!(config.token_ttl_days, DEFAULT_TOKEN_TTL_DAYS);
        assert_eq!(config.content_gateway.as_str(), DEFAULT_GATEWAY);
        assert!(config.rpc_url.is_none());
        assert!(config.data_dir.is_none());
    }
}
