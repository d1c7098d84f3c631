// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] built from them once at startup. Nothing reads the
//! environment after that; the config is passed to whoever needs it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_DOMAIN` | Auth0 tenant domain (issuer and JWKS host) | `dev-cf7iigxftqtlmxpj.us.auth0.com` |
//! | `API_AUDIENCE` | Expected JWT audience claim | `https://casting-api` |
//! | `AUTH_ALGORITHMS` | Comma-separated accepted signature algorithms | `RS256` |
//! | `AUTH_LEEWAY_SECS` | Clock skew tolerated on `exp`/`nbf` | `0` |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache lifetime, `0` fetches per request | `300` |
//! | `JWKS_TIMEOUT_SECS` | Timeout of the JWKS request | `10` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const API_AUDIENCE_ENV: &str = "API_AUDIENCE";
pub const AUTH_ALGORITHMS_ENV: &str = "AUTH_ALGORITHMS";
pub const AUTH_LEEWAY_ENV: &str = "AUTH_LEEWAY_SECS";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_TIMEOUT_ENV: &str = "JWKS_TIMEOUT_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_AUTH0_DOMAIN: &str = "dev-cf7iigxftqtlmxpj.us.auth0.com";
pub const DEFAULT_API_AUDIENCE: &str = "https://casting-api";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Startup configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid domain: {value:?}")]
    InvalidDomain { var: &'static str, value: String },

    #[error("{var} has an unsupported algorithm {value:?} (expected RS256, RS384, RS512, PS256, PS384 or PS512)")]
    InvalidAlgorithm { var: &'static str, value: String },

    #[error("{var} must list at least one algorithm")]
    NoAlgorithms { var: &'static str },

    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be `json` or `pretty`, got {value:?}")]
    InvalidLogFormat { var: &'static str, value: String },

    #[error("HOST:PORT is not a socket address: {value:?}")]
    InvalidBindAddress { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Identity provider and token verification settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub domain: String,
    pub audience: String,
    /// `https://{domain}/`
    pub issuer: String,
    /// `https://{domain}/.well-known/jwks.json`
    pub jwks_url: Url,
    pub algorithms: Vec<Algorithm>,
    pub leeway_secs: u64,
    pub jwks_cache_ttl: Duration,
    pub jwks_timeout: Duration,
}

impl AuthSettings {
    /// Settings for `domain` and `audience` with every other value at its
    /// default.
    pub fn new(domain: &str, audience: impl Into<String>) -> Result<Self, ConfigError> {
        let (issuer, jwks_url) = provider_urls(domain)?;
        Ok(Self {
            domain: domain.to_string(),
            audience: audience.into(),
            issuer,
            jwks_url,
            algorithms: vec![Algorithm::RS256],
            leeway_secs: 0,
            jwks_cache_ttl: crate::auth::jwks::DEFAULT_CACHE_TTL,
            jwks_timeout: crate::auth::jwks::DEFAULT_FETCH_TIMEOUT,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub auth: AuthSettings,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`; unset or empty variables take
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let domain = get(AUTH0_DOMAIN_ENV).unwrap_or_else(|| DEFAULT_AUTH0_DOMAIN.to_string());
        let audience = get(API_AUDIENCE_ENV).unwrap_or_else(|| DEFAULT_API_AUDIENCE.to_string());
        let mut auth = AuthSettings::new(domain.trim(), audience)?;

        if let Some(value) = get(AUTH_ALGORITHMS_ENV) {
            auth.algorithms = parse_algorithms(&value)?;
        }
        if let Some(value) = get(AUTH_LEEWAY_ENV) {
            auth.leeway_secs = parse_u64(AUTH_LEEWAY_ENV, &value)?;
        }
        if let Some(value) = get(JWKS_CACHE_TTL_ENV) {
            auth.jwks_cache_ttl = Duration::from_secs(parse_u64(JWKS_CACHE_TTL_ENV, &value)?);
        }
        if let Some(value) = get(JWKS_TIMEOUT_ENV) {
            auth.jwks_timeout = Duration::from_secs(parse_u64(JWKS_TIMEOUT_ENV, &value)?);
        }

        let log_format = match get(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            None => LogFormat::default(),
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            Some(v) => {
                return Err(ConfigError::InvalidLogFormat {
                    var: LOG_FORMAT_ENV,
                    value: v.to_string(),
                })
            }
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(value) => u16::from_str(value.trim()).map_err(|_| ConfigError::InvalidNumber {
                var: PORT_ENV,
                value,
            })?,
            None => DEFAULT_PORT,
        };
        let bind = format!("{host}:{port}");
        let bind_addr = bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress { value: bind })?;

        Ok(Self {
            bind_addr,
            log_format,
            auth,
        })
    }
}

fn provider_urls(domain: &str) -> Result<(String, Url), ConfigError> {
    let invalid = || ConfigError::InvalidDomain {
        var: AUTH0_DOMAIN_ENV,
        value: domain.to_string(),
    };
    if domain.is_empty() || domain.contains(['/', '?', '#', '@']) || domain.contains(char::is_whitespace) {
        return Err(invalid());
    }

    let issuer = format!("https://{domain}/");
    let base = Url::parse(&issuer).map_err(|_| invalid())?;
    let jwks_url = base.join(".well-known/jwks.json").map_err(|_| invalid())?;
    Ok((issuer, jwks_url))
}

fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let algorithms = value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| match Algorithm::from_str(name) {
            Ok(
                alg @ (Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512),
            ) => Ok(alg),
            _ => Err(ConfigError::InvalidAlgorithm {
                var: AUTH_ALGORITHMS_ENV,
                value: name.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if algorithms.is_empty() {
        return Err(ConfigError::NoAlgorithms {
            var: AUTH_ALGORITHMS_ENV,
        });
    }
    Ok(algorithms)
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}
