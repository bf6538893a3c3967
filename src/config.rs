use std::time::Duration;

use anyhow::Context;

use crate::session::DEFAULT_API_BASE;

/// Service settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub api_key: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
    pub defaults: Defaults,
}

/// Fallbacks for fields a send request leaves out.
#[derive(Clone)]
pub struct Defaults {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from: Option<String>,
    pub delivery_type: String,
}

impl std::fmt::Debug for Defaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Defaults")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .field("delivery_type", &self.delivery_type)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match var("SMS_API_PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid SMS_API_PORT: {}", p))?,
            None => 8787,
        };
        let timeout_secs: u64 = match var("TWILIO_TIMEOUT_SECS") {
            Some(t) => t
                .parse()
                .with_context(|| format!("invalid TWILIO_TIMEOUT_SECS: {}", t))?,
            None => 30,
        };

        Ok(Self {
            port,
            api_key: var("SMS_API_KEY"),
            api_base: var("TWILIO_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            defaults: Defaults {
                account_sid: var("TWILIO_ACCOUNT_SID"),
                auth_token: var("TWILIO_AUTH_TOKEN"),
                from: var("TWILIO_FROM"),
                delivery_type: var("TWILIO_DELIVERY_TYPE").unwrap_or_else(|| "sms".to_string()),
            },
        })
    }
}

impl Defaults {
    pub fn has_credentials(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some()
    }
}
