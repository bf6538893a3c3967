use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use secrecy::Secret;
use serde::{Deserialize, Serialize};

use crate::validator::ValidationResult;

/// Channel selector. Changes how sender and recipient addresses are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryType {
    Sms,
    Whatsapp,
}

impl DeliveryType {
    pub const ALLOWED: [&'static str; 2] = ["sms", "whatsapp"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Whatsapp => "whatsapp",
        }
    }

    pub fn address(self, number: &str) -> String {
        match self {
            Self::Sms => number.to_string(),
            Self::Whatsapp => format!("whatsapp:{}", number),
        }
    }
}

impl FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sms" => Ok(Self::Sms),
            "whatsapp" => Ok(Self::Whatsapp),
            other => Err(format!(
                "{} is not an allowed value for delivery type",
                other
            )),
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved settings for one dispatch.
pub struct DispatchConfig {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    pub from: String,
    /// Comma-joined recipient numbers.
    pub to: String,
    pub delivery_type: String,
}

impl fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("delivery_type", &self.delivery_type)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Success,
    Failure,
}

impl Relationship {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    UnsupportedDeliveryType(String),
    InvalidSender(String),
    EmptyBody,
    NoValidRecipients(Vec<String>),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDeliveryType(kind) => {
                write!(f, "{} is not an allowed value for delivery type", kind)
            }
            Self::InvalidSender(explanation) => f.write_str(explanation),
            Self::EmptyBody => f.write_str("message body cannot be empty"),
            Self::NoValidRecipients(_) => f.write_str("all numbers are not valid"),
        }
    }
}

/// Result of a single dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every recipient was valid and accepted by the API.
    Sent { sent: usize },
    /// Some recipients were skipped as malformed, the rest were sent.
    PartiallySent { sent: usize, skipped: Vec<String> },
    /// Nothing was sent because the input could not produce a message.
    Invalid(InvalidReason),
    /// The API failed mid-run; `sent` messages went out before the abort.
    Failed { sent: usize, error: String },
}

impl Outcome {
    pub fn relationship(&self) -> Relationship {
        match self {
            Self::Sent { .. } | Self::PartiallySent { .. } => Relationship::Success,
            Self::Invalid(_) | Self::Failed { .. } => Relationship::Failure,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "sent",
            Self::PartiallySent { .. } => "partially_sent",
            Self::Invalid(_) => "invalid",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn sent(&self) -> usize {
        match self {
            Self::Sent { sent } | Self::PartiallySent { sent, .. } | Self::Failed { sent, .. } => {
                *sent
            }
            Self::Invalid(_) => 0,
        }
    }

    pub fn skipped(&self) -> &[String] {
        match self {
            Self::PartiallySent { skipped, .. }
            | Self::Invalid(InvalidReason::NoValidRecipients(skipped)) => skipped.as_slice(),
            _ => &[],
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Sent { .. } => None,
            Self::PartiallySent { skipped, .. } => {
                Some(format!("some numbers were not valid: {}", skipped.join(",")))
            }
            Self::Invalid(reason) => Some(reason.to_string()),
            Self::Failed { error, .. } => Some(error.clone()),
        }
    }
}

#[derive(Deserialize)]
pub struct SendRequest {
    pub body: String,
    pub to: String,
    pub from: Option<String>,
    pub delivery_type: Option<String>,
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub dispatch_id: String,
    pub relationship: Relationship,
    pub outcome: &'static str,
    pub sent: usize,
    pub skipped: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SendResponse {
    pub fn new(dispatch_id: String, outcome: &Outcome) -> Self {
        Self {
            dispatch_id,
            relationship: outcome.relationship(),
            outcome: outcome.kind(),
            sent: outcome.sent(),
            skipped: outcome.skipped().to_vec(),
            detail: outcome.detail(),
        }
    }
}

/// Property display name to raw value.
pub type ValidateRequest = BTreeMap<String, String>;

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub results: Vec<ValidationResult>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_type_parse_is_case_sensitive() {
        assert_eq!("sms".parse::<DeliveryType>(), Ok(DeliveryType::Sms));
        assert_eq!("whatsapp".parse::<DeliveryType>(), Ok(DeliveryType::Whatsapp));
        assert!("SMS".parse::<DeliveryType>().is_err());
        assert!("blah".parse::<DeliveryType>().is_err());
    }

    #[test]
    fn whatsapp_addresses_are_prefixed() {
        assert_eq!(DeliveryType::Whatsapp.address("+41"), "whatsapp:+41");
        assert_eq!(DeliveryType::Sms.address("+41"), "+41");
    }

    #[test]
    fn outcomes_collapse_to_two_relationships() {
        assert_eq!(Outcome::Sent { sent: 1 }.relationship(), Relationship::Success);
        assert_eq!(
            Outcome::PartiallySent {
                sent: 1,
                skipped: vec!["bad".into()]
            }
            .relationship(),
            Relationship::Success
        );
        assert_eq!(
            Outcome::Invalid(InvalidReason::EmptyBody).relationship(),
            Relationship::Failure
        );
        assert_eq!(
            Outcome::Failed {
                sent: 0,
                error: "boom".into()
            }
            .relationship(),
            Relationship::Failure
        );
    }

    #[test]
    fn send_response_lists_skipped_numbers() {
        let outcome = Outcome::PartiallySent {
            sent: 2,
            skipped: vec!["bad".into()],
        };
        let resp = SendResponse::new("id".into(), &outcome);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["relationship"], "success");
        assert_eq!(json["outcome"], "partially_sent");
        assert_eq!(json["sent"], 2);
        assert_eq!(json["skipped"][0], "bad");
        assert!(json["detail"].as_str().unwrap().contains("bad"));
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = DispatchConfig {
            account_sid: "AC1".into(),
            auth_token: Secret::new("hunter2".into()),
            from: "+1".into(),
            to: "+2".into(),
            delivery_type: "sms".into(),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
