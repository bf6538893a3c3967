//! Per-property validation, run before anything is dispatched.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::types::DeliveryType;

/// Matches `^\+[0-9]*$`: a leading plus followed only by ASCII digits.
pub fn is_valid_number(number: &str) -> bool {
    number
        .strip_prefix('+')
        .is_some_and(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
}

/// True when the value still carries an unresolved `${...}` placeholder.
pub fn contains_expression_language(input: &str) -> bool {
    input
        .find("${")
        .is_some_and(|start| input[start + 2..].contains('}'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Property {
    AccountId,
    AuthToken,
    From,
    To,
    DeliveryType,
}

impl Property {
    pub const ALL: [Property; 5] = [
        Self::AccountId,
        Self::AuthToken,
        Self::From,
        Self::To,
        Self::DeliveryType,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AccountId => "Account Id",
            Self::AuthToken => "Auth token",
            Self::From => "From",
            Self::To => "To",
            Self::DeliveryType => "DeliveryType",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub subject: String,
    pub input: String,
    pub valid: bool,
    pub explanation: String,
}

impl ValidationResult {
    fn new(subject: &str, input: &str, valid: bool, explanation: impl Into<String>) -> Self {
        Self {
            subject: subject.to_string(),
            input: input.to_string(),
            valid,
            explanation: explanation.into(),
        }
    }

    fn placeholder(subject: &str, input: &str) -> Self {
        Self::new(subject, input, true, "contains expression language")
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.valid {
            Ok(())
        } else {
            Err(self.explanation)
        }
    }
}

pub fn validate_phone_number(subject: &str, input: &str) -> ValidationResult {
    if contains_expression_language(input) {
        return ValidationResult::placeholder(subject, input);
    }
    ValidationResult::new(
        subject,
        input,
        is_valid_number(input),
        format!("{} should be in E.164 format, e.g. +41444...", subject),
    )
}

/// Like [`validate_phone_number`], applied to every entry of a comma-joined list.
pub fn validate_recipients(subject: &str, input: &str) -> ValidationResult {
    if contains_expression_language(input) {
        return ValidationResult::placeholder(subject, input);
    }
    let bad: Vec<&str> = input.split(',').filter(|n| !is_valid_number(n)).collect();
    let explanation = if bad.is_empty() {
        format!("{} should be a comma-separated list of E.164 numbers", subject)
    } else {
        format!(
            "{} should be a comma-separated list of E.164 numbers, e.g. +41444...; invalid: {}",
            subject,
            bad.join(",")
        )
    };
    ValidationResult::new(subject, input, bad.is_empty(), explanation)
}

pub fn validate_delivery_type(subject: &str, input: &str) -> ValidationResult {
    if contains_expression_language(input) {
        return ValidationResult::placeholder(subject, input);
    }
    ValidationResult::new(
        subject,
        input,
        input.parse::<DeliveryType>().is_ok(),
        format!(
            "{} can have only following values: [{}]",
            subject,
            DeliveryType::ALLOWED.join(", ")
        ),
    )
}

pub fn validate_non_empty(subject: &str, input: &str) -> ValidationResult {
    ValidationResult::new(
        subject,
        input,
        !input.is_empty(),
        format!("{} cannot be empty", subject),
    )
}

pub fn validate(property: Property, input: &str) -> ValidationResult {
    let subject = property.name();
    match property {
        Property::AccountId | Property::AuthToken => validate_non_empty(subject, input),
        Property::From => validate_phone_number(subject, input),
        Property::To => validate_recipients(subject, input),
        Property::DeliveryType => validate_delivery_type(subject, input),
    }
}

/// Validates a full property set. Unknown names and missing properties are
/// reported as invalid, since every property is required.
pub fn validate_all(properties: &BTreeMap<String, String>) -> Vec<ValidationResult> {
    let mut results: Vec<ValidationResult> = Property::ALL
        .into_iter()
        .map(|property| match properties.get(property.name()) {
            Some(value) => validate(property, value),
            None => ValidationResult::new(
                property.name(),
                "",
                false,
                format!("{} is required", property.name()),
            ),
        })
        .collect();

    results.extend(
        properties
            .iter()
            .filter(|(name, _)| Property::from_name(name).is_none())
            .map(|(name, value)| {
                let explanation = format!("{} is not a supported property", name);
                ValidationResult::new(name, value, false, explanation)
            }),
    );
    results
}
