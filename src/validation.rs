//! Declarative request validation.
//!
//! A [`Schema`] lists field rules; [`Schema::validate`] checks a JSON body
//! against them and hands back the trimmed values, or the message of the first
//! rule that failed. Handlers turn the result into typed inputs.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

pub struct PatternRule {
    regex: Regex,
    message: String,
}

pub struct FieldRule {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub max_length: Option<usize>,
    pub pattern: Option<PatternRule>,
}

impl FieldRule {
    pub fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            required: false,
            max_length: None,
            pattern: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, regex: Regex, message: impl Into<String>) -> Self {
        self.pattern = Some(PatternRule {
            regex,
            message: message.into(),
        });
        self
    }

    fn check(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return self.required.then(|| format!("{}は必須です", self.label));
        }

        if let Some(max) = self.max_length {
            if value.chars().count() > max {
                return Some(format!("{}は{}文字以内で入力してください", self.label, max));
            }
        }

        match &self.pattern {
            Some(rule) if !rule.regex.is_match(value) => Some(rule.message.clone()),
            _ => None,
        }
    }
}

pub struct Schema {
    fields: Vec<FieldRule>,
}

/// Trimmed field values that passed validation.
#[derive(Debug, Default)]
pub struct ValidatedFields {
    values: HashMap<&'static str, String>,
}

impl ValidatedFields {
    /// Takes the value out; fields that were absent come back empty.
    pub fn take(&mut self, name: &str) -> String {
        self.values.remove(name).unwrap_or_default()
    }

    /// Like [`take`](Self::take) but maps an empty value to `None`.
    pub fn take_optional(&mut self, name: &str) -> Option<String> {
        Some(self.take(name)).filter(|value| !value.is_empty())
    }
}

impl Schema {
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    /// Fields that are missing or not strings count as empty.
    pub fn validate(&self, body: &Value) -> Result<ValidatedFields, String> {
        let mut validated = ValidatedFields::default();
        for rule in &self.fields {
            let value = body
                .get(rule.name)
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim();

            if let Some(message) = rule.check(value) {
                return Err(message);
            }
            validated.values.insert(rule.name, value.to_string());
        }
        Ok(validated)
    }
}

/// Parse a request body leniently: anything that is not valid JSON is
/// treated as an empty object so that validation reports the missing fields.
pub fn parse_json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}
