//! Field-keyed validation errors and string coercion helpers.
//!
//! Request payloads arrive as flat strings (query parameters, multipart form
//! fields). Coercion failures and `validator` rule violations are collected
//! into one [`FieldErrors`] map so a request reports every failing field at
//! once.

use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use validator::ValidationErrors;

use crate::types::UnknownVariant;

/// Map from field path (`title`, `contact_info.email`) to its messages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Merge `validator` output, prefixing every field with `prefix.` when given
    pub fn merge_validator(&mut self, errors: &ValidationErrors, prefix: Option<&str>) {
        for (field, errs) in errors.field_errors() {
            let path = match prefix {
                Some(p) => format!("{}.{}", p, field),
                None => field.to_string(),
            };
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", err.code));
                self.add(path.clone(), message);
            }
        }
    }

    /// Ok(value) when no errors were collected
    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Coerce an optional string into a number, recording a message on failure
pub fn coerce_f64(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            errors.add(field, format!("Expected number, received '{}'", raw));
            None
        }
    }
}

pub fn coerce_i32(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<i32> {
    let raw = raw?.trim();
    match raw.parse::<i32>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, format!("Expected integer, received '{}'", raw));
            None
        }
    }
}

/// Coerce a positive integer id (region_id, neighborhood_id)
pub fn coerce_id(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<i32> {
    let value = coerce_i32(errors, field, raw)?;
    if value <= 0 {
        errors.add(field, "Number must be greater than 0");
        return None;
    }
    Some(value)
}

pub fn coerce_bool(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<bool> {
    match raw?.trim() {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" => Some(false),
        other => {
            errors.add(field, format!("Expected boolean, received '{}'", other));
            None
        }
    }
}

/// Parse a text enum literal; unknown literals become a field error
pub fn coerce_enum<E>(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<E>
where
    E: FromStr<Err = UnknownVariant>,
{
    match raw?.parse::<E>() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

/// Record "Required" for a missing value unless coercion already failed on it
pub fn required<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() && !errors.contains(field) {
        errors.add(field, "Required");
    }
    value
}
