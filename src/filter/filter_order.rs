use serde_json::Value;

use super::error::FilterError;
use super::filter_where::validate_column;
use super::types::{FilterOrderInfo, SortDirection};

/// Parses `"created_at desc, name"` (or an array of such strings) into
/// validated sort keys; a missing direction sorts ascending
pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::Null => Ok(vec![]),
            Value::String(spec) => Self::parse_spec(spec),
            Value::Array(specs) => {
                let mut keys = Vec::new();
                for spec in specs {
                    let spec = spec
                        .as_str()
                        .ok_or_else(|| FilterError::InvalidOrder("order entries must be strings".to_string()))?;
                    keys.extend(Self::parse_spec(spec)?);
                }
                Ok(keys)
            }
            other => Err(FilterError::InvalidOrder(format!("unsupported order value: {}", other))),
        }
    }

    fn parse_spec(spec: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        spec.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut tokens = part.split_whitespace();
                let column = tokens.next().unwrap_or_default();
                validate_column(column)?;
                let sort = match tokens.next().map(str::to_ascii_lowercase).as_deref() {
                    None | Some("asc") => SortDirection::Asc,
                    Some("desc") => SortDirection::Desc,
                    Some(dir) => return Err(FilterError::InvalidOrder(format!("unknown direction '{}'", dir))),
                };
                if tokens.next().is_some() {
                    return Err(FilterError::InvalidOrder(format!("unexpected tokens in '{}'", part)));
                }
                Ok(FilterOrderInfo { column: column.to_string(), sort })
            })
            .collect()
    }

    pub fn generate(keys: &[FilterOrderInfo]) -> String {
        if keys.is_empty() {
            return String::new();
        }
        let columns = keys
            .iter()
            .map(|k| format!("\"{}\" {}", k.column, k.sort.to_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("ORDER BY {}", columns)
    }
}
