use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Translates a JSON where clause into a parameterised SQL predicate.
///
/// Supported shapes:
/// - `{ "field": value }` implicit equality (`null` becomes `IS NULL`)
/// - `{ "field": { "$gte": 1, "$lte": 5 } }` one condition per operator
/// - `{ "field": { "$between": [1, 5] } }` inclusive range
///
/// Conditions are joined with AND.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Returns the predicate (`1=1` when empty) and its parameters, numbered
    /// from `starting_param_index + 1`
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build(where_data)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut sql_conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                return Err(FilterError::UnsupportedOperator(key.clone()));
            }
            for condition in Self::parse_field_condition(key, value)? {
                sql_conditions.push(self.build_sql_condition(&condition)?);
            }
        }

        if sql_conditions.is_empty() {
            Ok("1=1".to_string())
        } else {
            Ok(sql_conditions.join(" AND "))
        }
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        validate_column(field)?;
        match value {
            Value::Object(obj) => obj
                .iter()
                .map(|(op_key, op_val)| {
                    Ok(FilterWhereInfo {
                        column: field.to_string(),
                        operator: Self::map_operator(op_key)?,
                        data: op_val.clone(),
                    })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            }]),
        }
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$gte" => FilterOp::Gte,
            "$lte" => FilterOp::Lte,
            "$between" => FilterOp::Between,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let data = &condition.data;
        match condition.operator {
            FilterOp::Eq => {
                if data.is_null() { Ok(format!("{} IS NULL", quoted_column)) }
                else { Ok(format!("{} = {}", quoted_column, self.param(data.clone()))) }
            }
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(data.clone()))),
            FilterOp::Between => {
                match data.as_array().map(|a| a.as_slice()) {
                    Some([low, high]) => {
                        let low = self.param(low.clone());
                        let high = self.param(high.clone());
                        Ok(format!("{} BETWEEN {} AND {}", quoted_column, low, high))
                    }
                    _ => Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())),
                }
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

pub(crate) fn validate_column(name: &str) -> Result<(), FilterError> {
    let mut chars = name.chars();
    let valid_start = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_where_matches_everything() {
        let (sql, params) = FilterWhere::generate(&Value::Null, 0).unwrap();
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn implicit_equality_and_ranges() {
        let where_data = json!({
            "category": "SALE",
            "price": { "$between": [1000, 5000] },
            "area_sqm": { "$gte": 40 }
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert!(sql.contains("\"category\" = $"));
        assert!(sql.contains("\"price\" BETWEEN $"));
        assert!(sql.contains("\"area_sqm\" >= $"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn parameters_number_from_starting_index() {
        let where_data = json!({ "price": { "$gte": 10, "$lte": 20 }, "is_read": false });
        let (sql, params) = FilterWhere::generate(&where_data, 2).unwrap();
        assert_eq!(params.len(), 3);
        for n in 3..=5 {
            assert!(sql.contains(&format!("${}", n)), "missing ${} in {}", n, sql);
        }
        assert!(!sql.contains("$1"));
    }

    #[test]
    fn null_equality_is_is_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "region_id": null }), 0).unwrap();
        assert_eq!(sql, "\"region_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_bad_columns_and_operators() {
        assert!(FilterWhere::generate(&json!({ "price; DROP": 1 }), 0).is_err());
        assert!(FilterWhere::generate(&json!({ "price": { "$regex": ".*" } }), 0).is_err());
        assert!(FilterWhere::generate(&json!({ "price": { "$between": [1] } }), 0).is_err());
        assert!(matches!(
            FilterWhere::generate(&json!({ "$or": [{ "featured": true }] }), 0),
            Err(FilterError::UnsupportedOperator(op)) if op == "$or"
        ));
    }
}
