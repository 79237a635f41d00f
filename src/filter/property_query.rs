use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::pagination::Pagination;
use super::types::FilterData;
use crate::types::{Category, ConstructionType, Furnishing, LocationType, PropertyType};
use crate::validation::{coerce_enum, FieldErrors};

/// Raw query string of `GET /properties`; every value arrives as text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_area: Option<String>,
    pub max_area: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub category: Option<String>,
    pub location_type: Option<String>,
    pub construction_type: Option<String>,
    pub furnishing: Option<String>,
    pub featured: Option<String>,
}

/// Inclusive numeric bounds; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Range {
    fn to_condition(self) -> Option<Value> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some(json!({ "$between": [min, max] })),
            (Some(min), None) => Some(json!({ "$gte": min })),
            (None, Some(max)) => Some(json!({ "$lte": max })),
            (None, None) => None,
        }
    }
}

/// Typed, validated form of [`PropertyListQuery`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    pub pagination: Pagination,
    pub property_type: Option<PropertyType>,
    pub category: Option<Category>,
    pub location_type: Option<LocationType>,
    pub construction_type: Option<ConstructionType>,
    pub furnishing: Option<Furnishing>,
    /// Only `featured=true` restricts; `false` and absence are the same
    pub featured_only: bool,
    pub price: Range,
    pub area: Range,
}

impl PropertyListQuery {
    pub fn into_filter(self) -> Result<PropertyFilter, FieldErrors> {
        let mut errors = FieldErrors::new();

        let pagination = Pagination::from_params(self.page.as_deref(), self.limit.as_deref());
        let property_type = coerce_enum(&mut errors, "type", non_empty(&self.property_type));
        let category = coerce_enum(&mut errors, "category", non_empty(&self.category));
        let location_type = coerce_enum(&mut errors, "location_type", non_empty(&self.location_type));
        let construction_type = coerce_enum(&mut errors, "construction_type", non_empty(&self.construction_type));
        let furnishing = coerce_enum(&mut errors, "furnishing", non_empty(&self.furnishing));
        let featured_only = self.featured.as_deref() == Some("true");

        let price = Range {
            min: parse_bound(&mut errors, "min_price", non_empty(&self.min_price)),
            max: parse_bound(&mut errors, "max_price", non_empty(&self.max_price)),
        };
        let area = Range {
            min: parse_bound(&mut errors, "min_area", non_empty(&self.min_area)),
            max: parse_bound(&mut errors, "max_area", non_empty(&self.max_area)),
        };

        errors.finish(PropertyFilter {
            pagination,
            property_type,
            category,
            location_type,
            construction_type,
            furnishing,
            featured_only,
            price,
            area,
        })
    }
}

impl PropertyFilter {
    /// JSON where clause understood by [`crate::filter::Filter`]
    pub fn where_clause(&self) -> Value {
        let mut conditions = Map::new();

        let enums: [(&str, Option<&'static str>); 5] = [
            ("type", self.property_type.map(|v| v.as_str())),
            ("category", self.category.map(|v| v.as_str())),
            ("location_type", self.location_type.map(|v| v.as_str())),
            ("construction_type", self.construction_type.map(|v| v.as_str())),
            ("furnishing", self.furnishing.map(|v| v.as_str())),
        ];
        for (column, value) in enums {
            if let Some(v) = value {
                conditions.insert(column.to_string(), json!(v));
            }
        }

        if self.featured_only {
            conditions.insert("featured".to_string(), json!(true));
        }
        if let Some(condition) = self.price.to_condition() {
            conditions.insert("price".to_string(), condition);
        }
        if let Some(condition) = self.area.to_condition() {
            conditions.insert("area_sqm".to_string(), condition);
        }

        Value::Object(conditions)
    }

    /// Full query description: predicate, newest first, page window
    pub fn to_filter_data(&self) -> FilterData {
        FilterData {
            select: None,
            where_clause: Some(self.where_clause()),
            order: Some(json!("created_at desc")),
            limit: Some(self.pagination.limit),
            offset: Some(self.pagination.skip()),
        }
    }
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Integer bound; a decimal input keeps its integer part
fn parse_bound(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    match raw.parse::<f64>() {
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
        Ok(v) if v.is_finite() && v.trunc() >= i64::MIN as f64 && v.trunc() < i64::MAX as f64 => {
            Some(v.trunc() as i64)
        }
        Ok(v) if v.is_finite() => {
            errors.add(field, format!("Value out of range: '{}'", raw));
            None
        }
        _ => {
            errors.add(field, format!("Expected integer, received '{}'", raw));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    fn query(pairs: &[(&str, &str)]) -> PropertyListQuery {
        let value = Value::Object(
            pairs.iter().map(|(k, v)| (k.to_string(), json!(v))).collect(),
        );
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn both_bounds_become_one_inclusive_range() {
        let filter = query(&[("min_price", "50000"), ("max_price", "100000")]).into_filter().unwrap();
        assert_eq!(filter.where_clause()["price"], json!({ "$between": [50000, 100000] }));
    }

    #[test]
    fn single_bound_is_one_sided() {
        let filter = query(&[("max_price", "100000"), ("min_area", "60")]).into_filter().unwrap();
        let where_clause = filter.where_clause();
        assert_eq!(where_clause["price"], json!({ "$lte": 100000 }));
        assert_eq!(where_clause["area_sqm"], json!({ "$gte": 60 }));
    }

    #[test]
    fn featured_false_and_absent_are_identical() {
        let absent = query(&[]).into_filter().unwrap();
        let explicit_false = query(&[("featured", "false")]).into_filter().unwrap();
        let only = query(&[("featured", "true")]).into_filter().unwrap();

        assert_eq!(absent.where_clause(), explicit_false.where_clause());
        assert!(absent.where_clause().get("featured").is_none());
        assert_eq!(only.where_clause()["featured"], json!(true));
    }

    #[test]
    fn enum_filters_are_equality_constraints() {
        let filter = query(&[("type", "APARTMENT"), ("category", "RENT"), ("furnishing", "FULLY_FURNISHED")])
            .into_filter()
            .unwrap();
        let where_clause = filter.where_clause();
        assert_eq!(where_clause["type"], "APARTMENT");
        assert_eq!(where_clause["category"], "RENT");
        assert_eq!(where_clause["furnishing"], "FULLY_FURNISHED");
    }

    #[test]
    fn malformed_enum_fails_whole_request() {
        let errors = query(&[("type", "CASTLE"), ("location_type", "MOON"), ("min_price", "1")])
            .into_filter()
            .unwrap_err();
        assert!(errors.contains("type"));
        assert!(errors.contains("location_type"));
        assert!(!errors.contains("min_price"));
    }

    #[test]
    fn window_follows_page_and_limit() {
        let filter = query(&[("page", "3"), ("limit", "5")]).into_filter().unwrap();
        let data = filter.to_filter_data();
        assert_eq!(data.limit, Some(5));
        assert_eq!(data.offset, Some(10));

        let fallback = query(&[("page", "x"), ("limit", "-1")]).into_filter().unwrap();
        assert_eq!(fallback.pagination, Pagination::default());
    }

    #[test]
    fn decimal_bounds_truncate() {
        let filter = query(&[("min_area", "75.9")]).into_filter().unwrap();
        assert_eq!(filter.area.min, Some(75));
        assert!(query(&[("max_area", "lots")]).into_filter().is_err());
    }

    #[test]
    fn out_of_range_bounds_are_field_errors() {
        let errors = query(&[("max_price", "1e30"), ("min_area", "-1e19"), ("min_price", "5")])
            .into_filter()
            .unwrap_err();
        assert!(errors.contains("max_price"));
        assert!(errors.contains("min_area"));
        assert!(!errors.contains("min_price"));

        let filter = query(&[("max_price", "9.2e18")]).into_filter().unwrap();
        assert_eq!(filter.price.max, Some(9_200_000_000_000_000_000));
    }

    #[test]
    fn generates_newest_first_sql() {
        let filter = query(&[("category", "SALE"), ("min_price", "1000"), ("max_price", "2000")])
            .into_filter()
            .unwrap();
        let mut sql_filter = Filter::new("properties").unwrap();
        sql_filter.assign(filter.to_filter_data()).unwrap();
        let sql = sql_filter.to_sql().unwrap();

        assert!(sql.query.ends_with("ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 0"));
        assert!(sql.query.contains("\"category\" = $1"));
        assert!(sql.query.contains("\"price\" BETWEEN $2 AND $3"));
        assert_eq!(sql.params, vec![json!("SALE"), json!(1000), json!(2000)]);
    }
}
