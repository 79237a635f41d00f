// handlers/mod.rs - Handlers grouped by access tier
// public (no auth) → protected (bearer token) → elevated (bearer token + ADMIN role)
pub mod elevated;
pub mod protected;
pub mod public;

use std::str::FromStr;

use crate::error::ApiError;

/// Parse a path id; anything unparseable cannot name a row, so it is a 404
pub(crate) fn parse_id<T: FromStr>(raw: &str, label: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ApiError::not_found(format!("{} not found", label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn malformed_ids_are_not_found() {
        assert_eq!(parse_id::<i32>("12", "Region").unwrap(), 12);
        assert!(parse_id::<Uuid>("not-a-uuid", "Property").is_err());
        let err = parse_id::<i32>("abc", "Region").unwrap_err();
        assert_eq!(err.message(), "Region not found");
    }
}
