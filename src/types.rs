//! Shared domain enumerations used across the codebase
//!
//! Every enum here is stored as a TEXT column and travels over the wire as its
//! upper-case literal, so the same literal set is used for request validation,
//! SQL parameters and response bodies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raised when a string does not match any literal of a text enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid enum value. Expected {expected}, received '{received}'")]
pub struct UnknownVariant {
    pub expected: String,
    pub received: String,
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $lit:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $lit)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $lit),+
                }
            }

            /// Literal list rendered as `'A' | 'B'` for error messages
            pub fn expected() -> String {
                Self::ALL
                    .iter()
                    .map(|v| format!("'{}'", v.as_str()))
                    .collect::<Vec<_>>()
                    .join(" | ")
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($lit => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        expected: Self::expected(),
                        received: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse::<$name>()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

text_enum!(
    Currency {
        Bgn => "BGN",
        Eur => "EUR",
        Usd => "USD",
    }
);

text_enum!(
    ConstructionType {
        Brick => "BRICK",
        Panel => "PANEL",
        Epk => "EPK",
        Concrete => "CONCRETE",
        Steel => "STEEL",
        Wood => "WOOD",
    }
);

text_enum!(
    Furnishing {
        Unfurnished => "UNFURNISHED",
        SemiFurnished => "SEMI_FURNISHED",
        FullyFurnished => "FULLY_FURNISHED",
    }
);

text_enum!(
    LocationType {
        City => "CITY",
        Suburb => "SUBURB",
        Village => "VILLAGE",
        Seaside => "SEASIDE",
        Mountain => "MOUNTAIN",
    }
);

text_enum!(
    /// Listing category: for sale or for rent
    Category {
        Sale => "SALE",
        Rent => "RENT",
    }
);

text_enum!(
    PropertyType {
        Apartment => "APARTMENT",
        House => "HOUSE",
        Plot => "PLOT",
        Commercial => "COMMERCIAL",
        Industrial => "INDUSTRIAL",
    }
);

text_enum!(
    FeatureType {
        Infrastructure => "INFRASTRUCTURE",
        Building => "BUILDING",
    }
);

text_enum!(
    Role {
        Admin => "ADMIN",
        User => "USER",
    }
);

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals_exactly() {
        assert_eq!("SEMI_FURNISHED".parse::<Furnishing>().unwrap(), Furnishing::SemiFurnished);
        assert_eq!("EPK".parse::<ConstructionType>().unwrap(), ConstructionType::Epk);
        assert!("apartment".parse::<PropertyType>().is_err());
    }

    #[test]
    fn unknown_variant_lists_expected_literals() {
        let err = "CASTLE".parse::<PropertyType>().unwrap_err();
        assert_eq!(err.received, "CASTLE");
        assert!(err.expected.contains("'APARTMENT'"));
        assert!(err.to_string().contains("received 'CASTLE'"));
    }

    #[test]
    fn serde_uses_upper_case_literals() {
        let json = serde_json::to_string(&LocationType::Seaside).unwrap();
        assert_eq!(json, "\"SEASIDE\"");
        let back: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(back, Role::Admin);
        assert_eq!(Role::default(), Role::User);
    }
}
