//! Reference tables a property points at without owning: regions,
//! neighborhoods and features.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};

use crate::database::manager::DatabaseError;
use crate::types::FeatureType;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Region {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Neighborhood {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Feature {
    pub id: i32,
    pub name: String,
    #[sqlx(rename = "type")]
    pub feature_type: FeatureType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Region {
    pub const TABLE: &'static str = "regions";

    pub async fn create<'e, E: PgExecutor<'e>>(executor: E, name: &str) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>("INSERT INTO regions (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn rename<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i32,
        name: Option<&str>,
    ) -> Result<Option<Self>, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "UPDATE regions SET name = COALESCE($2, name), updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn find_many<'e, E: PgExecutor<'e>>(executor: E, ids: &[i32]) -> Result<Vec<Self>, DatabaseError> {
        let rows = sqlx::query_as::<_, Self>("SELECT * FROM regions WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }
}

impl Neighborhood {
    pub const TABLE: &'static str = "neighborhoods";

    pub async fn create<'e, E: PgExecutor<'e>>(executor: E, name: &str) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>("INSERT INTO neighborhoods (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn rename<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i32,
        name: Option<&str>,
    ) -> Result<Option<Self>, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "UPDATE neighborhoods SET name = COALESCE($2, name), updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn find_many<'e, E: PgExecutor<'e>>(executor: E, ids: &[i32]) -> Result<Vec<Self>, DatabaseError> {
        let rows = sqlx::query_as::<_, Self>("SELECT * FROM neighborhoods WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }
}

impl Feature {
    pub const TABLE: &'static str = "features";

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
        feature_type: FeatureType,
    ) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>("INSERT INTO features (name, type) VALUES ($1, $2) RETURNING *")
            .bind(name)
            .bind(feature_type)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i32,
        name: Option<&str>,
        feature_type: Option<FeatureType>,
    ) -> Result<Option<Self>, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            UPDATE features SET
                name = COALESCE($2, name),
                type = COALESCE($3, type),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(feature_type)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Ids from `ids` with no matching row, in input order
    pub async fn missing<'e, E: PgExecutor<'e>>(executor: E, ids: &[i32]) -> Result<Vec<i32>, DatabaseError> {
        let found: Vec<i32> = sqlx::query_scalar("SELECT id FROM features WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    /// Features linked to any of the given properties, paired with the owning property id
    pub async fn for_properties<'e, E: PgExecutor<'e>>(
        executor: E,
        property_ids: &[uuid::Uuid],
    ) -> Result<Vec<(uuid::Uuid, Feature)>, DatabaseError> {
        let rows = sqlx::query_as::<_, LinkedFeature>(
            r#"
            SELECT pf.property_id, f.*
            FROM property_features pf
            JOIN features f ON f.id = pf.feature_id
            WHERE pf.property_id = ANY($1)
            ORDER BY f.name
            "#,
        )
        .bind(property_ids)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(|r| (r.property_id, r.feature)).collect())
    }
}

#[derive(FromRow)]
struct LinkedFeature {
    property_id: uuid::Uuid,
    #[sqlx(flatten)]
    feature: Feature,
}
