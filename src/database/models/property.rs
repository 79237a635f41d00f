//! The property aggregate: the `properties` row plus the contact info,
//! images and feature links it owns, and the regions/neighborhoods it
//! references.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use super::taxonomy::{Feature, Neighborhood, Region};
use crate::database::manager::DatabaseError;
use crate::types::{Category, ConstructionType, Currency, Furnishing, LocationType, PropertyType};

pub const TABLE: &str = "properties";

#[derive(Debug, Clone, FromRow)]
pub struct PropertyRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub area_sqm: f64,
    pub land_area_sqm: Option<f64>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub construction_type: Option<ConstructionType>,
    pub furnishing: Option<Furnishing>,
    pub location_type: LocationType,
    pub category: Category,
    #[sqlx(rename = "type")]
    pub property_type: PropertyType,
    pub featured: bool,
    pub has_regulation: Option<bool>,
    pub region_id: Option<i32>,
    pub neighborhood_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ContactInfo {
    pub id: Uuid,
    pub property_id: Uuid,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub property_id: Uuid,
    pub url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every scalar column of a new listing
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub area_sqm: f64,
    pub land_area_sqm: Option<f64>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub construction_type: Option<ConstructionType>,
    pub furnishing: Option<Furnishing>,
    pub location_type: LocationType,
    pub category: Category,
    pub property_type: PropertyType,
    pub featured: bool,
    pub has_regulation: Option<bool>,
    pub region_id: Option<i32>,
    pub neighborhood_id: Option<i32>,
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub area_sqm: Option<f64>,
    pub land_area_sqm: Option<f64>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub construction_type: Option<ConstructionType>,
    pub furnishing: Option<Furnishing>,
    pub location_type: Option<LocationType>,
    pub category: Option<Category>,
    pub property_type: Option<PropertyType>,
    pub featured: Option<bool>,
    pub has_regulation: Option<bool>,
    pub region_id: Option<i32>,
    pub neighborhood_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub phone: String,
    pub email: String,
}

/// A property with everything it owns or references, ready for shaping
#[derive(Debug, Clone)]
pub struct PropertyAggregate {
    pub property: PropertyRow,
    pub region: Option<Region>,
    pub neighborhood: Option<Neighborhood>,
    pub features: Vec<Feature>,
    pub images: Vec<Image>,
    pub contact_info: Option<ContactInfo>,
}

impl PropertyRow {
    pub async fn insert(conn: &mut PgConnection, draft: &PropertyDraft) -> Result<PropertyRow, DatabaseError> {
        let row = sqlx::query_as::<_, PropertyRow>(
            r#"
            INSERT INTO properties (
                title, description, price, currency, area_sqm, land_area_sqm,
                floor, total_floors, construction_type, furnishing, location_type,
                category, type, featured, has_regulation, region_id, neighborhood_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.currency)
        .bind(draft.area_sqm)
        .bind(draft.land_area_sqm)
        .bind(draft.floor)
        .bind(draft.total_floors)
        .bind(draft.construction_type)
        .bind(draft.furnishing)
        .bind(draft.location_type)
        .bind(draft.category)
        .bind(draft.property_type)
        .bind(draft.featured)
        .bind(draft.has_regulation)
        .bind(draft.region_id)
        .bind(draft.neighborhood_id)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// Write the supplied columns and bump `updated_at`; absent fields keep
    /// their stored value
    pub async fn apply_patch(
        conn: &mut PgConnection,
        id: Uuid,
        patch: &PropertyPatch,
    ) -> Result<Option<PropertyRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PropertyRow>(
            r#"
            UPDATE properties SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                currency = COALESCE($5, currency),
                area_sqm = COALESCE($6, area_sqm),
                land_area_sqm = COALESCE($7, land_area_sqm),
                floor = COALESCE($8, floor),
                total_floors = COALESCE($9, total_floors),
                construction_type = COALESCE($10, construction_type),
                furnishing = COALESCE($11, furnishing),
                location_type = COALESCE($12, location_type),
                category = COALESCE($13, category),
                type = COALESCE($14, type),
                featured = COALESCE($15, featured),
                has_regulation = COALESCE($16, has_regulation),
                region_id = COALESCE($17, region_id),
                neighborhood_id = COALESCE($18, neighborhood_id),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price)
        .bind(patch.currency)
        .bind(patch.area_sqm)
        .bind(patch.land_area_sqm)
        .bind(patch.floor)
        .bind(patch.total_floors)
        .bind(patch.construction_type)
        .bind(patch.furnishing)
        .bind(patch.location_type)
        .bind(patch.category)
        .bind(patch.property_type)
        .bind(patch.featured)
        .bind(patch.has_regulation)
        .bind(patch.region_id)
        .bind(patch.neighborhood_id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    /// Row lock held until the surrounding transaction ends
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<PropertyRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PropertyRow>("SELECT * FROM properties WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }
}

impl ContactInfo {
    /// Update the owned row in place, or create it when the property has none.
    /// An existing row keeps its id.
    pub async fn upsert(
        conn: &mut PgConnection,
        property_id: Uuid,
        draft: &ContactDraft,
    ) -> Result<ContactInfo, DatabaseError> {
        let row = sqlx::query_as::<_, ContactInfo>(
            r#"
            INSERT INTO contact_infos (property_id, phone, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (property_id) DO UPDATE
                SET phone = EXCLUDED.phone, email = EXCLUDED.email, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(property_id)
        .bind(&draft.phone)
        .bind(&draft.email)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }
}

impl Image {
    /// Delete every image row of the property, then insert one per url
    pub async fn replace_all(
        conn: &mut PgConnection,
        property_id: Uuid,
        urls: &[String],
    ) -> Result<Vec<Image>, DatabaseError> {
        sqlx::query("DELETE FROM images WHERE property_id = $1")
            .bind(property_id)
            .execute(&mut *conn)
            .await?;
        Self::insert_many(conn, property_id, urls).await
    }

    pub async fn insert_many(
        conn: &mut PgConnection,
        property_id: Uuid,
        urls: &[String],
    ) -> Result<Vec<Image>, DatabaseError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        let mut rows = sqlx::query_as::<_, Image>(
            r#"
            INSERT INTO images (property_id, url, position)
            SELECT $1, url, ord::int4 FROM UNNEST($2::text[]) WITH ORDINALITY AS t(url, ord)
            RETURNING *
            "#,
        )
        .bind(property_id)
        .bind(urls)
        .fetch_all(conn)
        .await?;
        // RETURNING order is unspecified
        rows.sort_by_key(|image| image.position);
        Ok(rows)
    }
}

/// Replace the property's feature links with exactly `feature_ids`
pub async fn replace_feature_links(
    conn: &mut PgConnection,
    property_id: Uuid,
    feature_ids: &[i32],
) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM property_features WHERE property_id = $1")
        .bind(property_id)
        .execute(&mut *conn)
        .await?;
    if feature_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO property_features (property_id, feature_id)
        SELECT $1, feature_id FROM UNNEST($2::int4[]) AS t(feature_id)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(property_id)
    .bind(feature_ids)
    .execute(conn)
    .await?;
    Ok(())
}

impl PropertyAggregate {
    /// Attach relations to a batch of rows with one query per relation.
    /// Output order follows `rows`.
    pub async fn load_many(pool: &PgPool, rows: Vec<PropertyRow>) -> Result<Vec<PropertyAggregate>, DatabaseError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let region_ids: Vec<i32> = rows.iter().filter_map(|r| r.region_id).collect();
        let neighborhood_ids: Vec<i32> = rows.iter().filter_map(|r| r.neighborhood_id).collect();

        let regions: HashMap<i32, Region> = Region::find_many(pool, &region_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let neighborhoods: HashMap<i32, Neighborhood> = Neighborhood::find_many(pool, &neighborhood_ids)
            .await?
            .into_iter()
            .map(|n| (n.id, n))
            .collect();

        let mut features: HashMap<Uuid, Vec<Feature>> = HashMap::new();
        for (property_id, feature) in Feature::for_properties(pool, &ids).await? {
            features.entry(property_id).or_default().push(feature);
        }

        let mut images: HashMap<Uuid, Vec<Image>> = HashMap::new();
        for image in images_for(pool, &ids).await? {
            images.entry(image.property_id).or_default().push(image);
        }

        let mut contacts: HashMap<Uuid, ContactInfo> = contacts_for(pool, &ids)
            .await?
            .into_iter()
            .map(|c| (c.property_id, c))
            .collect();

        Ok(rows
            .into_iter()
            .map(|property| PropertyAggregate {
                region: property.region_id.and_then(|id| regions.get(&id).cloned()),
                neighborhood: property.neighborhood_id.and_then(|id| neighborhoods.get(&id).cloned()),
                features: features.remove(&property.id).unwrap_or_default(),
                images: images.remove(&property.id).unwrap_or_default(),
                contact_info: contacts.remove(&property.id),
                property,
            })
            .collect())
    }

    pub async fn load(pool: &PgPool, id: Uuid) -> Result<Option<PropertyAggregate>, DatabaseError> {
        let row = sqlx::query_as::<_, PropertyRow>("SELECT * FROM properties WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        match row {
            Some(row) => Ok(Self::load_many(pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

async fn images_for<'e, E: PgExecutor<'e>>(executor: E, property_ids: &[Uuid]) -> Result<Vec<Image>, DatabaseError> {
    let rows = sqlx::query_as::<_, Image>(
        "SELECT * FROM images WHERE property_id = ANY($1) ORDER BY created_at, position, id",
    )
    .bind(property_ids)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

async fn contacts_for<'e, E: PgExecutor<'e>>(
    executor: E,
    property_ids: &[Uuid],
) -> Result<Vec<ContactInfo>, DatabaseError> {
    let rows = sqlx::query_as::<_, ContactInfo>("SELECT * FROM contact_infos WHERE property_id = ANY($1)")
        .bind(property_ids)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}
