//! Read and write workflows for the property aggregate.
//!
//! Writes follow one order: reference checks, file storage, then a single
//! transaction covering the property row and everything it owns. Images
//! and feature links are replaced wholesale when supplied, never merged.

use std::sync::Arc;

use futures::future::try_join_all;
use sqlx::PgPool;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::api::property_form::{CreateProperty, UpdateProperty};
use crate::database::models::property::{self, replace_feature_links, ContactInfo, Image};
use crate::database::models::{Feature, Neighborhood, PropertyAggregate, PropertyRow, Region};
use crate::database::{DatabaseError, Repository};
use crate::filter::{FilterData, PropertyFilter};
use crate::services::storage::{public_url, ImageStorage, StorageError, Upload};
use crate::validation::FieldErrors;

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Property not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct PropertyService {
    pool: PgPool,
    storage: Arc<dyn ImageStorage>,
    upload_prefix: String,
}

impl PropertyService {
    pub fn new(pool: PgPool, storage: Arc<dyn ImageStorage>, upload_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            storage,
            upload_prefix: upload_prefix.into(),
        }
    }

    fn rows(&self) -> Repository<PropertyRow> {
        Repository::new(property::TABLE, self.pool.clone())
    }

    /// Filtered page, newest first, with the unpaginated total
    pub async fn list(&self, filter: &PropertyFilter) -> Result<(Vec<PropertyAggregate>, i64), PropertyError> {
        let (rows, total) = self.rows().select_page(filter.to_filter_data()).await?;
        let items = PropertyAggregate::load_many(&self.pool, rows).await?;
        Ok((items, total))
    }

    pub async fn featured(&self, limit: i64) -> Result<Vec<PropertyAggregate>, PropertyError> {
        let rows = self
            .rows()
            .select_any(FilterData {
                select: None,
                where_clause: Some(serde_json::json!({ "featured": true })),
                order: Some(serde_json::json!("created_at desc")),
                limit: Some(limit),
                offset: None,
            })
            .await?;
        Ok(PropertyAggregate::load_many(&self.pool, rows).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<PropertyAggregate, PropertyError> {
        PropertyAggregate::load(&self.pool, id).await?.ok_or(PropertyError::NotFound)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, PropertyError> {
        Ok(self.rows().exists(id).await?)
    }

    pub async fn create(&self, input: CreateProperty, base_url: &Url) -> Result<PropertyAggregate, PropertyError> {
        let draft = &input.draft;
        self.check_references(draft.region_id, draft.neighborhood_id, Some(&input.feature_ids))
            .await?;

        let (keys, urls) = self.store_files(&input.files, base_url).await?;

        let written = async {
            let mut tx = self.pool.begin().await?;
            let row = PropertyRow::insert(&mut tx, draft).await?;
            if let Some(contact) = &input.contact_info {
                ContactInfo::upsert(&mut tx, row.id, contact).await?;
            }
            Image::insert_many(&mut tx, row.id, &urls).await?;
            replace_feature_links(&mut tx, row.id, &input.feature_ids).await?;
            tx.commit().await?;
            Ok::<_, DatabaseError>(row)
        }
        .await;

        let row = written.map_err(|e| self.orphaned(&keys, e))?;
        tracing::info!("Created property {} with {} images", row.id, urls.len());
        self.get(row.id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProperty,
        base_url: &Url,
    ) -> Result<PropertyAggregate, PropertyError> {
        self.check_references(input.patch.region_id, input.patch.neighborhood_id, input.feature_ids.as_deref())
            .await?;

        let (keys, urls) = self.store_files(&input.files, base_url).await?;

        let written = async {
            let mut tx = self.pool.begin().await?;
            if PropertyRow::lock(&mut tx, id).await?.is_none() {
                return Ok(false);
            }
            PropertyRow::apply_patch(&mut tx, id, &input.patch).await?;
            if let Some(contact) = &input.contact_info {
                ContactInfo::upsert(&mut tx, id, contact).await?;
            }
            if !urls.is_empty() {
                Image::replace_all(&mut tx, id, &urls).await?;
            }
            if let Some(feature_ids) = &input.feature_ids {
                replace_feature_links(&mut tx, id, feature_ids).await?;
            }
            tx.commit().await?;
            Ok::<_, DatabaseError>(true)
        }
        .await;

        match written {
            Ok(true) => {
                tracing::info!("Updated property {}", id);
                self.get(id).await
            }
            Ok(false) => {
                self.log_orphans(&keys);
                Err(PropertyError::NotFound)
            }
            Err(e) => Err(self.orphaned(&keys, e)),
        }
    }

    /// Owned contact info, images and feature links go with the row
    pub async fn delete(&self, id: Uuid) -> Result<(), PropertyError> {
        if !self.rows().delete_by_id(id).await? {
            return Err(PropertyError::NotFound);
        }
        tracing::info!("Deleted property {}", id);
        Ok(())
    }

    /// Unknown region, neighborhood or feature ids become field errors
    async fn check_references(
        &self,
        region_id: Option<i32>,
        neighborhood_id: Option<i32>,
        feature_ids: Option<&[i32]>,
    ) -> Result<(), PropertyError> {
        let mut errors = FieldErrors::new();

        if let Some(id) = region_id {
            if !Repository::<Region>::new(Region::TABLE, self.pool.clone()).exists(id).await? {
                errors.add("region_id", format!("Region {} does not exist", id));
            }
        }
        if let Some(id) = neighborhood_id {
            if !Repository::<Neighborhood>::new(Neighborhood::TABLE, self.pool.clone()).exists(id).await? {
                errors.add("neighborhood_id", format!("Neighborhood {} does not exist", id));
            }
        }
        if let Some(ids) = feature_ids.filter(|ids| !ids.is_empty()) {
            let missing = Feature::missing(&self.pool, ids).await?;
            if !missing.is_empty() {
                let list = missing.iter().map(i32::to_string).collect::<Vec<_>>().join(", ");
                errors.add("features", format!("Unknown feature ids: {}", list));
            }
        }

        errors.finish(()).map_err(PropertyError::Validation)
    }

    async fn store_files(&self, files: &[Upload], base_url: &Url) -> Result<(Vec<String>, Vec<String>), PropertyError> {
        let stored = try_join_all(files.iter().map(|f| self.storage.store(f))).await?;
        let mut keys = Vec::with_capacity(stored.len());
        let mut urls = Vec::with_capacity(stored.len());
        for image in stored {
            urls.push(public_url(base_url, &self.upload_prefix, &image.key)?);
            keys.push(image.key);
        }
        Ok((keys, urls))
    }

    fn orphaned(&self, keys: &[String], err: DatabaseError) -> PropertyError {
        self.log_orphans(keys);
        PropertyError::Database(err)
    }

    // Stored files are kept when the write fails; they may be shared by content hash
    fn log_orphans(&self, keys: &[String]) {
        if !keys.is_empty() {
            tracing::warn!("Property write failed; {} uploaded files left unreferenced: {:?}", keys.len(), keys);
        }
    }
}
