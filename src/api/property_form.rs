//! Multipart decoding for property create/update.
//!
//! Scalars arrive as text fields, `contact_info` and `features` as JSON text,
//! images as repeated `images` file parts. Every coercion and rule failure is
//! collected into one [`FieldErrors`] map.

use std::collections::HashMap;

use axum::extract::Multipart;
use serde::Deserialize;
use validator::Validate;

use crate::config::UploadConfig;
use crate::database::models::{ContactDraft, PropertyDraft, PropertyPatch};
use crate::error::ApiError;
use crate::services::storage::{Upload, ALLOWED_IMAGE_TYPES};
use crate::validation::{coerce_bool, coerce_enum, coerce_f64, coerce_i32, coerce_id, required, FieldErrors};

pub const IMAGES_FIELD: &str = "images";

/// Text fields and buffered files of one multipart request
#[derive(Debug, Default)]
pub struct PropertyForm {
    fields: HashMap<String, String>,
    pub files: Vec<Upload>,
}

#[derive(Debug)]
pub struct CreateProperty {
    pub draft: PropertyDraft,
    pub contact_info: Option<ContactDraft>,
    pub feature_ids: Vec<i32>,
    pub files: Vec<Upload>,
}

#[derive(Debug)]
pub struct UpdateProperty {
    pub patch: PropertyPatch,
    pub contact_info: Option<ContactDraft>,
    /// `Some` replaces every link, including with an empty set
    pub feature_ids: Option<Vec<i32>>,
    pub files: Vec<Upload>,
}

#[derive(Debug, Validate)]
struct ScalarRules {
    #[validate(length(min = 2, message = "Title must be at least 2 characters"))]
    title: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Number must be greater than 0"))]
    price: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "Number must be greater than 0"))]
    area_sqm: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "Number must be greater than 0"))]
    land_area_sqm: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
struct ContactInfoInput {
    #[serde(default)]
    #[validate(length(min = 6, message = "Phone must be at least 6 characters"))]
    phone: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Invalid email"))]
    email: Option<String>,
}

impl PropertyForm {
    /// Buffer the request body, enforcing file count, size and MIME limits
    pub async fn from_multipart(mut multipart: Multipart, limits: &UploadConfig) -> Result<Self, ApiError> {
        let mut form = PropertyForm::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(file_name) = field.file_name().map(str::to_string) else {
                let value = field.text().await?;
                form.fields.insert(name, value);
                continue;
            };

            if name != IMAGES_FIELD {
                return Err(ApiError::invalid_field(name, "Unexpected file field"));
            }

            let content_type = field.content_type().unwrap_or_default().to_string();
            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                if bytes.len() + chunk.len() > limits.max_file_bytes {
                    return Err(ApiError::invalid_field(
                        IMAGES_FIELD,
                        format!("Each file must be at most {} bytes", limits.max_file_bytes),
                    ));
                }
                bytes.extend_from_slice(&chunk);
            }

            // Browsers send an empty part when no file was chosen
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }

            if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
                return Err(ApiError::invalid_field(
                    IMAGES_FIELD,
                    format!("Only JPEG, PNG and WebP images are allowed, received '{}'", content_type),
                ));
            }

            form.files.push(Upload {
                file_name: Some(file_name),
                content_type,
                bytes,
            });

            if form.files.len() > limits.max_files {
                return Err(ApiError::invalid_field(
                    IMAGES_FIELD,
                    format!("At most {} files are allowed", limits.max_files),
                ));
            }
        }

        tracing::debug!("Decoded property form: {} fields, {} files", form.fields.len(), form.files.len());
        Ok(form)
    }

    pub fn from_parts(fields: impl IntoIterator<Item = (&'static str, &'static str)>, files: Vec<Upload>) -> Self {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            files,
        }
    }

    /// Non-blank text field; blank counts as not supplied
    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    /// Every scalar as optional, coerced and checked against the field rules
    fn scalars(&self, errors: &mut FieldErrors) -> PropertyPatch {
        let patch = PropertyPatch {
            title: self.text("title").map(str::to_string),
            description: self.text("description").map(str::to_string),
            price: coerce_f64(errors, "price", self.text("price")),
            currency: coerce_enum(errors, "currency", self.text("currency")),
            area_sqm: coerce_f64(errors, "area_sqm", self.text("area_sqm")),
            land_area_sqm: coerce_f64(errors, "land_area_sqm", self.text("land_area_sqm")),
            floor: coerce_i32(errors, "floor", self.text("floor")),
            total_floors: coerce_i32(errors, "total_floors", self.text("total_floors")),
            construction_type: coerce_enum(errors, "construction_type", self.text("construction_type")),
            furnishing: coerce_enum(errors, "furnishing", self.text("furnishing")),
            location_type: coerce_enum(errors, "location_type", self.text("location_type")),
            category: coerce_enum(errors, "category", self.text("category")),
            property_type: coerce_enum(errors, "type", self.text("type")),
            featured: coerce_bool(errors, "featured", self.text("featured")),
            has_regulation: coerce_bool(errors, "has_regulation", self.text("has_regulation")),
            region_id: coerce_id(errors, "region_id", self.text("region_id")),
            neighborhood_id: coerce_id(errors, "neighborhood_id", self.text("neighborhood_id")),
        };

        let rules = ScalarRules {
            title: patch.title.clone(),
            description: patch.description.clone(),
            price: patch.price,
            area_sqm: patch.area_sqm,
            land_area_sqm: patch.land_area_sqm,
        };
        if let Err(e) = rules.validate() {
            errors.merge_validator(&e, None);
        }

        patch
    }

    fn contact_info(&self, errors: &mut FieldErrors) -> Option<ContactDraft> {
        let raw = self.text("contact_info")?;
        let input: ContactInfoInput = match serde_json::from_str(raw) {
            Ok(input) => input,
            Err(_) => {
                errors.add("contact_info", "Expected a JSON object with phone and email");
                return None;
            }
        };

        if let Err(e) = input.validate() {
            errors.merge_validator(&e, Some("contact_info"));
        }
        let phone = required(errors, "contact_info.phone", input.phone);
        let email = required(errors, "contact_info.email", input.email);

        Some(ContactDraft {
            phone: phone?,
            email: email?,
        })
    }

    fn feature_ids(&self, errors: &mut FieldErrors) -> Option<Vec<i32>> {
        let raw = self.fields.get("features")?.trim();
        if raw.is_empty() {
            return Some(Vec::new());
        }
        match parse_feature_ids(raw) {
            Some(ids) => Some(ids),
            None => {
                errors.add("features", "Expected a JSON array of positive feature ids");
                None
            }
        }
    }

    /// Full validation: every required field must be present and valid
    pub fn into_create(self) -> Result<CreateProperty, FieldErrors> {
        let mut errors = FieldErrors::new();
        let p = self.scalars(&mut errors);
        let contact_info = self.contact_info(&mut errors);
        if self.text("contact_info").is_none() {
            errors.add("contact_info", "Required");
        }
        let feature_ids = self.feature_ids(&mut errors).unwrap_or_default();

        let title = required(&mut errors, "title", p.title);
        let description = required(&mut errors, "description", p.description);
        let price = required(&mut errors, "price", p.price);
        let currency = required(&mut errors, "currency", p.currency);
        let area_sqm = required(&mut errors, "area_sqm", p.area_sqm);
        let location_type = required(&mut errors, "location_type", p.location_type);
        let category = required(&mut errors, "category", p.category);
        let property_type = required(&mut errors, "type", p.property_type);

        if !errors.is_empty() {
            return Err(errors);
        }

        match (title, description, price, currency, area_sqm, location_type, category, property_type) {
            (
                Some(title),
                Some(description),
                Some(price),
                Some(currency),
                Some(area_sqm),
                Some(location_type),
                Some(category),
                Some(property_type),
            ) => Ok(CreateProperty {
                draft: PropertyDraft {
                    title,
                    description,
                    price,
                    currency,
                    area_sqm,
                    land_area_sqm: p.land_area_sqm,
                    floor: p.floor,
                    total_floors: p.total_floors,
                    construction_type: p.construction_type,
                    furnishing: p.furnishing,
                    location_type,
                    category,
                    property_type,
                    featured: p.featured.unwrap_or(false),
                    has_regulation: p.has_regulation,
                    region_id: p.region_id,
                    neighborhood_id: p.neighborhood_id,
                },
                contact_info,
                feature_ids,
                files: self.files,
            }),
            // Every None above recorded an error
            _ => Err(errors),
        }
    }

    /// Partial validation: only supplied fields are checked
    pub fn into_update(self) -> Result<UpdateProperty, FieldErrors> {
        let mut errors = FieldErrors::new();
        let patch = self.scalars(&mut errors);
        let contact_info = self.contact_info(&mut errors);
        let feature_ids = self.feature_ids(&mut errors);

        errors.finish(UpdateProperty {
            patch,
            contact_info,
            feature_ids,
            files: self.files,
        })
    }
}

/// `[1, 2]`, `["1", "2"]` or a bare `1,2`
fn parse_feature_ids(raw: &str) -> Option<Vec<i32>> {
    let values: Vec<serde_json::Value> = if raw.starts_with('[') {
        serde_json::from_str(raw).ok()?
    } else {
        raw.split(',').map(|s| serde_json::Value::String(s.trim().to_string())).collect()
    };

    let mut ids = Vec::with_capacity(values.len());
    for value in values {
        let id = match value {
            serde_json::Value::Number(n) => n.as_i64()?,
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        let id = i32::try_from(id).ok().filter(|id| *id > 0)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Some(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Currency, PropertyType};

    fn valid_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("title", "Sunny flat"),
            ("description", "Two bedrooms near the sea garden"),
            ("price", "125000"),
            ("currency", "EUR"),
            ("area_sqm", "78.5"),
            ("location_type", "SEASIDE"),
            ("category", "SALE"),
            ("type", "APARTMENT"),
            ("contact_info", r#"{"phone":"+359888000000","email":"a@b.com"}"#),
            ("features", "[1,2]"),
        ]
    }

    #[test]
    fn decodes_complete_create_payload() {
        let create = PropertyForm::from_parts(valid_fields(), vec![]).into_create().unwrap();

        assert_eq!(create.draft.price, 125000.0);
        assert_eq!(create.draft.currency, Currency::Eur);
        assert_eq!(create.draft.category, Category::Sale);
        assert_eq!(create.draft.property_type, PropertyType::Apartment);
        assert!(!create.draft.featured);
        assert_eq!(create.feature_ids, vec![1, 2]);
        assert_eq!(
            create.contact_info,
            Some(ContactDraft {
                phone: "+359888000000".to_string(),
                email: "a@b.com".to_string()
            })
        );
    }

    #[test]
    fn invalid_type_is_reported_under_its_field() {
        let mut fields = valid_fields();
        fields.retain(|(k, _)| *k != "type");
        fields.push(("type", "CASTLE"));

        let errors = PropertyForm::from_parts(fields, vec![]).into_create().unwrap_err();
        assert!(errors.contains("type"));
        assert_eq!(errors.get("type").map(|m| m.len()), Some(1));
    }

    #[test]
    fn create_reports_every_failing_field() {
        let errors = PropertyForm::from_parts(
            vec![
                ("title", "X"),
                ("description", "short"),
                ("price", "-5"),
                ("contact_info", r#"{"phone":"123","email":"nope"}"#),
            ],
            vec![],
        )
        .into_create()
        .unwrap_err();

        for field in [
            "title",
            "description",
            "price",
            "currency",
            "area_sqm",
            "location_type",
            "category",
            "type",
            "contact_info.phone",
            "contact_info.email",
        ] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn create_requires_contact_info() {
        let mut fields = valid_fields();
        fields.retain(|(k, _)| *k != "contact_info");
        let errors = PropertyForm::from_parts(fields, vec![]).into_create().unwrap_err();
        assert_eq!(errors.get("contact_info").unwrap()[0], "Required");
    }

    #[test]
    fn update_accepts_partial_payload() {
        let update = PropertyForm::from_parts(vec![("price", "99000"), ("featured", "true")], vec![])
            .into_update()
            .unwrap();

        assert_eq!(update.patch.price, Some(99000.0));
        assert_eq!(update.patch.featured, Some(true));
        assert_eq!(update.patch.title, None);
        assert!(update.contact_info.is_none());
        assert!(update.feature_ids.is_none());
    }

    #[test]
    fn update_still_checks_supplied_fields() {
        let errors = PropertyForm::from_parts(vec![("title", "X"), ("region_id", "0")], vec![])
            .into_update()
            .unwrap_err();
        assert!(errors.contains("title"));
        assert_eq!(errors.get("region_id").unwrap()[0], "Number must be greater than 0");
    }

    #[test]
    fn empty_features_field_clears_links() {
        let update = PropertyForm::from_parts(vec![("features", "[]")], vec![]).into_update().unwrap();
        assert_eq!(update.feature_ids, Some(vec![]));
    }

    #[test]
    fn feature_id_formats() {
        assert_eq!(parse_feature_ids("[3]"), Some(vec![3]));
        assert_eq!(parse_feature_ids(r#"["4","5"]"#), Some(vec![4, 5]));
        assert_eq!(parse_feature_ids("1, 2, 2"), Some(vec![1, 2]));
        assert_eq!(parse_feature_ids("[0]"), None);
        assert_eq!(parse_feature_ids("[\"x\"]"), None);
    }
}
