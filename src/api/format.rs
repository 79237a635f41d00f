//! Typed projections from store rows to response bodies.
//!
//! Every view lists its fields explicitly; a column added to a table does not
//! reach clients until it is added here. Timestamps are ISO-8601 strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{
    ContactInfo, ContactMessage, Feature, Image, Neighborhood, PropertyAggregate, Region, User,
};
use crate::types::{Category, ConstructionType, Currency, FeatureType, Furnishing, LocationType, PropertyType, Role};

pub fn iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionView {
    pub id: i32,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Region> for RegionView {
    fn from(r: &Region) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            created_at: iso8601(&r.created_at),
            updated_at: iso8601(&r.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NeighborhoodView {
    pub id: i32,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Neighborhood> for NeighborhoodView {
    fn from(n: &Neighborhood) -> Self {
        Self {
            id: n.id,
            name: n.name.clone(),
            created_at: iso8601(&n.created_at),
            updated_at: iso8601(&n.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureView {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Feature> for FeatureView {
    fn from(f: &Feature) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            feature_type: f.feature_type,
            created_at: iso8601(&f.created_at),
            updated_at: iso8601(&f.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageView {
    pub id: Uuid,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Image> for ImageView {
    fn from(i: &Image) -> Self {
        Self {
            id: i.id,
            url: i.url.clone(),
            created_at: iso8601(&i.created_at),
            updated_at: iso8601(&i.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactInfoView {
    pub id: Uuid,
    pub phone: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ContactInfo> for ContactInfoView {
    fn from(c: &ContactInfo) -> Self {
        Self {
            id: c.id,
            phone: c.phone.clone(),
            email: c.email.clone(),
            created_at: iso8601(&c.created_at),
            updated_at: iso8601(&c.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyView {
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
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub featured: bool,
    pub has_regulation: Option<bool>,
    pub region: Option<RegionView>,
    pub neighborhood: Option<NeighborhoodView>,
    pub features: Vec<FeatureView>,
    pub images: Vec<ImageView>,
    pub contact_info: Option<ContactInfoView>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&PropertyAggregate> for PropertyView {
    fn from(a: &PropertyAggregate) -> Self {
        let p = &a.property;
        Self {
            id: p.id,
            title: p.title.clone(),
            description: p.description.clone(),
            price: p.price,
            currency: p.currency,
            area_sqm: p.area_sqm,
            land_area_sqm: p.land_area_sqm,
            floor: p.floor,
            total_floors: p.total_floors,
            construction_type: p.construction_type,
            furnishing: p.furnishing,
            location_type: p.location_type,
            category: p.category,
            property_type: p.property_type,
            featured: p.featured,
            has_regulation: p.has_regulation,
            region: a.region.as_ref().map(RegionView::from),
            neighborhood: a.neighborhood.as_ref().map(NeighborhoodView::from),
            features: a.features.iter().map(FeatureView::from).collect(),
            images: a.images.iter().map(ImageView::from).collect(),
            contact_info: a.contact_info.as_ref().map(ContactInfoView::from),
            created_at: iso8601(&p.created_at),
            updated_at: iso8601(&p.updated_at),
        }
    }
}

/// Account as clients see it; the password hash never leaves the store
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
            created_at: iso8601(&u.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactMessageView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ContactMessage> for ContactMessageView {
    fn from(m: &ContactMessage) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            email: m.email.clone(),
            message: m.message.clone(),
            is_read: m.is_read,
            created_at: iso8601(&m.created_at),
            updated_at: iso8601(&m.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthView {
    pub token: String,
    pub user: UserView,
}
