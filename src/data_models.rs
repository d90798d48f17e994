use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Villa,
    Farmland,
    Plot,
    Apartment,
    ResidentialPlot,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Villa => "VILLA",
            PropertyType::Farmland => "FARMLAND",
            PropertyType::Plot => "PLOT",
            PropertyType::Apartment => "APARTMENT",
            PropertyType::ResidentialPlot => "RESIDENTIAL_PLOT",
        }
    }

    /// Lower-case phrase used in human readable summaries.
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Villa => "villa",
            PropertyType::Farmland => "farmland",
            PropertyType::Plot => "plot",
            PropertyType::Apartment => "apartment",
            PropertyType::ResidentialPlot => "residential plot",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    Available,
    UnderOffer,
    Sold,
    Rented,
    Draft,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "AVAILABLE",
            PropertyStatus::UnderOffer => "UNDER_OFFER",
            PropertyStatus::Sold => "SOLD",
            PropertyStatus::Rented => "RENTED",
            PropertyStatus::Draft => "DRAFT",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Listing price as it was entered. Older listings carry locale formatted
/// strings such as `"₹1,80,00,000"`, newer ones a plain number.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Text(String),
}

impl From<f64> for Price {
    fn from(value: f64) -> Self {
        Price::Amount(value)
    }
}

impl From<&str> for Price {
    fn from(value: &str) -> Self {
        Price::Text(value.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PropertyRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub property_type: PropertyType,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub location_id: Option<ObjectId>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub status: PropertyStatus,
    pub active: bool,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime,
}

impl PropertyRecord {
    /// A fresh, active and available listing. Remaining fields start empty.
    pub fn new(title: String, property_type: PropertyType, price: Price) -> PropertyRecord {
        PropertyRecord {
            id: ObjectId::new(),
            title,
            description: String::new(),
            price,
            property_type,
            bedrooms: None,
            location_id: None,
            coordinates: None,
            status: PropertyStatus::Available,
            active: true,
            views: 0,
            featured: false,
            created_at: DateTime::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocationRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub active: bool,
}

impl LocationRecord {
    pub fn new(name: &str, coordinates: Option<Coordinates>) -> LocationRecord {
        LocationRecord {
            id: ObjectId::new(),
            name: name.to_string(),
            slug: name.trim().to_lowercase().replace(' ', "-"),
            coordinates,
            active: true,
        }
    }
}

/// A property that survived filtering, with its distance from the resolved
/// centroid when both sides carry coordinates.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub property: PropertyRecord,
    pub distance_km: Option<f64>,
}
