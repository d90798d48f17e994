//! Compiles a parsed query into the structural catalog predicate.
//!
//! The predicate always restricts to active, available listings. It covers
//! property type, a minimum bedroom count, leftover keywords and the joined
//! location. Price is deliberately absent, see [`crate::pricing`].

use std::cmp::Ordering;

use mongodb::bson::{Document, doc, oid::ObjectId};

use crate::data_models::{LocationRecord, PropertyRecord, PropertyStatus, PropertyType};
use crate::parser::ParsedQuery;

#[derive(Debug, Clone, PartialEq)]
pub struct LocationConstraint {
    /// The parsed location string the joined location must contain.
    pub needle: String,
    /// Locations whose name or slug contains `needle`.
    pub location_ids: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyFilter {
    pub property_type: Option<PropertyType>,
    pub min_bedrooms: Option<u32>,
    pub keywords: Vec<String>,
    pub location: Option<LocationConstraint>,
}

impl PropertyFilter {
    /// `matched_locations` are the catalog locations matching the parsed
    /// location. A parsed location always constrains the search; with no
    /// matches nothing can satisfy it.
    pub fn compile(query: &ParsedQuery, matched_locations: &[LocationRecord]) -> Self {
        let location = query.location.as_ref().map(|needle| LocationConstraint {
            needle: needle.clone(),
            location_ids: matched_locations.iter().map(|l| l.id).collect(),
        });

        Self {
            property_type: query.property_type,
            min_bedrooms: query.bedrooms,
            keywords: query.keywords.clone(),
            location,
        }
    }

    /// The predicate as a MongoDB filter document over the `properties`
    /// collection.
    pub fn to_document(&self) -> Document {
        let mut filter = doc! {
            "active": true,
            "status": PropertyStatus::Available.as_str(),
        };

        if let Some(property_type) = self.property_type {
            filter.insert("property_type", property_type.as_str());
        }

        if let Some(bedrooms) = self.min_bedrooms {
            filter.insert("bedrooms", doc! { "$gte": i64::from(bedrooms) });
        }

        if !self.keywords.is_empty() {
            let clauses: Vec<Document> = self
                .keywords
                .iter()
                .flat_map(|keyword| {
                    let pattern = regex::escape(keyword);
                    [
                        doc! { "title": { "$regex": pattern.clone(), "$options": "i" } },
                        doc! { "description": { "$regex": pattern, "$options": "i" } },
                    ]
                })
                .collect();
            filter.insert("$or", clauses);
        }

        if let Some(location) = &self.location {
            filter.insert(
                "location_id",
                doc! { "$in": location.location_ids.clone() },
            );
        }

        filter
    }

    /// The same predicate evaluated in process.
    pub fn matches(&self, property: &PropertyRecord) -> bool {
        if !property.active || property.status != PropertyStatus::Available {
            return false;
        }

        if self
            .property_type
            .is_some_and(|ty| ty != property.property_type)
        {
            return false;
        }

        if let Some(min) = self.min_bedrooms {
            if !property.bedrooms.is_some_and(|b| b >= min) {
                return false;
            }
        }

        if !self.keywords.is_empty() {
            let title = property.title.to_lowercase();
            let description = property.description.to_lowercase();
            let hit = self.keywords.iter().any(|keyword| {
                let keyword = keyword.to_lowercase();
                title.contains(&keyword) || description.contains(&keyword)
            });
            if !hit {
                return false;
            }
        }

        if let Some(location) = &self.location {
            if !property
                .location_id
                .is_some_and(|id| location.location_ids.contains(&id))
            {
                return false;
            }
        }

        true
    }
}

/// Sort used whenever no centroid is available: featured first, then most
/// viewed, then newest.
pub fn baseline_sort() -> Document {
    doc! { "featured": -1, "views": -1, "created_at": -1 }
}

pub fn baseline_order(a: &PropertyRecord, b: &PropertyRecord) -> Ordering {
    b.featured
        .cmp(&a.featured)
        .then_with(|| b.views.cmp(&a.views))
        .then_with(|| b.created_at.cmp(&a.created_at))
}
