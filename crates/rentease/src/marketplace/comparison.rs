use serde::Serialize;

use super::domain::{Property, PropertyId};

pub const MAX_COMPARED: usize = 3;
pub const MIN_COMPARED: usize = 2;

/// Tenant's pick list for side-by-side comparison; keeps the latest three picks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonSelection {
    ids: Vec<PropertyId>,
}

impl ComparisonSelection {
    /// Select or unselect `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: PropertyId) -> bool {
        if let Some(position) = self.ids.iter().position(|selected| *selected == id) {
            self.ids.remove(position);
            return false;
        }
        self.ids.push(id);
        if self.ids.len() > MAX_COMPARED {
            let overflow = self.ids.len() - MAX_COMPARED;
            self.ids.drain(..overflow);
        }
        true
    }

    pub fn ids(&self) -> &[PropertyId] {
        &self.ids
    }

    pub fn can_compare(&self) -> bool {
        self.ids.len() >= MIN_COMPARED
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub id: PropertyId,
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: &'static str,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub rent: u64,
    pub location: String,
    pub pin_code: String,
    pub nearby_places: String,
}

impl From<&Property> for ComparisonEntry {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id,
            title: property.title.clone(),
            property_type: property.property_type.label(),
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            area: property.area,
            rent: property.rent,
            location: property.location.clone(),
            pin_code: property.pin_code.clone(),
            nearby_places: property.nearby_places.join(", "),
        }
    }
}

/// Build comparison columns in the order the ids were given.
pub fn compare(
    available: &[Property],
    ids: &[PropertyId],
) -> Result<Vec<ComparisonEntry>, ComparisonError> {
    if ids.len() < MIN_COMPARED {
        return Err(ComparisonError::TooFew(ids.len()));
    }
    if ids.len() > MAX_COMPARED {
        return Err(ComparisonError::TooMany(ids.len()));
    }

    ids.iter()
        .map(|id| {
            available
                .iter()
                .find(|property| property.id == *id)
                .map(ComparisonEntry::from)
                .ok_or(ComparisonError::Unknown(*id))
        })
        .collect()
}

pub fn parse_ids(raw: &str) -> Result<Vec<PropertyId>, ComparisonError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map(PropertyId)
                .map_err(|_| ComparisonError::InvalidId(part.to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComparisonError {
    #[error("select at least 2 properties to compare, got {0}")]
    TooFew(usize),
    #[error("at most 3 properties can be compared, got {0}")]
    TooMany(usize),
    #[error("property {0} is not available for comparison")]
    Unknown(PropertyId),
    #[error("'{0}' is not a property id")]
    InvalidId(String),
}
