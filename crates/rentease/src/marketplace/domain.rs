use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Apartment,
    #[serde(rename = "Independent House")]
    IndependentHouse,
    Studio,
}

impl PropertyType {
    pub const fn label(self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::IndependentHouse => "Independent House",
            PropertyType::Studio => "Studio",
        }
    }
}

/// Moderation state of a listing. Only approved listings are publicly visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Pending,
    Approved,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }
}

/// Counts of furnished appliances and fixtures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Furnishings {
    pub ac: u32,
    pub geyser: u32,
    pub tv: u32,
    pub table: u32,
    pub chair: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TenantPreferences {
    pub students: bool,
    pub male_students: bool,
    pub female_students: bool,
    pub family: bool,
    pub family_size: String,
    pub sharing: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalFacilities {
    pub food: bool,
    pub wifi: bool,
    pub parking: bool,
    pub laundry: bool,
}

/// A stored rental property, pending or approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub rent: u64,
    pub location: String,
    pub pin_code: String,
    #[serde(default)]
    pub nearby_places: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    pub available_from: NaiveDate,
    #[serde(rename = "ownerWhatsApp")]
    pub owner_whatsapp: String,
    #[serde(default)]
    pub interested_tenants: u32,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default)]
    pub furnishings: Furnishings,
    #[serde(default)]
    pub tenant_preferences: TenantPreferences,
    #[serde(default)]
    pub additional_facilities: AdditionalFacilities,
}

impl Property {
    pub fn is_listed(&self) -> bool {
        self.status == ListingStatus::Approved
    }
}

/// Owner supplied fields for a new or edited listing.
///
/// Identity, moderation status and the interest counter are owned by the
/// marketplace and never taken from a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub rent: u64,
    pub location: String,
    pub pin_code: String,
    #[serde(default)]
    pub nearby_places: Vec<String>,
    #[serde(default)]
    pub youtube_link: Option<String>,
    pub available_from: NaiveDate,
    #[serde(rename = "ownerWhatsApp")]
    pub owner_whatsapp: String,
    #[serde(default)]
    pub furnishings: Furnishings,
    #[serde(default)]
    pub tenant_preferences: TenantPreferences,
    #[serde(default)]
    pub additional_facilities: AdditionalFacilities,
}

impl PropertyDraft {
    /// Trim and validate the draft, producing a property with the given identity.
    pub fn into_property(
        self,
        id: PropertyId,
        status: ListingStatus,
        interested_tenants: u32,
    ) -> Result<Property, PropertyValidationError> {
        let title = required(self.title, "title")?;
        let location = required(self.location, "location")?;
        let pin_code = required(self.pin_code, "pinCode")?;
        let owner_whatsapp = required(self.owner_whatsapp, "ownerWhatsApp")?;

        if !(self.area.is_finite() && self.area > 0.0) {
            return Err(PropertyValidationError::NonPositiveArea);
        }
        if self.rent == 0 {
            return Err(PropertyValidationError::NonPositiveRent);
        }

        Ok(Property {
            id,
            title,
            property_type: self.property_type,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            rent: self.rent,
            location,
            pin_code,
            nearby_places: normalize_places(self.nearby_places),
            youtube_link: normalize_link(self.youtube_link),
            available_from: self.available_from,
            owner_whatsapp,
            interested_tenants,
            status,
            furnishings: self.furnishings,
            tenant_preferences: self.tenant_preferences,
            additional_facilities: self.additional_facilities,
        })
    }
}

impl From<Property> for PropertyDraft {
    fn from(property: Property) -> Self {
        Self {
            title: property.title,
            property_type: property.property_type,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            area: property.area,
            rent: property.rent,
            location: property.location,
            pin_code: property.pin_code,
            nearby_places: property.nearby_places,
            youtube_link: property.youtube_link,
            available_from: property.available_from,
            owner_whatsapp: property.owner_whatsapp,
            furnishings: property.furnishings,
            tenant_preferences: property.tenant_preferences,
            additional_facilities: property.additional_facilities,
        }
    }
}

fn required(value: String, field: &'static str) -> Result<String, PropertyValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(PropertyValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Keeps display order, drops blank entries left by comma separated input.
pub(crate) fn normalize_places(places: Vec<String>) -> Vec<String> {
    places
        .into_iter()
        .map(|place| place.trim().to_string())
        .filter(|place| !place.is_empty())
        .collect()
}

pub(crate) fn normalize_link(link: Option<String>) -> Option<String> {
    link.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("area must be a positive number of square feet")]
    NonPositiveArea,
    #[error("rent must be greater than zero")]
    NonPositiveRent,
}
