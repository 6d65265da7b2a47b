//! Listing search: free-text match, structured filters, ranking by interest.

use serde::{Deserialize, Serialize};

use super::domain::Property;

/// Structured constraints; `None` imposes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilters {
    pub pin_code: Option<String>,
    pub max_rent: Option<u64>,
    pub bedrooms: Option<u32>,
}

impl ListingFilters {
    pub fn admits(&self, property: &Property) -> bool {
        self.pin_code
            .as_deref()
            .map_or(true, |pin| property.pin_code == pin)
            && self.max_rent.map_or(true, |max| property.rent <= max)
            && self.bedrooms.map_or(true, |beds| property.bedrooms == beds)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub text: String,
    pub filters: ListingFilters,
}

impl ListingQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: ListingFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: ListingFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn matches(&self, property: &Property) -> bool {
        matches_text(property, &self.text.to_lowercase()) && self.filters.admits(property)
    }
}

fn matches_text(property: &Property, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |haystack: &str| haystack.to_lowercase().contains(needle);

    hit(&property.location)
        || hit(&property.title)
        || hit(&property.pin_code)
        || property.nearby_places.iter().any(|place| hit(place))
        || hit(property.property_type.label())
}

/// Matching properties ordered by `interested_tenants`, most interest first.
///
/// The sort is stable, so ties keep the order they had in `properties`.
pub fn rank_listings(properties: &[Property], query: &ListingQuery) -> Vec<Property> {
    let needle = query.text.to_lowercase();
    let mut ranked: Vec<Property> = properties
        .iter()
        .filter(|property| matches_text(property, &needle) && query.filters.admits(property))
        .cloned()
        .collect();
    ranked.sort_by(|a, b| b.interested_tenants.cmp(&a.interested_tenants));
    ranked
}

/// Admin dashboard search over the owner's WhatsApp number.
pub fn filter_by_owner_whatsapp(properties: &[Property], search: &str) -> Vec<Property> {
    let search = search.trim();
    properties
        .iter()
        .filter(|property| property.owner_whatsapp.contains(search))
        .cloned()
        .collect()
}

/// Raw query-string form of a listing search.
///
/// `q` and `pinCode` are matched exactly as sent; an empty value imposes
/// nothing. Numeric fields ignore surrounding whitespace and count as absent
/// when blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub pin_code: Option<String>,
    #[serde(default)]
    pub max_rent: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<String>,
}

impl ListingSearchParams {
    pub fn into_query(self) -> Result<ListingQuery, SearchParamError> {
        let filters = ListingFilters {
            pin_code: self.pin_code.filter(|pin| !pin.is_empty()),
            max_rent: parse_number(self.max_rent, "maxRent")?,
            bedrooms: parse_number(self.bedrooms, "bedrooms")?,
        };
        Ok(ListingQuery::new(self.q.unwrap_or_default()).with_filters(filters))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_number<T: std::str::FromStr>(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<T>, SearchParamError> {
    present(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| SearchParamError::NotANumber { field, value: raw })
        })
        .transpose()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchParamError {
    #[error("{field} must be a whole number, got '{value}'")]
    NotANumber { field: &'static str, value: String },
}
