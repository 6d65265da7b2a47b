use super::domain::{ListingStatus, Property, PropertyId};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `list` returns records in insertion (id) order; ranking relies on that order
/// to break ties.
pub trait PropertyRepository: Send + Sync {
    fn next_id(&self) -> Result<PropertyId, RepositoryError>;
    fn insert(&self, property: Property) -> Result<Property, RepositoryError>;
    fn update(&self, property: Property) -> Result<(), RepositoryError>;
    fn fetch(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn list(&self, status: Option<ListingStatus>) -> Result<Vec<Property>, RepositoryError>;
    fn delete(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError>;
    /// Atomically bump the interest counter, returning the updated record.
    fn increment_interest(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
