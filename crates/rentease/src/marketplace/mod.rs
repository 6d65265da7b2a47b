//! Rental marketplace: listings, tiered fees, moderation and admin settings.
//!
//! Public visitors see approved listings only. Owners submit listings which sit
//! pending until an administrator approves them; administrators also maintain
//! the fee schedules charged when a tenant expresses interest or asks for a
//! video walkthrough.

pub mod approval;
pub mod auth;
pub mod comparison;
pub mod dashboard;
pub mod domain;
pub mod fees;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod settings;

#[cfg(test)]
mod tests;

pub use approval::{AdminAction, Transition, TransitionError};
pub use auth::{
    hash_password, Account, AccountId, AccountRepository, AuthError, AuthService, Claims,
    Credentials, NewAccount, Registration, Role, Session, TokenAuthority, TokenVerifier,
    PASSWORD_COST,
};
pub use comparison::{ComparisonEntry, ComparisonError, ComparisonSelection};
pub use dashboard::{Collection, DashboardState, DashboardView, FetchTicket};
pub use domain::{
    AdditionalFacilities, Furnishings, ListingStatus, Property, PropertyDraft, PropertyId,
    PropertyType, PropertyValidationError, TenantPreferences,
};
pub use fees::{resolve_fee, FeeBand, FeeKind, FeeSchedule, FeeScheduleError, FeeTier};
pub use query::{rank_listings, ListingFilters, ListingQuery, ListingSearchParams, SearchParamError};
pub use repository::{PropertyRepository, RepositoryError};
pub use router::{marketplace_router, ApiError, MarketplaceState};
pub use service::{
    ApprovalOutcome, InterestReceipt, MarketplaceService, MarketplaceServiceError, PaymentQuote,
    VideoRequestReceipt,
};
pub use settings::{PublicSettings, Settings, SettingsError, SettingsStore, SocialLinks};
