use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::approval::{AdminAction, Transition, TransitionError};
use super::comparison::{compare, ComparisonEntry, ComparisonError};
use super::domain::{
    normalize_link, ListingStatus, Property, PropertyDraft, PropertyId, PropertyValidationError,
};
use super::fees::FeeKind;
use super::query::{filter_by_owner_whatsapp, rank_listings, ListingQuery};
use super::repository::{PropertyRepository, RepositoryError};
use super::settings::{PublicSettings, Settings, SettingsError, SettingsStore};

/// Service composing the property store, settings store, fee schedules and search.
pub struct MarketplaceService<R, S> {
    repository: Arc<R>,
    settings: Arc<S>,
}

/// Result of an approve request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalOutcome {
    pub property: Property,
    pub transition: Transition,
}

/// Fees shown on the payment prompt for one listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuote {
    pub property_id: PropertyId,
    pub rent: u64,
    pub interest_fee: u64,
    pub video_request_fee: u64,
    pub upi_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestReceipt {
    pub property: Property,
    pub fee: u64,
    pub upi_id: String,
    pub whatsapp_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequestReceipt {
    pub property_id: PropertyId,
    pub title: String,
    pub fee: u64,
    pub upi_id: String,
    pub whatsapp_number: String,
}

impl<R, S> MarketplaceService<R, S>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
{
    pub fn new(repository: Arc<R>, settings: Arc<S>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Approved listings matching `query`, ranked by interest.
    pub fn listings(&self, query: &ListingQuery) -> Result<Vec<Property>, MarketplaceServiceError> {
        let approved = self.repository.list(Some(ListingStatus::Approved))?;
        let ranked = rank_listings(&approved, query);
        debug!(
            query = %query.text,
            candidates = approved.len(),
            matched = ranked.len(),
            "listing search"
        );
        Ok(ranked)
    }

    pub fn listing(&self, id: PropertyId) -> Result<Option<Property>, MarketplaceServiceError> {
        Ok(self
            .repository
            .fetch(id)?
            .filter(Property::is_listed))
    }

    /// Store a new submission awaiting moderation.
    pub fn submit(&self, draft: PropertyDraft) -> Result<Property, MarketplaceServiceError> {
        let id = self.repository.next_id()?;
        let property = draft.into_property(id, ListingStatus::Pending, 0)?;
        let stored = self.repository.insert(property)?;
        info!(property_id = %stored.id, "listing submitted for approval");
        Ok(stored)
    }

    pub fn admin_listings(
        &self,
        status: Option<ListingStatus>,
        whatsapp_search: &str,
    ) -> Result<Vec<Property>, MarketplaceServiceError> {
        let records = self.repository.list(status)?;
        Ok(filter_by_owner_whatsapp(&records, whatsapp_search))
    }

    /// Approve a pending listing. Approving an approved listing changes nothing.
    pub fn approve(
        &self,
        id: PropertyId,
    ) -> Result<Option<ApprovalOutcome>, MarketplaceServiceError> {
        let Some(mut property) = self.repository.fetch(id)? else {
            return Ok(None);
        };

        let transition = property.status.apply(AdminAction::Approve)?;
        if transition == Transition::Approved {
            property.status = ListingStatus::Approved;
            self.repository.update(property.clone())?;
            info!(property_id = %id, "listing approved");
        }

        Ok(Some(ApprovalOutcome {
            property,
            transition,
        }))
    }

    /// Delete a pending listing.
    pub fn reject(&self, id: PropertyId) -> Result<Option<Property>, MarketplaceServiceError> {
        let Some(property) = self.repository.fetch(id)? else {
            return Ok(None);
        };

        if let Err(error) = property.status.apply(AdminAction::Reject) {
            warn!(property_id = %id, "reject refused for approved listing");
            return Err(error.into());
        }
        let removed = self.repository.delete(id)?;
        info!(property_id = %id, "pending listing rejected");
        Ok(removed)
    }

    /// Delete a listing in any state.
    pub fn remove(&self, id: PropertyId) -> Result<Option<Property>, MarketplaceServiceError> {
        let removed = self.repository.delete(id)?;
        if removed.is_some() {
            info!(property_id = %id, "listing removed");
        }
        Ok(removed)
    }

    /// Replace the owner supplied fields of a listing in place.
    pub fn edit(
        &self,
        id: PropertyId,
        draft: PropertyDraft,
    ) -> Result<Option<Property>, MarketplaceServiceError> {
        let Some(current) = self.repository.fetch(id)? else {
            return Ok(None);
        };

        let updated = draft.into_property(id, current.status, current.interested_tenants)?;
        self.repository.update(updated.clone())?;
        info!(property_id = %id, "listing edited");
        Ok(Some(updated))
    }

    pub fn set_video_link(
        &self,
        id: PropertyId,
        link: Option<String>,
    ) -> Result<Option<Property>, MarketplaceServiceError> {
        let Some(mut property) = self.repository.fetch(id)? else {
            return Ok(None);
        };

        property.youtube_link = normalize_link(link);
        self.repository.update(property.clone())?;
        info!(property_id = %id, has_link = property.youtube_link.is_some(), "video link updated");
        Ok(Some(property))
    }

    pub fn payment_quote(
        &self,
        id: PropertyId,
    ) -> Result<Option<PaymentQuote>, MarketplaceServiceError> {
        let Some(property) = self.listing(id)? else {
            return Ok(None);
        };
        let settings = self.settings.read()?;

        Ok(Some(PaymentQuote {
            property_id: property.id,
            rent: property.rent,
            interest_fee: fee_for(&settings, FeeKind::Interest, property.rent)?,
            video_request_fee: fee_for(&settings, FeeKind::VideoRequest, property.rent)?,
            upi_id: settings.upi_id,
        }))
    }

    /// Record a tenant's interest and return the fee they are asked to pay.
    pub fn express_interest(
        &self,
        id: PropertyId,
        whatsapp_number: &str,
    ) -> Result<Option<InterestReceipt>, MarketplaceServiceError> {
        let whatsapp_number = contact(whatsapp_number)?;
        let Some(listed) = self.listing(id)? else {
            return Ok(None);
        };
        let settings = self.settings.read()?;
        let fee = fee_for(&settings, FeeKind::Interest, listed.rent)?;

        let Some(property) = self.repository.increment_interest(id)? else {
            return Ok(None);
        };
        info!(
            property_id = %id,
            interested = property.interested_tenants,
            fee,
            "interest confirmed"
        );

        Ok(Some(InterestReceipt {
            property,
            fee,
            upi_id: settings.upi_id,
            whatsapp_number,
        }))
    }

    pub fn request_video(
        &self,
        id: PropertyId,
        whatsapp_number: &str,
    ) -> Result<Option<VideoRequestReceipt>, MarketplaceServiceError> {
        let whatsapp_number = contact(whatsapp_number)?;
        let Some(property) = self.listing(id)? else {
            return Ok(None);
        };
        let settings = self.settings.read()?;
        let fee = fee_for(&settings, FeeKind::VideoRequest, property.rent)?;
        info!(property_id = %id, fee, "video requested");

        Ok(Some(VideoRequestReceipt {
            property_id: property.id,
            title: property.title,
            fee,
            upi_id: settings.upi_id,
            whatsapp_number,
        }))
    }

    pub fn compare(
        &self,
        ids: &[PropertyId],
    ) -> Result<Vec<ComparisonEntry>, MarketplaceServiceError> {
        let approved = self.repository.list(Some(ListingStatus::Approved))?;
        Ok(compare(&approved, ids)?)
    }

    pub fn settings(&self) -> Result<Settings, MarketplaceServiceError> {
        Ok(self.settings.read()?)
    }

    pub fn public_settings(&self) -> Result<PublicSettings, MarketplaceServiceError> {
        Ok(self.settings.read()?.public_view())
    }

    /// Validate and persist new settings; invalid schedules are never stored.
    pub fn update_settings(&self, settings: Settings) -> Result<Settings, MarketplaceServiceError> {
        settings.validate()?;
        self.settings.write(&settings)?;
        info!(upi_id = %settings.upi_id, "settings updated");
        Ok(settings)
    }
}

fn fee_for(settings: &Settings, kind: FeeKind, rent: u64) -> Result<u64, MarketplaceServiceError> {
    let schedule = settings
        .fee_schedule(kind)
        .map_err(MarketplaceServiceError::Misconfigured)?;
    Ok(schedule.resolve(rent))
}

fn contact(whatsapp_number: &str) -> Result<String, MarketplaceServiceError> {
    let trimmed = whatsapp_number.trim();
    if trimmed.is_empty() {
        Err(MarketplaceServiceError::MissingContact)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceServiceError {
    #[error(transparent)]
    Validation(#[from] PropertyValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Comparison(#[from] ComparisonError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("stored settings are unusable: {0}")]
    Misconfigured(SettingsError),
    #[error("a WhatsApp number is required")]
    MissingContact,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
