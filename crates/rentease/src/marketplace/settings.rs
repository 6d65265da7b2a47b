use serde::{Deserialize, Serialize};

use super::fees::{validate_tiers, FeeKind, FeeSchedule, FeeScheduleError, FeeTier};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub facebook: String,
    pub twitter: String,
    pub instagram: String,
}

/// Marketplace-wide settings edited from the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub upi_id: String,
    #[serde(default)]
    pub social_links: SocialLinks,
    pub interested_fees: Vec<FeeTier>,
    pub video_request_fees: Vec<FeeTier>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upi_id: "rentease@upi".to_string(),
            social_links: SocialLinks {
                facebook: "https://facebook.com/rentease".to_string(),
                twitter: "https://twitter.com/rentease".to_string(),
                instagram: "https://instagram.com/rentease".to_string(),
            },
            interested_fees: vec![
                FeeTier::up_to(10_000, 50),
                FeeTier::up_to(25_000, 100),
                FeeTier::above(200),
            ],
            video_request_fees: vec![
                FeeTier::up_to(10_000, 100),
                FeeTier::up_to(25_000, 150),
                FeeTier::above(250),
            ],
        }
    }
}

impl Settings {
    pub fn tiers(&self, kind: FeeKind) -> &[FeeTier] {
        match kind {
            FeeKind::Interest => &self.interested_fees,
            FeeKind::VideoRequest => &self.video_request_fees,
        }
    }

    pub fn fee_schedule(&self, kind: FeeKind) -> Result<FeeSchedule, SettingsError> {
        FeeSchedule::new(self.tiers(kind).to_vec())
            .map_err(|source| SettingsError::InvalidSchedule { kind, source })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for kind in [FeeKind::Interest, FeeKind::VideoRequest] {
            validate_tiers(self.tiers(kind))
                .map_err(|source| SettingsError::InvalidSchedule { kind, source })?;
        }
        Ok(())
    }

    pub fn public_view(&self) -> PublicSettings {
        PublicSettings {
            upi_id: self.upi_id.clone(),
            social_links: self.social_links.clone(),
        }
    }
}

/// The subset of settings shown to visitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub upi_id: String,
    pub social_links: SocialLinks,
}

/// Persistence for the settings record. Implementations own durability; callers
/// validate before writing.
pub trait SettingsStore: Send + Sync {
    fn read(&self) -> Result<Settings, SettingsError>;
    fn write(&self, settings: &Settings) -> Result<(), SettingsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid {} schedule: {source}", .kind.label())]
    InvalidSchedule {
        kind: FeeKind,
        #[source]
        source: FeeScheduleError,
    },
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}
