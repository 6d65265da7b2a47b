//! Tiered fee schedules.
//!
//! A schedule is an ascending list of `(maxRent, fee)` tiers whose final tier is
//! unbounded. A rent belongs to the first tier whose bound is at or above it, so a
//! rent sitting exactly on a boundary is charged the lower tier's fee.

use serde::{Deserialize, Serialize};

/// One row of a fee schedule. `max_rent: None` marks the open-ended final tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTier {
    pub max_rent: Option<u64>,
    pub fee: u64,
}

impl FeeTier {
    pub const fn up_to(max_rent: u64, fee: u64) -> Self {
        Self {
            max_rent: Some(max_rent),
            fee,
        }
    }

    pub const fn above(fee: u64) -> Self {
        Self {
            max_rent: None,
            fee,
        }
    }

    fn covers(&self, rent: u64) -> bool {
        match self.max_rent {
            Some(bound) => rent <= bound,
            None => true,
        }
    }
}

/// Which of the two marketplace schedules a fee comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Interest,
    VideoRequest,
}

impl FeeKind {
    pub const fn label(self) -> &'static str {
        match self {
            FeeKind::Interest => "interestedFees",
            FeeKind::VideoRequest => "videoRequestFees",
        }
    }
}

/// A validated, ready to query fee schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeeSchedule {
    tiers: Vec<FeeTier>,
}

impl FeeSchedule {
    pub fn new(tiers: Vec<FeeTier>) -> Result<Self, FeeScheduleError> {
        validate_tiers(&tiers)?;
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[FeeTier] {
        &self.tiers
    }

    pub fn resolve(&self, rent: u64) -> u64 {
        lookup(&self.tiers, rent)
    }

    /// Inclusive rent ranges per tier, as shown on the admin settings table.
    pub fn bands(&self) -> Vec<FeeBand> {
        let mut floor = 0;
        self.tiers
            .iter()
            .map(|tier| {
                let band = FeeBand {
                    min_rent: floor,
                    max_rent: tier.max_rent,
                    fee: tier.fee,
                };
                if let Some(bound) = tier.max_rent {
                    floor = bound.saturating_add(1);
                }
                band
            })
            .collect()
    }
}

/// Display row for a tier: `min_rent..=max_rent`, open ended when `max_rent` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBand {
    pub min_rent: u64,
    pub max_rent: Option<u64>,
    pub fee: u64,
}

impl FeeBand {
    pub fn label(&self) -> String {
        match self.max_rent {
            Some(max) => format!("{} - {}", self.min_rent, max),
            None => format!("{} - Above", self.min_rent),
        }
    }
}

/// Resolve a fee against an unvalidated tier table.
pub fn resolve_fee(rent: u64, tiers: &[FeeTier]) -> Result<u64, FeeScheduleError> {
    validate_tiers(tiers)?;
    Ok(lookup(tiers, rent))
}

pub fn validate_tiers(tiers: &[FeeTier]) -> Result<(), FeeScheduleError> {
    let last = tiers.len().checked_sub(1).ok_or(FeeScheduleError::Empty)?;
    let mut previous: Option<u64> = None;

    for (index, tier) in tiers.iter().enumerate() {
        match tier.max_rent {
            None if index != last => return Err(FeeScheduleError::UnboundedTierNotLast { index }),
            None => {}
            Some(bound) => {
                if index == last {
                    return Err(FeeScheduleError::MissingUnboundedTier);
                }
                if let Some(prev) = previous {
                    if bound <= prev {
                        return Err(FeeScheduleError::NotAscending {
                            index,
                            previous: prev,
                            max_rent: bound,
                        });
                    }
                }
                previous = Some(bound);
            }
        }
    }

    Ok(())
}

// Callers validate first; the fallback to the last tier only matters for
// unvalidated input and keeps this total.
fn lookup(tiers: &[FeeTier], rent: u64) -> u64 {
    tiers
        .iter()
        .find(|tier| tier.covers(rent))
        .or_else(|| tiers.last())
        .map(|tier| tier.fee)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeScheduleError {
    #[error("fee schedule must contain at least one tier")]
    Empty,
    #[error("tier {index} has max rent {max_rent}, which is not above the previous bound {previous}")]
    NotAscending {
        index: usize,
        previous: u64,
        max_rent: u64,
    },
    #[error("tier {index} is unbounded but is not the final tier")]
    UnboundedTierNotLast { index: usize },
    #[error("the final tier must be unbounded")]
    MissingUnboundedTier,
}
