//! Admin dashboard view model.
//!
//! Holds the dashboard's own copy of the visible and pending collections. Fetch
//! responses are tagged with tickets so a slow, older response cannot overwrite
//! data from a newer request. Mutations are applied only after the store has
//! confirmed them and advance the sequence of every collection they touch, so
//! a fetch issued before a confirmed mutation is dropped when it lands. Every
//! mutation is followed by an explicit [`DashboardState::view`] recompute.

use serde::Serialize;

use super::domain::{ListingStatus, Property, PropertyId};
use super::query::filter_by_owner_whatsapp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Listings,
    Pending,
}

/// Handle returned when a fetch is issued; pass it back with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    collection: Collection,
    sequence: u64,
}

impl FetchTicket {
    pub fn collection(&self) -> Collection {
        self.collection
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    listings: Vec<Property>,
    pending: Vec<Property>,
    whatsapp_search: String,
    issued: u64,
    applied_listings: u64,
    applied_pending: u64,
}

/// What the dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub listings: Vec<Property>,
    pub pending: Vec<Property>,
    pub whatsapp_search: String,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self, collection: Collection) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            collection,
            sequence: self.issued,
        }
    }

    /// Apply a completed fetch. Returns `false` when a newer response or a
    /// newer confirmed mutation has already been applied to the same collection.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, properties: Vec<Property>) -> bool {
        let (applied, target) = match ticket.collection {
            Collection::Listings => (&mut self.applied_listings, &mut self.listings),
            Collection::Pending => (&mut self.applied_pending, &mut self.pending),
        };
        if ticket.sequence <= *applied {
            return false;
        }
        *applied = ticket.sequence;
        *target = properties;
        true
    }

    /// Record a confirmed mutation so older in-flight fetches are dropped.
    fn settle(&mut self, collections: &[Collection]) {
        self.issued += 1;
        for collection in collections {
            match collection {
                Collection::Listings => self.applied_listings = self.issued,
                Collection::Pending => self.applied_pending = self.issued,
            }
        }
    }

    pub fn set_whatsapp_search(&mut self, search: impl Into<String>) {
        self.whatsapp_search = search.into();
    }

    /// Move a pending record into the visible collection. A second call for
    /// the same id finds nothing pending and changes nothing.
    pub fn approve(&mut self, id: PropertyId) -> bool {
        let Some(position) = self.pending.iter().position(|p| p.id == id) else {
            return false;
        };
        let mut property = self.pending.remove(position);
        property.status = ListingStatus::Approved;
        if !self.listings.iter().any(|p| p.id == id) {
            self.listings.push(property);
        }
        self.settle(&[Collection::Listings, Collection::Pending]);
        true
    }

    pub fn reject(&mut self, id: PropertyId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        let changed = before != self.pending.len();
        if changed {
            self.settle(&[Collection::Pending]);
        }
        changed
    }

    pub fn remove(&mut self, id: PropertyId) -> bool {
        let before = self.listings.len();
        self.listings.retain(|p| p.id != id);
        let changed = before != self.listings.len();
        if changed {
            self.settle(&[Collection::Listings]);
        }
        changed
    }

    pub fn replace(&mut self, property: Property) -> bool {
        let Some(slot) = self.listings.iter_mut().find(|p| p.id == property.id) else {
            return false;
        };
        *slot = property;
        self.settle(&[Collection::Listings]);
        true
    }

    pub fn set_video_link(&mut self, id: PropertyId, link: Option<String>) -> bool {
        let Some(property) = self.listings.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        property.youtube_link = link;
        self.settle(&[Collection::Listings]);
        true
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            listings: filter_by_owner_whatsapp(&self.listings, &self.whatsapp_search),
            pending: self.pending.clone(),
            whatsapp_search: self.whatsapp_search.clone(),
        }
    }
}
