use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use secrecy::SecretString;
use serde_json::Value;

use crate::marketplace::auth::{
    hash_password, Account, AccountId, AccountRepository, AuthService, NewAccount, Role,
    TokenAuthority,
};
use crate::marketplace::domain::{
    AdditionalFacilities, Furnishings, ListingStatus, Property, PropertyDraft, PropertyId,
    PropertyType, TenantPreferences,
};
use crate::marketplace::repository::{PropertyRepository, RepositoryError};
use crate::marketplace::settings::{Settings, SettingsError, SettingsStore};
use crate::marketplace::{marketplace_router, MarketplaceService, MarketplaceState};

pub(super) const ADMIN_EMAIL: &str = "admin@rentease.test";
pub(super) const ADMIN_PASSWORD: &str = "correct-horse";
/// Lowest bcrypt work factor; keeps hashing fast in tests.
pub(super) const TEST_COST: u32 = 4;

pub(super) fn draft(title: &str, location: &str, rent: u64) -> PropertyDraft {
    PropertyDraft {
        title: title.to_string(),
        property_type: PropertyType::Apartment,
        bedrooms: 2,
        bathrooms: 1,
        area: 850.0,
        rent,
        location: location.to_string(),
        pin_code: "560034".to_string(),
        nearby_places: vec!["Metro Station".to_string(), "City Mall".to_string()],
        youtube_link: None,
        available_from: NaiveDate::from_ymd_opt(2025, 11, 1).expect("valid date"),
        owner_whatsapp: "+919800000001".to_string(),
        furnishings: Furnishings {
            ac: 1,
            geyser: 1,
            tv: 0,
            table: 1,
            chair: 2,
        },
        tenant_preferences: TenantPreferences {
            students: true,
            family: true,
            family_size: "4".to_string(),
            ..TenantPreferences::default()
        },
        additional_facilities: AdditionalFacilities {
            wifi: true,
            parking: true,
            ..AdditionalFacilities::default()
        },
    }
}

pub(super) fn property(id: u64, title: &str, location: &str, rent: u64) -> Property {
    draft(title, location, rent)
        .into_property(PropertyId(id), ListingStatus::Approved, 0)
        .expect("fixture is valid")
}

pub(super) fn with_interest(mut property: Property, interested: u32) -> Property {
    property.interested_tenants = interested;
    property
}

pub(super) fn pending(mut property: Property) -> Property {
    property.status = ListingStatus::Pending;
    property
}

pub(super) fn build_service() -> (
    MarketplaceService<MemoryRepository, MemorySettings>,
    Arc<MemoryRepository>,
    Arc<MemorySettings>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let settings = Arc::new(MemorySettings::default());
    let service = MarketplaceService::new(repository.clone(), settings.clone());
    (service, repository, settings)
}

pub(super) fn token_authority() -> TokenAuthority {
    TokenAuthority::new(SecretString::from("test-signing-secret".to_string()), 1)
}

pub(super) fn build_auth() -> (AuthService<MemoryAccounts>, Arc<MemoryAccounts>) {
    let accounts = Arc::new(MemoryAccounts::default());
    accounts
        .insert(NewAccount {
            name: "Admin".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password_hash: hash_password(ADMIN_PASSWORD, TEST_COST).expect("password hashes"),
            role: Role::Admin,
        })
        .expect("admin seeded");
    let auth = AuthService::new(accounts.clone(), token_authority()).with_cost(TEST_COST);
    (auth, accounts)
}

pub(super) type TestState = MarketplaceState<MemoryRepository, MemorySettings, MemoryAccounts>;

pub(super) fn build_state() -> (TestState, Arc<MemoryRepository>, Arc<MemorySettings>) {
    let (service, repository, settings) = build_service();
    let (auth, _) = build_auth();
    let state = MarketplaceState {
        marketplace: Arc::new(service),
        auth: Arc::new(auth),
    };
    (state, repository, settings)
}

pub(super) fn build_router() -> (Router, Arc<MemoryRepository>, Arc<MemorySettings>) {
    let (state, repository, settings) = build_state();
    (marketplace_router(state), repository, settings)
}

pub(super) fn token_for(role: Role) -> String {
    let account = Account {
        id: AccountId(match role {
            Role::Admin => 1,
            Role::Member => 2,
        }),
        name: "Tester".to_string(),
        email: "tester@rentease.test".to_string(),
        password_hash: String::new(),
        role,
    };
    token_authority().issue(&account).expect("token issued")
}

pub(super) fn bearer(role: Role) -> String {
    format!("Bearer {}", token_for(role))
}

pub(super) fn auth_headers(role: Role) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&bearer(role)).expect("header value"),
    );
    headers
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<BTreeMap<PropertyId, Property>>,
    last_id: Mutex<u64>,
}

impl MemoryRepository {
    pub(super) fn seed(&self, property: Property) {
        let mut last = self.last_id.lock().expect("id mutex poisoned");
        *last = (*last).max(property.id.0);
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(property.id, property);
    }

    pub(super) fn get(&self, id: u64) -> Option<Property> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&PropertyId(id))
            .cloned()
    }

    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl PropertyRepository for MemoryRepository {
    fn next_id(&self) -> Result<PropertyId, RepositoryError> {
        let mut last = self.last_id.lock().expect("id mutex poisoned");
        *last += 1;
        Ok(PropertyId(*last))
    }

    fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(property.id, property.clone());
        Ok(property)
    }

    fn update(&self, property: Property) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&property.id) {
            Some(slot) => {
                *slot = property;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Ok(self.get(id.0))
    }

    fn list(&self, status: Option<ListingStatus>) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|property| status.map_or(true, |wanted| property.status == wanted))
            .cloned()
            .collect())
    }

    fn delete(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("repository mutex poisoned")
            .remove(&id))
    }

    fn increment_interest(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get_mut(&id).map(|property| {
            property.interested_tenants += 1;
            property.clone()
        }))
    }
}

pub(super) struct UnavailableRepository;

impl PropertyRepository for UnavailableRepository {
    fn next_id(&self) -> Result<PropertyId, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn insert(&self, _property: Property) -> Result<Property, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn update(&self, _property: Property) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn list(&self, _status: Option<ListingStatus>) -> Result<Vec<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn delete(&self, _id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn increment_interest(&self, _id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemorySettings {
    current: Mutex<Settings>,
}

impl MemorySettings {
    /// Bypasses validation to simulate a corrupted store.
    pub(super) fn overwrite(&self, settings: Settings) {
        *self.current.lock().expect("settings mutex poisoned") = settings;
    }

    pub(super) fn snapshot(&self) -> Settings {
        self.current.lock().expect("settings mutex poisoned").clone()
    }
}

impl SettingsStore for MemorySettings {
    fn read(&self) -> Result<Settings, SettingsError> {
        Ok(self.snapshot())
    }

    fn write(&self, settings: &Settings) -> Result<(), SettingsError> {
        self.overwrite(settings.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryAccounts {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryAccounts {
    pub(super) fn count(&self) -> usize {
        self.accounts.lock().expect("account mutex poisoned").len()
    }
}

impl AccountRepository for MemoryAccounts {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let guard = self.accounts.lock().expect("account mutex poisoned");
        Ok(guard.get(&email.to_lowercase()).cloned())
    }

    fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut guard = self.accounts.lock().expect("account mutex poisoned");
        let email = account.email.to_lowercase();
        if guard.contains_key(&email) {
            return Err(RepositoryError::Conflict);
        }
        let stored = Account {
            id: AccountId(guard.len() as u64 + 1),
            name: account.name,
            email: email.clone(),
            password_hash: account.password_hash,
            role: account.role,
        };
        guard.insert(email, stored.clone());
        Ok(stored)
    }
}
