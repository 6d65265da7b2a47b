use metrics_exporter_prometheus::PrometheusHandle;
use rentease::error::AppError;
use rentease::marketplace::{
    Account, AccountId, AccountRepository, ListingStatus, NewAccount, Property, PropertyDraft,
    PropertyId, PropertyRepository, RepositoryError, Role, Settings, SettingsError, SettingsStore,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Property store keyed by id, so listings come back in id order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPropertyRepository {
    records: Arc<Mutex<BTreeMap<PropertyId, Property>>>,
    last_id: Arc<AtomicU64>,
}

impl InMemoryPropertyRepository {
    pub(crate) fn from_properties(properties: Vec<Property>) -> Self {
        let last_id = properties
            .iter()
            .map(|property| property.id.0)
            .max()
            .unwrap_or_default();
        let records = properties
            .into_iter()
            .map(|property| (property.id, property))
            .collect();
        Self {
            records: Arc::new(Mutex::new(records)),
            last_id: Arc::new(AtomicU64::new(last_id)),
        }
    }
}

impl PropertyRepository for InMemoryPropertyRepository {
    fn next_id(&self) -> Result<PropertyId, RepositoryError> {
        Ok(PropertyId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1))
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
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
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
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.remove(&id))
    }

    fn increment_interest(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get_mut(&id).map(|property| {
            property.interested_tenants = property.interested_tenants.saturating_add(1);
            property.clone()
        }))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAccountRepository {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    last_id: Arc<AtomicU64>,
}

impl InMemoryAccountRepository {
    /// Install the bootstrap administrator, replacing any account with that email.
    pub(crate) fn seed_admin(&self, email: &str, password_hash: &str) {
        let email = email.trim().to_lowercase();
        let account = Account {
            id: AccountId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1),
            name: "Administrator".to_string(),
            email: email.clone(),
            password_hash: password_hash.to_string(),
            role: Role::Admin,
        };
        self.accounts
            .lock()
            .expect("account mutex poisoned")
            .insert(email.clone(), account);
        info!(%email, "administrator account seeded");
    }
}

impl AccountRepository for InMemoryAccountRepository {
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
            id: AccountId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1),
            name: account.name,
            email: email.clone(),
            password_hash: account.password_hash,
            role: account.role,
        };
        guard.insert(email, stored.clone());
        Ok(stored)
    }
}

/// Settings held in memory and mirrored to a JSON file when a path is configured.
#[derive(Clone)]
pub(crate) struct LocalSettingsStore {
    path: Option<PathBuf>,
    current: Arc<Mutex<Settings>>,
}

impl LocalSettingsStore {
    /// Load settings from `path` if it exists, otherwise start from the defaults.
    pub(crate) fn open(path: Option<PathBuf>) -> Result<Self, AppError> {
        let settings = match path.as_deref() {
            Some(file) if file.exists() => read_settings(file)?,
            _ => Settings::default(),
        };
        settings.validate()?;

        Ok(Self {
            path,
            current: Arc::new(Mutex::new(settings)),
        })
    }
}

impl SettingsStore for LocalSettingsStore {
    fn read(&self) -> Result<Settings, SettingsError> {
        Ok(self.current.lock().expect("settings mutex poisoned").clone())
    }

    fn write(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut guard = self.current.lock().expect("settings mutex poisoned");
        if let Some(path) = &self.path {
            let payload = serde_json::to_vec_pretty(settings)
                .map_err(|err| SettingsError::Unavailable(err.to_string()))?;
            fs::write(path, payload).map_err(|err| {
                SettingsError::Unavailable(format!("writing {}: {err}", path.display()))
            })?;
        }
        *guard = settings.clone();
        Ok(())
    }
}

pub(crate) fn read_settings(path: &Path) -> Result<Settings, AppError> {
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw).map_err(|source| AppError::data(path, source))
}

/// Read a JSON array of listings, e.g. a seed file or an export.
///
/// Every row passes the same checks as a submitted draft and ids must be
/// unique within the file.
pub(crate) fn load_properties(path: &Path) -> Result<Vec<Property>, AppError> {
    let raw = fs::read(path)?;
    let rows: Vec<Property> =
        serde_json::from_slice(&raw).map_err(|source| AppError::data(path, source))?;

    let mut seen = BTreeSet::new();
    let mut properties = Vec::with_capacity(rows.len());
    for row in rows {
        let (id, status, interested) = (row.id, row.status, row.interested_tenants);
        if !seen.insert(id) {
            return Err(AppError::duplicate_listing(path, id));
        }
        let property = PropertyDraft::from(row)
            .into_property(id, status, interested)
            .map_err(|source| AppError::invalid_listing(path, id, source))?;
        properties.push(property);
    }

    info!(path = %path.display(), count = properties.len(), "listings loaded");
    Ok(properties)
}
