//! End-to-end marketplace flow through the public router: an owner submits a
//! listing, an admin approves it and adjusts fees, and tenants find and pay for it.

mod common {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use secrecy::SecretString;

    use rentease::marketplace::{
        marketplace_router, hash_password, Account, AccountId, AccountRepository, AuthService,
        ListingStatus, MarketplaceService, MarketplaceState, NewAccount, Property, PropertyId,
        PropertyRepository, RepositoryError, Role, Settings, SettingsError, SettingsStore,
        TokenAuthority,
    };

    pub(super) const ADMIN_EMAIL: &str = "admin@rentease.test";
    pub(super) const ADMIN_PASSWORD: &str = "admin-password";

    #[derive(Default)]
    pub(super) struct Listings {
        records: Mutex<BTreeMap<PropertyId, Property>>,
        last_id: Mutex<u64>,
    }

    impl PropertyRepository for Listings {
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
            guard.insert(property.id, property);
            Ok(())
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
                property.interested_tenants += 1;
                property.clone()
            }))
        }
    }

    #[derive(Default)]
    pub(super) struct SettingsCell(Mutex<Settings>);

    impl SettingsStore for SettingsCell {
        fn read(&self) -> Result<Settings, SettingsError> {
            Ok(self.0.lock().expect("settings mutex poisoned").clone())
        }

        fn write(&self, settings: &Settings) -> Result<(), SettingsError> {
            *self.0.lock().expect("settings mutex poisoned") = settings.clone();
            Ok(())
        }
    }

    #[derive(Default)]
    pub(super) struct Accounts(Mutex<HashMap<String, Account>>);

    impl AccountRepository for Accounts {
        fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
            Ok(self.0.lock().expect("account mutex poisoned").get(email).cloned())
        }

        fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError> {
            let mut guard = self.0.lock().expect("account mutex poisoned");
            if guard.contains_key(&account.email) {
                return Err(RepositoryError::Conflict);
            }
            let stored = Account {
                id: AccountId(guard.len() as u64 + 1),
                name: account.name,
                email: account.email,
                password_hash: account.password_hash,
                role: account.role,
            };
            guard.insert(stored.email.clone(), stored.clone());
            Ok(stored)
        }
    }

    pub(super) fn router() -> Router {
        let accounts = Arc::new(Accounts::default());
        accounts
            .insert(NewAccount {
                name: "Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password_hash: hash_password(ADMIN_PASSWORD, 4).expect("password hashes"),
                role: Role::Admin,
            })
            .expect("admin seeded");

        let tokens = TokenAuthority::new(SecretString::from("workflow-secret".to_string()), 1);
        marketplace_router(MarketplaceState {
            marketplace: Arc::new(MarketplaceService::new(
                Arc::new(Listings::default()),
                Arc::new(SettingsCell::default()),
            )),
            auth: Arc::new(AuthService::new(accounts, tokens).with_cost(4)),
        })
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("valid json")
    };
    (status, payload)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serializes")))
        .expect("request builds")
}

fn listing_payload(title: &str, rent: u64, bedrooms: u32) -> Value {
    json!({
        "title": title,
        "type": "Independent House",
        "bedrooms": bedrooms,
        "bathrooms": 2,
        "area": 1200.5,
        "rent": rent,
        "location": "Indiranagar, Bangalore",
        "pinCode": "560038",
        "nearbyPlaces": ["100ft Road", "Metro"],
        "availableFrom": "2025-12-01",
        "ownerWhatsApp": "+919812345678",
        "furnishings": { "ac": 2, "geyser": 2, "tv": 1, "table": 1, "chair": 4 },
        "tenantPreferences": { "family": true, "familySize": "5" },
        "additionalFacilities": { "parking": true }
    })
}

#[tokio::test]
async fn submitted_listing_goes_live_after_approval_and_collects_interest() {
    let router = common::router();

    let (status, registered) = call(
        &router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Owner", "email": "owner@rentease.test", "password": "owner-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["role"], "member");

    let (_, member) = call(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "owner@rentease.test", "password": "owner-password" }),
        ),
    )
    .await;
    let member_token = member["token"].as_str().expect("member token").to_string();

    let (status, created) = call(
        &router,
        json_request(
            "POST",
            "/api/properties",
            Some(&member_token),
            listing_payload("Family house", 30_000, 3),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_u64().expect("numeric id");

    let (_, public) = call(
        &router,
        Request::get("/api/properties").body(Body::empty()).expect("request"),
    )
    .await;
    assert_eq!(public, json!([]));

    let (status, _) = call(
        &router,
        json_request(
            "POST",
            &format!("/api/admin/properties/{id}/approve"),
            Some(&member_token),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, admin) = call(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": common::ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }),
        ),
    )
    .await;
    let admin_token = admin["token"].as_str().expect("admin token").to_string();

    let (status, approved) = call(
        &router,
        json_request(
            "POST",
            &format!("/api/admin/properties/{id}/approve"),
            Some(&admin_token),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["transition"], "approved");

    let (_, found) = call(
        &router,
        Request::get("/api/properties?q=indiranagar&bedrooms=3&maxRent=30000")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(found.as_array().map(Vec::len), Some(1));
    assert_eq!(found[0]["type"], "Independent House");

    let (status, _) = call(
        &router,
        json_request(
            "PUT",
            "/api/admin/settings",
            Some(&admin_token),
            json!({
                "upiId": "owner-fees@upi",
                "socialLinks": { "facebook": "", "twitter": "", "instagram": "" },
                "interestedFees": [
                    { "maxRent": 30000, "fee": 120 },
                    { "maxRent": null, "fee": 300 }
                ],
                "videoRequestFees": [{ "maxRent": null, "fee": 180 }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, quote) = call(
        &router,
        Request::get(format!("/api/properties/{id}/quote"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["interestFee"], 120);
    assert_eq!(quote["videoRequestFee"], 180);
    assert_eq!(quote["upiId"], "owner-fees@upi");

    let (status, receipt) = call(
        &router,
        json_request(
            "POST",
            &format!("/api/properties/{id}/interest"),
            None,
            json!({ "whatsappNumber": "+919800011122" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["fee"], 120);
    assert_eq!(receipt["property"]["interestedTenants"], 1);

    let (status, video) = call(
        &router,
        json_request(
            "POST",
            &format!("/api/properties/{id}/video-request"),
            None,
            json!({ "whatsappNumber": "+919800011122" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(video["fee"], 180);
}
