use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::auth::{AccountRepository, AuthError, AuthService, Credentials, Registration, Role};
use super::comparison::parse_ids;
use super::domain::{ListingStatus, PropertyDraft, PropertyId};
use super::query::{ListingSearchParams, SearchParamError};
use super::repository::{PropertyRepository, RepositoryError};
use super::service::{MarketplaceService, MarketplaceServiceError};
use super::settings::{Settings, SettingsError, SettingsStore};

/// Shared handler state: the marketplace service and the auth service.
pub struct MarketplaceState<R, S, A> {
    pub marketplace: Arc<MarketplaceService<R, S>>,
    pub auth: Arc<AuthService<A>>,
}

impl<R, S, A> Clone for MarketplaceState<R, S, A> {
    fn clone(&self) -> Self {
        Self {
            marketplace: Arc::clone(&self.marketplace),
            auth: Arc::clone(&self.auth),
        }
    }
}

/// Router builder exposing the public, tenant and admin endpoints.
pub fn marketplace_router<R, S, A>(state: MarketplaceState<R, S, A>) -> Router
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    Router::new()
        .route(
            "/api/properties",
            get(list_handler::<R, S, A>).post(submit_handler::<R, S, A>),
        )
        .route("/api/properties/:id", get(detail_handler::<R, S, A>))
        .route("/api/properties/:id/quote", get(quote_handler::<R, S, A>))
        .route(
            "/api/properties/:id/interest",
            post(interest_handler::<R, S, A>),
        )
        .route(
            "/api/properties/:id/video-request",
            post(video_request_handler::<R, S, A>),
        )
        .route("/api/compare", get(compare_handler::<R, S, A>))
        .route(
            "/api/settings/public",
            get(public_settings_handler::<R, S, A>),
        )
        .route("/api/auth/login", post(login_handler::<R, S, A>))
        .route("/api/auth/register", post(register_handler::<R, S, A>))
        .route(
            "/api/admin/properties",
            get(admin_list_handler::<R, S, A>),
        )
        .route(
            "/api/admin/properties/:id",
            put(edit_handler::<R, S, A>).delete(remove_handler::<R, S, A>),
        )
        .route(
            "/api/admin/properties/:id/video",
            patch(video_link_handler::<R, S, A>),
        )
        .route(
            "/api/admin/properties/:id/approve",
            post(approve_handler::<R, S, A>),
        )
        .route(
            "/api/admin/properties/:id/reject",
            post(reject_handler::<R, S, A>),
        )
        .route(
            "/api/admin/settings",
            get(settings_handler::<R, S, A>).put(update_settings_handler::<R, S, A>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContactRequest {
    pub(crate) whatsapp_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoLinkRequest {
    #[serde(default)]
    pub(crate) youtube_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdminListParams {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) whatsapp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareParams {
    pub(crate) ids: String,
}

pub(crate) async fn list_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    params: Result<Query<ListingSearchParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let Query(params) = params?;
    let query = params.into_query()?;
    let listings = state.marketplace.listings(&query)?;
    Ok((StatusCode::OK, Json(listings)).into_response())
}

pub(crate) async fn detail_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let id = PropertyId(id?.0);
    let property = state
        .marketplace
        .listing(id)?
        .ok_or(ApiError::NotFound(id))?;
    Ok((StatusCode::OK, Json(property)).into_response())
}

pub(crate) async fn submit_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
    draft: Result<Json<PropertyDraft>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Member)?;
    let Json(draft) = draft?;
    let stored = state.marketplace.submit(draft)?;
    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

pub(crate) async fn quote_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let id = PropertyId(id?.0);
    let quote = state
        .marketplace
        .payment_quote(id)?
        .ok_or(ApiError::NotFound(id))?;
    Ok((StatusCode::OK, Json(quote)).into_response())
}

pub(crate) async fn interest_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    id: Result<Path<u64>, PathRejection>,
    request: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let id = PropertyId(id?.0);
    let Json(request) = request?;
    let receipt = state
        .marketplace
        .express_interest(id, &request.whatsapp_number)?
        .ok_or(ApiError::NotFound(id))?;
    Ok((StatusCode::OK, Json(receipt)).into_response())
}

pub(crate) async fn video_request_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    id: Result<Path<u64>, PathRejection>,
    request: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let id = PropertyId(id?.0);
    let Json(request) = request?;
    let receipt = state
        .marketplace
        .request_video(id, &request.whatsapp_number)?
        .ok_or(ApiError::NotFound(id))?;
    Ok((StatusCode::ACCEPTED, Json(receipt)).into_response())
}

pub(crate) async fn compare_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    params: Result<Query<CompareParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let Query(params) = params?;
    let ids = parse_ids(&params.ids).map_err(MarketplaceServiceError::from)?;
    let entries = state.marketplace.compare(&ids)?;
    Ok((StatusCode::OK, Json(entries)).into_response())
}

pub(crate) async fn public_settings_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let settings = state.marketplace.public_settings()?;
    Ok((StatusCode::OK, Json(settings)).into_response())
}

pub(crate) async fn login_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    credentials: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let Json(credentials) = credentials?;
    let session = state.auth.login(credentials)?;
    Ok((StatusCode::OK, Json(session)).into_response())
}

pub(crate) async fn register_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    registration: Result<Json<Registration>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    let Json(registration) = registration?;
    let account = state.auth.register(registration)?;
    let payload = json!({
        "id": account.id,
        "email": account.email,
        "role": account.role,
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

pub(crate) async fn admin_list_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
    params: Result<Query<AdminListParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Admin)?;
    let Query(params) = params?;
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            Some(ListingStatus::parse(raw).ok_or_else(|| ApiError::InvalidStatus(raw.to_string()))?)
        }
    };
    let records = state
        .marketplace
        .admin_listings(status, params.whatsapp.as_deref().unwrap_or_default())?;
    Ok((StatusCode::OK, Json(records)).into_response())
}

pub(crate) async fn edit_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
    id: Result<Path<u64>, PathRejection>,
    draft: Result<Json<PropertyDraft>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Admin)?;
    let id = PropertyId(id?.0);
    let Json(draft) = draft?;
    let updated = state
        .marketplace
        .edit(id, draft)?
        .ok_or(ApiError::NotFound(id))?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

pub(crate) async fn video_link_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
    id: Result<Path<u64>, PathRejection>,
    request: Result<Json<VideoLinkRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Admin)?;
    let id = PropertyId(id?.0);
    let Json(request) = request?;
    let updated = state
        .marketplace
        .set_video_link(id, request.youtube_link)?
        .ok_or(ApiError::NotFound(id))?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

pub(crate) async fn approve_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Admin)?;
    let id = PropertyId(id?.0);
    let outcome = state
        .marketplace
        .approve(id)?
        .ok_or(ApiError::NotFound(id))?;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}

pub(crate) async fn reject_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Admin)?;
    let id = PropertyId(id?.0);
    state
        .marketplace
        .reject(id)?
        .ok_or(ApiError::NotFound(id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn remove_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Admin)?;
    let id = PropertyId(id?.0);
    state
        .marketplace
        .remove(id)?
        .ok_or(ApiError::NotFound(id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn settings_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Admin)?;
    let settings = state.marketplace.settings()?;
    Ok((StatusCode::OK, Json(settings)).into_response())
}

pub(crate) async fn update_settings_handler<R, S, A>(
    State(state): State<MarketplaceState<R, S, A>>,
    headers: HeaderMap,
    settings: Result<Json<Settings>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: PropertyRepository + 'static,
    S: SettingsStore + 'static,
    A: AccountRepository + 'static,
{
    state.auth.authorize(&headers, Role::Admin)?;
    let Json(settings) = settings?;
    let stored = state.marketplace.update_settings(settings)?;
    Ok((StatusCode::OK, Json(stored)).into_response())
}

/// Handler error mapped onto an HTTP status and a JSON `{"error": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Service(MarketplaceServiceError),
    Search(SearchParamError),
    NotFound(PropertyId),
    InvalidStatus(String),
    /// Path, query or body that could not be extracted.
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(error) => match error {
                AuthError::MissingToken | AuthError::InvalidToken | AuthError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::InvalidRegistration(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::Repository(_) | AuthError::Signing(_) | AuthError::Hashing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Service(error) => match error {
                MarketplaceServiceError::Validation(_)
                | MarketplaceServiceError::Comparison(_)
                | MarketplaceServiceError::MissingContact
                | MarketplaceServiceError::Settings(SettingsError::InvalidSchedule { .. }) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                MarketplaceServiceError::Transition(_)
                | MarketplaceServiceError::Repository(RepositoryError::Conflict) => {
                    StatusCode::CONFLICT
                }
                MarketplaceServiceError::Repository(RepositoryError::NotFound) => {
                    StatusCode::NOT_FOUND
                }
                MarketplaceServiceError::Settings(SettingsError::Unavailable(_))
                | MarketplaceServiceError::Misconfigured(_)
                | MarketplaceServiceError::Repository(RepositoryError::Unavailable(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Search(_) | ApiError::InvalidStatus(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Auth(error) => write!(f, "{error}"),
            ApiError::Service(error) => write!(f, "{error}"),
            ApiError::Search(error) => write!(f, "{error}"),
            ApiError::NotFound(id) => write!(f, "property {id} not found"),
            ApiError::InvalidStatus(raw) => {
                write!(f, "unknown status '{raw}', expected pending or approved")
            }
            ApiError::Rejected { message, .. } => write!(f, "{message}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<MarketplaceServiceError> for ApiError {
    fn from(value: MarketplaceServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<SearchParamError> for ApiError {
    fn from(value: SearchParamError) -> Self {
        Self::Search(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::Rejected {
            status: value.status(),
            message: value.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::Rejected {
            status: value.status(),
            message: value.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self::Rejected {
            status: value.status(),
            message: value.body_text(),
        }
    }
}
