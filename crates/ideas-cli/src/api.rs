//! JSON API over the idea store.
//!
//! Transport-free: [`handle`] takes the parts of a request it needs and
//! returns a status plus a JSON body; `server` adapts it to hyper.
//!
//! ```text
//! GET    /healthz
//! POST   /api/auth/register | /api/auth/login      GET /api/auth/me
//! PUT    /api/users/me/profile | /api/users/me/password
//! GET    /api/ideas            POST /api/ideas
//! GET    /api/ideas/{id}       PUT  /api/ideas/{id}   DELETE /api/ideas/{id}
//! POST   /api/ideas/{id}/like  POST /api/ideas/{id}/save
//! GET    /api/ideas/{id}/reviews                      POST /api/ideas/{id}/reviews
//! POST   /api/reviews/{id}/helpful                    PUT  /api/reviews/{id}/status
//! ```

use hyper::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use url::form_urlencoded;
use uuid::Uuid;

use ideas_auth::{
    bearer_token, check_password_strength, ensure_admin, ensure_owner_or_admin, AuthError, Claims,
    PasswordHasher, TokenIssuer,
};
use ideas_model::{
    BusinessModel, Category, Contact, Idea, IdeaId, IdeaPatch, IdeaStatus, InvestmentRange, MarketSize,
    NewIdea, NewReview, NewUser, Profile, ReviewId, ReviewStatus, Role, TimeToStart, User,
};
use ideas_storage::query::DEFAULT_PER_PAGE;
use ideas_storage::{IdeaQuery, IdeaStore, StoreError};

/// Everything a request handler needs.
pub struct AppState {
    pub store: IdeaStore,
    pub tokens: TokenIssuer,
    pub hasher: Arc<dyn PasswordHasher>,
}

pub struct ApiRequest<'a> {
    pub method: Method,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub authorization: Option<&'a str>,
    pub body: &'a [u8],
}

#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Auth(AuthError::WeakPassword { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::Hash(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Store(StoreError::Validation(_) | StoreError::InvalidBatchRecord { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::Connection { .. } | StoreError::Persist { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

type ApiResult = Result<(StatusCode, Value), ApiError>;

pub async fn handle(state: &AppState, req: ApiRequest<'_>) -> ApiResponse {
    let segments: Vec<&str> = req
        .path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match route(state, &req, &segments).await {
        Ok((status, body)) => ApiResponse { status, body },
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(method = %req.method, path = req.path, error = %e, "request failed");
            } else {
                tracing::debug!(method = %req.method, path = req.path, %status, error = %e, "request rejected");
            }
            ApiResponse {
                status,
                body: json!({ "error": e.to_string() }),
            }
        }
    }
}

async fn route(state: &AppState, req: &ApiRequest<'_>, segments: &[&str]) -> ApiResult {
    match (req.method.clone(), segments) {
        (Method::GET, ["healthz"]) => Ok((StatusCode::OK, json!({ "status": "ok" }))),

        (Method::POST, ["api", "auth", "register"]) => register(state, req).await,
        (Method::POST, ["api", "auth", "login"]) => login(state, req).await,
        (Method::GET, ["api", "auth", "me"]) => me(state, req),
        (Method::PUT, ["api", "users", "me", "profile"]) => update_profile(state, req).await,
        (Method::PUT, ["api", "users", "me", "password"]) => change_password(state, req).await,

        (Method::GET, ["api", "ideas"]) => list_ideas(state, req),
        (Method::POST, ["api", "ideas"]) => create_idea(state, req).await,
        (Method::GET, ["api", "ideas", id]) => get_idea(state, req, parse_id(id)?).await,
        (Method::PUT, ["api", "ideas", id]) => update_idea(state, req, parse_id(id)?).await,
        (Method::DELETE, ["api", "ideas", id]) => delete_idea(state, req, parse_id(id)?).await,
        (Method::POST, ["api", "ideas", id, "like"]) => like_idea(state, req, parse_id(id)?).await,
        (Method::POST, ["api", "ideas", id, "save"]) => save_idea(state, req, parse_id(id)?).await,
        (Method::GET, ["api", "ideas", id, "reviews"]) => list_reviews(state, req, parse_id(id)?),
        (Method::POST, ["api", "ideas", id, "reviews"]) => {
            create_review(state, req, parse_id(id)?).await
        }

        (Method::POST, ["api", "reviews", id, "helpful"]) => {
            mark_helpful(state, req, parse_id(id)?).await
        }
        (Method::PUT, ["api", "reviews", id, "status"]) => {
            moderate_review(state, req, parse_id(id)?).await
        }

        _ => Err(ApiError::NotFound),
    }
}

// ============================================================================
// Request helpers
// ============================================================================

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid id `{raw}`")))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

fn require_claims(state: &AppState, req: &ApiRequest<'_>) -> Result<Claims, ApiError> {
    let token = bearer_token(req.authorization)?;
    Ok(state.tokens.verify(token)?)
}

/// Anonymous requests are fine; a bad token is not.
fn optional_claims(state: &AppState, req: &ApiRequest<'_>) -> Result<Option<Claims>, ApiError> {
    match req.authorization {
        None => Ok(None),
        Some(_) => require_claims(state, req).map(Some),
    }
}

fn current_user(state: &AppState, claims: &Claims) -> Result<User, ApiError> {
    state
        .store
        .get_user(claims.sub)
        .ok_or_else(|| AuthError::InvalidToken("user no longer exists".to_string()).into())
}

fn query_params(query: Option<&str>) -> HashMap<String, String> {
    form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

fn label_param<T>(params: &HashMap<String, String>, key: &str) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| ApiError::BadRequest(format!("{key}: {e}"))),
    }
}

fn bool_param(params: &HashMap<String, String>, key: &str) -> Result<Option<bool>, ApiError> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(ApiError::BadRequest(format!("{key}: expected a boolean, got `{other}`"))),
    }
}

/// Build an [`IdeaQuery`] from `GET /api/ideas` parameters.
pub fn idea_query(params: &HashMap<String, String>) -> Result<IdeaQuery, ApiError> {
    let mut query = IdeaQuery::default();
    let filter = &mut query.filter;

    filter.search = params
        .get("search")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    filter.category = label_param::<Category>(params, "category")?;
    filter.investment_range = label_param::<InvestmentRange>(params, "investmentRange")?;
    filter.time_to_start = label_param::<TimeToStart>(params, "timeToStart")?;
    filter.market_size = label_param::<MarketSize>(params, "marketSize")?;
    filter.business_model = label_param::<BusinessModel>(params, "businessModel")?;
    filter.status = label_param::<IdeaStatus>(params, "status")?;
    filter.featured = bool_param(params, "featured")?;
    filter.is_static_idea = match params.get("source").map(|s| s.trim()) {
        None | Some("") | Some("all") => None,
        Some("static") => Some(true),
        Some("community") => Some(false),
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "source: expected all|static|community, got `{other}`"
            )))
        }
    };

    if let Some(sort) = label_param(params, "sort")? {
        query.sort = sort;
    }
    query.page = label_param(params, "page")?.unwrap_or(1);
    query.per_page = label_param(params, "perPage")?.unwrap_or(DEFAULT_PER_PAGE);
    Ok(query)
}

fn session(state: &AppState, user: &User) -> Result<Value, ApiError> {
    let token = state.tokens.issue(user)?;
    Ok(json!({ "token": token, "user": user.to_public() }))
}

// ============================================================================
// Auth and users
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChange {
    current_password: String,
    new_password: String,
}

// Hashing runs on the blocking pool, off the connection tasks.
async fn hash_password(state: &AppState, password: String) -> Result<String, ApiError> {
    let hasher = Arc::clone(&state.hasher);
    let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task: {e}")))?;
    Ok(hashed?)
}

async fn verify_password(state: &AppState, password: String, hash: String) -> Result<bool, ApiError> {
    let hasher = Arc::clone(&state.hasher);
    let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password check task: {e}")))?;
    Ok(verified?)
}

async fn register(state: &AppState, req: &ApiRequest<'_>) -> ApiResult {
    let body: RegisterRequest = parse_body(req.body)?;
    check_password_strength(&body.password)?;
    let password_hash = hash_password(state, body.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            name: body.name,
            email: body.email,
            password_hash,
            role: Role::User,
        })
        .await?;
    tracing::info!(user = %user.id, "user registered");
    Ok((StatusCode::CREATED, session(state, &user)?))
}

async fn login(state: &AppState, req: &ApiRequest<'_>) -> ApiResult {
    let body: LoginRequest = parse_body(req.body)?;
    let user = state
        .store
        .find_user_by_email(&body.email)
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(state, body.password, user.password_hash.clone()).await? {
        return Err(AuthError::InvalidCredentials.into());
    }
    Ok((StatusCode::OK, session(state, &user)?))
}

fn me(state: &AppState, req: &ApiRequest<'_>) -> ApiResult {
    let claims = require_claims(state, req)?;
    let user = current_user(state, &claims)?;
    Ok((StatusCode::OK, json!({ "user": user.to_public() })))
}

async fn update_profile(state: &AppState, req: &ApiRequest<'_>) -> ApiResult {
    let claims = require_claims(state, req)?;
    let update: Profile = parse_body(req.body)?;
    let user = state.store.update_profile(claims.sub, update).await?;
    Ok((StatusCode::OK, json!({ "user": user.to_public() })))
}

async fn change_password(state: &AppState, req: &ApiRequest<'_>) -> ApiResult {
    let claims = require_claims(state, req)?;
    let body: PasswordChange = parse_body(req.body)?;
    let user = current_user(state, &claims)?;
    if !verify_password(state, body.current_password, user.password_hash.clone()).await? {
        return Err(AuthError::InvalidCredentials.into());
    }
    check_password_strength(&body.new_password)?;
    let password_hash = hash_password(state, body.new_password).await?;
    state.store.update_password_hash(user.id, password_hash).await?;
    Ok((StatusCode::OK, json!({ "updated": true })))
}

// ============================================================================
// Ideas
// ============================================================================

/// What a user submits; provenance and counters are filled in server-side.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdeaSubmission {
    title: String,
    description: String,
    category: Category,
    investment_range: InvestmentRange,
    time_to_start: TimeToStart,
    business_model: BusinessModel,
    market_size: MarketSize,
    #[serde(default)]
    target_audience: String,
    #[serde(default)]
    competitive_advantage: String,
    #[serde(default)]
    challenges: String,
    key_features: Vec<String>,
    revenue_streams: Vec<String>,
    required_skills: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    image: Option<String>,
    contact: Contact,
    #[serde(default)]
    status: IdeaStatus,
}

impl IdeaSubmission {
    fn into_new_idea(self, owner: &User) -> NewIdea {
        NewIdea {
            original_id: None,
            title: self.title,
            description: self.description,
            category: self.category,
            investment_range: self.investment_range,
            time_to_start: self.time_to_start,
            business_model: self.business_model,
            market_size: self.market_size,
            target_audience: self.target_audience,
            competitive_advantage: self.competitive_advantage,
            challenges: self.challenges,
            key_features: self.key_features,
            revenue_streams: self.revenue_streams,
            required_skills: self.required_skills,
            tags: self.tags,
            image: self.image,
            contact: self.contact,
            status: self.status,
            is_static_idea: false,
            featured: false,
            uploaded_by: owner.id,
            uploaded_by_email: owner.email.clone(),
            uploaded_by_name: owner.name.clone(),
            views: 0,
            likes: 0,
        }
    }
}

fn list_ideas(state: &AppState, req: &ApiRequest<'_>) -> ApiResult {
    let claims = optional_claims(state, req)?;
    let params = query_params(req.query);
    let mut query = idea_query(&params)?;

    if bool_param(&params, "mine")?.unwrap_or(false) {
        let claims = claims.as_ref().ok_or(AuthError::MissingToken)?;
        query.filter.uploaded_by = Some(claims.sub);
    } else if !claims.as_ref().is_some_and(Claims::is_admin) {
        query.filter.status = Some(IdeaStatus::Published);
    }

    let page = state.store.query_ideas(&query);
    Ok((StatusCode::OK, to_json(&page)?))
}

async fn create_idea(state: &AppState, req: &ApiRequest<'_>) -> ApiResult {
    let claims = require_claims(state, req)?;
    let owner = current_user(state, &claims)?;
    let submission: IdeaSubmission = parse_body(req.body)?;
    let idea = state.store.insert_idea(submission.into_new_idea(&owner)).await?;
    tracing::info!(idea = %idea.id, owner = %owner.id, "idea submitted");
    Ok((StatusCode::CREATED, json!({ "idea": idea })))
}

fn can_see(claims: Option<&Claims>, status: IdeaStatus, owner: Uuid) -> bool {
    status == IdeaStatus::Published || claims.is_some_and(|c| c.sub == owner || c.is_admin())
}

/// The idea if it exists and `claims` may see it; drafts and archived ideas
/// are 404 to everyone but their owner and admins.
fn visible_idea(state: &AppState, claims: Option<&Claims>, id: IdeaId) -> Result<Idea, ApiError> {
    state
        .store
        .get_idea(id)
        .filter(|idea| can_see(claims, idea.content.status, idea.content.uploaded_by))
        .ok_or(ApiError::NotFound)
}

async fn get_idea(state: &AppState, req: &ApiRequest<'_>, id: IdeaId) -> ApiResult {
    let claims = optional_claims(state, req)?;
    visible_idea(state, claims.as_ref(), id)?;
    let idea = state.store.record_view(id).await?;
    let average_rating = state.store.average_rating(id);
    Ok((
        StatusCode::OK,
        json!({ "idea": idea, "averageRating": average_rating }),
    ))
}

async fn update_idea(state: &AppState, req: &ApiRequest<'_>, id: IdeaId) -> ApiResult {
    let claims = require_claims(state, req)?;
    let idea = state.store.get_idea(id).ok_or(ApiError::NotFound)?;
    ensure_owner_or_admin(&claims, idea.content.uploaded_by)?;

    let patch: IdeaPatch = parse_body(req.body)?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest("nothing to update".to_string()));
    }
    if patch.featured.is_some() {
        ensure_admin(&claims)?;
    }
    let idea = state.store.update_idea(id, patch).await?;
    Ok((StatusCode::OK, json!({ "idea": idea })))
}

async fn delete_idea(state: &AppState, req: &ApiRequest<'_>, id: IdeaId) -> ApiResult {
    let claims = require_claims(state, req)?;
    let idea = state.store.get_idea(id).ok_or(ApiError::NotFound)?;
    ensure_owner_or_admin(&claims, idea.content.uploaded_by)?;
    state.store.delete_idea(id).await?;
    tracing::info!(idea = %id, by = %claims.sub, "idea deleted");
    Ok((StatusCode::OK, json!({ "deleted": id })))
}

async fn like_idea(state: &AppState, req: &ApiRequest<'_>, id: IdeaId) -> ApiResult {
    let claims = require_claims(state, req)?;
    visible_idea(state, Some(&claims), id)?;
    let (idea, liked) = state.store.toggle_like(id, claims.sub).await?;
    Ok((
        StatusCode::OK,
        json!({ "liked": liked, "likes": idea.content.likes }),
    ))
}

async fn save_idea(state: &AppState, req: &ApiRequest<'_>, id: IdeaId) -> ApiResult {
    let claims = require_claims(state, req)?;
    visible_idea(state, Some(&claims), id)?;
    let saved = state.store.toggle_save(id, claims.sub).await?;
    Ok((StatusCode::OK, json!({ "saved": saved })))
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewSubmission {
    comment: String,
    rating: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate {
    status: ReviewStatus,
}

fn list_reviews(state: &AppState, req: &ApiRequest<'_>, idea: IdeaId) -> ApiResult {
    let claims = optional_claims(state, req)?;
    visible_idea(state, claims.as_ref(), idea)?;
    let include_unmoderated = claims.as_ref().is_some_and(Claims::is_admin);
    let reviews = state.store.reviews_for_idea(idea, include_unmoderated);
    Ok((
        StatusCode::OK,
        json!({
            "reviews": reviews,
            "averageRating": state.store.average_rating(idea),
        }),
    ))
}

async fn create_review(state: &AppState, req: &ApiRequest<'_>, idea: IdeaId) -> ApiResult {
    let claims = require_claims(state, req)?;
    visible_idea(state, Some(&claims), idea)?;
    let user = current_user(state, &claims)?;
    let body: ReviewSubmission = parse_body(req.body)?;
    let review = state
        .store
        .create_review(NewReview {
            idea_id: idea,
            user_id: user.id,
            user_name: user.name,
            comment: body.comment,
            rating: body.rating,
        })
        .await?;
    Ok((StatusCode::CREATED, json!({ "review": review })))
}

async fn mark_helpful(state: &AppState, req: &ApiRequest<'_>, id: ReviewId) -> ApiResult {
    require_claims(state, req)?;
    let review = state.store.mark_review_helpful(id).await?;
    Ok((StatusCode::OK, json!({ "helpful": review.helpful })))
}

async fn moderate_review(state: &AppState, req: &ApiRequest<'_>, id: ReviewId) -> ApiResult {
    let claims = require_claims(state, req)?;
    ensure_admin(&claims)?;
    let update: StatusUpdate = parse_body(req.body)?;
    let review = state.store.set_review_status(id, update.status).await?;
    tracing::info!(review = %id, status = %review.status, "review moderated");
    Ok((StatusCode::OK, json!({ "review": review })))
}
