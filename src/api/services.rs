use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};

use super::{auth::authenticate, error::ApiError, models::SubscribeForm, state::AppState};
use crate::feed::{FetchError, LocateError};
use crate::storage::DatabaseError;
use crate::subscribe::{subscribe, SubscribeError, SubscribeOutcome};

/// Subscribe the caller to the feed behind a URL (POST /subscriptions)
///
/// Takes the `url` form field (falling back to a `?url=` query parameter),
/// discovers its feed, and stores it. Responds 201 with an empty body on
/// success and 409 when the feed is already tracked by anyone.
pub async fn create_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<SubscribeForm>, QueryRejection>,
    form: Result<Form<SubscribeForm>, FormRejection>,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;

    let from_body = form.ok().and_then(|Form(form)| provided(form.url));
    let url = from_body
        .or_else(|| query.ok().and_then(|Query(query)| provided(query.url)))
        .ok_or_else(|| {
            ApiError::BadRequest("Insufficient parameters: URL was not provided".to_owned())
        })?;

    match subscribe(&state.fetcher, &state.db, user.id, &url).await {
        Ok(SubscribeOutcome::Inserted(_)) => Ok(StatusCode::CREATED),
        Ok(SubscribeOutcome::Conflict { .. }) => Err(ApiError::DuplicateSubscription),
        Err(e) => Err(subscribe_failure(&url, e)),
    }
}

/// List the caller's subscriptions (GET /subscriptions)
pub async fn list_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &headers).await?;

    let subs = state.db.list_subscriptions(user.id).await.map_err(|e| {
        tracing::error!(operation = "list_subscriptions", user_id = user.id, error = %e, "Database error");
        ApiError::Store
    })?;

    let body = serde_json::to_vec(&subs).map_err(|e| {
        tracing::error!(operation = "list_subscriptions", user_id = user.id, error = %e, "JSON encoding error");
        ApiError::Encoding
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Remove one of the caller's subscriptions (DELETE /subscriptions/{id})
///
/// Ids that do not exist, are not numeric, or belong to another user all
/// answer 404.
pub async fn delete_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;

    let id: i64 = id.parse().map_err(|_| ApiError::NotFound)?;

    match state.db.delete_subscription(id, user.id).await {
        Ok(()) => {
            tracing::info!(user_id = user.id, id, "Subscription deleted");
            Ok(StatusCode::OK)
        }
        Err(DatabaseError::NotFound) => Err(ApiError::NotFound),
        Err(e) => {
            tracing::error!(operation = "delete_subscription", user_id = user.id, id, error = %e, "Database error");
            Err(ApiError::Store)
        }
    }
}

/// A trimmed, non-blank parameter value.
fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Logs a failed subscribe request and picks what the client is told.
fn subscribe_failure(url: &str, err: SubscribeError) -> ApiError {
    let stage = err.stage();
    match err {
        SubscribeError::Locate(LocateError::Fetch(FetchError::InvalidUrl(reason))) => {
            tracing::debug!(%stage, url = %url, reason = %reason, "Rejected subscribe URL");
            ApiError::BadRequest("Invalid URL".to_owned())
        }
        SubscribeError::Locate(LocateError::FeedNotFound) => {
            tracing::info!(%stage, url = %url, "No feed found");
            ApiError::FeedNotFound("Feed URL not found".to_owned())
        }
        SubscribeError::Locate(LocateError::RefusedHint { href, reason }) => {
            tracing::warn!(%stage, url = %url, href = %href, reason = %reason, "Page links to a refused feed URL");
            ApiError::FeedNotFound("Feed URL not allowed".to_owned())
        }
        SubscribeError::Locate(LocateError::Fetch(e)) => {
            tracing::warn!(%stage, url = %url, error = %e, "Could not fetch URL");
            ApiError::FeedNotFound("Could not fetch URL".to_owned())
        }
        SubscribeError::Locate(e) => {
            tracing::warn!(%stage, url = %url, error = %e, "Could not read document");
            ApiError::FeedNotFound("Could not read document at URL".to_owned())
        }
        SubscribeError::Store(e) => {
            tracing::error!(%stage, url = %url, error = %e, "Database error");
            ApiError::Store
        }
    }
}
