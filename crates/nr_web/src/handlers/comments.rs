use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use nr_core::{CommentDraft, CommentOrdering, CommentQuery, CommentStorage, Error, Slice};
use serde::Deserialize;
use tracing::info;

use super::parse_id;
use crate::error::ApiError;
use crate::extract::Payload;
use crate::pagination::{page_number, Paginated};
use crate::serializers::{CommentAction, Envelope, Message};
use crate::AppState;

const CREATED: &str = "Comment added successfully";
const UPDATED: &str = "Comment updated successfully";
const DELETED: &str = "Comment deleted successfully";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsQuery {
    article_id: Option<String>,
    author_name: Option<String>,
    ordering: Option<String>,
    page: Option<String>,
}

impl ListCommentsQuery {
    fn to_query(&self) -> Result<CommentQuery, ApiError> {
        let article_id = match self.article_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| ApiError::validation("articleId", "Enter a whole number."))?,
            ),
        };
        Ok(CommentQuery {
            article_id,
            author_name: self.author_name.clone().filter(|name| !name.is_empty()),
            ordering: CommentOrdering::parse(self.ordering.as_deref()),
        })
    }
}

// GET /api/comments/
pub async fn list_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListCommentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = page_number(params.page.as_deref(), state.config.page_size)?;
    let query = params.to_query()?;

    let listing = state
        .storage
        .list_comments(&query, Slice::page(page, state.config.page_size))
        .await?;

    let serializer = state.serializer();
    let mut results = Vec::with_capacity(listing.items.len());
    for comment in listing.items {
        results.push(serializer.comment(comment, CommentAction::List).await?);
    }

    Ok(Json(Paginated::new(
        &state.config,
        &uri,
        page,
        listing.total,
        results,
    )?))
}

// POST /api/comments/
pub async fn create_comment(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<impl IntoResponse, ApiError> {
    let comment = payload.parse::<CommentDraft>()?.into_new()?;
    let comment = state.storage.insert_comment(comment).await?;
    info!(
        "💬 Comment {} by {} on article {}",
        comment.id, comment.author_name, comment.article_id
    );

    let data = state.serializer().comment(comment, CommentAction::Create).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(CREATED, data))))
}

// GET /api/comments/:id/
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Comment")?;
    let comment = state
        .storage
        .find_comment(id)
        .await?
        .ok_or_else(|| Error::not_found("Comment", id))?;

    let data = state.serializer().comment(comment, CommentAction::Retrieve).await?;
    Ok(Json(data))
}

async fn update(
    state: AppState,
    raw_id: &str,
    payload: Payload,
    partial: bool,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(raw_id, "Comment")?;
    if state.storage.find_comment(id).await?.is_none() {
        return Err(Error::not_found("Comment", id).into());
    }

    let changes = payload.parse::<CommentDraft>()?.into_changes(partial)?;
    let comment = state
        .storage
        .update_comment(id, changes)
        .await?
        .ok_or_else(|| Error::not_found("Comment", id))?;
    info!("📝 Updated comment {}", id);

    let data = state.serializer().comment(comment, CommentAction::Update).await?;
    Ok(Json(Envelope::new(UPDATED, data)))
}

// PUT /api/comments/:id/
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<impl IntoResponse, ApiError> {
    update(state, &id, payload, false).await
}

// PATCH /api/comments/:id/
pub async fn patch_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<impl IntoResponse, ApiError> {
    update(state, &id, payload, true).await
}

// DELETE /api/comments/:id/
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Comment")?;
    if !state.storage.delete_comment(id).await? {
        return Err(Error::not_found("Comment", id).into());
    }
    info!("🗑️ Deleted comment {}", id);
    Ok(Json(Message { message: DELETED }))
}
