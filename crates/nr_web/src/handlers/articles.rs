use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use nr_core::{
    ArticleDraft, ArticleOrdering, ArticleQuery, ArticleStorage, CommentQuery, CommentStorage,
    Error, Slice,
};
use serde::Deserialize;
use tracing::info;

use super::{parse_id, store_upload};
use crate::error::ApiError;
use crate::extract::Payload;
use crate::pagination::{page_number, Paginated};
use crate::serializers::{ArticleAction, ArticleComments, CommentView, Envelope, Message};
use crate::AppState;

const CREATED: &str = "Article created successfully";
const UPDATED: &str = "Article updated successfully";
const DELETED: &str = "Article deleted successfully";

#[derive(Debug, Default, Deserialize)]
pub struct ListArticlesQuery {
    search: Option<String>,
    ordering: Option<String>,
    page: Option<String>,
}

async fn find(state: &AppState, raw_id: &str) -> Result<nr_core::Article, ApiError> {
    let id = parse_id(raw_id, "Article")?;
    state
        .storage
        .find_article(id)
        .await?
        .ok_or_else(|| Error::not_found("Article", id).into())
}

// GET /api/articles/
pub async fn list_articles(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListArticlesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = page_number(params.page.as_deref(), state.config.page_size)?;
    let query = ArticleQuery {
        search: params.search,
        ordering: ArticleOrdering::parse(params.ordering.as_deref()),
    };

    let listing = state
        .storage
        .list_articles(&query, Slice::page(page, state.config.page_size))
        .await?;
    let results = state
        .serializer()
        .articles(listing.items, ArticleAction::List)
        .await?;

    Ok(Json(Paginated::new(
        &state.config,
        &uri,
        page,
        listing.total,
        results,
    )?))
}

// POST /api/articles/
pub async fn create_article(
    State(state): State<AppState>,
    mut payload: Payload,
) -> Result<impl IntoResponse, ApiError> {
    let upload = payload.take_file("image");
    let mut article = payload.parse::<ArticleDraft>()?.into_new()?;
    if let Some(upload) = upload {
        article.image = Some(store_upload(&state, upload).await?);
    }

    let article = state.storage.insert_article(article).await?;
    info!("📰 Created article {}: {}", article.id, article.title);

    let data = state.serializer().article(article, ArticleAction::Create).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(CREATED, data))))
}

// GET /api/articles/:id/
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let article = find(&state, &id).await?;
    let data = state.serializer().article(article, ArticleAction::Retrieve).await?;
    Ok(Json(data))
}

async fn update(
    state: AppState,
    raw_id: &str,
    mut payload: Payload,
    partial: bool,
) -> Result<impl IntoResponse, ApiError> {
    let id = find(&state, raw_id).await?.id;

    let upload = payload.take_file("image");
    let mut changes = payload.parse::<ArticleDraft>()?.into_changes(partial)?;
    if let Some(upload) = upload {
        changes.image = Some(Some(store_upload(&state, upload).await?));
    }

    let article = state
        .storage
        .update_article(id, changes)
        .await?
        .ok_or_else(|| Error::not_found("Article", id))?;
    info!("📝 Updated article {}", id);

    let data = state.serializer().article(article, ArticleAction::Update).await?;
    Ok(Json(Envelope::new(UPDATED, data)))
}

// PUT /api/articles/:id/
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<impl IntoResponse, ApiError> {
    update(state, &id, payload, false).await
}

// PATCH /api/articles/:id/
pub async fn patch_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<impl IntoResponse, ApiError> {
    update(state, &id, payload, true).await
}

// DELETE /api/articles/:id/
pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Article")?;
    if !state.storage.delete_article(id).await? {
        return Err(Error::not_found("Article", id).into());
    }
    info!("🗑️ Deleted article {} and its comments", id);
    Ok(Json(Message { message: DELETED }))
}

// GET /api/articles/:id/comments/
pub async fn get_article_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let article = find(&state, &id).await?;
    let comments = state
        .storage
        .list_comments(&CommentQuery::for_article(article.id), Slice::all())
        .await?;

    Ok(Json(ArticleComments {
        article_title: article.title,
        comment_count: comments.total,
        comments: comments.items.into_iter().map(CommentView::from).collect(),
    }))
}

// GET /api/articles/recent/
pub async fn get_recent_articles(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state
        .storage
        .list_articles(&ArticleQuery::default(), Slice::first(state.config.recent_limit))
        .await?;
    let data = state
        .serializer()
        .articles(listing.items, ArticleAction::Recent)
        .await?;
    Ok(Json(data))
}
