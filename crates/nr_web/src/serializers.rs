//! Wire representations of articles and comments.
//!
//! Which representation a handler answers with is decided by
//! [`article_shape`] and [`comment_shape`], keyed on the action being served.

use chrono::{DateTime, Utc};
use nr_core::{
    Article, ArticleStorage, Comment, CommentQuery, CommentStorage, Error, Slice, Storage,
};
use serde::Serialize;

use crate::config::WebConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleAction {
    List,
    Recent,
    Create,
    Retrieve,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleShape {
    /// No nested comments.
    Summary,
    Detail,
}

pub const fn article_shape(action: ArticleAction) -> ArticleShape {
    match action {
        ArticleAction::List | ArticleAction::Recent => ArticleShape::Summary,
        ArticleAction::Create | ArticleAction::Retrieve | ArticleAction::Update => {
            ArticleShape::Detail
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    List,
    Create,
    Retrieve,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentShape {
    Plain,
    /// Plain plus the title of the article the comment was added to.
    CreationEcho,
}

pub const fn comment_shape(action: CommentAction) -> CommentShape {
    match action {
        CommentAction::Create => CommentShape::CreationEcho,
        CommentAction::List | CommentAction::Retrieve | CommentAction::Update => {
            CommentShape::Plain
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub body: String,
    pub image: Option<String>,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: ArticleSummary,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ArticleRepr {
    Summary(ArticleSummary),
    Detail(ArticleDetail),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub body: String,
    pub article_id: i64,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author_name: comment.author_name,
            created_at: comment.created_at,
            body: comment.body,
            article_id: comment.article_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreated {
    #[serde(flatten)]
    pub comment: CommentView,
    pub article_title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommentRepr {
    Plain(CommentView),
    CreationEcho(CommentCreated),
}

/// Response of `GET /api/articles/{id}/comments/`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleComments {
    pub article_title: String,
    pub comment_count: u64,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self { message, data }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Turns stored rows into wire shapes. Computed fields (nested comments,
/// `articleTitle`, image URLs) are resolved here at response time.
pub struct Serializer<'a> {
    storage: &'a dyn Storage,
    config: &'a WebConfig,
}

impl<'a> Serializer<'a> {
    pub fn new(storage: &'a dyn Storage, config: &'a WebConfig) -> Self {
        Self { storage, config }
    }

    /// Stored image references are either absolute URLs, returned as they
    /// are, or paths relative to the media root.
    pub fn image_url(&self, stored: &str) -> String {
        if stored.starts_with("http://") || stored.starts_with("https://") {
            return stored.to_string();
        }
        self.config
            .absolute(&format!("media/{}", stored.trim_start_matches('/')))
            .to_string()
    }

    pub fn summary(&self, article: Article) -> ArticleSummary {
        ArticleSummary {
            id: article.id,
            title: article.title,
            published_at: article.published_at,
            body: article.body,
            image: article.image.as_deref().map(|i| self.image_url(i)),
            comment_count: article.comment_count,
        }
    }

    pub async fn article(
        &self,
        article: Article,
        action: ArticleAction,
    ) -> Result<ArticleRepr, Error> {
        match article_shape(action) {
            ArticleShape::Summary => Ok(ArticleRepr::Summary(self.summary(article))),
            ArticleShape::Detail => {
                let comments = self
                    .storage
                    .list_comments(&CommentQuery::for_article(article.id), Slice::all())
                    .await?;
                Ok(ArticleRepr::Detail(ArticleDetail {
                    article: self.summary(article),
                    comments: comments.items.into_iter().map(CommentView::from).collect(),
                }))
            }
        }
    }

    pub async fn articles(
        &self,
        articles: Vec<Article>,
        action: ArticleAction,
    ) -> Result<Vec<ArticleRepr>, Error> {
        let mut out = Vec::with_capacity(articles.len());
        for article in articles {
            out.push(self.article(article, action).await?);
        }
        Ok(out)
    }

    pub async fn comment(
        &self,
        comment: Comment,
        action: CommentAction,
    ) -> Result<CommentRepr, Error> {
        match comment_shape(action) {
            CommentShape::Plain => Ok(CommentRepr::Plain(comment.into())),
            CommentShape::CreationEcho => {
                let article = self
                    .storage
                    .find_article(comment.article_id)
                    .await?
                    .ok_or_else(|| Error::not_found("Article", comment.article_id))?;
                Ok(CommentRepr::CreationEcho(CommentCreated {
                    comment: comment.into(),
                    article_title: article.title,
                }))
            }
        }
    }
}
