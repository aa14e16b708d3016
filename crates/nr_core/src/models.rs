use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published news item as read back from storage.
///
/// `comment_count` is computed by the backend on every read and is never
/// written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub comment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub article_id: i64,
}

/// Validated input for a new article. Build it through
/// [`crate::validation::ArticleDraft`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
}

/// Validated changes to an existing article. `None` leaves the stored value
/// untouched; `image: Some(None)` clears the image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<Option<String>>,
}

impl ArticleChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.image.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub article_id: i64,
    pub author_name: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentChanges {
    pub author_name: Option<String>,
    pub body: Option<String>,
}

impl CommentChanges {
    pub fn is_empty(&self) -> bool {
        self.author_name.is_none() && self.body.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }

    fn from_prefix(raw: &str) -> (Self, &str) {
        match raw.strip_prefix('-') {
            Some(field) => (Direction::Descending, field),
            None => (Direction::Ascending, raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleField {
    PublishedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleOrdering {
    pub field: ArticleField,
    pub direction: Direction,
}

impl Default for ArticleOrdering {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: ArticleField::PublishedAt,
            direction: Direction::Descending,
        }
    }
}

impl ArticleOrdering {
    /// Parses an `ordering` query value such as `-publishedAt` or `title`.
    /// Unknown fields fall back to the default ordering.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::default();
        };
        let (direction, field) = Direction::from_prefix(raw);
        let field = match field {
            "publishedAt" | "published_at" => ArticleField::PublishedAt,
            "title" => ArticleField::Title,
            _ => return Self::default(),
        };
        Self { field, direction }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentOrdering {
    pub direction: Direction,
}

impl Default for CommentOrdering {
    fn default() -> Self {
        Self {
            direction: Direction::Descending,
        }
    }
}

impl CommentOrdering {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::default();
        };
        match Direction::from_prefix(raw) {
            (direction, "createdAt" | "created_at") => Self { direction },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleQuery {
    /// Case-insensitive substring matched against title and body.
    pub search: Option<String>,
    pub ordering: ArticleOrdering,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentQuery {
    pub article_id: Option<i64>,
    pub author_name: Option<String>,
    pub ordering: CommentOrdering,
}

impl CommentQuery {
    pub fn for_article(article_id: i64) -> Self {
        Self {
            article_id: Some(article_id),
            ..Self::default()
        }
    }
}

/// The slice of an ordered result set a listing should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Slice {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn first(limit: u64) -> Self {
        Self {
            offset: 0,
            limit: Some(limit),
        }
    }

    /// 1-based page of `size` items.
    pub fn page(page: u64, size: u64) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(size),
            limit: Some(size),
        }
    }
}

/// One slice of a listing plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub total: u64,
    pub items: Vec<T>,
}
