use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nr_core::{
    missing_article, Article, ArticleChanges, ArticleField, ArticleQuery, ArticleStorage, Comment,
    CommentChanges, CommentQuery, CommentStorage, Direction, Listing, NewArticle, NewComment,
    Result, Slice,
};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::StorageBackend;

#[derive(Debug, Clone)]
struct StoredArticle {
    id: i64,
    title: String,
    body: String,
    image: Option<String>,
    published_at: DateTime<Utc>,
}

/// Plain in-process tables. Ids are never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Vec<StoredArticle>,
    comments: Vec<Comment>,
    last_article_id: i64,
    last_comment_id: i64,
}

impl MemoryStore {
    fn comment_count(&self, article_id: i64) -> u64 {
        self.comments
            .iter()
            .filter(|c| c.article_id == article_id)
            .count() as u64
    }

    fn read_article(&self, stored: &StoredArticle) -> Article {
        Article {
            id: stored.id,
            title: stored.title.clone(),
            body: stored.body.clone(),
            image: stored.image.clone(),
            published_at: stored.published_at,
            comment_count: self.comment_count(stored.id),
        }
    }

    fn find_article(&self, id: i64) -> Option<Article> {
        self.articles
            .iter()
            .find(|a| a.id == id)
            .map(|a| self.read_article(a))
    }

    fn insert_article(&mut self, article: NewArticle) -> Article {
        self.last_article_id += 1;
        let stored = StoredArticle {
            id: self.last_article_id,
            title: article.title,
            body: article.body,
            image: article.image,
            published_at: Utc::now(),
        };
        let article = self.read_article(&stored);
        self.articles.push(stored);
        article
    }

    fn list_articles(&self, query: &ArticleQuery, slice: Slice) -> Listing<Article> {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<&StoredArticle> = self
            .articles
            .iter()
            .filter(|a| match &needle {
                Some(needle) => {
                    a.title.to_lowercase().contains(needle.as_str())
                        || a.body.to_lowercase().contains(needle.as_str())
                }
                None => true,
            })
            .collect();

        matches.sort_by(|a, b| {
            let ord = match query.ordering.field {
                ArticleField::PublishedAt => a.published_at.cmp(&b.published_at),
                ArticleField::Title => a.title.cmp(&b.title),
            };
            directed(ord.then(a.id.cmp(&b.id)), query.ordering.direction)
        });

        cut(matches, slice, |a| self.read_article(a))
    }

    fn update_article(&mut self, id: i64, changes: ArticleChanges) -> Option<Article> {
        let stored = self.articles.iter_mut().find(|a| a.id == id)?;
        if let Some(title) = changes.title {
            stored.title = title;
        }
        if let Some(body) = changes.body {
            stored.body = body;
        }
        if let Some(image) = changes.image {
            stored.image = image;
        }
        self.find_article(id)
    }

    fn delete_article(&mut self, id: i64) -> bool {
        let before = self.articles.len();
        self.articles.retain(|a| a.id != id);
        if self.articles.len() == before {
            return false;
        }
        self.comments.retain(|c| c.article_id != id);
        true
    }

    fn insert_comment(&mut self, comment: NewComment) -> Result<Comment> {
        if !self.articles.iter().any(|a| a.id == comment.article_id) {
            return Err(missing_article(comment.article_id));
        }
        self.last_comment_id += 1;
        let comment = Comment {
            id: self.last_comment_id,
            author_name: comment.author_name,
            body: comment.body,
            created_at: Utc::now(),
            article_id: comment.article_id,
        };
        self.comments.push(comment.clone());
        Ok(comment)
    }

    fn list_comments(&self, query: &CommentQuery, slice: Slice) -> Listing<Comment> {
        let mut matches: Vec<&Comment> = self
            .comments
            .iter()
            .filter(|c| query.article_id.map_or(true, |id| c.article_id == id))
            .filter(|c| {
                query
                    .author_name
                    .as_deref()
                    .map_or(true, |name| c.author_name == name)
            })
            .collect();

        matches.sort_by(|a, b| {
            let ord = a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id));
            directed(ord, query.ordering.direction)
        });

        cut(matches, slice, |c| (*c).clone())
    }

    fn update_comment(&mut self, id: i64, changes: CommentChanges) -> Option<Comment> {
        let comment = self.comments.iter_mut().find(|c| c.id == id)?;
        if let Some(author_name) = changes.author_name {
            comment.author_name = author_name;
        }
        if let Some(body) = changes.body {
            comment.body = body;
        }
        Some(comment.clone())
    }

    fn delete_comment(&mut self, id: i64) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != id);
        self.comments.len() != before
    }
}

fn directed(ord: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    }
}

fn cut<T, U>(items: Vec<T>, slice: Slice, read: impl Fn(&T) -> U) -> Listing<U> {
    let total = items.len() as u64;
    let limit = slice.limit.map_or(usize::MAX, |l| l as usize);
    let items = items
        .iter()
        .skip(slice.offset as usize)
        .take(limit)
        .map(read)
        .collect();
    Listing { total, items }
}

/// Storage backed by process memory. Everything is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_url: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn insert_article(&self, article: NewArticle) -> Result<Article> {
        let article = self.store.write().await.insert_article(article);
        debug!("Stored article {}", article.id);
        Ok(article)
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>> {
        Ok(self.store.read().await.find_article(id))
    }

    async fn list_articles(&self, query: &ArticleQuery, slice: Slice) -> Result<Listing<Article>> {
        Ok(self.store.read().await.list_articles(query, slice))
    }

    async fn update_article(&self, id: i64, changes: ArticleChanges) -> Result<Option<Article>> {
        Ok(self.store.write().await.update_article(id, changes))
    }

    async fn delete_article(&self, id: i64) -> Result<bool> {
        Ok(self.store.write().await.delete_article(id))
    }
}

#[async_trait]
impl CommentStorage for MemoryStorage {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        let comment = self.store.write().await.insert_comment(comment)?;
        debug!("Stored comment {} on article {}", comment.id, comment.article_id);
        Ok(comment)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>> {
        Ok(self
            .store
            .read()
            .await
            .comments
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_comments(&self, query: &CommentQuery, slice: Slice) -> Result<Listing<Comment>> {
        Ok(self.store.read().await.list_comments(query, slice))
    }

    async fn update_comment(&self, id: i64, changes: CommentChanges) -> Result<Option<Comment>> {
        Ok(self.store.write().await.update_comment(id, changes))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        Ok(self.store.write().await.delete_comment(id))
    }
}
