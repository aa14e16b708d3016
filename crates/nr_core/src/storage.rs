use async_trait::async_trait;

use crate::models::{
    Article, ArticleChanges, ArticleQuery, Comment, CommentChanges, CommentQuery, Listing,
    NewArticle, NewComment, Slice,
};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Store a new article, assigning its id and publish time.
    async fn insert_article(&self, article: NewArticle) -> Result<Article>;

    async fn find_article(&self, id: i64) -> Result<Option<Article>>;

    /// Articles matching `query`, ordered by `query.ordering`, cut to `slice`.
    async fn list_articles(&self, query: &ArticleQuery, slice: Slice) -> Result<Listing<Article>>;

    /// Apply `changes` and return the stored result, or `None` if the id is unknown.
    async fn update_article(&self, id: i64, changes: ArticleChanges) -> Result<Option<Article>>;

    /// Delete the article and every comment it owns. Returns `false` if
    /// nothing was deleted.
    async fn delete_article(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CommentStorage: Send + Sync {
    /// Store a new comment. Fails with a validation error on `articleId`
    /// when the referenced article does not exist.
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment>;

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>>;

    async fn list_comments(&self, query: &CommentQuery, slice: Slice) -> Result<Listing<Comment>>;

    async fn update_comment(&self, id: i64, changes: CommentChanges) -> Result<Option<Comment>>;

    async fn delete_comment(&self, id: i64) -> Result<bool>;
}

/// Everything the HTTP layer needs from a backend.
pub trait Storage: ArticleStorage + CommentStorage {}

impl<T: ArticleStorage + CommentStorage> Storage for T {}
