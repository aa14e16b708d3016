pub mod error;
pub mod models;
pub mod storage;
pub mod validation;

pub use error::{Error, Result};
pub use models::{
    Article, ArticleChanges, ArticleField, ArticleOrdering, ArticleQuery, Comment,
    CommentChanges, CommentOrdering, CommentQuery, Direction, Listing, NewArticle, NewComment,
    Slice,
};
pub use storage::{ArticleStorage, CommentStorage, Storage};
pub use validation::{ArticleDraft, CommentDraft};

/// Foreign-key error message used by every backend when a comment points
/// at an article that does not exist.
pub fn missing_article(article_id: i64) -> Error {
    Error::validation(
        "articleId",
        format!("Invalid pk \"{}\" - object does not exist.", article_id),
    )
}

pub mod prelude {
    pub use crate::{Article, ArticleStorage, Comment, CommentStorage, Error, Result, Storage};
}
