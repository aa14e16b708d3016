use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use nr_core::{
    missing_article, Article, ArticleChanges, ArticleField, ArticleQuery, ArticleStorage, Comment,
    CommentChanges, CommentQuery, CommentStorage, Error, Listing, NewArticle, NewComment, Result,
    Slice,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::StorageBackend;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:newsroom.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL CHECK (length(title) <= 200),
        body TEXT NOT NULL,
        image TEXT,
        published_at TEXT NOT NULL,
        title_folded TEXT NOT NULL,
        body_folded TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_name TEXT NOT NULL CHECK (length(author_name) <= 100),
        body TEXT NOT NULL,
        created_at TEXT NOT NULL,
        article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (published_at)",
    "CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments (article_id)",
    // Add future migrations here
];

const ARTICLE_COLUMNS: &str = r#"
    SELECT a.id, a.title, a.body, a.image, a.published_at,
           (SELECT COUNT(*) FROM comments c WHERE c.article_id = a.id) AS comment_count
    FROM articles a
"#;

const COMMENT_COLUMNS: &str = "SELECT id, author_name, body, created_at, article_id FROM comments";

pub struct SQLiteStorage {
    pool: SqlitePool,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be reachable (default: sqlite:newsroom.db)"
    }

    async fn connect(url: Option<&str>) -> Result<Self> {
        Self::new_with_url(url.unwrap_or(DEFAULT_DATABASE_URL)).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_url(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(storage_error("Invalid database url"))?;
        Self::open(options).await
    }

    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(SqliteConnectOptions::new().filename(db_path)).await
    }

    async fn open(options: SqliteConnectOptions) -> Result<Self> {
        let options = options.create_if_missing(true).foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(storage_error("Failed to connect to database"))?;

        let storage = Self { pool };
        storage.migrate().await?;
        info!("💾 SQLite database ready");
        Ok(storage)
    }

    /// Apply every schema migration. Each one is idempotent.
    pub async fn migrate(&self) -> Result<()> {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }
        debug!("Applied {} migrations", MIGRATIONS.len());
        Ok(())
    }
}

fn storage_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Storage(format!("{}: {}", context, e))
}

/// Fixed-width text so that string order matches time order.
fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("Failed to parse date {:?}: {}", raw, e)))
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// SQLite's own `lower()` and `LIKE` only fold ASCII, so search runs
/// against copies of title and body lowercased here.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_slice(qb: &mut QueryBuilder<'_, Sqlite>, slice: Slice) {
    match slice.limit {
        Some(limit) => {
            qb.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        None if slice.offset > 0 => {
            qb.push(" LIMIT -1");
        }
        None => return,
    }
    qb.push(" OFFSET ").push_bind(i64::try_from(slice.offset).unwrap_or(i64::MAX));
}

fn read_article(row: &SqliteRow) -> Result<Article> {
    let read = storage_error("Failed to read article row");
    Ok(Article {
        id: row.try_get("id").map_err(&read)?,
        title: row.try_get("title").map_err(&read)?,
        body: row.try_get("body").map_err(&read)?,
        image: row.try_get("image").map_err(&read)?,
        published_at: decode_time(row.try_get("published_at").map_err(&read)?)?,
        comment_count: row.try_get::<i64, _>("comment_count").map_err(&read)? as u64,
    })
}

fn read_comment(row: &SqliteRow) -> Result<Comment> {
    let read = storage_error("Failed to read comment row");
    Ok(Comment {
        id: row.try_get("id").map_err(&read)?,
        author_name: row.try_get("author_name").map_err(&read)?,
        body: row.try_get("body").map_err(&read)?,
        created_at: decode_time(row.try_get("created_at").map_err(&read)?)?,
        article_id: row.try_get("article_id").map_err(&read)?,
    })
}

fn push_article_filter(qb: &mut QueryBuilder<'_, Sqlite>, query: &ArticleQuery) {
    let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return;
    };
    let pattern = like_pattern(&fold(search));
    qb.push(" WHERE a.title_folded LIKE ")
        .push_bind(pattern.clone())
        .push(" ESCAPE '\\' OR a.body_folded LIKE ")
        .push_bind(pattern)
        .push(" ESCAPE '\\'");
}

fn push_comment_filter(qb: &mut QueryBuilder<'_, Sqlite>, query: &CommentQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(article_id) = query.article_id {
        qb.push(" AND article_id = ").push_bind(article_id);
    }
    if let Some(author_name) = &query.author_name {
        qb.push(" AND author_name = ").push_bind(author_name.clone());
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn insert_article(&self, article: NewArticle) -> Result<Article> {
        let published_at = now();
        let id = sqlx::query(
            r#"
            INSERT INTO articles (title, body, image, published_at, title_folded, body_folded)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.title)
        .bind(&article.body)
        .bind(article.image.as_deref())
        .bind(encode_time(published_at))
        .bind(fold(&article.title))
        .bind(fold(&article.body))
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to store article"))?
        .last_insert_rowid();

        debug!("Stored article {}", id);
        Ok(Article {
            id,
            title: article.title,
            body: article.body,
            image: article.image,
            published_at,
            comment_count: 0,
        })
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("{} WHERE a.id = ?", ARTICLE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("Failed to get article"))?;
        row.as_ref().map(read_article).transpose()
    }

    async fn list_articles(&self, query: &ArticleQuery, slice: Slice) -> Result<Listing<Article>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles a");
        push_article_filter(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count articles"))?;

        let column = match query.ordering.field {
            ArticleField::PublishedAt => "a.published_at",
            ArticleField::Title => "a.title",
        };
        let direction = query.ordering.direction.as_sql();

        let mut select = QueryBuilder::<Sqlite>::new(ARTICLE_COLUMNS);
        push_article_filter(&mut select, query);
        select.push(format!(" ORDER BY {column} {direction}, a.id {direction}"));
        push_slice(&mut select, slice);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("Failed to list articles"))?;

        Ok(Listing {
            total: total as u64,
            items: rows.iter().map(read_article).collect::<Result<_>>()?,
        })
    }

    async fn update_article(&self, id: i64, changes: ArticleChanges) -> Result<Option<Article>> {
        if changes.is_empty() {
            return self.find_article(id).await;
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE articles SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(title) = changes.title {
                set.push("title_folded = ").push_bind_unseparated(fold(&title));
                set.push("title = ").push_bind_unseparated(title);
            }
            if let Some(body) = changes.body {
                set.push("body_folded = ").push_bind_unseparated(fold(&body));
                set.push("body = ").push_bind_unseparated(body);
            }
            if let Some(image) = changes.image {
                set.push("image = ").push_bind_unseparated(image);
            }
        }
        qb.push(" WHERE id = ").push_bind(id);

        let updated = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update article"))?
            .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        debug!("Updated article {}", id);
        self.find_article(id).await
    }

    async fn delete_article(&self, id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete article"))?
            .rows_affected();
        debug!("Deleted article {} ({} rows)", id, deleted);
        Ok(deleted > 0)
    }
}

#[async_trait]
impl CommentStorage for SQLiteStorage {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        let created_at = now();
        let result = sqlx::query(
            r#"
            INSERT INTO comments (author_name, body, created_at, article_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&comment.author_name)
        .bind(&comment.body)
        .bind(encode_time(created_at))
        .bind(comment.article_id)
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(e))
                if e.is_foreign_key_violation() || e.message().contains("FOREIGN KEY") =>
            {
                return Err(missing_article(comment.article_id));
            }
            Err(e) => return Err(Error::Storage(format!("Failed to store comment: {}", e))),
        };

        debug!("Stored comment {} on article {}", id, comment.article_id);
        Ok(Comment {
            id,
            author_name: comment.author_name,
            body: comment.body,
            created_at,
            article_id: comment.article_id,
        })
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", COMMENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("Failed to get comment"))?;
        row.as_ref().map(read_comment).transpose()
    }

    async fn list_comments(&self, query: &CommentQuery, slice: Slice) -> Result<Listing<Comment>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM comments");
        push_comment_filter(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("Failed to count comments"))?;

        let direction = query.ordering.direction.as_sql();
        let mut select = QueryBuilder::<Sqlite>::new(COMMENT_COLUMNS);
        push_comment_filter(&mut select, query);
        select.push(format!(" ORDER BY created_at {direction}, id {direction}"));
        push_slice(&mut select, slice);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("Failed to list comments"))?;

        Ok(Listing {
            total: total as u64,
            items: rows.iter().map(read_comment).collect::<Result<_>>()?,
        })
    }

    async fn update_comment(&self, id: i64, changes: CommentChanges) -> Result<Option<Comment>> {
        if changes.is_empty() {
            return self.find_comment(id).await;
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE comments SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(author_name) = changes.author_name {
                set.push("author_name = ").push_bind_unseparated(author_name);
            }
            if let Some(body) = changes.body {
                set.push("body = ").push_bind_unseparated(body);
            }
        }
        qb.push(" WHERE id = ").push_bind(id);

        let updated = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to update comment"))?
            .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.find_comment(id).await
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error("Failed to delete comment"))?
            .rows_affected();
        Ok(deleted > 0)
    }
}
