//! Field checks applied before anything is written.
//!
//! Request payloads arrive as loosely typed drafts (every field optional,
//! any JSON type) and leave as [`NewArticle`], [`ArticleChanges`],
//! [`NewComment`] or [`CommentChanges`]. The first failing field is
//! reported; nothing is persisted on failure.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{ArticleChanges, CommentChanges, NewArticle, NewComment};
use crate::{Error, Result};

pub const TITLE_MAX_CHARS: usize = 200;
pub const AUTHOR_NAME_MAX_CHARS: usize = 100;

const REQUIRED: &str = "This field is required.";

/// Raw article fields. `None` means the field was absent, `Some(Value::Null)`
/// that it was sent as an explicit null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleDraft {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    #[serde(default, deserialize_with = "present")]
    pub author_name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub article_id: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ArticleDraft {
    pub fn into_new(self) -> Result<NewArticle> {
        Ok(NewArticle {
            title: required_text("title", "Title", self.title, Some(TITLE_MAX_CHARS))?,
            body: required_text("body", "Body", self.body, None)?,
            image: self.image.map(image_reference).transpose()?.flatten(),
        })
    }

    /// `partial` is a PATCH: only the fields that were sent are checked. A
    /// full update (PUT) requires `title` and `body`; `image` stays optional
    /// for both and is left untouched when absent.
    pub fn into_changes(self, partial: bool) -> Result<ArticleChanges> {
        Ok(ArticleChanges {
            title: changed_text("title", "Title", self.title, partial, Some(TITLE_MAX_CHARS))?,
            body: changed_text("body", "Body", self.body, partial, None)?,
            image: self.image.map(image_reference).transpose()?,
        })
    }
}

impl CommentDraft {
    pub fn into_new(self) -> Result<NewComment> {
        let author_name = required_text(
            "authorName",
            "Author name",
            self.author_name,
            Some(AUTHOR_NAME_MAX_CHARS),
        )?;
        let body = required_text("body", "Comment body", self.body, None)?;
        let article_id = article_reference(self.article_id)?;
        Ok(NewComment {
            article_id,
            author_name,
            body,
        })
    }

    /// The owning article never changes, so `articleId` is ignored here.
    pub fn into_changes(self, partial: bool) -> Result<CommentChanges> {
        Ok(CommentChanges {
            author_name: changed_text(
                "authorName",
                "Author name",
                self.author_name,
                partial,
                Some(AUTHOR_NAME_MAX_CHARS),
            )?,
            body: changed_text("body", "Comment body", self.body, partial, None)?,
        })
    }
}

/// Trims `value` and rejects it when nothing is left or it is too long.
pub fn non_empty(
    field: &str,
    label: &str,
    value: &str,
    max_chars: Option<usize>,
) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, format!("{} must not be empty", label)));
    }
    if let Some(max) = max_chars {
        if trimmed.chars().count() > max {
            return Err(Error::validation(
                field,
                format!("Ensure this field has no more than {} characters.", max),
            ));
        }
    }
    Ok(trimmed.to_string())
}

fn required_text(
    field: &str,
    label: &str,
    value: Option<Value>,
    max_chars: Option<usize>,
) -> Result<String> {
    let value = value.ok_or_else(|| Error::validation(field, REQUIRED))?;
    non_empty(field, label, &text(field, value)?, max_chars)
}

fn changed_text(
    field: &str,
    label: &str,
    value: Option<Value>,
    partial: bool,
    max_chars: Option<usize>,
) -> Result<Option<String>> {
    match value {
        None if partial => Ok(None),
        value => required_text(field, label, value, max_chars).map(Some),
    }
}

fn text(field: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(Error::validation(field, "This field may not be null.")),
        Value::Array(_) | Value::Object(_) => Err(Error::validation(field, "Not a valid string.")),
    }
}

fn image_reference(value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        _ => Err(Error::validation(
            "image",
            "The submitted data was not a file or image reference.",
        )),
    }
}

fn article_reference(value: Option<Value>) -> Result<i64> {
    const FIELD: &str = "articleId";
    let invalid = || Error::validation(FIELD, "Incorrect type. Expected pk value.");
    match value {
        None => Err(Error::validation(FIELD, REQUIRED)),
        Some(Value::Null) => Err(Error::validation(FIELD, "This field may not be null.")),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
