use axum::http::Uri;
use serde::Serialize;

use crate::config::WebConfig;
use crate::error::ApiError;

const INVALID_PAGE: &str = "Invalid page.";

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// 1-based page number from the `page` query parameter. Pages whose
/// offset would not fit a signed 64-bit row offset can never exist.
pub fn page_number(raw: Option<&str>, page_size: u64) -> Result<u64, ApiError> {
    let page = match raw.map(str::trim) {
        None | Some("") => return Ok(1),
        Some(raw) => raw.parse::<u64>().ok().filter(|page| *page >= 1),
    };
    page.filter(|page| {
        (page - 1)
            .checked_mul(page_size)
            .is_some_and(|offset| offset <= i64::MAX as u64)
    })
    .ok_or_else(|| ApiError::NotFound(INVALID_PAGE.to_string()))
}

impl<T> Paginated<T> {
    /// Wrap one page of `results`. Pages past the end are rejected; page 1
    /// of an empty collection is valid.
    pub fn new(
        config: &WebConfig,
        uri: &Uri,
        page: u64,
        total: u64,
        results: Vec<T>,
    ) -> Result<Self, ApiError> {
        let size = config.page_size.max(1);
        let pages = total.div_ceil(size).max(1);
        if page > pages {
            return Err(ApiError::NotFound(INVALID_PAGE.to_string()));
        }

        let next = (page < pages).then(|| page_link(config, uri, Some(page + 1)));
        let previous = match page {
            1 => None,
            2 => Some(page_link(config, uri, None)),
            _ => Some(page_link(config, uri, Some(page - 1))),
        };

        Ok(Self {
            count: total,
            next,
            previous,
            results,
        })
    }
}

/// The current request URL with `page` replaced (or dropped when `None`).
fn page_link(config: &WebConfig, uri: &Uri, page: Option<u64>) -> String {
    let mut url = config.absolute(uri.path());
    let query = uri.query().unwrap_or_default();
    let kept: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(key, _)| key != "page")
        .collect();

    url.set_query(None);
    if !kept.is_empty() || page.is_some() {
        let mut query = url.query_pairs_mut();
        for (key, value) in &kept {
            query.append_pair(key, value);
        }
        if let Some(page) = page {
            query.append_pair("page", &page.to_string());
        }
    }
    url.to_string()
}
