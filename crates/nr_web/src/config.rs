use url::Url;

pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8000/";

pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:8080",
    "http://localhost:4200",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:8080",
];

#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Base used for absolute links: pagination, media, the API root.
    pub public_url: Url,
    pub page_size: u64,
    pub recent_limit: u64,
    pub max_body_bytes: usize,
    /// Allowed CORS origins; a single `*` allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            public_url: Url::parse(DEFAULT_PUBLIC_URL).expect("default public url is valid"),
            page_size: 10,
            recent_limit: 5,
            max_body_bytes: 10 * 1024 * 1024,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

impl WebConfig {
    pub fn with_public_url(mut self, raw: &str) -> Result<Self, url::ParseError> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.public_url = url;
        Ok(self)
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Absolute URL for `path` (with or without a leading slash) under the
    /// public base.
    pub fn absolute(&self, path: &str) -> Url {
        self.public_url
            .join(path.trim_start_matches('/'))
            .unwrap_or_else(|_| self.public_url.clone())
    }
}
