use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, MethodRouter},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::WebConfig;
use crate::handlers::{self, articles, comments};
use crate::AppState;

/// Register `path` with and without its trailing slash.
fn route(
    router: Router<AppState>,
    path: &str,
    methods: MethodRouter<AppState>,
) -> Router<AppState> {
    let bare = path.trim_end_matches('/');
    if bare.is_empty() || bare == path {
        return router.route(path, methods);
    }
    router.route(path, methods.clone()).route(bare, methods)
}

fn cors_layer(config: &WebConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️ Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new();
    router = route(router, "/api/", get(handlers::api_root));
    router = route(
        router,
        "/api/articles/",
        get(articles::list_articles).post(articles::create_article),
    );
    router = route(router, "/api/articles/recent/", get(articles::get_recent_articles));
    router = route(
        router,
        "/api/articles/:id/",
        get(articles::get_article)
            .put(articles::update_article)
            .patch(articles::patch_article)
            .delete(articles::delete_article),
    );
    router = route(
        router,
        "/api/articles/:id/comments/",
        get(articles::get_article_comments),
    );
    router = route(
        router,
        "/api/comments/",
        get(comments::list_comments).post(comments::create_comment),
    );
    router = route(
        router,
        "/api/comments/:id/",
        get(comments::get_comment)
            .put(comments::update_comment)
            .patch(comments::patch_comment)
            .delete(comments::delete_comment),
    );
    router = route(router, "/health", get(handlers::health));

    router
        .fallback(handlers::handler_404)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}
