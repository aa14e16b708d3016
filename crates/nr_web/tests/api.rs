use axum::{
    body::Body,
    http::{header, header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use nr_storage::{MediaStore, MemoryStorage};
use nr_web::{create_app, AppState, WebConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    media: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(WebConfig::default())
    }

    fn with_config(config: WebConfig) -> Self {
        let media = TempDir::new().unwrap();
        let state = AppState::new(
            Arc::new(MemoryStorage::new()),
            MediaStore::new(media.path()),
            config,
        );
        Self {
            app: create_app(state),
            media,
        }
    }

    async fn respond(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.respond(request).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn create_article(&self, title: &str, body: &str) -> i64 {
        let (status, created) = self
            .json(
                Method::POST,
                "/api/articles/",
                json!({ "title": title, "body": body }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", created);
        created["data"]["id"].as_i64().unwrap()
    }

    async fn create_comment(&self, article_id: i64, author: &str, body: &str) -> Value {
        let (status, created) = self
            .json(
                Method::POST,
                "/api/comments/",
                json!({ "articleId": article_id, "authorName": author, "body": body }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", created);
        created
    }
}

fn multipart(boundary: &str, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                boundary, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn test_create_article() {
    let app = TestApp::new();
    let (status, created) = app
        .json(
            Method::POST,
            "/api/articles/",
            json!({ "title": "  Flood warning  ", "body": "Rivers are rising." }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Article created successfully");
    assert_eq!(created["data"]["title"], "Flood warning");
    assert_eq!(created["data"]["commentCount"], 0);
    assert_eq!(created["data"]["comments"], json!([]));
    assert!(created["data"]["image"].is_null());
    assert!(created["data"]["publishedAt"].is_string());
}

#[tokio::test]
async fn test_create_article_rejects_blank_title() {
    let app = TestApp::new();
    let (status, error) = app
        .json(
            Method::POST,
            "/api/articles/",
            json!({ "title": "   ", "body": "Rivers are rising." }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "ValidationError");
    assert_eq!(error["field"], "title");

    let (status, error) = app
        .json(Method::POST, "/api/articles/", json!({ "title": "No body" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "body");
}

#[tokio::test]
async fn test_missing_article_is_not_found() {
    let app = TestApp::new();
    let (status, error) = app.get("/api/articles/42/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "NotFoundError");

    let (status, _) = app.get("/api/articles/forty-two/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/api/articles/42/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(Method::PATCH, "/api/articles/42/", json!({ "title": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_article_cascades_to_comments() {
    let app = TestApp::new();
    let id = app.create_article("Budget passed", "The vote was close.").await;
    let comment = app.create_comment(id, "Ana", "Finally.").await;
    app.create_comment(id, "Budi", "Too late.").await;
    let comment_id = comment["data"]["id"].as_i64().unwrap();

    let (status, deleted) = app.delete(&format!("/api/articles/{}/", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Article deleted successfully");

    let (status, _) = app.get(&format!("/api/articles/{}/", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, listing) = app.get(&format!("/api/comments/?articleId={}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 0);

    let (status, _) = app.get(&format!("/api/comments/{}/", comment_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_articles_newest_first() {
    let app = TestApp::new();
    for title in ["First", "Second", "Third"] {
        app.create_article(title, "Body").await;
    }

    let (status, listing) = app.get("/api/articles/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 3);
    let titles: Vec<&str> = listing["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Third", "Second", "First"]);
    assert!(listing["results"][0].get("comments").is_none());

    let (_, listing) = app.get("/api/articles/?ordering=title").await;
    assert_eq!(listing["results"][0]["title"], "First");
}

#[tokio::test]
async fn test_search_matches_title_and_body() {
    let app = TestApp::new();
    app.create_article("Weather", "Flood warnings for the coast.").await;
    app.create_article("Elections", "Turnout was high.").await;
    app.create_article("Flood relief", "Aid is on its way.").await;

    let (status, listing) = app.get("/api/articles/?search=FLOOD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 2);

    let (_, listing) = app.get("/api/articles/?search=turnout").await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["results"][0]["title"], "Elections");
}

#[tokio::test]
async fn test_comment_requires_existing_article() {
    let app = TestApp::new();
    let (status, error) = app
        .json(
            Method::POST,
            "/api/comments/",
            json!({ "articleId": 999, "authorName": "Ana", "body": "Hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "articleId");

    let (status, error) = app
        .json(
            Method::POST,
            "/api/comments/",
            json!({ "articleId": "abc", "authorName": "Ana", "body": "Hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "articleId");
}

#[tokio::test]
async fn test_create_comment_echoes_article_title() {
    let app = TestApp::new();
    let id = app.create_article("Harbour reopens", "Ships are back.").await;
    let created = app.create_comment(id, "  Ana  ", "Good news").await;

    assert_eq!(created["message"], "Comment added successfully");
    assert_eq!(created["data"]["articleTitle"], "Harbour reopens");
    assert_eq!(created["data"]["authorName"], "Ana");
    assert_eq!(created["data"]["articleId"], id);

    let comment_id = created["data"]["id"].as_i64().unwrap();
    let (status, comment) = app.get(&format!("/api/comments/{}/", comment_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(comment.get("articleTitle").is_none());

    let (_, article) = app.get(&format!("/api/articles/{}/", id)).await;
    assert_eq!(article["commentCount"], 1);
    assert_eq!(article["comments"][0]["id"], comment_id);
}

#[tokio::test]
async fn test_article_comments_newest_first() {
    let app = TestApp::new();
    let id = app.create_article("Storm", "Winds up to 120km/h.").await;
    let other = app.create_article("Calm", "Nothing happened.").await;
    for body in ["one", "two", "three"] {
        app.create_comment(id, "Ana", body).await;
    }
    app.create_comment(other, "Budi", "elsewhere").await;

    let (status, listing) = app.get(&format!("/api/articles/{}/comments/", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["articleTitle"], "Storm");
    assert_eq!(listing["commentCount"], 3);
    let bodies: Vec<&str> = listing["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, ["three", "two", "one"]);

    let (status, _) = app.get("/api/articles/77/comments/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_filters() {
    let app = TestApp::new();
    let id = app.create_article("Storm", "Winds.").await;
    let other = app.create_article("Calm", "Nothing.").await;
    app.create_comment(id, "Ana", "first").await;
    app.create_comment(id, "Budi", "second").await;
    app.create_comment(other, "Ana", "third").await;

    let (_, listing) = app.get("/api/comments/?authorName=Ana").await;
    assert_eq!(listing["count"], 2);

    let (_, listing) = app
        .get(&format!("/api/comments/?articleId={}&authorName=Ana", id))
        .await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["results"][0]["body"], "first");

    let (_, listing) = app.get("/api/comments/?ordering=createdAt").await;
    assert_eq!(listing["results"][0]["body"], "first");

    let (status, error) = app.get("/api/comments/?articleId=storm").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "articleId");
}

#[tokio::test]
async fn test_recent_articles_limited_to_five() {
    let app = TestApp::new();
    for n in 0..7 {
        app.create_article(&format!("Article {}", n), "Body").await;
    }

    let (status, recent) = app.get("/api/articles/recent/").await;
    assert_eq!(status, StatusCode::OK);
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0]["title"], "Article 6");
    assert!(recent[0].get("comments").is_none());
}

#[tokio::test]
async fn test_patch_is_idempotent() {
    let app = TestApp::new();
    let id = app.create_article("Draft", "Original body").await;
    let uri = format!("/api/articles/{}/", id);

    let (status, first) = app
        .json(Method::PATCH, &uri, json!({ "title": "Final" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], "Article updated successfully");
    assert_eq!(first["data"]["title"], "Final");
    assert_eq!(first["data"]["body"], "Original body");

    let (_, second) = app
        .json(Method::PATCH, &uri, json!({ "title": "Final" }))
        .await;
    assert_eq!(first["data"], second["data"]);
}

#[tokio::test]
async fn test_put_requires_all_fields() {
    let app = TestApp::new();
    let id = app.create_article("Draft", "Original body").await;
    let uri = format!("/api/articles/{}/", id);

    let (status, error) = app.json(Method::PUT, &uri, json!({ "title": "Only" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "body");

    let (status, updated) = app
        .json(Method::PUT, &uri, json!({ "title": "New", "body": "New body" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["body"], "New body");
}

#[tokio::test]
async fn test_update_and_delete_comment() {
    let app = TestApp::new();
    let id = app.create_article("Storm", "Winds.").await;
    let created = app.create_comment(id, "Ana", "tpyo").await;
    let uri = format!("/api/comments/{}/", created["data"]["id"]);

    let (status, updated) = app.json(Method::PATCH, &uri, json!({ "body": "typo" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["message"], "Comment updated successfully");
    assert_eq!(updated["data"]["body"], "typo");
    assert_eq!(updated["data"]["authorName"], "Ana");

    let (status, deleted) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Comment deleted successfully");

    let (_, article) = app.get(&format!("/api/articles/{}/", id)).await;
    assert_eq!(article["commentCount"], 0);
}

#[tokio::test]
async fn test_pagination_links() {
    let app = TestApp::new();
    for n in 0..12 {
        app.create_article(&format!("Article {}", n), "Body").await;
    }

    let (_, first) = app.get("/api/articles/").await;
    assert_eq!(first["count"], 12);
    assert_eq!(first["results"].as_array().unwrap().len(), 10);
    assert_eq!(first["next"], "http://localhost:8000/api/articles/?page=2");
    assert!(first["previous"].is_null());

    let (_, second) = app.get("/api/articles/?page=2").await;
    assert_eq!(second["results"].as_array().unwrap().len(), 2);
    assert!(second["next"].is_null());
    assert_eq!(second["previous"], "http://localhost:8000/api/articles/");

    let (status, error) = app.get("/api/articles/?page=3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "Invalid page.");
}

#[tokio::test]
async fn test_multipart_image_upload() {
    let app = TestApp::new();
    let boundary = "newsroom-boundary";
    let body = multipart(
        boundary,
        &[("title", "Photo essay"), ("body", "Pictures from the coast.")],
        Some(("coast.PNG", &b"\x89PNG fake image bytes"[..])),
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/articles/")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, created) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let image = created["data"]["image"].as_str().unwrap();
    assert!(image.starts_with("http://localhost:8000/media/article_images/"));
    assert!(image.ends_with(".png"));

    let stored = image.trim_start_matches("http://localhost:8000/media/");
    assert!(app.media.path().join(stored).exists());
}

#[tokio::test]
async fn test_multipart_rejects_unknown_extension() {
    let app = TestApp::new();
    let boundary = "newsroom-boundary";
    let body = multipart(
        boundary,
        &[("title", "Notes"), ("body", "Plain text.")],
        Some(("notes.txt", &b"hello"[..])),
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/articles/")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, error) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "image");

    let (_, listing) = app.get("/api/articles/").await;
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn test_urlencoded_form() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/articles")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("title=From+a+form&body=Sent%20urlencoded"))
        .unwrap();

    let (status, created) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["title"], "From a form");
    assert_eq!(created["data"]["body"], "Sent urlencoded");
}

#[tokio::test]
async fn test_malformed_json() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/articles/")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();

    let (status, error) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "non_field_errors");
}

#[tokio::test]
async fn test_api_root_health_and_fallback() {
    let app = TestApp::new();
    let (status, root) = app.get("/api/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["articles"], "http://localhost:8000/api/articles/");
    assert_eq!(root["comments"], "http://localhost:8000/api/comments/");

    let (status, health) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");

    let (status, error) = app.get("/api/authors/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "NotFoundError");
}

#[tokio::test]
async fn test_recent_articles_returns_fewer_when_fewer_exist() {
    let app = TestApp::new();
    let (status, recent) = app.get("/api/articles/recent/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent, json!([]));

    app.create_article("Older", "Body").await;
    app.create_article("Newer", "Body").await;

    let (_, recent) = app.get("/api/articles/recent/").await;
    let titles: Vec<&str> = recent
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Newer", "Older"]);
}

#[tokio::test]
async fn test_huge_page_number_is_invalid() {
    let app = TestApp::new();
    let id = app.create_article("Only", "Body").await;
    app.create_comment(id, "Ana", "Hello").await;

    for uri in [
        "/api/articles/?page=18446744073709551615",
        "/api/comments/?page=18446744073709551615",
    ] {
        let (status, error) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(error["error"], "NotFoundError");
        assert_eq!(error["message"], "Invalid page.");
    }
}

#[tokio::test]
async fn test_client_timestamps_are_ignored() {
    let app = TestApp::new();
    let stale = "2000-01-01T00:00:00Z";

    let (status, created) = app
        .json(
            Method::POST,
            "/api/articles/",
            json!({ "title": "Dated", "body": "Body", "publishedAt": stale }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let published_at = created["data"]["publishedAt"].clone();
    assert!(!published_at.as_str().unwrap().starts_with("2000-"));

    let id = created["data"]["id"].as_i64().unwrap();
    let (status, patched) = app
        .json(
            Method::PATCH,
            &format!("/api/articles/{}/", id),
            json!({ "title": "Redated", "publishedAt": stale }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["data"]["title"], "Redated");
    assert_eq!(patched["data"]["publishedAt"], published_at);

    let (status, comment) = app
        .json(
            Method::POST,
            "/api/comments/",
            json!({ "articleId": id, "authorName": "Ana", "body": "Hi", "createdAt": stale }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let created_at = comment["data"]["createdAt"].clone();
    assert!(!created_at.as_str().unwrap().starts_with("2000-"));

    let (status, patched) = app
        .json(
            Method::PATCH,
            &format!("/api/comments/{}/", comment["data"]["id"]),
            json!({ "body": "Hi again", "createdAt": stale }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["data"]["createdAt"], created_at);
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/articles/")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cors_preflight_allow_list() {
    let app = TestApp::new();

    let response = app.respond(preflight("http://localhost:3000")).await;
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let response = app.respond(preflight("http://evil.example.com")).await;
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cors_preflight_wildcard() {
    let config = WebConfig::default().with_cors_origins(vec!["*".to_string()]);
    let app = TestApp::with_config(config);

    let response = app.respond(preflight("http://anywhere.example.com")).await;
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = TestApp::new();
    let body = json!({ "title": "Big", "body": "x".repeat(11 * 1024 * 1024) });
    let (status, error) = app.json(Method::POST, "/api/articles/", body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error["error"], "PayloadTooLargeError");

    let boundary = "newsroom-boundary";
    let image = vec![0u8; 11 * 1024 * 1024];
    let body = multipart(
        boundary,
        &[("title", "Big"), ("body", "Large photo")],
        Some(("big.png", &image[..])),
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/articles/")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (_, listing) = app.get("/api/articles/").await;
    assert_eq!(listing["count"], 0);
}
