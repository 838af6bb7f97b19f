use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vidhub::config::app_config::{
    AppConfig, CookieConfig, DatabaseConfig, MediaBackend, MediaConfig, ServerConfig, TokenConfig,
};
use vidhub::repository::in_memory_user_repository::InMemoryUserRepository;
use vidhub::service::media_service::InMemoryMediaStore;

const BOUNDARY: &str = "vidhub-test-boundary";

fn test_config() -> AppConfig {
    let token = TokenConfig {
        access_secret: "integration-access-secret-0123456789abcdef".to_string(),
        access_ttl_minutes: 15,
        refresh_secret: "integration-refresh-secret-0123456789abcdef".to_string(),
        refresh_ttl_days: 10,
    };

    AppConfig {
        server: ServerConfig {
            address: "127.0.0.1".to_string(),
            port: 0,
            cors_origin: "*".to_string(),
            max_upload_size_mb: 10,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            name: None,
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_seconds: 1,
        },
        cookie: CookieConfig::for_tokens(&token, true),
        token,
        media: MediaConfig {
            backend: MediaBackend::Memory,
            cloudinary: None,
        },
        bcrypt_cost: 4,
    }
}

fn app() -> (Router, Arc<InMemoryMediaStore>) {
    let media = InMemoryMediaStore::new_shared();
    let router = vidhub::routes::root::routes(InMemoryUserRepository::new_shared(), media.clone(), &test_config())
        .expect("router builds with valid secrets");
    (router, media)
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str),
}

fn multipart(method: &str, uri: &str, parts: &[Part<'_>], bearer: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
                );
            }
            Part::File(name, file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

fn register_request(username: &str, email: &str, with_avatar: bool) -> Request<Body> {
    let mut parts = vec![
        Part::Text("fullname", "Alice Liddell"),
        Part::Text("email", email),
        Part::Text("username", username),
        Part::Text("password", "p@ss"),
    ];
    if with_avatar {
        parts.push(Part::File("avatar", "avatar.png"));
    }
    multipart("POST", "/api/v1/users/register", &parts, None)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authorized(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users/login",
            json!({"username": "alice", "email": "a@x.com", "password": "p@ss"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}

#[tokio::test]
async fn test_register_login_refresh_scenario() {
    let (app, _) = app();

    let response = app.clone().oneshot(register_request("alice", "a@x.com", true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 201);
    assert!(body["data"]["avatar"].as_str().is_some_and(|url| !url.is_empty()));
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("refreshToken").is_none());

    let response = app.clone().oneshot(register_request("bob", "a@x.com", true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(response).await["success"], false);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users/login",
            json!({"username": "alice", "email": "a@x.com", "password": "p@ss"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|cookie| cookie.contains("HttpOnly") && cookie.contains("Secure")));
    let body = read_json(response).await;
    let refresh_token = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["user"]["username"], "alice");

    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-access-token")
                .header(header::COOKIE, format!("refreshToken={refresh_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get_all(header::SET_COOKIE).iter().count(), 2);

    let second = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users/refresh-access-token",
            json!({"refreshToken": refresh_token}),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_without_avatar_is_rejected() {
    let (app, media) = app();

    let response = app.clone().oneshot(register_request("alice", "a@x.com", false)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(media.asset_count(), 0);
}

#[tokio::test]
async fn test_login_requires_both_identifiers() {
    let (app, _) = app();
    app.clone().oneshot(register_request("alice", "a@x.com", true)).await.unwrap();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/users/login", json!({"email": "a@x.com", "password": "p@ss"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_bodies_are_bad_requests() {
    let (app, _) = app();
    app.clone().oneshot(register_request("alice", "a@x.com", true)).await.unwrap();

    let missing_password = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/users/login", json!({"username": "alice", "email": "a@x.com"})))
        .await
        .unwrap();
    assert_eq!(missing_password.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(missing_password).await["success"], false);

    let no_content_type = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/login")
                .body(Body::from(json!({"username": "alice", "email": "a@x.com", "password": "p@ss"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(no_content_type.status(), StatusCode::BAD_REQUEST);

    let not_multipart = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/users/register", json!({"username": "bob"})))
        .await
        .unwrap();
    assert_eq!(not_multipart.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let (app, _) = app();
    app.clone().oneshot(register_request("alice", "a@x.com", true)).await.unwrap();
    let session = login(&app).await;
    let access_token = session["data"]["accessToken"].as_str().unwrap();
    let refresh_token = session["data"]["refreshToken"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(authorized("POST", "/api/v1/users/logout", access_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .all(|value| value.to_str().unwrap().contains("Max-Age=0")));
    assert_eq!(read_json(response).await["data"], json!({}));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users/refresh-access-token",
            json!({"refreshToken": refresh_token}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_without_token_is_unauthorized() {
    let (app, _) = app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-access-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_access_token() {
    let (app, _) = app();
    app.clone().oneshot(register_request("alice", "a@x.com", true)).await.unwrap();

    let anonymous = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/get-current-user")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let session = login(&app).await;
    let refresh_token = session["data"]["refreshToken"].as_str().unwrap();
    let with_refresh = app
        .clone()
        .oneshot(authorized("GET", "/api/v1/users/get-current-user", refresh_token))
        .await
        .unwrap();
    assert_eq!(with_refresh.status(), StatusCode::UNAUTHORIZED);

    let access_token = session["data"]["accessToken"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(authorized("GET", "/api/v1/users/get-current-user", access_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["data"]["email"], "a@x.com");
}

#[tokio::test]
async fn test_update_avatar_replaces_and_deletes_old_asset() {
    let (app, media) = app();
    let registered = read_json(app.clone().oneshot(register_request("alice", "a@x.com", true)).await.unwrap()).await;
    let old_avatar = registered["data"]["avatar"].as_str().unwrap().to_string();
    let session = login(&app).await;
    let access_token = session["data"]["accessToken"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(multipart(
            "PATCH",
            "/api/v1/users/update-avatar-image",
            &[Part::File("avatar", "new.png")],
            Some(access_token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_ne!(body["data"]["avatar"].as_str().unwrap(), old_avatar);
    assert_eq!(media.deletions().len(), 1);
    assert_eq!(media.asset_count(), 1);
}

#[tokio::test]
async fn test_update_cover_without_file_is_rejected() {
    let (app, _) = app();
    app.clone().oneshot(register_request("alice", "a@x.com", true)).await.unwrap();
    let session = login(&app).await;
    let access_token = session["data"]["accessToken"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(multipart(
            "PATCH",
            "/api/v1/users/update-cover-image",
            &[Part::Text("note", "no file")],
            Some(access_token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_channel_profile_is_public() {
    let (app, _) = app();
    app.clone().oneshot(register_request("alice", "a@x.com", true)).await.unwrap();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/v1/users/channel/Alice").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["subscribersCount"], 0);
    assert_eq!(body["data"]["isSubscribed"], false);

    let missing = app
        .clone()
        .oneshot(Request::builder().uri("/api/v1/users/channel/nobody").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["data"]["status"], "healthy");

    let detail = app
        .clone()
        .oneshot(Request::builder().uri("/health/detail").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);
}
