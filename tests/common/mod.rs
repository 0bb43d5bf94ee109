#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use blog_platform::{
    app_state::AppState,
    blog_interface::create_blog_router,
    config::Config,
    infrastructure::{
        database::{BlogStore, NewPost},
        sqlite_database::SqliteStore,
    },
    models::{Group, Post, User},
};

pub const BOUNDARY: &str = "blogtestboundary";

/// A fresh router over an in-memory store and a throwaway media root
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub media_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let media_dir = tempfile::tempdir().expect("media dir");
        let mut config = Config::default();
        config.media.root = media_dir.path().to_path_buf();

        let store = SqliteStore::new_in_memory().await.expect("in-memory store");
        let state = AppState::with_store(config, Arc::new(store));
        let router = create_blog_router(state.clone());

        Self {
            router,
            state,
            media_dir,
        }
    }

    pub fn store(&self) -> &dyn BlogStore {
        self.state.store.as_ref()
    }

    /// A user plus a session token that signs requests in as them
    pub async fn user(&self, username: &str) -> (User, String) {
        let user = self.store().create_user(username).await.unwrap();
        let token = self.store().create_session(user.id).await.unwrap();
        (user, token)
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.store()
            .create_group(title, slug, "Test description")
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.store()
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();

        TestResponse {
            status,
            location,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, token).body(Body::empty()).unwrap())
            .await
    }

    /// POST an urlencoded form
    pub async fn post_form(&self, uri: &str, token: Option<&str>, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(name, value)| {
                format!("{}={}", name, utf8_percent_encode(value, NON_ALPHANUMERIC))
            })
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            request("POST", uri, token)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// POST a multipart form with an optional `image` file part
    pub async fn post_multipart(
        &self,
        uri: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, data)) = image {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        self.send(
            request("POST", uri, token)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

fn request(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

/// A tiny valid PNG
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::new(2, 1)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// Post ids of a rendered page, in display order
pub fn page_ids(context: &Value) -> Vec<i64> {
    context["page_obj"]["items"]
        .as_array()
        .expect("page_obj.items")
        .iter()
        .map(|post| post["id"].as_i64().unwrap())
        .collect()
}
