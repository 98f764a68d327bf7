#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use todo_pages::db::Database;
use todo_pages::models::{NewTodo, Todo};
use todo_pages::{app, AppState};
use tower::ServiceExt;

/// Router plus a handle on its state for inspecting storage directly.
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let state = AppState::new(Database::open_in_memory().unwrap());
        Self {
            app: app(state.clone()),
            state,
        }
    }

    pub fn seed(&self, title: &str, description: &str) -> Todo {
        self.state
            .db()
            .unwrap()
            .add_todo(&NewTodo {
                title: title.to_string(),
                description: description.to_string(),
                due_date: None,
            })
            .unwrap()
    }

    pub fn fetch(&self, id: i64) -> Option<Todo> {
        self.state.db().unwrap().get_todo(id).unwrap()
    }

    pub fn count(&self) -> usize {
        self.state.db().unwrap().count_todos().unwrap()
    }

    pub fn all(&self) -> Vec<Todo> {
        self.state.db().unwrap().list_todos().unwrap()
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, form: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(body.to_vec()).unwrap(),
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn assert_redirect(&self, location: &str) {
        assert_eq!(self.status, StatusCode::FOUND, "body: {}", self.body);
        assert_eq!(
            self.headers.get(header::LOCATION).unwrap().to_str().unwrap(),
            location
        );
    }
}
