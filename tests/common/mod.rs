use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use registrar::router::init_router;
use registrar::state::AppState;
use registrar_auth::create_access_token;
use registrar_core::Role;
use registrar_models::UserId;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
}

#[allow(dead_code)]
pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        dotenvy::dotenv().ok();
        Self {
            state: AppState::from_pool(pool),
        }
    }

    /// Mints a token for a fresh identity. The user row is created on the
    /// first request that carries it.
    pub fn token(&self, role: Role) -> (String, String) {
        let email = generate_unique_email();
        let token = create_access_token(
            &format!("user_{}", Uuid::new_v4().simple()),
            &email,
            Some("Test User"),
            Some(role),
            &self.state.jwt_config,
        )
        .unwrap();
        (token, email)
    }

    /// Creates a signed-in user with `role` and returns its token.
    pub async fn user(&self, role: Role) -> TestUser {
        let (token, email) = self.token(role);
        let (status, body) = self.request("GET", "/api/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        TestUser {
            id: body["id"].as_str().unwrap().parse().unwrap(),
            email,
            token,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let app = init_router(self.state.clone());
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

#[allow(dead_code)]
pub fn generate_unique_name(prefix: &str) -> String {
    format!("{} {}", prefix, Uuid::new_v4())
}
