#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use rbac_api::configuration::JwtSettings;
use rbac_api::startup::run;
use rbac_api::store::{InMemoryStore, Store};
use serde_json::{json, Value};

pub const PASSWORD: &str = "Passw0rd!";

pub struct TestApp<S = InMemoryStore> {
    pub address: String,
    pub store: Arc<S>,
    pub client: reqwest::Client,
}

pub struct Session {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub fn test_jwt_settings() -> JwtSettings {
    JwtSettings {
        access_secret: "integration-access-secret".to_string(),
        refresh_secret: "integration-refresh-secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_jwt_settings()).await
}

pub async fn spawn_app_with(jwt_config: JwtSettings) -> TestApp {
    spawn_app_on(Arc::new(InMemoryStore::new()), jwt_config)
}

/// Serves the API from `store` on a random local port
pub fn spawn_app_on<S: Store + 'static>(store: Arc<S>, jwt_config: JwtSettings) -> TestApp<S> {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let server = run(listener, store.clone(), jwt_config).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

impl<S> TestApp<S> {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, name: &str, email: &str, role: &str) -> reqwest::Response {
        self.post_json(
            "/auth/register",
            &json!({
                "name": name,
                "email": email,
                "role": role,
                "password": PASSWORD
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json("/auth/login", &json!({"email": email, "password": password}))
            .await
    }

    /// Registers a user with `role` and logs it in
    pub async fn signed_in(&self, email: &str, role: &str) -> Session {
        let response = self.register("Test User", email, role).await;
        assert_eq!(201, response.status().as_u16());

        let response = self.login(email, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());

        let body: Value = response.json().await.expect("Failed to parse response");
        let data = &body["body"]["data"];
        Session {
            id: data["id"].as_str().expect("No id").to_string(),
            access_token: data["accessToken"].as_str().expect("No access token").to_string(),
            refresh_token: data["refreshToken"]
                .as_str()
                .expect("No refresh token")
                .to_string(),
        }
    }
}
