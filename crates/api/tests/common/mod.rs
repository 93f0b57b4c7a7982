//! Shared helpers for API integration tests.
//!
//! Builds the real application router (same middleware stack as
//! production) over a test pool and a stub payment gateway.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use guidely_api::auth::jwt::{generate_access_token, JwtConfig};
use guidely_api::config::ServerConfig;
use guidely_api::router::build_app_router;
use guidely_api::state::AppState;
use guidely_core::types::DbId;
use guidely_db::models::guide_product::CreateGuideProduct;
use guidely_db::models::user::CreateUser;
use guidely_db::repositories::{GuideProductRepo, UserRepo};
use guidely_ledger::ReservationLedger;
use guidely_payments::{GatewayError, PaymentGateway, PaymentState, PaymentVerification};

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-not-for-production".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Stub payment gateway: every registered transaction verifies as paid.
#[derive(Default)]
pub struct StubGateway {
    payments: Mutex<HashMap<String, i32>>,
}

impl StubGateway {
    pub fn paid(&self, imp_uid: &str, amount: i32) {
        self.payments
            .lock()
            .unwrap()
            .insert(imp_uid.to_string(), amount);
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn verify(&self, imp_uid: &str) -> Result<PaymentVerification, GatewayError> {
        let amount = self
            .payments
            .lock()
            .unwrap()
            .get(imp_uid)
            .copied()
            .ok_or_else(|| GatewayError::Rejected(format!("unknown transaction {imp_uid}")))?;
        Ok(PaymentVerification {
            imp_uid: imp_uid.to_string(),
            amount,
            state: PaymentState::Paid,
            paid_at: Some(chrono::Utc::now()),
        })
    }

    async fn refund(&self, imp_uid: &str, _reason: &str) -> Result<(), GatewayError> {
        if self.payments.lock().unwrap().contains_key(imp_uid) {
            Ok(())
        } else {
            Err(GatewayError::Rejected(format!("unknown transaction {imp_uid}")))
        }
    }
}

/// Build the full application router over the given pool and gateway.
pub fn build_test_app(pool: PgPool, gateway: Arc<StubGateway>) -> Router {
    let config = test_config();
    let ledger = Arc::new(ReservationLedger::new(pool.clone(), gateway));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ledger,
    };
    build_app_router(state, &config)
}

/// Mint an access token for `user_id` with the test secret.
pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).unwrap()
}

pub async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            nickname: email.split('@').next().unwrap().to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

/// Listing available all of 2024-06-01 at 10,000 minor units, capacity 1.
pub async fn seed_product(pool: &PgPool, guide_id: DbId) -> DbId {
    use chrono::{TimeZone, Utc};
    GuideProductRepo::create(
        pool,
        &CreateGuideProduct {
            user_id: guide_id,
            title: "Gyeongbokgung palace tour".to_string(),
            description: Some("Two hours around the palace grounds".to_string()),
            price: 10_000,
            capacity: 1,
            guide_start: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            guide_end: Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap(),
        },
    )
    .await
    .unwrap()
    .id
}

/// Send a GET request without authentication.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a GET request with a Bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body and a Bearer token.
pub async fn post_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body into parsed JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a response status and return the parsed JSON body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
