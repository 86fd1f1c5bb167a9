#![allow(dead_code)]

use serde_json::{json, Value};
use shuk::Marketplace;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Route the crate's tracing output to the test harness; `RUST_LOG=shuk=debug` to see it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn market(server: &MockServer) -> Marketplace {
    init_tracing();
    Marketplace::new(&server.uri(), "test_anon_key").unwrap()
}

pub fn session_json(user_id: &str, access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "test_refresh_token",
        "user": {
            "id": user_id,
            "email": "dana@levi-textiles.co.il",
            "role": "authenticated",
            "user_metadata": { "is_supplier": true, "business_name": "Levi Textiles" }
        }
    })
}

/// Mount a password grant and sign in through it
pub async fn signed_in(server: &MockServer, user_id: &str, access_token: &str) -> Marketplace {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(user_id, access_token)))
        .mount(server)
        .await;

    let market = market(server).await;
    market
        .auth()
        .sign_in("dana@levi-textiles.co.il", "password123")
        .await
        .unwrap();
    market
}

pub fn product_json(id: &str, supplier_id: &str, price: Option<f64>, created_at: &str) -> Value {
    json!({
        "id": id,
        "supplier_id": supplier_id,
        "title": format!("Product {id}"),
        "price": price,
        "category": "Textiles",
        "images": [],
        "is_active": true,
        "created_at": created_at,
        "supplier": { "id": supplier_id, "business_name": "Levi Textiles", "is_verified": true }
    })
}
