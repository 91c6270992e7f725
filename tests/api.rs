use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mealplanner::{
    app::build_app,
    auth::JwtKeys,
    billing::webhook::WebhookVerifier,
    llm::{client::ChatMessage, LlmClient, LlmError},
    state::AppState,
};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

fn bearer(state: &AppState) -> String {
    let token = JwtKeys::from(&state.config.jwt)
        .sign(Uuid::new_v4(), Some("cook@example.com"), Duration::from_secs(300))
        .unwrap();
    format!("Bearer {token}")
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Vec<u8>) {
    let auth = bearer(&state);
    let req = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap();
    send(build_app(state), req).await
}

async fn post_json(state: AppState, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let auth = bearer(&state);
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(build_app(state), req).await
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let req = Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap();
    let (status, body) = send(build_app(AppState::fake()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn recipes_require_a_token() {
    let req = Request::builder().uri("/api/v1/recipes").body(Body::empty()).unwrap();
    let (status, _) = send(build_app(AppState::fake()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/v1/recipes")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(build_app(AppState::fake()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn snack_bucket_comes_from_overrides() {
    let (status, body) = get(AppState::fake(), "/api/v1/recipes?meal_type=snack").await;
    assert_eq!(status, StatusCode::OK);
    let page = json_body(&body);
    assert_eq!(page["total"], 3);
    let ids: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["b7", "b8", "l8"]);
    assert!(page["items"].as_array().unwrap().iter().all(|r| r["mealType"] == "snack"));
}

#[tokio::test]
async fn listing_is_paginated() {
    let (status, body) = get(AppState::fake(), "/api/v1/recipes?limit=5&offset=20").await;
    assert_eq!(status, StatusCode::OK);
    let page = json_body(&body);
    assert_eq!(page["total"], 24);
    assert_eq!(page["items"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn unknown_meal_type_is_rejected() {
    let (status, _) = get(AppState::fake(), "/api/v1/recipes?meal_type=brunch").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn random_recipe_is_from_the_bucket() {
    let (status, body) = get(AppState::fake(), "/api/v1/recipes/random?meal_type=dinner").await;
    assert_eq!(status, StatusCode::OK);
    let recipe = json_body(&body);
    assert_eq!(recipe["mealType"], "dinner");
    assert!(recipe["id"].as_str().unwrap().starts_with('d'));
}

#[tokio::test]
async fn search_returns_first_containment_match() {
    let (status, body) = get(AppState::fake(), "/api/v1/recipes/search?name=OATS&meal_type=breakfast").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["id"], "b1");

    let (status, _) = get(AppState::fake(), "/api/v1/recipes/search?name=pizza&meal_type=dinner").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recipe_by_id() {
    let (status, body) = get(AppState::fake(), "/api/v1/recipes/d2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["name"], "Baked Salmon with Asparagus");

    let (status, _) = get(AppState::fake(), "/api/v1/recipes/x99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn free_tier_has_no_checkout() {
    let (status, _) = post_json(AppState::fake(), "/api/v1/billing/checkout", json!({ "tier": "free" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn webhook_request(signature: Option<String>, payload: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/api/v1/billing/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(sig) = signature {
        req = req.header("stripe-signature", sig);
    }
    req.body(Body::from(payload.to_string())).unwrap()
}

#[tokio::test]
async fn webhook_rejects_bad_signatures() {
    let payload = json!({ "id": "evt_1", "type": "customer.subscription.deleted", "data": { "object": {} } }).to_string();

    let (status, _) = send(build_app(AppState::fake()), webhook_request(None, &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let now = OffsetDateTime::now_utc().unix_timestamp();
    let forged = WebhookVerifier::new("whsec_other").signature_header(payload.as_bytes(), now);
    let (status, _) = send(build_app(AppState::fake()), webhook_request(Some(forged), &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_webhook_is_acknowledged_even_when_processing_fails() {
    let state = AppState::fake();
    let verifier = WebhookVerifier::new(&state.config.billing.webhook_secret);
    let now = OffsetDateTime::now_utc().unix_timestamp();

    // the fake pool cannot connect, so the profile update fails
    let payload = json!({
        "id": "evt_2",
        "type": "checkout.session.completed",
        "data": { "object": {
            "client_reference_id": Uuid::new_v4().to_string(),
            "customer": "cus_1",
            "subscription": "sub_1",
            "metadata": { "tier": "premium" }
        }}
    })
    .to_string();
    let sig = verifier.signature_header(payload.as_bytes(), now);
    let (status, body) = send(build_app(state.clone()), webhook_request(Some(sig), &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({ "received": true }));

    let ignored = json!({ "id": "evt_3", "type": "invoice.paid", "data": { "object": {} } }).to_string();
    let sig = verifier.signature_header(ignored.as_bytes(), now);
    let (status, _) = send(build_app(state), webhook_request(Some(sig), &ignored)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn ai_meal_plan_returns_parsed_meals() {
    let body = json!({ "dietary_preference": "vegetarian", "budget_tier": "low", "servings": 2 });
    let (status, bytes) = post_json(AppState::fake(), "/api/v1/ai/meal-plan", body).await;
    assert_eq!(status, StatusCode::OK);
    let plan = json_body(&bytes);
    assert_eq!(plan["meals"][0]["day"], "Monday");
    assert_eq!(plan["meals"][0]["ingredients"][0], "1 cup rice");
}

struct ChattyLlm;

#[async_trait]
impl LlmClient for ChattyLlm {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        Ok("Here is a lovely plan for your week!".into())
    }
}

#[tokio::test]
async fn unparseable_model_reply_is_a_bad_gateway() {
    let state = AppState::fake().with_llm(Arc::new(ChattyLlm));
    let body = json!({ "dietary_preference": null, "budget_tier": "high", "servings": 4 });
    let (status, bytes) = post_json(state, "/api/v1/ai/meal-plan", body).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(String::from_utf8_lossy(&bytes).starts_with("invalid response from model"));
}

#[tokio::test]
async fn ai_meal_plan_validates_servings() {
    let body = json!({ "budget_tier": "medium", "servings": 0 });
    let (status, _) = post_json(AppState::fake(), "/api/v1/ai/meal-plan", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn week(days: usize, dinner: &str) -> Value {
    let days: Vec<Value> = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        .iter()
        .take(days)
        .map(|day| {
            json!({
                "day": day,
                "breakfast": { "id": "b1", "name": "Overnight Oats" },
                "lunch": "Lentil Soup",
                "dinner": dinner,
            })
        })
        .collect();
    json!({ "week": days })
}

#[tokio::test]
async fn saved_plan_needs_seven_days() {
    let (status, body) = post_json(AppState::fake(), "/api/v1/meal-plans", week(6, "Beef Tacos")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(String::from_utf8_lossy(&body), "a plan needs exactly 7 days, got 6");
}

#[tokio::test]
async fn saved_plan_slots_must_resolve() {
    let (status, body) = post_json(AppState::fake(), "/api/v1/meal-plans", week(7, "Beef Wellington")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(String::from_utf8_lossy(&body).contains("Beef Wellington"));
}

#[tokio::test]
async fn feedback_for_unknown_recipe_is_not_found() {
    let state = AppState::fake();
    let auth = bearer(&state);
    let req = Request::builder()
        .method("PUT")
        .uri("/api/v1/recipes/zzz/feedback")
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "rating": "like" }).to_string()))
        .unwrap();
    let (status, _) = send(build_app(state), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn meal_plans_require_a_token() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/meal-plans/generate")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(build_app(AppState::fake()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
