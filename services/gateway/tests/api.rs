//! End-to-end checks of the session boundary and risk endpoint

use actix_web::{http::StatusCode, test, web, App};
use gateway::models::{RiskEvaluationResponse, SessionCreatedResponse, SessionStatusResponse};
use gateway::{handlers, SessionAuth};
use risk_engine::{
    FallbackReason, HttpRiskClassifier, ResilientRiskResolver, ResolutionSource, ResolverConfig,
    RiskTier,
};
use security::{ManualClock, SessionConfig, SessionStore, SESSION_TOKEN_HEADER};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

macro_rules! app {
    ($store:expr, $resolver:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($resolver.clone()))
                .app_data(web::Data::new($store.clone()))
                .wrap(SessionAuth::new($store.clone()))
                .configure(handlers::configure_routes),
        )
        .await
    };
}

fn local_resolver() -> Arc<ResilientRiskResolver> {
    Arc::new(ResilientRiskResolver::local_only())
}

fn fresh_store() -> (Arc<SessionStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let store = Arc::new(SessionStore::with_clock(SessionConfig::default(), clock.clone()));
    (store, clock)
}

#[actix_web::test]
async fn test_health_is_public() {
    let (store, _) = fresh_store();
    let resolver = local_resolver();
    let app = app!(store, resolver);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let fields = body.as_object().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[actix_web::test]
async fn test_protected_route_requires_token() {
    let (store, _) = fresh_store();
    let resolver = local_resolver();
    let app = app!(store, resolver);

    let req = test::TestRequest::post()
        .uri("/api/v1/risk/evaluate")
        .set_json(serde_json::json!({"amount": "50.00", "payment_method": "PIX"}))
        .to_request();
    let resp = test::try_call_service(&app, req).await;

    let status = match resp {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    };
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_unknown_token_is_rejected() {
    let (store, _) = fresh_store();
    let resolver = local_resolver();
    let app = app!(store, resolver);

    let req = test::TestRequest::post()
        .uri("/api/v1/risk/evaluate")
        .insert_header((SESSION_TOKEN_HEADER, "forged"))
        .set_json(serde_json::json!({"amount": "50.00", "payment_method": "PIX"}))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();

    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_session_flow_and_local_risk() {
    let (store, clock) = fresh_store();
    let resolver = local_resolver();
    let app = app!(store, resolver);

    let req = test::TestRequest::post()
        .uri("/api/v1/sessions?subject=operator-7")
        .to_request();
    let created: SessionCreatedResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(store.peek(&created.token).unwrap().subject, "operator-7");

    let req = test::TestRequest::post()
        .uri("/api/v1/risk/evaluate")
        .insert_header((SESSION_TOKEN_HEADER, created.token.as_str()))
        .set_json(serde_json::json!({"amount": "500.00", "payment_method": "CARTAO"}))
        .to_request();
    let body: RiskEvaluationResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.risk_tier, RiskTier::Medium);
    assert_eq!(body.risk_tier_label, "Médio");
    assert_eq!(body.payment_method_label.as_deref(), Some("Cartão"));
    assert_eq!(body.source, ResolutionSource::Fallback(FallbackReason::Disabled));

    // session expires after 30 idle minutes
    clock.advance(chrono::Duration::minutes(31));

    let req = test::TestRequest::post()
        .uri("/api/v1/sessions/validate")
        .insert_header((SESSION_TOKEN_HEADER, created.token.as_str()))
        .to_request();
    let status: SessionStatusResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status.status, "invalid");
    assert!(store.is_empty());
}

#[actix_web::test]
async fn test_invalidate_ends_session() {
    let (store, _) = fresh_store();
    let resolver = local_resolver();
    let app = app!(store, resolver);
    let token = store.create("user");

    let req = test::TestRequest::post()
        .uri("/api/v1/sessions/validate")
        .insert_header((SESSION_TOKEN_HEADER, token.as_str()))
        .to_request();
    let status: SessionStatusResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status.status, "valid");

    let req = test::TestRequest::post()
        .uri("/api/v1/sessions/invalidate")
        .insert_header((SESSION_TOKEN_HEADER, token.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(!store.validate(&token));
}

#[actix_web::test]
async fn test_non_positive_amount_is_rejected() {
    let (store, _) = fresh_store();
    let resolver = local_resolver();
    let app = app!(store, resolver);
    let token = store.create("user");

    let req = test::TestRequest::post()
        .uri("/api/v1/risk/evaluate")
        .insert_header((SESSION_TOKEN_HEADER, token.as_str()))
        .set_json(serde_json::json!({"amount": "0", "payment_method": "PIX"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_preflight_skips_session_check() {
    let (store, _) = fresh_store();
    let resolver = local_resolver();
    let app = app!(store, resolver);

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/v1/risk/evaluate")
        .to_request();
    let resp = test::try_call_service(&app, req).await;

    let status = match resp {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    };
    assert_ne!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_remote_tier_is_used_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/consultar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"risco": "alto"})))
        .mount(&server)
        .await;

    let config = ResolverConfig {
        external_enabled: true,
        timeout: Duration::from_secs(2),
        retry_count: 0,
        retry_delay: Duration::ZERO,
    };
    let classifier = HttpRiskClassifier::new(server.uri(), Duration::from_secs(1)).unwrap();
    let resolver = Arc::new(ResilientRiskResolver::new(config, Arc::new(classifier)));
    let (store, _) = fresh_store();
    let app = app!(store, resolver);
    let token = store.create("user");

    let req = test::TestRequest::post()
        .uri("/api/v1/risk/evaluate")
        .insert_header((SESSION_TOKEN_HEADER, token.as_str()))
        .set_json(serde_json::json!({"amount": 10, "payment_method": "DINHEIRO"}))
        .to_request();
    let body: RiskEvaluationResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.risk_tier, RiskTier::High);
    assert_eq!(body.source, ResolutionSource::Remote);
}
