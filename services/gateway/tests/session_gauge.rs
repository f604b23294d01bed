//! The active-sessions gauge follows lazy expiry, not just the sweeper.
//!
//! Kept in its own test binary: the gauge is process-wide.

use actix_web::{http::StatusCode, test, web, App};
use gateway::models::{SessionCreatedResponse, SessionStatusResponse};
use gateway::{handlers, metrics, SessionAuth};
use risk_engine::ResilientRiskResolver;
use security::{ManualClock, SessionConfig, SessionStore, SESSION_TOKEN_HEADER};
use std::sync::Arc;

#[actix_web::test]
async fn test_gauge_drops_when_expired_sessions_are_touched() {
    let clock = Arc::new(ManualClock::default());
    let store = Arc::new(SessionStore::with_clock(SessionConfig::default(), clock.clone()));
    let resolver = Arc::new(ResilientRiskResolver::local_only());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(store.clone()))
            .wrap(SessionAuth::new(store.clone()))
            .configure(handlers::configure_routes),
    )
    .await;

    let mut tokens = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
        let created: SessionCreatedResponse = test::call_and_read_body_json(&app, req).await;
        tokens.push(created.token);
    }
    assert_eq!(metrics::ACTIVE_SESSIONS.get(), 2);

    clock.advance(chrono::Duration::minutes(31));

    // rejected at the middleware
    let req = test::TestRequest::post()
        .uri("/api/v1/risk/evaluate")
        .insert_header((SESSION_TOKEN_HEADER, tokens[0].as_str()))
        .set_json(serde_json::json!({"amount": "10.00", "payment_method": "PIX"}))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(metrics::ACTIVE_SESSIONS.get(), 1);

    // reported invalid by the validate endpoint
    let req = test::TestRequest::post()
        .uri("/api/v1/sessions/validate")
        .insert_header((SESSION_TOKEN_HEADER, tokens[1].as_str()))
        .to_request();
    let status: SessionStatusResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status.status, "invalid");
    assert_eq!(metrics::ACTIVE_SESSIONS.get(), 0);
    assert!(store.is_empty());
}
