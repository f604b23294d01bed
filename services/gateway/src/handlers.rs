use crate::errors::{ApiError, ApiResult};
use crate::metrics;
use crate::models::*;
use actix_web::{web, HttpRequest, HttpResponse};
use risk_engine::ResilientRiskResolver;
use rust_decimal::Decimal;
use security::{SessionStore, SESSION_TOKEN_HEADER};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

const DEFAULT_SUBJECT: &str = "user";

fn session_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty())
}

// ===== Health Check =====
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ===== Prometheus Metrics =====
pub async fn prometheus_metrics() -> ApiResult<HttpResponse> {
    let body = metrics::metrics_handler().map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ===== Create Session =====
pub async fn create_session(
    query: web::Query<CreateSessionQuery>,
    store: web::Data<Arc<SessionStore>>,
) -> HttpResponse {
    let subject = query
        .into_inner()
        .subject
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

    let token = store.create(&subject);
    metrics::SESSIONS_CREATED.inc();
    metrics::observe_sessions(&store);
    info!("Session opened for {}", subject);

    HttpResponse::Ok().json(SessionCreatedResponse {
        token,
        message: "Session created".to_string(),
    })
}

// ===== Validate Session =====
pub async fn validate_session(req: HttpRequest, store: web::Data<Arc<SessionStore>>) -> HttpResponse {
    let valid = session_token(&req).map(|t| store.validate(t)).unwrap_or(false);
    if !valid {
        metrics::observe_sessions(&store);
    }

    let response = if valid {
        SessionStatusResponse {
            status: "valid".to_string(),
            message: "Session is valid".to_string(),
        }
    } else {
        SessionStatusResponse {
            status: "invalid".to_string(),
            message: "Invalid or expired session".to_string(),
        }
    };

    HttpResponse::Ok().json(response)
}

// ===== Invalidate Session =====
pub async fn invalidate_session(
    req: HttpRequest,
    store: web::Data<Arc<SessionStore>>,
) -> HttpResponse {
    if let Some(token) = session_token(&req) {
        store.invalidate(token);
        metrics::observe_sessions(&store);
    }

    HttpResponse::Ok().json(json!({"status": "invalidated"}))
}

// ===== Evaluate Risk =====
pub async fn evaluate_risk(
    req: web::Json<RiskEvaluationRequest>,
    resolver: web::Data<Arc<ResilientRiskResolver>>,
) -> ApiResult<HttpResponse> {
    let request = req.into_inner();

    if request.amount <= Decimal::ZERO {
        return Err(ApiError::ValidationError(
            "amount must be positive".to_string(),
        ));
    }

    // Dropping this future on client disconnect also drops the remote call
    let resolution = resolver
        .resolve_detailed(request.amount, request.payment_method)
        .await;
    metrics::record_resolution(&resolution);

    info!(
        "Risk resolved: {} via {:?} for {} {}",
        resolution.tier,
        resolution.source,
        request.amount,
        request
            .payment_method
            .map(|m| m.as_str())
            .unwrap_or("UNKNOWN")
    );

    Ok(HttpResponse::Ok().json(RiskEvaluationResponse::new(
        resolution,
        request.payment_method,
    )))
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::ValidationError(err.to_string()).into()
    }))
    .service(
        web::scope("/api/v1/sessions")
            .route("", web::post().to(create_session))
            .route("/validate", web::post().to(validate_session))
            .route("/invalidate", web::post().to(invalidate_session)),
    )
    .service(web::scope("/api/v1/risk").route("/evaluate", web::post().to(evaluate_risk)))
    .route("/", web::get().to(health_check))
    .route("/health", web::get().to(health_check))
    .route("/metrics", web::get().to(prometheus_metrics));
}
