use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use risk_engine::{ResolutionSource, RiskResolution};
use security::SessionStore;
use std::sync::Once;
use tracing::warn;

lazy_static! {
    // Risk resolution metrics
    pub static ref RISK_RESOLUTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("risk_resolutions_total", "Risk resolutions by source and fallback reason"),
        &["source", "reason", "tier"]
    ).expect("metric can be created");

    // Session metrics
    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::new(
        "active_sessions",
        "Sessions currently held by the store"
    ).expect("metric can be created");

    pub static ref SESSIONS_CREATED: IntCounter = IntCounter::new(
        "sessions_created_total",
        "Total sessions created"
    ).expect("metric can be created");

    pub static ref SESSIONS_SWEPT: IntCounter = IntCounter::new(
        "sessions_swept_total",
        "Total expired sessions removed by the sweeper"
    ).expect("metric can be created");

    pub static ref SESSION_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("session_rejections_total", "Requests refused at the session boundary"),
        &["reason"]
    ).expect("metric can be created");
}

static REGISTER_DEFAULT: Once = Once::new();

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(RISK_RESOLUTIONS_TOTAL.clone()))?;
    registry.register(Box::new(ACTIVE_SESSIONS.clone()))?;
    registry.register(Box::new(SESSIONS_CREATED.clone()))?;
    registry.register(Box::new(SESSIONS_SWEPT.clone()))?;
    registry.register(Box::new(SESSION_REJECTIONS.clone()))?;
    Ok(())
}

/// Register with the process-wide default registry, once
pub fn init() {
    REGISTER_DEFAULT.call_once(|| {
        if let Err(e) = register_metrics(prometheus::default_registry()) {
            warn!("Failed to register metrics: {}", e);
        }
    });
}

/// Count one resolution by where its tier came from
pub fn record_resolution(resolution: &RiskResolution) {
    let (source, reason) = match resolution.source {
        ResolutionSource::Remote => ("remote", "none"),
        ResolutionSource::Fallback(reason) => ("fallback", reason.as_str()),
    };
    RISK_RESOLUTIONS_TOTAL
        .with_label_values(&[source, reason, resolution.tier.as_str()])
        .inc();
}

/// Publish the number of sessions the store currently holds
pub fn observe_sessions(store: &SessionStore) {
    ACTIVE_SESSIONS.set(store.len() as i64);
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
