use risk_engine::{PaymentMethod, ResolutionSource, RiskResolution, RiskTier};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ===== Health =====
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ===== Sessions =====
#[derive(Debug, Deserialize)]
pub struct CreateSessionQuery {
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub status: String,
    pub message: String,
}

// ===== Risk Evaluation =====
#[derive(Debug, Deserialize, Clone)]
pub struct RiskEvaluationRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RiskEvaluationResponse {
    pub risk_tier: RiskTier,
    pub risk_tier_label: String,
    pub payment_method_label: Option<String>,
    pub source: ResolutionSource,
}

impl RiskEvaluationResponse {
    pub fn new(resolution: RiskResolution, method: Option<PaymentMethod>) -> Self {
        Self {
            risk_tier: resolution.tier,
            risk_tier_label: resolution.tier.label().to_string(),
            payment_method_label: method.map(|m| m.label().to_string()),
            source: resolution.source,
        }
    }
}
