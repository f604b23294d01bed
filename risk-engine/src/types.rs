//! Core types for risk engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fraud risk tier attached to every transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    /// Low risk
    #[serde(rename = "BAIXO")]
    Low,
    /// Medium risk
    #[serde(rename = "MEDIO")]
    Medium,
    /// High risk
    #[serde(rename = "ALTO")]
    High,
}

impl RiskTier {
    /// Name used on the wire and in persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "BAIXO",
            RiskTier::Medium => "MEDIO",
            RiskTier::High => "ALTO",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Baixo",
            RiskTier::Medium => "Médio",
            RiskTier::High => "Alto",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for RiskTier {
    type Err = UnknownVariant;

    /// Case-insensitive; accepts wire names and English names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BAIXO" | "LOW" => Ok(RiskTier::Low),
            "MEDIO" | "MEDIUM" => Ok(RiskTier::Medium),
            "ALTO" | "HIGH" => Ok(RiskTier::High),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash
    #[serde(rename = "DINHEIRO", alias = "CASH")]
    Cash,
    /// Debit or credit card
    #[serde(rename = "CARTAO", alias = "CARD")]
    Card,
    /// Instant transfer
    #[serde(rename = "PIX")]
    Pix,
}

impl PaymentMethod {
    /// Name used on the wire and in persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "DINHEIRO",
            PaymentMethod::Card => "CARTAO",
            PaymentMethod::Pix => "PIX",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::Card => "Cartão",
            PaymentMethod::Pix => "PIX",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DINHEIRO" | "CASH" => Ok(PaymentMethod::Cash),
            "CARTAO" | "CARD" => Ok(PaymentMethod::Card),
            "PIX" => Ok(PaymentMethod::Pix),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Payload sent to the external classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResolutionRequest {
    /// Transaction amount, validated non-negative by the caller
    #[serde(rename = "valor", with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Payment method, if known
    #[serde(rename = "tipoPagamento")]
    pub method: Option<PaymentMethod>,
}

impl RiskResolutionRequest {
    /// Build a request for one classification call
    pub fn new(amount: Decimal, method: Option<PaymentMethod>) -> Self {
        Self { amount, method }
    }
}

/// Successful answer from the external classifier
///
/// `tier` is kept as the raw string; it must be parsed into a [`RiskTier`]
/// before use and is discarded when it names no tier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRiskOutcome {
    /// Tier name as reported by the remote service
    #[serde(rename = "risco", alias = "risk")]
    pub tier: String,

    /// Free-form message
    #[serde(default, rename = "mensagem", alias = "message")]
    pub message: Option<String>,

    /// Raw score, if reported
    #[serde(default, rename = "score")]
    pub raw_score: Option<i64>,
}

impl RemoteRiskOutcome {
    /// Parse the reported tier
    pub fn parse_tier(&self) -> Option<RiskTier> {
        self.tier.parse().ok()
    }
}
