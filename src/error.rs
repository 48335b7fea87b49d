use crate::penalty::PenaltyKind;
use crate::types::TaxType;

/// Domain failure taxonomy for calculation functions.
///
/// Configuration fallbacks (missing rate tables) are deliberately not errors:
/// the rate provider substitutes built-in defaults and logs a warning instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No applicable penalty rule is configured, not even a default.
    /// Fatal to that calculation: callers must surface "cannot price this
    /// penalty" rather than silently zeroing it.
    #[error("no {kind} rule configured for {tax_type}")]
    RuleNotFound { tax_type: TaxType, kind: PenaltyKind },

    /// A computed penalty violates its own rule's bounds or basic sanity
    /// checks. Indicates calculation-logic drift, not bad user input.
    #[error("penalty validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
