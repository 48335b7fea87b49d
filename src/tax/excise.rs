//! Excise duty: per-line specific (per unit) or ad-valorem (percent of
//! value) rates resolved by product code.

use crate::money::round_sle;
use crate::rates::{ExciseRateType, RateProvider};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExciseLine {
    pub product_code: String,
    pub quantity: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExciseDutyRequest {
    pub items: Vec<ExciseLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExciseLineResult {
    pub product_code: String,
    pub description: String,
    pub rate_type: ExciseRateType,
    pub rate: Decimal,
    pub duty: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExciseDutyResult {
    pub lines: Vec<ExciseLineResult>,
    /// Product codes with no configured rate. Duty on these items is not
    /// assessed; callers should surface this list as a completeness gap.
    pub skipped: Vec<String>,
    pub total_duty: Decimal,
}

pub fn calculate_excise_duty(rates: &RateProvider, request: &ExciseDutyRequest) -> ExciseDutyResult {
    let mut lines = Vec::new();
    let mut skipped = Vec::new();
    let mut total_duty = Decimal::ZERO;

    for item in &request.items {
        let Some(rate) = rates.resolve_excise_rate(&item.product_code) else {
            log::warn!(
                "no excise rate for product code {}, duty not assessed",
                item.product_code
            );
            skipped.push(item.product_code.clone());
            continue;
        };

        let duty = match rate.rate_type {
            ExciseRateType::Specific => round_sle(rate.rate * item.quantity),
            ExciseRateType::AdValorem => round_sle(item.value * rate.rate / dec!(100)),
        };
        total_duty += duty;
        lines.push(ExciseLineResult {
            product_code: rate.product_code.clone(),
            description: rate.description.clone(),
            rate_type: rate.rate_type,
            rate: rate.rate,
            duty,
        });
    }

    ExciseDutyResult {
        lines,
        skipped,
        total_duty,
    }
}
