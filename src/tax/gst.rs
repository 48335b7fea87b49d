//! GST: output tax on taxable supplies, zero-rated exports, input tax
//! credit, and reverse-charge GST on imports.

use crate::error::Result;
use crate::money::round_sle;
use crate::penalty::{PenaltyCalculationResult, PenaltyEngine};
use crate::rates::RateProvider;
use crate::types::{TaxType, TaxYear, TaxpayerCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GstRequest {
    pub tax_year: TaxYear,
    #[serde(default)]
    pub category: TaxpayerCategory,
    /// Standard-rated domestic supplies
    pub taxable_supplies: Decimal,
    /// Export supplies (zero-rated, not exempt: shown at 0%)
    #[serde(default)]
    pub export_supplies: Decimal,
    /// Input tax credit on purchases
    #[serde(default)]
    pub input_tax: Decimal,
    /// Value of imported services/goods subject to reverse charge
    #[serde(default)]
    pub import_value: Decimal,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GstResult {
    pub rate_percent: Decimal,
    pub output_gst: Decimal,
    /// Exports taxed at 0%; recorded so the return shows them as zero-rated
    pub zero_rated_supplies: Decimal,
    pub input_tax: Decimal,
    /// max(0, output - input); excess credit carries forward, it is not
    /// refunded by this calculation
    pub net_gst: Decimal,
    /// Reverse-charge GST on imports, added unconditionally (not netted
    /// against input tax)
    pub reverse_charge_gst: Decimal,
    pub gst_payable: Decimal,
    pub penalty: Option<PenaltyCalculationResult>,
    pub total_amount_due: Decimal,
}

pub fn calculate_gst(rates: &RateProvider, request: &GstRequest) -> Result<GstResult> {
    let bands = rates.resolve_tax_rates(request.tax_year, TaxType::Gst, request.category);
    let rate_percent = bands
        .first()
        .map(|b| b.rate_percent)
        .unwrap_or(Decimal::ZERO);

    let output_gst = round_sle(request.taxable_supplies * rate_percent / dec!(100));
    let net_gst = (output_gst - request.input_tax).max(Decimal::ZERO);
    let reverse_charge_gst = round_sle(request.import_value * rate_percent / dec!(100));
    let gst_payable = net_gst + reverse_charge_gst;

    let penalty = match (request.due_date, request.payment_date) {
        (Some(due), Some(paid)) if paid > due => {
            let engine = PenaltyEngine::new(rates);
            Some(engine.calculate_late_payment_penalty(
                TaxType::Gst,
                gst_payable,
                due,
                Some(paid),
                Some(request.category),
            )?)
        }
        _ => None,
    };
    let penalty_amount = penalty
        .as_ref()
        .map(|p| p.penalty_amount)
        .unwrap_or(Decimal::ZERO);

    Ok(GstResult {
        rate_percent,
        output_gst,
        zero_rated_supplies: request.export_supplies,
        input_tax: request.input_tax,
        net_gst,
        reverse_charge_gst,
        gst_payable,
        penalty,
        total_amount_due: gst_payable + penalty_amount,
    })
}
