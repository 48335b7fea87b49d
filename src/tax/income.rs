//! Income tax: progressive brackets over the taxable base, with a
//! minimum-tax floor for Medium and Large taxpayers.

use crate::error::Result;
use crate::money::round_sle;
use crate::penalty::{PenaltyCalculationResult, PenaltyEngine};
use crate::rates::{AllowanceValue, RateProvider};
use crate::types::{TaxType, TaxYear, TaxpayerCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxRequest {
    pub tax_year: TaxYear,
    #[serde(default)]
    pub category: TaxpayerCategory,
    pub gross_income: Decimal,
    #[serde(default)]
    pub deductions: Decimal,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

/// Tax charged within one bracket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketTax {
    pub band_min: Decimal,
    pub band_max: Option<Decimal>,
    pub rate_percent: Decimal,
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxResult {
    pub taxable_income: Decimal,
    pub brackets: Vec<BracketTax>,
    pub bracket_tax: Decimal,
    /// Minimum-tax floor, when one applied to the category
    pub minimum_tax: Option<Decimal>,
    /// Final liability: max(bracket tax, minimum tax)
    pub tax: Decimal,
    pub penalty: Option<PenaltyCalculationResult>,
    pub total_amount_due: Decimal,
}

/// Calculate income tax liability.
///
/// Taxable income = max(0, gross - deductions - allowances). Brackets are
/// applied in ascending `band_min` order; the walk stops when the income is
/// exhausted. When a payment date past the due date is supplied, the late
/// payment penalty is added to produce `total_amount_due`.
pub fn calculate_income_tax(
    rates: &RateProvider,
    request: &IncomeTaxRequest,
) -> Result<IncomeTaxResult> {
    let allowance_total: Decimal = rates
        .resolve_allowances(request.tax_year, request.category)
        .iter()
        .map(|a| match a.value {
            AllowanceValue::Fixed(amount) => amount,
            AllowanceValue::PercentOfGross(pct) => {
                round_sle(request.gross_income * pct / dec!(100))
            }
        })
        .sum();

    let taxable_income =
        (request.gross_income - request.deductions - allowance_total).max(Decimal::ZERO);

    let bands = rates.resolve_tax_rates(request.tax_year, TaxType::IncomeTax, request.category);

    let mut brackets = Vec::new();
    let mut bracket_tax = Decimal::ZERO;
    let mut remaining = taxable_income;
    for band in &bands {
        if remaining <= Decimal::ZERO {
            break;
        }
        let band_width = band.band_max.map(|max| max - band.band_min);
        let taxed_amount = match band_width {
            Some(width) => remaining.min(width),
            None => remaining,
        };
        let tax = round_sle(taxed_amount * band.rate_percent / dec!(100));
        log::debug!(
            "bracket [{}, {:?}) @ {}%: taxed {} -> {}",
            band.band_min,
            band.band_max,
            band.rate_percent,
            taxed_amount,
            tax
        );
        brackets.push(BracketTax {
            band_min: band.band_min,
            band_max: band.band_max,
            rate_percent: band.rate_percent,
            taxed_amount,
            tax,
        });
        bracket_tax += tax;
        remaining -= taxed_amount;
    }

    let minimum_tax = rates
        .minimum_tax_rate(request.category)
        .map(|rate| round_sle(request.gross_income * rate / dec!(100)));
    let tax = match minimum_tax {
        Some(floor) => bracket_tax.max(floor),
        None => bracket_tax,
    };

    let penalty = late_payment_penalty(rates, request, tax)?;
    let penalty_amount = penalty
        .as_ref()
        .map(|p| p.penalty_amount)
        .unwrap_or(Decimal::ZERO);

    Ok(IncomeTaxResult {
        taxable_income,
        brackets,
        bracket_tax,
        minimum_tax,
        tax,
        penalty,
        total_amount_due: tax + penalty_amount,
    })
}

fn late_payment_penalty(
    rates: &RateProvider,
    request: &IncomeTaxRequest,
    tax: Decimal,
) -> Result<Option<PenaltyCalculationResult>> {
    match (request.due_date, request.payment_date) {
        (Some(due), Some(paid)) if paid > due => {
            let engine = PenaltyEngine::new(rates);
            let result = engine.calculate_late_payment_penalty(
                TaxType::IncomeTax,
                tax,
                due,
                Some(paid),
                Some(request.category),
            )?;
            Ok(Some(result))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::TaxAllowance;

    fn request(gross: Decimal, category: TaxpayerCategory) -> IncomeTaxRequest {
        IncomeTaxRequest {
            tax_year: TaxYear(2025),
            category,
            gross_income: gross,
            deductions: Decimal::ZERO,
            due_date: None,
            payment_date: None,
        }
    }

    #[test]
    fn individual_second_band_only() {
        // 8,000,000 income: (8,000,000 - 7,200,000) x 15% = 120,000
        let rates = RateProvider::with_defaults();
        let result =
            calculate_income_tax(&rates, &request(dec!(8000000), TaxpayerCategory::Individual))
                .unwrap();
        assert_eq!(result.tax, dec!(120000));
        assert_eq!(result.brackets.len(), 2);
        assert_eq!(result.brackets[0].tax, Decimal::ZERO);
        assert_eq!(result.brackets[1].taxed_amount, dec!(800000));
    }

    #[test]
    fn income_below_tax_free_band() {
        let rates = RateProvider::with_defaults();
        let result =
            calculate_income_tax(&rates, &request(dec!(5000000), TaxpayerCategory::Individual))
                .unwrap();
        assert_eq!(result.tax, Decimal::ZERO);
    }

    #[test]
    fn bracket_breakdown_sums_to_total() {
        let rates = RateProvider::with_defaults();
        let result =
            calculate_income_tax(&rates, &request(dec!(30000000), TaxpayerCategory::Individual))
                .unwrap();
        let sum: Decimal = result.brackets.iter().map(|b| b.tax).sum();
        assert_eq!(sum, result.bracket_tax);
        // all five bands engaged
        assert_eq!(result.brackets.len(), 5);
    }

    #[test]
    fn tax_monotonically_non_decreasing_in_income() {
        let rates = RateProvider::with_defaults();
        let mut previous = Decimal::ZERO;
        for gross in [
            dec!(0),
            dec!(7200000),
            dec!(7200001),
            dec!(12000000),
            dec!(18000000),
            dec!(24000000),
            dec!(50000000),
        ] {
            let result =
                calculate_income_tax(&rates, &request(gross, TaxpayerCategory::Individual))
                    .unwrap();
            assert!(result.tax >= previous, "tax decreased at income {gross}");
            previous = result.tax;
        }
    }

    #[test]
    fn deductions_reduce_taxable_income() {
        let rates = RateProvider::with_defaults();
        let mut req = request(dec!(8000000), TaxpayerCategory::Individual);
        req.deductions = dec!(800000);
        let result = calculate_income_tax(&rates, &req).unwrap();
        assert_eq!(result.taxable_income, dec!(7200000));
        assert_eq!(result.tax, Decimal::ZERO);
    }

    #[test]
    fn deductions_cannot_go_negative() {
        let rates = RateProvider::with_defaults();
        let mut req = request(dec!(1000000), TaxpayerCategory::Individual);
        req.deductions = dec!(5000000);
        let result = calculate_income_tax(&rates, &req).unwrap();
        assert_eq!(result.taxable_income, Decimal::ZERO);
        assert_eq!(result.tax, Decimal::ZERO);
    }

    #[test]
    fn allowances_reduce_taxable_base() {
        let mut rates = RateProvider::with_defaults();
        rates.add_allowance(TaxAllowance {
            tax_year: TaxYear(2025),
            category: TaxpayerCategory::Individual,
            allowance_type: "Personal".to_string(),
            value: AllowanceValue::Fixed(dec!(800000)),
        });
        let result =
            calculate_income_tax(&rates, &request(dec!(8000000), TaxpayerCategory::Individual))
                .unwrap();
        assert_eq!(result.taxable_income, dec!(7200000));
        assert_eq!(result.tax, Decimal::ZERO);
    }

    #[test]
    fn minimum_tax_floor_for_large_taxpayer() {
        // Flat 25% on a loss-making base would be 0; the 3% of gross floor
        // applies instead
        let rates = RateProvider::with_defaults();
        let mut req = request(dec!(10000000), TaxpayerCategory::Large);
        req.deductions = dec!(10000000);
        let result = calculate_income_tax(&rates, &req).unwrap();
        assert_eq!(result.bracket_tax, Decimal::ZERO);
        assert_eq!(result.minimum_tax, Some(dec!(300000)));
        assert_eq!(result.tax, dec!(300000));
    }

    #[test]
    fn minimum_tax_not_applied_when_bracket_tax_higher() {
        let rates = RateProvider::with_defaults();
        let result =
            calculate_income_tax(&rates, &request(dec!(10000000), TaxpayerCategory::Medium))
                .unwrap();
        // 25% of 10,000,000 = 2,500,000 beats the 2% floor of 200,000
        assert_eq!(result.minimum_tax, Some(dec!(200000)));
        assert_eq!(result.tax, dec!(2500000));
    }

    #[test]
    fn no_minimum_tax_for_individuals() {
        let rates = RateProvider::with_defaults();
        let result =
            calculate_income_tax(&rates, &request(dec!(8000000), TaxpayerCategory::Individual))
                .unwrap();
        assert_eq!(result.minimum_tax, None);
    }

    #[test]
    fn late_payment_adds_penalty_to_total() {
        let rates = RateProvider::with_defaults();
        let mut req = request(dec!(8000000), TaxpayerCategory::Individual);
        req.due_date = Some(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
        // 45 days late, grace 30, monthly 2%: 120,000 x 2% x 1 = 2,400
        req.payment_date = Some(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap());
        let result = calculate_income_tax(&rates, &req).unwrap();
        let penalty = result.penalty.as_ref().unwrap();
        assert_eq!(penalty.penalty_amount, dec!(2400));
        assert_eq!(result.total_amount_due, dec!(122400));
    }

    #[test]
    fn on_time_payment_has_no_penalty() {
        let rates = RateProvider::with_defaults();
        let mut req = request(dec!(8000000), TaxpayerCategory::Individual);
        req.due_date = Some(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
        req.payment_date = Some(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
        let result = calculate_income_tax(&rates, &req).unwrap();
        assert!(result.penalty.is_none());
        assert_eq!(result.total_amount_due, result.tax);
    }
}
