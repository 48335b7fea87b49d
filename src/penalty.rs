//! Penalty and interest calculation engine.
//!
//! Each calculation returns a [`PenaltyCalculationResult`] carrying the
//! ordered, human-readable calculation steps. Downstream consumers display
//! these steps verbatim to justify the figure to a taxpayer, so every
//! arithmetic stage must append a line.

use crate::error::{EngineError, Result};
use crate::money::{display_sle, round_sle};
use crate::rates::RateProvider;
use crate::types::{TaxType, TaxpayerCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Statutory interest rate, percent per annum (simple daily, 365-day year)
pub const INTEREST_RATE_PERCENT: Decimal = dec!(18);

/// Kind of penalty a rule prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenaltyKind {
    LateFiling,
    LatePayment,
    NonFiling,
    UnderDeclaration,
    Interest,
}

impl PenaltyKind {
    pub fn from_str(s: &str) -> Option<PenaltyKind> {
        match s.to_lowercase().as_str() {
            "late-filing" | "latefiling" => Some(PenaltyKind::LateFiling),
            "late-payment" | "latepayment" => Some(PenaltyKind::LatePayment),
            "non-filing" | "nonfiling" => Some(PenaltyKind::NonFiling),
            "under-declaration" | "underdeclaration" => Some(PenaltyKind::UnderDeclaration),
            "interest" => Some(PenaltyKind::Interest),
            _ => None,
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            PenaltyKind::LateFiling => "late filing penalty",
            PenaltyKind::LatePayment => "late payment penalty",
            PenaltyKind::NonFiling => "non-filing penalty",
            PenaltyKind::UnderDeclaration => "under-declaration penalty",
            PenaltyKind::Interest => "interest",
        }
    }
}

impl std::fmt::Display for PenaltyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Exactly one pricing shape per rule; percentages are whole-number
/// percents (2 = 2%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value")]
pub enum PricingShape {
    FixedAmount(Decimal),
    FixedRatePercent(Decimal),
    DailyRatePercent(Decimal),
    MonthlyRatePercent(Decimal),
}

impl PricingShape {
    /// The percentage rate used, if any (fixed amounts have none)
    pub fn rate_percent(&self) -> Option<Decimal> {
        match self {
            PricingShape::FixedAmount(_) => None,
            PricingShape::FixedRatePercent(r)
            | PricingShape::DailyRatePercent(r)
            | PricingShape::MonthlyRatePercent(r) => Some(*r),
        }
    }
}

/// Admin-authored penalty pricing rule, versioned by effective date.
/// Corrections create a new rule and deactivate the old one; rules are
/// never mutated in place once in force.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyRule {
    pub tax_type: TaxType,
    pub kind: PenaltyKind,
    pub pricing: PricingShape,
    pub grace_period_days: i64,
    pub maximum_days: Option<i64>,
    pub minimum_amount: Option<Decimal>,
    pub maximum_amount: Option<Decimal>,
    /// None = applies to any taxpayer category
    pub category: Option<TaxpayerCategory>,
    pub priority: i32,
    pub effective_from: NaiveDate,
    pub expires_on: Option<NaiveDate>,
    pub active: bool,
    pub legal_reference: String,
}

impl PenaltyRule {
    /// Invariant check: `minimum_amount <= maximum_amount` when both set
    pub fn bounds_consistent(&self) -> bool {
        match (self.minimum_amount, self.maximum_amount) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Itemized outcome of a single penalty or interest calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyCalculationResult {
    pub kind: PenaltyKind,
    pub base_amount: Decimal,
    pub days_overdue: i64,
    pub penalty_amount: Decimal,
    pub rate_used: Option<Decimal>,
    /// Ordered audit trail, one line per arithmetic step
    pub calculation_steps: Vec<String>,
    pub legal_reference: Option<String>,
}

impl PenaltyCalculationResult {
    /// A zero-amount "no penalty" result with an explanatory step
    fn none(kind: PenaltyKind, base_amount: Decimal, reason: String) -> Self {
        PenaltyCalculationResult {
            kind,
            base_amount,
            days_overdue: 0,
            penalty_amount: Decimal::ZERO,
            rate_used: None,
            calculation_steps: vec![reason],
            legal_reference: None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.penalty_amount.is_zero()
    }
}

/// Input to [`PenaltyEngine::calculate_all_applicable`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyAssessmentInput {
    pub tax_type: TaxType,
    #[serde(default)]
    pub category: Option<TaxpayerCategory>,
    /// Assessed or estimated liability, the base for filing penalties
    pub liability_amount: Decimal,
    /// Outstanding balance, the base for payment penalties and interest
    pub unpaid_amount: Decimal,
    pub filing_due_date: NaiveDate,
    #[serde(default)]
    pub filed_date: Option<NaiveDate>,
    pub payment_due_date: NaiveDate,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    /// Assessment date; open obligations accrue up to this day
    pub as_of: NaiveDate,
}

/// Penalty calculation engine over an explicit rule provider.
///
/// Stateless with respect to anything but the provider reference; safe to
/// call concurrently.
pub struct PenaltyEngine<'a> {
    rates: &'a RateProvider,
}

impl<'a> PenaltyEngine<'a> {
    pub fn new(rates: &'a RateProvider) -> Self {
        PenaltyEngine { rates }
    }

    /// Penalty for filing after the due date. `actual_date` defaults to
    /// today when the return is still outstanding.
    pub fn calculate_late_filing_penalty(
        &self,
        tax_type: TaxType,
        base_amount: Decimal,
        due_date: NaiveDate,
        actual_date: Option<NaiveDate>,
        category: Option<TaxpayerCategory>,
    ) -> Result<PenaltyCalculationResult> {
        self.overdue_penalty(
            PenaltyKind::LateFiling,
            tax_type,
            base_amount,
            due_date,
            actual_date,
            category,
        )
    }

    /// Penalty on an unpaid balance past its due date. Same shape, grace
    /// and cap mechanics as late filing, operating on the unpaid amount.
    pub fn calculate_late_payment_penalty(
        &self,
        tax_type: TaxType,
        unpaid_amount: Decimal,
        due_date: NaiveDate,
        actual_date: Option<NaiveDate>,
        category: Option<TaxpayerCategory>,
    ) -> Result<PenaltyCalculationResult> {
        self.overdue_penalty(
            PenaltyKind::LatePayment,
            tax_type,
            unpaid_amount,
            due_date,
            actual_date,
            category,
        )
    }

    /// Penalty for a return that was never filed. The "significantly
    /// overdue" policy threshold (30+ days) is enforced by the caller,
    /// not here.
    pub fn calculate_non_filing_penalty(
        &self,
        tax_type: TaxType,
        estimated_liability: Decimal,
        due_date: NaiveDate,
        as_of: Option<NaiveDate>,
        category: Option<TaxpayerCategory>,
    ) -> Result<PenaltyCalculationResult> {
        self.overdue_penalty(
            PenaltyKind::NonFiling,
            tax_type,
            estimated_liability,
            due_date,
            as_of,
            category,
        )
    }

    /// Simple (non-compounding) daily interest at the statutory rate.
    /// No grace period applies to interest.
    pub fn calculate_interest(
        &self,
        unpaid_amount: Decimal,
        due_date: NaiveDate,
        paid_date: Option<NaiveDate>,
    ) -> PenaltyCalculationResult {
        let actual = paid_date.unwrap_or_else(today);
        let days_overdue = actual.signed_duration_since(due_date).num_days().max(0);

        if days_overdue == 0 {
            return PenaltyCalculationResult::none(
                PenaltyKind::Interest,
                unpaid_amount,
                "No interest: paid on or before the due date".to_string(),
            );
        }

        let mut steps = vec![format!(
            "Days overdue: {days_overdue} (due {due_date}, settled {actual})"
        )];
        // Multiply before dividing so the division rounds only once
        let amount = round_sle(
            unpaid_amount * INTEREST_RATE_PERCENT * Decimal::from(days_overdue) / dec!(36500),
        );
        steps.push(format!(
            "{} x {INTEREST_RATE_PERCENT}%/365 x {days_overdue} day(s) = {}",
            display_sle(unpaid_amount),
            display_sle(amount)
        ));

        PenaltyCalculationResult {
            kind: PenaltyKind::Interest,
            base_amount: unpaid_amount,
            days_overdue,
            penalty_amount: amount,
            rate_used: Some(INTEREST_RATE_PERCENT),
            calculation_steps: steps,
            legal_reference: None,
        }
    }

    /// Penalty on the difference between declared and actual liability.
    /// Zero when nothing was under-declared.
    pub fn calculate_under_declaration_penalty(
        &self,
        tax_type: TaxType,
        declared_amount: Decimal,
        actual_amount: Decimal,
        category: Option<TaxpayerCategory>,
    ) -> Result<PenaltyCalculationResult> {
        let under_declared = actual_amount - declared_amount;
        if under_declared <= Decimal::ZERO {
            return Ok(PenaltyCalculationResult::none(
                PenaltyKind::UnderDeclaration,
                Decimal::ZERO,
                "No penalty: declared amount covers the actual liability".to_string(),
            ));
        }

        let rule = self
            .rates
            .resolve_penalty_rule(tax_type, PenaltyKind::UnderDeclaration, category)?;

        let mut steps = vec![format!(
            "Under-declared amount: {} - {} = {}",
            display_sle(actual_amount),
            display_sle(declared_amount),
            display_sle(under_declared)
        )];

        let mut amount = match rule.pricing {
            PricingShape::FixedAmount(fixed) => {
                steps.push(format!("Fixed penalty: {}", display_sle(fixed)));
                fixed
            }
            PricingShape::FixedRatePercent(rate)
            | PricingShape::DailyRatePercent(rate)
            | PricingShape::MonthlyRatePercent(rate) => {
                let computed = round_sle(under_declared * rate / dec!(100));
                steps.push(format!(
                    "{} x {rate}% = {}",
                    display_sle(under_declared),
                    display_sle(computed)
                ));
                computed
            }
        };
        amount = clamp_to_bounds(amount, rule, &mut steps);

        Ok(PenaltyCalculationResult {
            kind: PenaltyKind::UnderDeclaration,
            base_amount: under_declared,
            days_overdue: 0,
            penalty_amount: amount,
            rate_used: rule.pricing.rate_percent(),
            calculation_steps: steps,
            legal_reference: Some(rule.legal_reference.clone()),
        })
    }

    /// Orchestrates every penalty that applies to an obligation:
    /// - late filing if not yet filed, or filed after the due date
    /// - late payment penalty and interest if an unpaid balance exists past
    ///   its due date
    /// - non-filing penalty only once the return is more than 30 days
    ///   overdue and still unfiled
    ///
    /// Returns the non-zero results without summing them; callers sum as
    /// needed, preserving the itemized breakdown.
    pub fn calculate_all_applicable(
        &self,
        input: &PenaltyAssessmentInput,
    ) -> Result<Vec<PenaltyCalculationResult>> {
        let mut results = Vec::new();

        let filed_late = input
            .filed_date
            .map(|d| d > input.filing_due_date)
            .unwrap_or(input.as_of > input.filing_due_date);
        if filed_late {
            let actual = input.filed_date.unwrap_or(input.as_of);
            results.push(self.calculate_late_filing_penalty(
                input.tax_type,
                input.liability_amount,
                input.filing_due_date,
                Some(actual),
                input.category,
            )?);
        }

        let unpaid_overdue = input.unpaid_amount > Decimal::ZERO
            && input
                .paid_date
                .map(|d| d > input.payment_due_date)
                .unwrap_or(input.as_of > input.payment_due_date);
        if unpaid_overdue {
            let actual = input.paid_date.unwrap_or(input.as_of);
            results.push(self.calculate_late_payment_penalty(
                input.tax_type,
                input.unpaid_amount,
                input.payment_due_date,
                Some(actual),
                input.category,
            )?);
            results.push(self.calculate_interest(
                input.unpaid_amount,
                input.payment_due_date,
                Some(actual),
            ));
        }

        let unfiled_days = input
            .as_of
            .signed_duration_since(input.filing_due_date)
            .num_days();
        if input.filed_date.is_none() && unfiled_days > 30 {
            results.push(self.calculate_non_filing_penalty(
                input.tax_type,
                input.liability_amount,
                input.filing_due_date,
                Some(input.as_of),
                input.category,
            )?);
        }

        results.retain(|r| !r.is_zero());
        Ok(results)
    }

    /// Guard against calculation-logic drift: rejects negative amounts or
    /// day counts and re-checks the amount against the rule's bounds,
    /// returning a descriptive failure rather than silently correcting.
    pub fn validate_penalty_calculation(
        &self,
        result: &PenaltyCalculationResult,
        rule: &PenaltyRule,
    ) -> Result<()> {
        if result.penalty_amount < Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "negative penalty amount {}",
                result.penalty_amount
            )));
        }
        if result.days_overdue < 0 {
            return Err(EngineError::Validation(format!(
                "negative days overdue {}",
                result.days_overdue
            )));
        }
        if !rule.bounds_consistent() {
            return Err(EngineError::Validation(
                "rule minimum exceeds its maximum".to_string(),
            ));
        }
        // Bounds only bind a non-zero penalty; grace-period zeroes are valid
        if !result.penalty_amount.is_zero() {
            if let Some(min) = rule.minimum_amount {
                if result.penalty_amount < min {
                    return Err(EngineError::Validation(format!(
                        "amount {} below rule minimum {}",
                        result.penalty_amount, min
                    )));
                }
            }
            if let Some(max) = rule.maximum_amount {
                if result.penalty_amount > max {
                    return Err(EngineError::Validation(format!(
                        "amount {} above rule maximum {}",
                        result.penalty_amount, max
                    )));
                }
            }
        }
        Ok(())
    }

    /// Shared mechanics for the overdue-day penalty kinds: day count, grace
    /// period, pricing shape, day cap, min/max clamp.
    fn overdue_penalty(
        &self,
        kind: PenaltyKind,
        tax_type: TaxType,
        base_amount: Decimal,
        due_date: NaiveDate,
        actual_date: Option<NaiveDate>,
        category: Option<TaxpayerCategory>,
    ) -> Result<PenaltyCalculationResult> {
        let actual = actual_date.unwrap_or_else(today);
        let days_overdue = actual.signed_duration_since(due_date).num_days().max(0);

        if days_overdue == 0 {
            return Ok(PenaltyCalculationResult::none(
                kind,
                base_amount,
                "No penalty: on or before the due date".to_string(),
            ));
        }

        let rule = self.rates.resolve_penalty_rule(tax_type, kind, category)?;

        let mut steps = vec![format!(
            "Days overdue: {days_overdue} (due {due_date}, actual {actual})"
        )];

        let effective_days = days_overdue - rule.grace_period_days;
        if rule.grace_period_days > 0 {
            steps.push(format!(
                "Grace period {} day(s): effective days = {}",
                rule.grace_period_days,
                effective_days.max(0)
            ));
        }
        if effective_days <= 0 {
            steps.push("Within grace period: no penalty accrues".to_string());
            return Ok(PenaltyCalculationResult {
                kind,
                base_amount,
                days_overdue,
                penalty_amount: Decimal::ZERO,
                rate_used: None,
                calculation_steps: steps,
                legal_reference: Some(rule.legal_reference.clone()),
            });
        }

        let mut amount = match rule.pricing {
            PricingShape::FixedAmount(fixed) => {
                steps.push(format!("Fixed penalty: {}", display_sle(fixed)));
                fixed
            }
            PricingShape::FixedRatePercent(rate) => {
                let computed = round_sle(base_amount * rate / dec!(100));
                steps.push(format!(
                    "{} x {rate}% = {}",
                    display_sle(base_amount),
                    display_sle(computed)
                ));
                computed
            }
            PricingShape::DailyRatePercent(rate) => {
                let capped_days = match rule.maximum_days {
                    Some(max_days) => {
                        let capped = effective_days.min(max_days);
                        if capped < effective_days {
                            steps.push(format!("Chargeable days capped at {max_days}"));
                        }
                        capped
                    }
                    None => effective_days,
                };
                let computed =
                    round_sle(base_amount * rate * Decimal::from(capped_days) / dec!(100));
                steps.push(format!(
                    "{} x {rate}%/day x {capped_days} day(s) = {}",
                    display_sle(base_amount),
                    display_sle(computed)
                ));
                computed
            }
            PricingShape::MonthlyRatePercent(rate) => {
                // Any started month counts as a full month
                let months = (effective_days + 29) / 30;
                steps.push(format!(
                    "Months started: ceil({effective_days}/30) = {months}"
                ));
                let computed = round_sle(base_amount * rate * Decimal::from(months) / dec!(100));
                steps.push(format!(
                    "{} x {rate}%/month x {months} month(s) = {}",
                    display_sle(base_amount),
                    display_sle(computed)
                ));
                computed
            }
        };
        amount = clamp_to_bounds(amount, rule, &mut steps);

        Ok(PenaltyCalculationResult {
            kind,
            base_amount,
            days_overdue,
            penalty_amount: amount,
            rate_used: rule.pricing.rate_percent(),
            calculation_steps: steps,
            legal_reference: Some(rule.legal_reference.clone()),
        })
    }
}

fn clamp_to_bounds(amount: Decimal, rule: &PenaltyRule, steps: &mut Vec<String>) -> Decimal {
    let mut clamped = amount;
    if let Some(min) = rule.minimum_amount {
        if clamped < min {
            steps.push(format!("Raised to statutory minimum {}", display_sle(min)));
            clamped = min;
        }
    }
    if let Some(max) = rule.maximum_amount {
        if clamped > max {
            steps.push(format!("Capped at statutory maximum {}", display_sle(max)));
            clamped = max;
        }
    }
    clamped
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateProvider;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rule(
        kind: PenaltyKind,
        pricing: PricingShape,
        grace: i64,
        min: Option<Decimal>,
        max: Option<Decimal>,
    ) -> PenaltyRule {
        PenaltyRule {
            tax_type: TaxType::Gst,
            kind,
            pricing,
            grace_period_days: grace,
            maximum_days: None,
            minimum_amount: min,
            maximum_amount: max,
            category: None,
            priority: 100,
            effective_from: date("2024-01-01"),
            expires_on: None,
            active: true,
            legal_reference: "Finance Act 2024 s.90".to_string(),
        }
    }

    #[test]
    fn no_penalty_on_or_before_due_date() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let result = engine
            .calculate_late_filing_penalty(
                TaxType::Gst,
                dec!(1000000),
                date("2025-01-15"),
                Some(date("2025-01-15")),
                None,
            )
            .unwrap();
        assert!(result.is_zero());
        assert_eq!(result.days_overdue, 0);
        assert_eq!(result.calculation_steps.len(), 1);
    }

    #[test]
    fn no_penalty_when_actual_precedes_due() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let result = engine
            .calculate_late_payment_penalty(
                TaxType::IncomeTax,
                dec!(500000),
                date("2025-06-30"),
                Some(date("2025-06-01")),
                None,
            )
            .unwrap();
        assert_eq!(result.penalty_amount, Decimal::ZERO);
    }

    #[test]
    fn monthly_rate_with_grace_period_scenario() {
        // base 1,000,000, monthly 2%, grace 30 days, 45 days overdue
        // effective 15 days -> 1 month started -> 20,000
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let result = engine
            .calculate_late_payment_penalty(
                TaxType::IncomeTax,
                dec!(1000000),
                date("2025-01-15"),
                Some(date("2025-03-01")),
                None,
            )
            .unwrap();
        assert_eq!(result.days_overdue, 45);
        assert_eq!(result.penalty_amount, dec!(20000));
        assert_eq!(result.rate_used, Some(dec!(2)));
        assert!(result
            .calculation_steps
            .iter()
            .any(|s| s.contains("ceil(15/30) = 1")));
    }

    #[test]
    fn grace_period_boundary() {
        let mut rates = RateProvider::empty();
        rates.add_penalty_rule(rule(
            PenaltyKind::LatePayment,
            PricingShape::DailyRatePercent(dec!(0.5)),
            10,
            None,
            None,
        ));
        let engine = PenaltyEngine::new(&rates);

        // exactly at grace: zero
        let at_grace = engine
            .calculate_late_payment_penalty(
                TaxType::Gst,
                dec!(100000),
                date("2025-01-01"),
                Some(date("2025-01-11")),
                None,
            )
            .unwrap();
        assert_eq!(at_grace.penalty_amount, Decimal::ZERO);
        assert_eq!(at_grace.days_overdue, 10);

        // one day past grace: non-zero
        let past_grace = engine
            .calculate_late_payment_penalty(
                TaxType::Gst,
                dec!(100000),
                date("2025-01-01"),
                Some(date("2025-01-12")),
                None,
            )
            .unwrap();
        assert_eq!(past_grace.penalty_amount, dec!(500));
    }

    #[test]
    fn daily_rate_capped_at_maximum_days() {
        let mut rates = RateProvider::empty();
        let mut r = rule(
            PenaltyKind::LateFiling,
            PricingShape::DailyRatePercent(dec!(1)),
            0,
            None,
            None,
        );
        r.maximum_days = Some(20);
        rates.add_penalty_rule(r);
        let engine = PenaltyEngine::new(&rates);

        let result = engine
            .calculate_late_filing_penalty(
                TaxType::Gst,
                dec!(100000),
                date("2025-01-01"),
                Some(date("2025-03-01")),
                None,
            )
            .unwrap();
        // 59 days overdue but capped at 20: 100,000 x 1% x 20 = 20,000
        assert_eq!(result.days_overdue, 59);
        assert_eq!(result.penalty_amount, dec!(20000));
    }

    #[test]
    fn clamps_to_minimum_and_maximum() {
        let mut rates = RateProvider::empty();
        rates.add_penalty_rule(rule(
            PenaltyKind::LateFiling,
            PricingShape::FixedRatePercent(dec!(1)),
            0,
            Some(dec!(50000)),
            Some(dec!(200000)),
        ));
        let engine = PenaltyEngine::new(&rates);

        // 1% of 100,000 = 1,000, raised to the 50,000 minimum
        let small = engine
            .calculate_late_filing_penalty(
                TaxType::Gst,
                dec!(100000),
                date("2025-01-01"),
                Some(date("2025-01-10")),
                None,
            )
            .unwrap();
        assert_eq!(small.penalty_amount, dec!(50000));

        // 1% of 100,000,000 = 1,000,000, capped at 200,000
        let large = engine
            .calculate_late_filing_penalty(
                TaxType::Gst,
                dec!(100000000),
                date("2025-01-01"),
                Some(date("2025-01-10")),
                None,
            )
            .unwrap();
        assert_eq!(large.penalty_amount, dec!(200000));
    }

    #[test]
    fn interest_simple_daily() {
        // 500,000 unpaid, 60 days overdue: 500,000 x 18/36500 x 60 = 14,794.52
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let result = engine.calculate_interest(
            dec!(500000),
            date("2025-01-01"),
            Some(date("2025-03-02")),
        );
        assert_eq!(result.days_overdue, 60);
        assert_eq!(result.penalty_amount, dec!(14794.52));
        assert_eq!(result.rate_used, Some(dec!(18)));
    }

    #[test]
    fn interest_has_no_grace_period() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let result =
            engine.calculate_interest(dec!(100000), date("2025-01-01"), Some(date("2025-01-02")));
        assert!(result.penalty_amount > Decimal::ZERO);
        assert_eq!(result.days_overdue, 1);
    }

    #[test]
    fn under_declaration_zero_when_fully_declared() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let result = engine
            .calculate_under_declaration_penalty(TaxType::IncomeTax, dec!(500000), dec!(400000), None)
            .unwrap();
        assert!(result.is_zero());
    }

    #[test]
    fn under_declaration_percentage_of_shortfall() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let result = engine
            .calculate_under_declaration_penalty(
                TaxType::IncomeTax,
                dec!(1000000),
                dec!(3000000),
                None,
            )
            .unwrap();
        // default rule: 25% of the 2,000,000 shortfall
        assert_eq!(result.base_amount, dec!(2000000));
        assert_eq!(result.penalty_amount, dec!(500000));
    }

    #[test]
    fn rule_not_found_surfaces() {
        let rates = RateProvider::empty();
        let engine = PenaltyEngine::new(&rates);
        let err = engine
            .calculate_late_filing_penalty(
                TaxType::ExciseDuty,
                dec!(100000),
                date("2025-01-01"),
                Some(date("2025-02-01")),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::RuleNotFound { .. }));
        assert!(err.to_string().contains("Excise Duty"));
    }

    #[test]
    fn all_applicable_penalties_itemized() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let input = PenaltyAssessmentInput {
            tax_type: TaxType::Gst,
            category: None,
            liability_amount: dec!(2000000),
            unpaid_amount: dec!(2000000),
            filing_due_date: date("2025-01-15"),
            filed_date: None,
            payment_due_date: date("2025-01-15"),
            paid_date: None,
            as_of: date("2025-04-01"),
        };
        let results = engine.calculate_all_applicable(&input).unwrap();
        let kinds: Vec<PenaltyKind> = results.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&PenaltyKind::LateFiling));
        assert!(kinds.contains(&PenaltyKind::LatePayment));
        assert!(kinds.contains(&PenaltyKind::Interest));
        assert!(kinds.contains(&PenaltyKind::NonFiling));
        assert!(results.iter().all(|r| !r.is_zero()));
    }

    #[test]
    fn non_filing_requires_thirty_days() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let input = PenaltyAssessmentInput {
            tax_type: TaxType::Gst,
            category: None,
            liability_amount: dec!(2000000),
            unpaid_amount: Decimal::ZERO,
            filing_due_date: date("2025-01-15"),
            filed_date: None,
            payment_due_date: date("2025-01-15"),
            paid_date: None,
            as_of: date("2025-02-10"),
        };
        let results = engine.calculate_all_applicable(&input).unwrap();
        assert!(results.iter().all(|r| r.kind != PenaltyKind::NonFiling));
    }

    #[test]
    fn filed_and_paid_on_time_yields_nothing() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let input = PenaltyAssessmentInput {
            tax_type: TaxType::IncomeTax,
            category: None,
            liability_amount: dec!(1000000),
            unpaid_amount: Decimal::ZERO,
            filing_due_date: date("2025-04-30"),
            filed_date: Some(date("2025-04-20")),
            payment_due_date: date("2025-04-30"),
            paid_date: Some(date("2025-04-20")),
            as_of: date("2025-06-01"),
        };
        let results = engine.calculate_all_applicable(&input).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn validation_rejects_out_of_bounds_result() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let r = rule(
            PenaltyKind::LateFiling,
            PricingShape::FixedRatePercent(dec!(5)),
            0,
            Some(dec!(10000)),
            Some(dec!(50000)),
        );
        let bad = PenaltyCalculationResult {
            kind: PenaltyKind::LateFiling,
            base_amount: dec!(100000),
            days_overdue: 10,
            penalty_amount: dec!(90000),
            rate_used: Some(dec!(5)),
            calculation_steps: vec![],
            legal_reference: None,
        };
        let err = engine.validate_penalty_calculation(&bad, &r).unwrap_err();
        assert!(err.to_string().contains("above rule maximum"));
    }

    #[test]
    fn validation_rejects_negative_amount() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let r = rule(
            PenaltyKind::LatePayment,
            PricingShape::FixedAmount(dec!(1000)),
            0,
            None,
            None,
        );
        let bad = PenaltyCalculationResult {
            kind: PenaltyKind::LatePayment,
            base_amount: dec!(100000),
            days_overdue: 5,
            penalty_amount: dec!(-1),
            rate_used: None,
            calculation_steps: vec![],
            legal_reference: None,
        };
        assert!(engine.validate_penalty_calculation(&bad, &r).is_err());
    }

    #[test]
    fn validation_accepts_grace_period_zero() {
        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);
        let r = rule(
            PenaltyKind::LatePayment,
            PricingShape::MonthlyRatePercent(dec!(2)),
            30,
            Some(dec!(10000)),
            None,
        );
        let zero = PenaltyCalculationResult {
            kind: PenaltyKind::LatePayment,
            base_amount: dec!(100000),
            days_overdue: 20,
            penalty_amount: Decimal::ZERO,
            rate_used: None,
            calculation_steps: vec!["Within grace period: no penalty accrues".to_string()],
            legal_reference: None,
        };
        assert!(engine.validate_penalty_calculation(&zero, &r).is_ok());
    }

    #[test]
    fn steps_document_every_stage() {
        let mut rates = RateProvider::empty();
        rates.add_penalty_rule(rule(
            PenaltyKind::LateFiling,
            PricingShape::FixedRatePercent(dec!(5)),
            7,
            Some(dec!(1000000)),
            None,
        ));
        let engine = PenaltyEngine::new(&rates);
        let result = engine
            .calculate_late_filing_penalty(
                TaxType::Gst,
                dec!(100000),
                date("2025-01-01"),
                Some(date("2025-01-20")),
                None,
            )
            .unwrap();
        // days line, grace line, rate line, minimum clamp line
        assert_eq!(result.calculation_steps.len(), 4);
        assert!(result.calculation_steps[0].contains("Days overdue: 19"));
        assert!(result.calculation_steps[1].contains("Grace period 7"));
        assert!(result.calculation_steps[3].contains("minimum"));
        assert_eq!(result.penalty_amount, dec!(1000000));
    }
}
