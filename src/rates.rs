//! Rate and rule resolution.
//!
//! The provider holds admin-configured rate tables, allowances, penalty
//! rules and excise rates. Missing rate tables fall back to the built-in
//! defaults with a logged warning (incomplete admin setup is non-fatal by
//! contract). Missing penalty rules are fatal to that calculation and
//! surface as [`EngineError::RuleNotFound`].

use crate::error::{EngineError, Result};
use crate::penalty::{PenaltyKind, PenaltyRule, PricingShape};
use crate::types::{TaxType, TaxYear, TaxpayerCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One income band of a progressive rate table.
///
/// Bands for a given (year, type, category) are contiguous and
/// non-overlapping when ordered by `band_min`; the top band has
/// `band_max = None` (unbounded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRateRule {
    pub tax_year: TaxYear,
    pub tax_type: TaxType,
    pub category: TaxpayerCategory,
    pub band_min: Decimal,
    pub band_max: Option<Decimal>,
    pub rate_percent: Decimal,
    pub description: String,
    pub active: bool,
}

/// Allowance value: a fixed deduction or a percentage of gross income
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum AllowanceValue {
    Fixed(Decimal),
    PercentOfGross(Decimal),
}

/// Reduces the taxable base before bracket application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxAllowance {
    pub tax_year: TaxYear,
    pub category: TaxpayerCategory,
    pub allowance_type: String,
    pub value: AllowanceValue,
}

/// How an excise rate applies to a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExciseRateType {
    /// Per-unit amount, multiplied by quantity
    Specific,
    /// Percentage of value
    AdValorem,
}

/// Excise duty rate keyed by product code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExciseRate {
    pub product_code: String,
    pub description: String,
    pub rate_type: ExciseRateType,
    pub rate: Decimal,
}

/// Resolves rate tables, allowances, penalty rules and excise rates for
/// the calculators. Constructed explicitly and passed in; no hidden
/// lazily-populated caches.
#[derive(Debug, Clone, Default)]
pub struct RateProvider {
    rate_rules: Vec<TaxRateRule>,
    allowances: Vec<TaxAllowance>,
    penalty_rules: Vec<PenaltyRule>,
    excise_rates: Vec<ExciseRate>,
}

impl RateProvider {
    /// A provider with nothing configured. Rate lookups still succeed via
    /// the built-in defaults; penalty lookups fail with `RuleNotFound`.
    pub fn empty() -> Self {
        RateProvider::default()
    }

    /// A provider seeded with the statutory default penalty rules and
    /// excise product table
    pub fn with_defaults() -> Self {
        RateProvider {
            rate_rules: Vec::new(),
            allowances: Vec::new(),
            penalty_rules: default_penalty_rules(),
            excise_rates: default_excise_rates(),
        }
    }

    pub fn add_rate_rule(&mut self, rule: TaxRateRule) {
        self.rate_rules.push(rule);
    }

    pub fn add_allowance(&mut self, allowance: TaxAllowance) {
        self.allowances.push(allowance);
    }

    pub fn add_penalty_rule(&mut self, rule: PenaltyRule) {
        self.penalty_rules.push(rule);
    }

    pub fn add_excise_rate(&mut self, rate: ExciseRate) {
        self.excise_rates.push(rate);
    }

    /// Active rate bands for the exact (year, type, category), ordered by
    /// `band_min`. Falls back to the built-in default table when nothing is
    /// configured; defaulting is the explicit contract, never an error.
    pub fn resolve_tax_rates(
        &self,
        year: TaxYear,
        tax_type: TaxType,
        category: TaxpayerCategory,
    ) -> Vec<TaxRateRule> {
        let mut configured: Vec<TaxRateRule> = self
            .rate_rules
            .iter()
            .filter(|r| {
                r.active && r.tax_year == year && r.tax_type == tax_type && r.category == category
            })
            .cloned()
            .collect();

        if configured.is_empty() {
            log::warn!(
                "no configured {tax_type} rates for {year}/{category}, using built-in defaults"
            );
            return default_rates(year, tax_type, category);
        }

        configured.sort_by(|a, b| a.band_min.cmp(&b.band_min));
        configured
    }

    /// Configured allowances for (year, category). No built-in defaults:
    /// the personal relief is embedded in the zero-rate band.
    pub fn resolve_allowances(&self, year: TaxYear, category: TaxpayerCategory) -> Vec<TaxAllowance> {
        self.allowances
            .iter()
            .filter(|a| a.tax_year == year && a.category == category)
            .cloned()
            .collect()
    }

    /// Minimum-tax floor as a percentage of gross income, for the
    /// categories a statutory floor applies to
    pub fn minimum_tax_rate(&self, category: TaxpayerCategory) -> Option<Decimal> {
        match category {
            TaxpayerCategory::Medium => Some(dec!(2)),
            TaxpayerCategory::Large => Some(dec!(3)),
            _ => None,
        }
    }

    /// Best-matching active penalty rule: a rule scoped to the exact
    /// category beats a category-agnostic one, then lower priority value,
    /// then most recent effective date.
    pub fn resolve_penalty_rule(
        &self,
        tax_type: TaxType,
        kind: PenaltyKind,
        category: Option<TaxpayerCategory>,
    ) -> Result<&PenaltyRule> {
        self.penalty_rules
            .iter()
            .filter(|r| r.active && r.tax_type == tax_type && r.kind == kind)
            .filter(|r| match (r.category, category) {
                (None, _) => true,
                (Some(scope), Some(c)) => scope == c,
                (Some(_), None) => false,
            })
            .min_by_key(|r| {
                (
                    r.category.is_none(), // false (scoped) sorts first
                    r.priority,
                    std::cmp::Reverse(r.effective_from),
                )
            })
            .ok_or(EngineError::RuleNotFound { tax_type, kind })
    }

    /// Excise rate for a product code, if one is configured
    pub fn resolve_excise_rate(&self, product_code: &str) -> Option<&ExciseRate> {
        self.excise_rates
            .iter()
            .find(|r| r.product_code.eq_ignore_ascii_case(product_code))
    }
}

/// Built-in default rate tables, used when no configured override exists
fn default_rates(year: TaxYear, tax_type: TaxType, category: TaxpayerCategory) -> Vec<TaxRateRule> {
    let band = |min: Decimal, max: Option<Decimal>, rate: Decimal, description: &str| TaxRateRule {
        tax_year: year,
        tax_type,
        category,
        band_min: min,
        band_max: max,
        rate_percent: rate,
        description: description.to_string(),
        active: true,
    };

    match tax_type {
        TaxType::IncomeTax => match category {
            TaxpayerCategory::Individual => vec![
                band(dec!(0), Some(dec!(7200000)), dec!(0), "Tax-free band"),
                band(dec!(7200000), Some(dec!(12000000)), dec!(15), "First band"),
                band(dec!(12000000), Some(dec!(18000000)), dec!(20), "Second band"),
                band(dec!(18000000), Some(dec!(24000000)), dec!(25), "Third band"),
                band(dec!(24000000), None, dec!(30), "Top band"),
            ],
            // Corporate income tax is a flat rate
            _ => vec![band(dec!(0), None, dec!(25), "Corporate rate")],
        },
        // Standard rate; exports are zero-rated at the calculator
        TaxType::Gst => vec![band(dec!(0), None, dec!(15), "Standard rate")],
        // PAYE brackets are statutory constants in the payroll calculator;
        // the table here only records the headline rate for display
        TaxType::PayrollTax => vec![band(dec!(0), None, dec!(15), "PAYE entry rate")],
        // Excise rates are per product code, resolved separately
        TaxType::ExciseDuty => Vec::new(),
    }
}

fn default_penalty_rules() -> Vec<PenaltyRule> {
    let effective = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut rules = Vec::new();
    for tax_type in TaxType::ALL {
        rules.push(PenaltyRule {
            tax_type,
            kind: PenaltyKind::LateFiling,
            pricing: PricingShape::MonthlyRatePercent(dec!(5)),
            grace_period_days: 0,
            maximum_days: None,
            minimum_amount: Some(dec!(50000)),
            maximum_amount: Some(dec!(10000000)),
            category: None,
            priority: 100,
            effective_from: effective,
            expires_on: None,
            active: true,
            legal_reference: "Finance Act 2024 s.88".to_string(),
        });
        rules.push(PenaltyRule {
            tax_type,
            kind: PenaltyKind::LatePayment,
            pricing: PricingShape::MonthlyRatePercent(dec!(2)),
            grace_period_days: 30,
            maximum_days: None,
            minimum_amount: None,
            maximum_amount: None,
            category: None,
            priority: 100,
            effective_from: effective,
            expires_on: None,
            active: true,
            legal_reference: "Finance Act 2024 s.89".to_string(),
        });
        rules.push(PenaltyRule {
            tax_type,
            kind: PenaltyKind::NonFiling,
            pricing: PricingShape::FixedRatePercent(dec!(10)),
            grace_period_days: 0,
            maximum_days: None,
            minimum_amount: Some(dec!(500000)),
            maximum_amount: None,
            category: None,
            priority: 100,
            effective_from: effective,
            expires_on: None,
            active: true,
            legal_reference: "Finance Act 2024 s.90".to_string(),
        });
        rules.push(PenaltyRule {
            tax_type,
            kind: PenaltyKind::UnderDeclaration,
            pricing: PricingShape::FixedRatePercent(dec!(25)),
            grace_period_days: 0,
            maximum_days: None,
            minimum_amount: None,
            maximum_amount: None,
            category: None,
            priority: 100,
            effective_from: effective,
            expires_on: None,
            active: true,
            legal_reference: "Finance Act 2024 s.92".to_string(),
        });
    }
    rules
}

fn default_excise_rates() -> Vec<ExciseRate> {
    let rate = |code: &str, description: &str, rate_type: ExciseRateType, rate: Decimal| {
        ExciseRate {
            product_code: code.to_string(),
            description: description.to_string(),
            rate_type,
            rate,
        }
    };
    vec![
        rate("TOB-CIG", "Cigarettes (per pack)", ExciseRateType::Specific, dec!(5000)),
        rate("ALC-BEER", "Beer (per litre)", ExciseRateType::Specific, dec!(1500)),
        rate("ALC-SPIRIT", "Spirits (per litre)", ExciseRateType::Specific, dec!(6000)),
        rate("FUEL-PET", "Petrol (per litre)", ExciseRateType::Specific, dec!(1200)),
        rate("FUEL-DSL", "Diesel (per litre)", ExciseRateType::Specific, dec!(1000)),
        rate("LUX-VEH", "Luxury vehicles", ExciseRateType::AdValorem, dec!(30)),
        rate("BEV-SOFT", "Sweetened beverages", ExciseRateType::AdValorem, dec!(10)),
    ]
}
