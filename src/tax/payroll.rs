//! Payroll tax: per-employee monthly PAYE over the statutory brackets,
//! annualized, plus the skills development levy on total payroll.

use crate::money::round_sle;
use crate::rates::RateProvider;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Monthly tax-free threshold when the request does not override it
pub const DEFAULT_TAX_FREE_THRESHOLD: Decimal = dec!(800000);
/// Skills development levy, percent of total payroll
pub const DEFAULT_LEVY_RATE_PERCENT: Decimal = dec!(1);

// Statutory monthly PAYE brackets (above the tax-free threshold)
const BRACKET_1_CEILING: Decimal = dec!(1000000);
const BRACKET_2_CEILING: Decimal = dec!(5000000);
const BRACKET_1_RATE: Decimal = dec!(15);
const BRACKET_2_RATE: Decimal = dec!(20);
const BRACKET_3_RATE: Decimal = dec!(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub name: String,
    pub annual_salary: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollTaxRequest {
    pub employees: Vec<EmployeeRecord>,
    /// Monthly tax-free threshold override
    #[serde(default)]
    pub tax_free_threshold: Option<Decimal>,
    /// Skills development levy override, percent
    #[serde(default)]
    pub levy_rate_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeePaye {
    pub name: String,
    pub monthly_income: Decimal,
    pub monthly_taxable: Decimal,
    pub monthly_paye: Decimal,
    pub annual_paye: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollTaxResult {
    pub employees: Vec<EmployeePaye>,
    pub total_paye: Decimal,
    pub total_payroll: Decimal,
    pub levy_rate_percent: Decimal,
    pub skills_development_levy: Decimal,
    pub total_payroll_tax: Decimal,
}

/// Monthly PAYE on income above the tax-free threshold:
/// 15% up to 1,000,000; 20% on the next band up to 5,000,000; 30% above.
fn monthly_paye(taxable: Decimal) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut remaining = taxable;

    let in_first = remaining.min(BRACKET_1_CEILING);
    tax += in_first * BRACKET_1_RATE / dec!(100);
    remaining -= in_first;

    if remaining > Decimal::ZERO {
        let in_second = remaining.min(BRACKET_2_CEILING - BRACKET_1_CEILING);
        tax += in_second * BRACKET_2_RATE / dec!(100);
        remaining -= in_second;
    }

    if remaining > Decimal::ZERO {
        tax += remaining * BRACKET_3_RATE / dec!(100);
    }

    round_sle(tax)
}

/// Calculate total payroll tax: the sum of every employee's annualized
/// PAYE plus the skills development levy on total payroll.
///
/// Pure over the request; `_rates` is accepted for signature parity with
/// the other calculators (PAYE brackets are statutory constants).
pub fn calculate_payroll_tax(_rates: &RateProvider, request: &PayrollTaxRequest) -> PayrollTaxResult {
    let threshold = request
        .tax_free_threshold
        .unwrap_or(DEFAULT_TAX_FREE_THRESHOLD);
    let levy_rate = request
        .levy_rate_percent
        .unwrap_or(DEFAULT_LEVY_RATE_PERCENT);

    let mut employees = Vec::with_capacity(request.employees.len());
    let mut total_paye = Decimal::ZERO;
    let mut total_payroll = Decimal::ZERO;

    for employee in &request.employees {
        let monthly_income = round_sle(employee.annual_salary / dec!(12));
        let monthly_taxable = (monthly_income - threshold).max(Decimal::ZERO);
        let paye = monthly_paye(monthly_taxable);
        let annual_paye = paye * dec!(12);

        total_paye += annual_paye;
        total_payroll += employee.annual_salary;
        employees.push(EmployeePaye {
            name: employee.name.clone(),
            monthly_income,
            monthly_taxable,
            monthly_paye: paye,
            annual_paye,
        });
    }

    let skills_development_levy = round_sle(total_payroll * levy_rate / dec!(100));

    PayrollTaxResult {
        employees,
        total_paye,
        total_payroll,
        levy_rate_percent: levy_rate,
        skills_development_levy,
        total_payroll_tax: total_paye + skills_development_levy,
    }
}
