//! Penalty command - price a single penalty or interest charge and print
//! the full audit trail.

use crate::money::display_sle;
use crate::penalty::{PenaltyEngine, PenaltyKind};
use crate::rates::RateProvider;
use crate::types::{TaxType, TaxpayerCategory};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct PenaltyCommand {
    /// Penalty kind: late-filing, late-payment, non-filing,
    /// under-declaration or interest
    #[arg(short, long)]
    kind: String,

    /// Tax type: income, gst, payroll or excise
    #[arg(short, long)]
    tax_type: String,

    /// Base amount (liability, unpaid balance, or declared amount for
    /// under-declaration)
    #[arg(short, long)]
    base: Decimal,

    /// Actual liability, required for under-declaration
    #[arg(long)]
    actual_liability: Option<Decimal>,

    /// Due date (YYYY-MM-DD)
    #[arg(short, long)]
    due: Option<NaiveDate>,

    /// Actual filing/payment date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    actual: Option<NaiveDate>,

    /// Taxpayer category: individual, micro, small, medium or large
    #[arg(short, long)]
    category: Option<String>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl PenaltyCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let kind = PenaltyKind::from_str(&self.kind)
            .ok_or_else(|| anyhow::anyhow!("unknown penalty kind: {}", self.kind))?;
        let tax_type = TaxType::from_str(&self.tax_type)
            .ok_or_else(|| anyhow::anyhow!("unknown tax type: {}", self.tax_type))?;
        let category = self
            .category
            .as_deref()
            .map(|c| {
                TaxpayerCategory::from_str(c)
                    .ok_or_else(|| anyhow::anyhow!("unknown taxpayer category: {c}"))
            })
            .transpose()?;

        let rates = RateProvider::with_defaults();
        let engine = PenaltyEngine::new(&rates);

        let result = match kind {
            PenaltyKind::LateFiling => {
                let due = self.require_due()?;
                engine.calculate_late_filing_penalty(tax_type, self.base, due, self.actual, category)?
            }
            PenaltyKind::LatePayment => {
                let due = self.require_due()?;
                engine.calculate_late_payment_penalty(tax_type, self.base, due, self.actual, category)?
            }
            PenaltyKind::NonFiling => {
                let due = self.require_due()?;
                engine.calculate_non_filing_penalty(tax_type, self.base, due, self.actual, category)?
            }
            PenaltyKind::UnderDeclaration => {
                let actual_liability = self.actual_liability.ok_or_else(|| {
                    anyhow::anyhow!("--actual-liability is required for under-declaration")
                })?;
                engine.calculate_under_declaration_penalty(
                    tax_type,
                    self.base,
                    actual_liability,
                    category,
                )?
            }
            PenaltyKind::Interest => {
                let due = self.require_due()?;
                engine.calculate_interest(self.base, due, self.actual)
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        println!("{} for {}", result.kind, tax_type);
        for step in &result.calculation_steps {
            println!("  {step}");
        }
        if let Some(reference) = &result.legal_reference {
            println!("Legal reference: {reference}");
        }
        println!("Amount: {}", display_sle(result.penalty_amount));
        Ok(())
    }

    fn require_due(&self) -> anyhow::Result<NaiveDate> {
        self.due
            .ok_or_else(|| anyhow::anyhow!("--due is required for {}", self.kind))
    }
}
