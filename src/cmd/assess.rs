//! Assessment commands: one per tax type, each reading a JSON request
//! file and printing the itemized result.

use crate::money::display_sle;
use crate::rates::RateProvider;
use crate::tax::excise::ExciseDutyRequest;
use crate::tax::gst::GstRequest;
use crate::tax::income::IncomeTaxRequest;
use crate::tax::payroll::PayrollTaxRequest;
use crate::tax::{calculate_excise_duty, calculate_gst, calculate_income_tax, calculate_payroll_tax};
use clap::Args;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

fn render<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string()
}

#[derive(Args, Debug)]
pub struct IncomeCommand {
    /// JSON file containing the income tax request (or "-" for stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct BracketRow {
    #[tabled(rename = "Band from")]
    from: String,
    #[tabled(rename = "Band to")]
    to: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Taxed amount")]
    taxed: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

impl IncomeCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let request: IncomeTaxRequest = super::read_json_request(&self.file)?;
        let rates = RateProvider::with_defaults();
        let result = calculate_income_tax(&rates, &request)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        let rows: Vec<BracketRow> = result
            .brackets
            .iter()
            .map(|b| BracketRow {
                from: display_sle(b.band_min),
                to: b
                    .band_max
                    .map(display_sle)
                    .unwrap_or_else(|| "unbounded".to_string()),
                rate: format!("{}%", b.rate_percent),
                taxed: display_sle(b.taxed_amount),
                tax: display_sle(b.tax),
            })
            .collect();

        println!("Income Tax assessment, {} ({})", request.tax_year, request.category);
        println!("Taxable income: {}", display_sle(result.taxable_income));
        println!("{}", render(rows));
        println!("Bracket tax: {}", display_sle(result.bracket_tax));
        if let Some(minimum) = result.minimum_tax {
            println!("Minimum tax floor: {}", display_sle(minimum));
        }
        println!("Tax due: {}", display_sle(result.tax));
        if let Some(penalty) = &result.penalty {
            println!("Late payment penalty: {}", display_sle(penalty.penalty_amount));
            for step in &penalty.calculation_steps {
                println!("  {step}");
            }
        }
        println!("Total amount due: {}", display_sle(result.total_amount_due));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct GstCommand {
    /// JSON file containing the GST request (or "-" for stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl GstCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let request: GstRequest = super::read_json_request(&self.file)?;
        let rates = RateProvider::with_defaults();
        let result = calculate_gst(&rates, &request)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        println!("GST assessment, {} ({})", request.tax_year, request.category);
        println!("Output GST @ {}%: {}", result.rate_percent, display_sle(result.output_gst));
        if !result.zero_rated_supplies.is_zero() {
            println!(
                "Zero-rated exports: {}",
                display_sle(result.zero_rated_supplies)
            );
        }
        println!("Input tax credit: {}", display_sle(result.input_tax));
        println!("Net GST: {}", display_sle(result.net_gst));
        if !result.reverse_charge_gst.is_zero() {
            println!(
                "Reverse charge on imports: {}",
                display_sle(result.reverse_charge_gst)
            );
        }
        println!("GST payable: {}", display_sle(result.gst_payable));
        if let Some(penalty) = &result.penalty {
            println!("Late payment penalty: {}", display_sle(penalty.penalty_amount));
        }
        println!("Total amount due: {}", display_sle(result.total_amount_due));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct PayrollCommand {
    /// JSON file containing the payroll request (or "-" for stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct EmployeeRow {
    #[tabled(rename = "Employee")]
    name: String,
    #[tabled(rename = "Monthly income")]
    monthly: String,
    #[tabled(rename = "Monthly PAYE")]
    paye: String,
    #[tabled(rename = "Annual PAYE")]
    annual: String,
}

impl PayrollCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let request: PayrollTaxRequest = super::read_json_request(&self.file)?;
        let rates = RateProvider::with_defaults();
        let result = calculate_payroll_tax(&rates, &request);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        let rows: Vec<EmployeeRow> = result
            .employees
            .iter()
            .map(|e| EmployeeRow {
                name: e.name.clone(),
                monthly: display_sle(e.monthly_income),
                paye: display_sle(e.monthly_paye),
                annual: display_sle(e.annual_paye),
            })
            .collect();

        println!("{}", render(rows));
        println!("Total PAYE: {}", display_sle(result.total_paye));
        println!(
            "Skills development levy @ {}%: {}",
            result.levy_rate_percent,
            display_sle(result.skills_development_levy)
        );
        println!("Total payroll tax: {}", display_sle(result.total_payroll_tax));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ExciseCommand {
    /// JSON file containing the excise duty request (or "-" for stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct ExciseRow {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Rate type")]
    rate_type: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Duty")]
    duty: String,
}

impl ExciseCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let request: ExciseDutyRequest = super::read_json_request(&self.file)?;
        let rates = RateProvider::with_defaults();
        let result = calculate_excise_duty(&rates, &request);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        let rows: Vec<ExciseRow> = result
            .lines
            .iter()
            .map(|l| ExciseRow {
                product: format!("{} ({})", l.product_code, l.description),
                rate_type: format!("{:?}", l.rate_type),
                rate: l.rate.to_string(),
                duty: display_sle(l.duty),
            })
            .collect();

        println!("{}", render(rows));
        for code in &result.skipped {
            println!("Warning: no excise rate for {code}, duty not assessed");
        }
        println!("Total excise duty: {}", display_sle(result.total_duty));
        Ok(())
    }
}
