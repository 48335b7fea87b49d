//! Score command - compliance score snapshot and issue list for a
//! client's history.

use crate::compliance::{
    calculate_compliance_score, identify_compliance_issues, ComplianceHistory,
};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct ScoreCommand {
    /// JSON file containing the client's compliance history (or "-" for
    /// stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Evaluation date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    today: Option<NaiveDate>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Tax type")]
    tax_type: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Issue")]
    description: String,
}

#[derive(Serialize)]
struct ScoreOutput<'a> {
    snapshot: &'a crate::compliance::ComplianceScoreSnapshot,
    issues: &'a [crate::compliance::ComplianceIssue],
}

impl ScoreCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let history: ComplianceHistory = super::read_json_request(&self.file)?;
        let today = self
            .today
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let now = today.and_hms_opt(0, 0, 0).expect("midnight is valid");

        let snapshot = calculate_compliance_score(&history, now);
        let issues = identify_compliance_issues(&history, today);

        if self.json {
            let output = ScoreOutput {
                snapshot: &snapshot,
                issues: &issues,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!(
            "Compliance score for {} ({}): {} / 100",
            snapshot.client_ref, snapshot.tax_year, snapshot.score
        );
        println!(
            "Grade {} ({}), risk {}",
            snapshot.grade, snapshot.grade_label, snapshot.risk
        );
        for factor in &snapshot.factors {
            if factor.impact < 0 {
                println!("  {} ({})", factor.description, factor.impact);
            } else {
                println!("  {}", factor.description);
            }
        }

        if issues.is_empty() {
            println!("No compliance issues identified");
        } else {
            let rows: Vec<IssueRow> = issues
                .iter()
                .map(|i| IssueRow {
                    severity: i.severity.display().to_string(),
                    tax_type: i.tax_type.map(|t| t.to_string()).unwrap_or_default(),
                    date: i.date.map(|d| d.to_string()).unwrap_or_default(),
                    description: i.description.clone(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        Ok(())
    }
}
