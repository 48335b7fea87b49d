//! Monitor command - run the deadline scan over a batch of monitoring
//! items and write back the updated state.

use crate::monitor::{run_monitor, ComplianceMonitoringItem, LogNotifier};
use crate::rates::RateProvider;
use chrono::NaiveDate;
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct MonitorCommand {
    /// JSON file containing the monitoring items (or "-" for stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Scan date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    today: Option<NaiveDate>,

    /// Write the updated items back to this JSON file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write the emitted alerts to this CSV file
    #[arg(short, long)]
    alerts: Option<PathBuf>,
}

impl MonitorCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let mut items: Vec<ComplianceMonitoringItem> = super::read_json_request(&self.file)?;
        let today = self
            .today
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        let rates = RateProvider::with_defaults();
        let report = run_monitor(&rates, &mut items, today, &LogNotifier);

        println!(
            "Scanned {} item(s), emitted {} alert(s)",
            report.scanned,
            report.alerts.len()
        );
        for alert in &report.alerts {
            println!(
                "  [{}] {} -> {}: {}",
                alert.kind, alert.client_ref, alert.recipient, alert.message
            );
        }
        for (id, error) in &report.errors {
            log::warn!("item {id}: {error}");
        }

        if let Some(out) = &self.out {
            let file = File::create(out)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &items)?;
            println!("Updated items written to {}", out.display());
        }

        if let Some(path) = &self.alerts {
            let file = File::create(path)?;
            crate::utils::write_csv(&report.alerts, BufWriter::new(file))?;
            println!("Alerts written to {}", path.display());
        }

        if !report.errors.is_empty() {
            anyhow::bail!("{} item(s) failed during the scan", report.errors.len());
        }
        Ok(())
    }
}
