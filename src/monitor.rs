//! Deadline monitoring: a per-item state machine evaluated once per run
//! against a fixed escalation ladder (30/14/10/7/1 days and overdue, plus
//! a 5-to-1-day daily reminder window).
//!
//! Idempotency contract: each warning fires exactly once per item,
//! gated by a persisted "already sent" flag. Re-running the scan on the
//! same day with unchanged data emits nothing new.

use crate::penalty::PenaltyEngine;
use crate::rates::RateProvider;
use crate::types::{TaxType, TaxYear, TaxpayerCategory};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitoringStatus {
    Pending,
    Overdue,
    Filed,
    Paid,
}

impl MonitoringStatus {
    /// Filed and Paid are terminal; Overdue is not (an overdue item can
    /// still be filed or paid)
    pub fn is_terminal(&self) -> bool {
        matches!(self, MonitoringStatus::Filed | MonitoringStatus::Paid)
    }
}

/// One monitored filing obligation and its alert-flag state.
///
/// The `version` token is bumped on every mutation so a store applying
/// the batch can reject stale writes (two overlapping runs must not both
/// flip the same flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceMonitoringItem {
    pub id: String,
    pub client_ref: String,
    /// Phone number or email address for alert delivery
    pub recipient: String,
    pub tax_year: TaxYear,
    pub tax_type: TaxType,
    #[serde(default)]
    pub category: TaxpayerCategory,
    pub due_date: NaiveDate,
    pub base_amount: Decimal,
    pub status: MonitoringStatus,
    #[serde(default)]
    pub filed_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_overdue: i64,
    #[serde(default)]
    pub estimated_penalty: Option<Decimal>,
    #[serde(default)]
    pub alert_sent_30_days: bool,
    #[serde(default)]
    pub alert_sent_14_days: bool,
    #[serde(default)]
    pub alert_sent_10_days: bool,
    #[serde(default)]
    pub alert_sent_7_days: bool,
    #[serde(default)]
    pub alert_sent_1_day: bool,
    #[serde(default)]
    pub alert_sent_overdue: bool,
    #[serde(default)]
    pub last_daily_reminder_sent: Option<NaiveDate>,
    #[serde(default)]
    pub version: u32,
}

impl ComplianceMonitoringItem {
    pub fn new(
        id: impl Into<String>,
        client_ref: impl Into<String>,
        recipient: impl Into<String>,
        tax_year: TaxYear,
        tax_type: TaxType,
        due_date: NaiveDate,
        base_amount: Decimal,
    ) -> Self {
        ComplianceMonitoringItem {
            id: id.into(),
            client_ref: client_ref.into(),
            recipient: recipient.into(),
            tax_year,
            tax_type,
            category: TaxpayerCategory::default(),
            due_date,
            base_amount,
            status: MonitoringStatus::Pending,
            filed_date: None,
            paid_date: None,
            days_overdue: 0,
            estimated_penalty: None,
            alert_sent_30_days: false,
            alert_sent_14_days: false,
            alert_sent_10_days: false,
            alert_sent_7_days: false,
            alert_sent_1_day: false,
            alert_sent_overdue: false,
            last_daily_reminder_sent: None,
            version: 0,
        }
    }

    /// True iff the due date has passed and the item is neither filed
    /// nor paid
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        today > self.due_date && !self.status.is_terminal()
    }

    /// Move the item to the terminal Filed state. The only external
    /// mutators are this and `mark_as_paid`; there is no rollback.
    pub fn mark_as_filed(&mut self, filed_date: NaiveDate) {
        self.status = MonitoringStatus::Filed;
        self.filed_date = Some(filed_date);
        self.version += 1;
    }

    /// Move the item to the terminal Paid state and clear the overdue
    /// bookkeeping.
    pub fn mark_as_paid(&mut self, paid_date: NaiveDate) {
        self.status = MonitoringStatus::Paid;
        self.paid_date = Some(paid_date);
        self.days_overdue = 0;
        self.version += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Warning30Days,
    Warning14Days,
    Warning10Days,
    Warning7Days,
    DailyReminder,
    Warning1Day,
    Overdue,
}

impl AlertKind {
    pub fn display(&self) -> &'static str {
        match self {
            AlertKind::Warning30Days => "30-day warning",
            AlertKind::Warning14Days => "14-day warning",
            AlertKind::Warning10Days => "10-day warning",
            AlertKind::Warning7Days => "7-day warning",
            AlertKind::DailyReminder => "daily reminder",
            AlertKind::Warning1Day => "1-day warning",
            AlertKind::Overdue => "overdue notice",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Sms,
    Email,
}

/// A persisted alert record, consumed by the notification collaborator
/// and by dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub item_id: String,
    pub client_ref: String,
    pub recipient: String,
    pub kind: AlertKind,
    pub message: String,
    pub channel: Channel,
    pub sent_at: NaiveDateTime,
}

/// Outbound notification boundary. Delivery is fire-and-forget from the
/// monitor's perspective: a failed send is logged and the alert flag is
/// still set. Callers needing guaranteed delivery layer retry behind this
/// trait, not in the monitor.
pub trait Notifier {
    fn send(&self, recipient: &str, message: &str, channel: Channel) -> anyhow::Result<()>;
}

/// Notifier that only logs; used by the CLI and in tests
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, recipient: &str, message: &str, _channel: Channel) -> anyhow::Result<()> {
        log::info!("notify {recipient}: {message}");
        Ok(())
    }
}

/// Outcome of one monitor run
#[derive(Debug, Default)]
pub struct MonitorRunReport {
    pub scanned: usize,
    pub alerts: Vec<Alert>,
    /// (item id, error message) for items that failed mid-evaluation;
    /// a bad item never aborts the rest of the batch
    pub errors: Vec<(String, String)>,
}

/// Evaluate every item once against the escalation ladder.
///
/// Threshold table (fires once each, flag-gated):
/// overdue; exactly 30/14/10/7 days out; a daily reminder in the 5-to-1-day
/// window; exactly 1 day out. The 1-day warning and the daily reminder are
/// independently flagged and can both fire on the same day.
///
/// The run is single-threaded per invocation; flag updates are applied to
/// the items in place and version tokens bumped for optimistic-concurrency
/// stores.
pub fn run_monitor(
    rates: &RateProvider,
    items: &mut [ComplianceMonitoringItem],
    today: NaiveDate,
    notifier: &dyn Notifier,
) -> MonitorRunReport {
    let mut report = MonitorRunReport::default();

    for item in items.iter_mut() {
        if item.status.is_terminal() {
            continue;
        }
        report.scanned += 1;

        let days_until_due = item.due_date.signed_duration_since(today).num_days();

        if days_until_due < 0 {
            item.status = MonitoringStatus::Overdue;
            item.days_overdue = -days_until_due;
            item.version += 1;

            // Advisory estimate only; the authoritative penalty is computed
            // at filing/payment time
            if item.estimated_penalty.is_none() {
                let engine = PenaltyEngine::new(rates);
                match engine.calculate_late_filing_penalty(
                    item.tax_type,
                    item.base_amount,
                    item.due_date,
                    Some(today),
                    Some(item.category),
                ) {
                    Ok(result) => item.estimated_penalty = Some(result.penalty_amount),
                    Err(e) => {
                        log::error!("penalty estimate failed for item {}: {e}", item.id);
                        report.errors.push((item.id.clone(), e.to_string()));
                    }
                }
            }

            if !item.alert_sent_overdue {
                item.alert_sent_overdue = true;
                let message = format!(
                    "{} return for {} was due on {} and is now {} day(s) overdue",
                    item.tax_type, item.tax_year, item.due_date, item.days_overdue
                );
                emit(&mut report, item, AlertKind::Overdue, message, today, notifier);
            }
            continue;
        }

        match days_until_due {
            30 if !item.alert_sent_30_days => {
                item.alert_sent_30_days = true;
                item.version += 1;
                let message = due_message(item, 30);
                emit(&mut report, item, AlertKind::Warning30Days, message, today, notifier);
            }
            14 if !item.alert_sent_14_days => {
                item.alert_sent_14_days = true;
                item.version += 1;
                let message = due_message(item, 14);
                emit(&mut report, item, AlertKind::Warning14Days, message, today, notifier);
            }
            10 if !item.alert_sent_10_days => {
                item.alert_sent_10_days = true;
                item.version += 1;
                let message = due_message(item, 10);
                emit(&mut report, item, AlertKind::Warning10Days, message, today, notifier);
            }
            7 if !item.alert_sent_7_days => {
                item.alert_sent_7_days = true;
                item.version += 1;
                let message = due_message(item, 7);
                emit(&mut report, item, AlertKind::Warning7Days, message, today, notifier);
            }
            _ => {}
        }

        if (1..=5).contains(&days_until_due) {
            let already_sent_today = item
                .last_daily_reminder_sent
                .map(|d| d >= today)
                .unwrap_or(false);
            if !already_sent_today {
                item.last_daily_reminder_sent = Some(today);
                item.version += 1;
                let message = format!(
                    "Reminder: {} return for {} is due in {} day(s) on {}",
                    item.tax_type, item.tax_year, days_until_due, item.due_date
                );
                emit(&mut report, item, AlertKind::DailyReminder, message, today, notifier);
            }
        }

        // Fires independently of the daily reminder; both can go out on
        // the same day
        if days_until_due == 1 && !item.alert_sent_1_day {
            item.alert_sent_1_day = true;
            item.version += 1;
            let message = due_message(item, 1);
            emit(&mut report, item, AlertKind::Warning1Day, message, today, notifier);
        }
    }

    report
}

fn due_message(item: &ComplianceMonitoringItem, days: i64) -> String {
    format!(
        "{} return for {} is due in {} day(s) on {}",
        item.tax_type, item.tax_year, days, item.due_date
    )
}

fn emit(
    report: &mut MonitorRunReport,
    item: &ComplianceMonitoringItem,
    kind: AlertKind,
    message: String,
    today: NaiveDate,
    notifier: &dyn Notifier,
) {
    let channel = if item.recipient.contains('@') {
        Channel::Email
    } else {
        Channel::Sms
    };
    // Delivery failure does not roll back the flag: the alert is recorded
    // and the error is swallowed here by contract
    if let Err(e) = notifier.send(&item.recipient, &message, channel) {
        log::error!("alert delivery failed for item {}: {e}", item.id);
    }
    report.alerts.push(Alert {
        item_id: item.id.clone(),
        client_ref: item.client_ref.clone(),
        recipient: item.recipient.clone(),
        kind,
        message,
        channel,
        sent_at: today.and_hms_opt(0, 0, 0).unwrap(),
    });
}
