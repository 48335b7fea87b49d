//! Compliance scoring: aggregates a client's filing/payment/document
//! history for a tax year into a 0-100 score, risk tier and grade, plus a
//! list of concrete, dated compliance issues.
//!
//! Facts in, snapshot out: the snapshot is a new immutable record each
//! time, never updated in place.

use crate::types::{TaxType, TaxYear, TaxpayerCategory};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingRecord {
    pub tax_type: TaxType,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub submitted_date: Option<NaiveDate>,
}

impl FilingRecord {
    pub fn is_late(&self) -> bool {
        self.submitted_date.map(|d| d > self.due_date).unwrap_or(false)
    }

    pub fn days_late(&self) -> i64 {
        self.submitted_date
            .map(|d| d.signed_duration_since(self.due_date).num_days().max(0))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub tax_type: TaxType,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    pub amount: Decimal,
}

impl PaymentRecord {
    pub fn is_late(&self) -> bool {
        self.paid_date.map(|d| d > self.due_date).unwrap_or(false)
    }

    pub fn is_pending(&self) -> bool {
        self.paid_date.is_none()
    }
}

/// A client's compliance facts for one tax year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceHistory {
    pub client_ref: String,
    pub tax_year: TaxYear,
    #[serde(default)]
    pub category: TaxpayerCategory,
    pub filings: Vec<FilingRecord>,
    pub payments: Vec<PaymentRecord>,
    #[serde(default)]
    pub documents_uploaded: u32,
    /// "Non-compliant" audit/tracker flags on record
    #[serde(default)]
    pub non_compliant_flags: u32,
    #[serde(default)]
    pub outstanding_penalty: Decimal,
    /// Filing obligations the client is registered for this year
    #[serde(default)]
    pub required_filings: Vec<TaxType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn display(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One contributing factor, positive or negative, in the score breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub description: String,
    /// Score impact; negative values are deductions
    pub impact: i32,
}

/// Immutable snapshot of a computed compliance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceScoreSnapshot {
    pub client_ref: String,
    pub tax_year: TaxYear,
    pub computed_at: NaiveDateTime,
    /// Clamped to [0, 100]
    pub score: u8,
    pub factors: Vec<ScoreFactor>,
    pub risk: RiskLevel,
    pub grade: char,
    pub grade_label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueSeverity {
    Medium,
    High,
    Critical,
}

impl IssueSeverity {
    pub fn display(&self) -> &'static str {
        match self {
            IssueSeverity::Medium => "Medium",
            IssueSeverity::High => "High",
            IssueSeverity::Critical => "Critical",
        }
    }
}

/// A concrete, dated, actionable compliance issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub severity: IssueSeverity,
    pub tax_type: Option<TaxType>,
    pub date: Option<NaiveDate>,
    pub description: String,
}

/// Compute the compliance score snapshot for a client's history.
///
/// Starts at 100: -10 per late filing, -15 per late payment, -20 per
/// non-compliant flag, -10 when fewer than 5 supporting documents were
/// uploaded. Clamped to [0, 100]. A client with no history scores
/// exactly 100 apart from the document deduction exemption below: an
/// empty history carries no negative evidence, so no deduction applies.
pub fn calculate_compliance_score(
    history: &ComplianceHistory,
    now: NaiveDateTime,
) -> ComplianceScoreSnapshot {
    let mut score: i32 = 100;
    let mut factors = Vec::new();

    let late_filings = history.filings.iter().filter(|f| f.is_late()).count() as i32;
    if late_filings > 0 {
        let impact = -10 * late_filings;
        factors.push(ScoreFactor {
            description: format!("{late_filings} late filing(s)"),
            impact,
        });
        score += impact;
    }

    let late_payments = history.payments.iter().filter(|p| p.is_late()).count() as i32;
    if late_payments > 0 {
        let impact = -15 * late_payments;
        factors.push(ScoreFactor {
            description: format!("{late_payments} late payment(s)"),
            impact,
        });
        score += impact;
    }

    if history.non_compliant_flags > 0 {
        let impact = -20 * history.non_compliant_flags as i32;
        factors.push(ScoreFactor {
            description: format!("{} non-compliant audit flag(s)", history.non_compliant_flags),
            impact,
        });
        score += impact;
    }

    // The document deduction only applies once there is any activity on
    // record; an empty history is not penalized for missing paperwork
    let has_activity = !history.filings.is_empty() || !history.payments.is_empty();
    if has_activity && history.documents_uploaded < 5 {
        factors.push(ScoreFactor {
            description: format!(
                "only {} supporting document(s) uploaded",
                history.documents_uploaded
            ),
            impact: -10,
        });
        score -= 10;
    } else if history.documents_uploaded >= 10 {
        // called out as a positive factor, not scored further
        factors.push(ScoreFactor {
            description: format!(
                "{} supporting documents uploaded",
                history.documents_uploaded
            ),
            impact: 0,
        });
    }

    let score = score.clamp(0, 100) as u8;
    let (grade, grade_label) = grade_for(score);

    ComplianceScoreSnapshot {
        client_ref: history.client_ref.clone(),
        tax_year: history.tax_year,
        computed_at: now,
        score,
        factors,
        risk: risk_level(score, history.outstanding_penalty),
        grade,
        grade_label,
    }
}

fn grade_for(score: u8) -> (char, &'static str) {
    match score {
        90..=100 => ('A', "Excellent"),
        80..=89 => ('B', "Good"),
        70..=79 => ('C', "Satisfactory"),
        60..=69 => ('D', "Poor"),
        _ => ('F', "Very poor"),
    }
}

/// Risk tier from score and outstanding penalty magnitude. Any outstanding
/// penalty above 1,000 forces at least High regardless of score.
pub fn risk_level(score: u8, outstanding_penalty: Decimal) -> RiskLevel {
    let mut risk = if score < 40 {
        RiskLevel::Critical
    } else if score < 60 {
        RiskLevel::High
    } else if score < 80 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    if outstanding_penalty > dec!(1000) && risk < RiskLevel::High {
        risk = RiskLevel::High;
    }
    risk
}

/// Enumerate concrete compliance issues: missing required filings, late
/// submissions, pending payments, and a GST-registration advisory for
/// non-micro business taxpayers with no GST filing on record.
pub fn identify_compliance_issues(
    history: &ComplianceHistory,
    today: NaiveDate,
) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();

    for required in &history.required_filings {
        let filed = history
            .filings
            .iter()
            .any(|f| f.tax_type == *required && f.submitted_date.is_some());
        if !filed {
            issues.push(ComplianceIssue {
                severity: IssueSeverity::High,
                tax_type: Some(*required),
                date: None,
                description: format!(
                    "No {} filing on record for {}",
                    required, history.tax_year
                ),
            });
        }
    }

    for filing in &history.filings {
        if filing.is_late() {
            let days = filing.days_late();
            let severity = if days > 30 {
                IssueSeverity::Critical
            } else {
                IssueSeverity::Medium
            };
            issues.push(ComplianceIssue {
                severity,
                tax_type: Some(filing.tax_type),
                date: filing.submitted_date,
                description: format!(
                    "{} return submitted {days} day(s) after the {} deadline",
                    filing.tax_type, filing.due_date
                ),
            });
        }
    }

    for payment in &history.payments {
        if payment.is_pending() {
            let overdue = payment.due_date < today;
            issues.push(ComplianceIssue {
                severity: if overdue {
                    IssueSeverity::Critical
                } else {
                    IssueSeverity::High
                },
                tax_type: Some(payment.tax_type),
                date: Some(payment.due_date),
                description: format!(
                    "{} payment of {} due {}{}",
                    payment.tax_type,
                    payment.amount,
                    payment.due_date,
                    if overdue { " is overdue" } else { " is pending" }
                ),
            });
        }
    }

    let is_gst_candidate = history.category.is_corporate()
        && history.category != TaxpayerCategory::Micro;
    let has_gst_filing = history.filings.iter().any(|f| f.tax_type == TaxType::Gst);
    if is_gst_candidate && !has_gst_filing {
        issues.push(ComplianceIssue {
            severity: IssueSeverity::Medium,
            tax_type: Some(TaxType::Gst),
            date: None,
            description: format!(
                "{} taxpayer has no GST filing on record; confirm GST registration status",
                history.category
            ),
        });
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn now() -> NaiveDateTime {
        date("2025-07-01").and_hms_opt(9, 0, 0).unwrap()
    }

    fn empty_history() -> ComplianceHistory {
        ComplianceHistory {
            client_ref: "CL-001".to_string(),
            tax_year: TaxYear(2025),
            category: TaxpayerCategory::Small,
            filings: vec![],
            payments: vec![],
            documents_uploaded: 0,
            non_compliant_flags: 0,
            outstanding_penalty: Decimal::ZERO,
            required_filings: vec![],
        }
    }

    fn filing(tax_type: TaxType, due: &str, submitted: Option<&str>) -> FilingRecord {
        FilingRecord {
            tax_type,
            due_date: date(due),
            submitted_date: submitted.map(date),
        }
    }

    fn payment(due: &str, paid: Option<&str>, amount: Decimal) -> PaymentRecord {
        PaymentRecord {
            tax_type: TaxType::Gst,
            due_date: date(due),
            paid_date: paid.map(date),
            amount,
        }
    }

    #[test]
    fn clean_history_scores_one_hundred() {
        let snapshot = calculate_compliance_score(&empty_history(), now());
        assert_eq!(snapshot.score, 100);
        assert_eq!(snapshot.grade, 'A');
        assert_eq!(snapshot.grade_label, "Excellent");
        assert_eq!(snapshot.risk, RiskLevel::Low);
    }

    #[test]
    fn deductions_per_late_filing_and_payment() {
        let mut history = empty_history();
        history.documents_uploaded = 6;
        history.filings = vec![
            filing(TaxType::Gst, "2025-01-15", Some("2025-01-20")),
            filing(TaxType::IncomeTax, "2025-04-30", Some("2025-04-01")),
        ];
        history.payments = vec![payment("2025-01-15", Some("2025-02-01"), dec!(100000))];
        let snapshot = calculate_compliance_score(&history, now());
        // 100 - 10 (one late filing) - 15 (one late payment)
        assert_eq!(snapshot.score, 75);
        assert_eq!(snapshot.grade, 'C');
        assert_eq!(snapshot.risk, RiskLevel::Medium);
    }

    #[test]
    fn non_compliant_flags_weigh_twenty_each() {
        let mut history = empty_history();
        history.non_compliant_flags = 2;
        let snapshot = calculate_compliance_score(&history, now());
        assert_eq!(snapshot.score, 60);
        assert_eq!(snapshot.grade, 'D');
    }

    #[test]
    fn few_documents_deducts_ten() {
        let mut history = empty_history();
        history.filings = vec![filing(TaxType::Gst, "2025-01-15", Some("2025-01-10"))];
        history.documents_uploaded = 3;
        let snapshot = calculate_compliance_score(&history, now());
        assert_eq!(snapshot.score, 90);
    }

    #[test]
    fn many_documents_is_positive_factor_not_scored() {
        let mut history = empty_history();
        history.filings = vec![filing(TaxType::Gst, "2025-01-15", Some("2025-01-10"))];
        history.documents_uploaded = 12;
        let snapshot = calculate_compliance_score(&history, now());
        assert_eq!(snapshot.score, 100);
        assert!(snapshot.factors.iter().any(|f| f.impact == 0));
    }

    #[test]
    fn score_clamps_at_zero() {
        let mut history = empty_history();
        history.non_compliant_flags = 10;
        let snapshot = calculate_compliance_score(&history, now());
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.grade, 'F');
        assert_eq!(snapshot.risk, RiskLevel::Critical);
    }

    #[test]
    fn outstanding_penalty_forces_high_risk() {
        assert_eq!(risk_level(95, dec!(5000)), RiskLevel::High);
        // but never lowers a Critical tier
        assert_eq!(risk_level(10, dec!(5000)), RiskLevel::Critical);
        // and a small penalty changes nothing
        assert_eq!(risk_level(95, dec!(500)), RiskLevel::Low);
    }

    #[test]
    fn risk_tiers_by_score() {
        assert_eq!(risk_level(85, Decimal::ZERO), RiskLevel::Low);
        assert_eq!(risk_level(79, Decimal::ZERO), RiskLevel::Medium);
        assert_eq!(risk_level(59, Decimal::ZERO), RiskLevel::High);
        assert_eq!(risk_level(39, Decimal::ZERO), RiskLevel::Critical);
    }

    #[test]
    fn grade_bands() {
        assert_eq!(grade_for(90), ('A', "Excellent"));
        assert_eq!(grade_for(80), ('B', "Good"));
        assert_eq!(grade_for(70), ('C', "Satisfactory"));
        assert_eq!(grade_for(60), ('D', "Poor"));
        assert_eq!(grade_for(59), ('F', "Very poor"));
    }

    #[test]
    fn missing_required_filing_reported() {
        let mut history = empty_history();
        history.required_filings = vec![TaxType::IncomeTax, TaxType::Gst];
        history.filings = vec![filing(TaxType::Gst, "2025-01-15", Some("2025-01-10"))];
        let issues = identify_compliance_issues(&history, date("2025-07-01"));
        let missing: Vec<_> = issues
            .iter()
            .filter(|i| i.description.contains("No "))
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].tax_type, Some(TaxType::IncomeTax));
        assert_eq!(missing[0].severity, IssueSeverity::High);
    }

    #[test]
    fn late_filing_severity_by_days() {
        let mut history = empty_history();
        history.filings = vec![
            filing(TaxType::Gst, "2025-01-15", Some("2025-01-25")),
            filing(TaxType::IncomeTax, "2025-01-15", Some("2025-03-15")),
        ];
        let issues = identify_compliance_issues(&history, date("2025-07-01"));
        let gst = issues
            .iter()
            .find(|i| i.tax_type == Some(TaxType::Gst) && i.date.is_some())
            .unwrap();
        assert_eq!(gst.severity, IssueSeverity::Medium);
        let income = issues
            .iter()
            .find(|i| i.tax_type == Some(TaxType::IncomeTax))
            .unwrap();
        assert_eq!(income.severity, IssueSeverity::Critical);
    }

    #[test]
    fn pending_payment_severity() {
        let mut history = empty_history();
        history.payments = vec![
            payment("2025-06-01", None, dec!(100000)), // overdue by 2025-07-01
            payment("2025-08-01", None, dec!(200000)), // not yet due
        ];
        let issues = identify_compliance_issues(&history, date("2025-07-01"));
        assert_eq!(issues[0].severity, IssueSeverity::Critical);
        assert_eq!(issues[1].severity, IssueSeverity::High);
    }

    #[test]
    fn gst_advisory_for_non_micro_business_only() {
        let mut history = empty_history();
        history.category = TaxpayerCategory::Medium;
        let issues = identify_compliance_issues(&history, date("2025-07-01"));
        assert!(issues
            .iter()
            .any(|i| i.description.contains("GST registration")));

        history.category = TaxpayerCategory::Micro;
        let issues = identify_compliance_issues(&history, date("2025-07-01"));
        assert!(issues.is_empty());

        history.category = TaxpayerCategory::Individual;
        let issues = identify_compliance_issues(&history, date("2025-07-01"));
        assert!(issues.is_empty());
    }

    #[test]
    fn advisory_suppressed_once_gst_filed() {
        let mut history = empty_history();
        history.category = TaxpayerCategory::Large;
        history.filings = vec![filing(TaxType::Gst, "2025-01-15", Some("2025-01-10"))];
        history.documents_uploaded = 6;
        let issues = identify_compliance_issues(&history, date("2025-07-01"));
        assert!(issues.is_empty());
    }
}
