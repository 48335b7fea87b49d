use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Tax type administered by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxType {
    IncomeTax,
    Gst,
    PayrollTax,
    ExciseDuty,
}

impl TaxType {
    pub fn from_str(s: &str) -> Option<TaxType> {
        match s.to_lowercase().as_str() {
            "income" | "income-tax" | "incometax" => Some(TaxType::IncomeTax),
            "gst" => Some(TaxType::Gst),
            "payroll" | "paye" | "payroll-tax" => Some(TaxType::PayrollTax),
            "excise" | "excise-duty" => Some(TaxType::ExciseDuty),
            _ => None,
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            TaxType::IncomeTax => "Income Tax",
            TaxType::Gst => "GST",
            TaxType::PayrollTax => "Payroll Tax",
            TaxType::ExciseDuty => "Excise Duty",
        }
    }

    pub const ALL: [TaxType; 4] = [
        TaxType::IncomeTax,
        TaxType::Gst,
        TaxType::PayrollTax,
        TaxType::ExciseDuty,
    ];
}

impl std::fmt::Display for TaxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Taxpayer classification driving which rate/rule set applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaxpayerCategory {
    #[default]
    Individual,
    Micro,
    Small,
    Medium,
    Large,
}

impl TaxpayerCategory {
    pub fn from_str(s: &str) -> Option<TaxpayerCategory> {
        match s.to_lowercase().as_str() {
            "individual" => Some(TaxpayerCategory::Individual),
            "micro" => Some(TaxpayerCategory::Micro),
            "small" => Some(TaxpayerCategory::Small),
            "medium" => Some(TaxpayerCategory::Medium),
            "large" => Some(TaxpayerCategory::Large),
            _ => None,
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            TaxpayerCategory::Individual => "Individual",
            TaxpayerCategory::Micro => "Micro",
            TaxpayerCategory::Small => "Small",
            TaxpayerCategory::Medium => "Medium",
            TaxpayerCategory::Large => "Large",
        }
    }

    /// Whether this category is a corporate entity (minimum-tax floor applies
    /// to Medium and Large only)
    pub fn is_corporate(&self) -> bool {
        !matches!(self, TaxpayerCategory::Individual)
    }
}

impl std::fmt::Display for TaxpayerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Tax year (calendar year, 1 January to 31 December)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxYear(pub i32);

impl TaxYear {
    pub fn from_date(date: NaiveDate) -> Self {
        TaxYear(date.year())
    }

    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 1, 1).unwrap()
    }

    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 12, 31).unwrap()
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
