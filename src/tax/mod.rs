pub mod excise;
pub mod gst;
pub mod income;
pub mod payroll;

pub use excise::{calculate_excise_duty, ExciseDutyResult};
pub use gst::{calculate_gst, GstResult};
pub use income::{calculate_income_tax, IncomeTaxResult};
pub use payroll::{calculate_payroll_tax, PayrollTaxResult};
