//! Tax & compliance calculation engine: tax liabilities per tax type,
//! penalties and interest for late or incorrect filings, compliance
//! scoring, and deadline monitoring with idempotent alerting.
//!
//! This is an in-process computation library; the binary in `main.rs` is a
//! thin CLI over it. All calculators are pure over their explicit inputs
//! and safe to call concurrently.

pub mod cmd;
pub mod compliance;
pub mod error;
pub mod money;
pub mod monitor;
pub mod penalty;
pub mod rates;
pub mod tax;
pub mod types;
pub mod utils;

pub use error::{EngineError, Result};
pub use rates::RateProvider;
pub use types::{TaxType, TaxYear, TaxpayerCategory};
