//! Paper execution runner.
//!
//! Loads contract orders, quotes and tick sizes from TOML and executes the
//! orders through the execution engine against a simulated broker.

pub mod app;
pub mod config;
pub mod error;
pub mod paper;

pub use app::{PaperSession, SessionSummary};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use paper::{PaperGateway, PaperOrder};
