//! Grading ledger for notebook assignments.
//!
//! Cells are classified from their grading annotations ([`models::classify`]),
//! per-cell scores and comments live in a [`models::GradeLedger`] that is
//! loaded from and saved to a remote grading service ([`sync::LedgerSync`]),
//! and [`grading::GradingModeController`] binds grading widgets to cells.

pub mod api;
pub mod client;
pub mod config;
pub mod grading;
pub mod models;
pub mod render;
pub mod sync;
