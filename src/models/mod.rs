//! Domain models for the grading ledger.
//!
//! # Core Concepts
//!
//! - [`CellAnnotation`]: grading flags attached to a notebook cell. Foreign
//!   data, parsed leniently and never modified for classification.
//! - [`ToolData`]: a cell's derived grading role ([`CellKind`]), id and point
//!   budget, computed by [`classify`].
//! - [`GradeLedger`]: notebook name → cell id → grading state for one
//!   submission. Parsed from and serialized back to the grading service's
//!   properties payload.
//! - [`Submission`]: the service's submission record; only its
//!   [`ManualStatus`] is touched here.
//! - [`SessionContext`]: the acting user and their per-lecture [`Role`].

mod cell;
mod context;
mod ledger;
mod notebook;
mod submission;

pub use cell::*;
pub use context::*;
pub use ledger::*;
pub use notebook::*;
pub use submission::*;
