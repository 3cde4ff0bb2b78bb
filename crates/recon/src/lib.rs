//! `regrade-recon`: grade-reconciliation decision engine.
//!
//! Pure engine crate: receives a pre-loaded table, returns one annotated
//! record per row. No CLI or file IO dependencies.

pub mod classify;
pub mod config;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;
pub mod normalize;
pub mod rules;
pub mod table;

pub use classify::{classify, StageClassifier};
pub use config::{Field, ReconConfig};
pub use dynamics::passes_dynamics;
pub use engine::{annotate_table, reconcile_record, run};
pub use error::ReconError;
pub use model::{GradeRecord, ReconResult, ReconciledRecord, Stage};
pub use normalize::normalize;
pub use table::{Cell, Table};
