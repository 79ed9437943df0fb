mod operation;
mod reconcile;

pub use operation::{MutateConfig, MutationOutcome};
pub use reconcile::{ReconcileReport, SkipReason, Skipped, reconcile};
