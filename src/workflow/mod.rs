pub mod extractor;
pub mod locks;
pub mod poller;
pub mod reconcile;
pub mod types;

pub use reconcile::{ReconcileSettings, Reconciler};
pub use types::{PullRequestEvent, ReconciliationOutcome, RejectReason};
