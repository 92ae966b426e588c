mod progress;
mod reconcile;

pub use progress::{ProgressEmitter, ProgressStream};
pub use reconcile::{reconcile, Reconciliation};
