pub mod availability;
pub mod payments;
pub mod reconcile;
