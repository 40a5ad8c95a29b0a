//! Custodia Consent — consent-state reconciliation.

pub mod reconcile;

pub use reconcile::{ConsentMode, ConsentReconciler};
