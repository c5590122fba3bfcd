pub mod history;
pub mod reconcile;
pub mod registry;
