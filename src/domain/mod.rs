//! Domain aggregates exposed by the receipt service layer.

pub mod client;
pub mod receipt;
pub mod types;
