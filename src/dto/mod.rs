//! Response bodies returned by the JSON API.

pub mod api;
