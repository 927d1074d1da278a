//! Administration toolkit for the photo-restoration order workflow.
//!
//! The library owns the synchronization layer (`store`) that keeps a local list
//! of orders consistent with the hosted table and blob store (`gateway`), plus
//! the derived views the command-line front end renders.

pub mod config;
pub mod detail;
pub mod download;
pub mod error;
pub mod gateway;
pub mod model;
pub mod render;
pub mod store;
pub mod summary;
pub mod view;
