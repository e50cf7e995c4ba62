//! tune-radar library: catalogue search ranking, bulk feature retrieval, and
//! radar chart geometry.

pub mod api;
pub mod catalog;
pub mod error;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod radar;
pub mod safety;
pub mod scoring;
pub mod session;
