//! Iris classification walkthrough: correlation overview, a 60/40 split,
//! a prepped recipe (correlation filter, center, scale), two random-forest
//! engines behind one `Classifier` trait, and test-set evaluation with
//! ROC and gain curves.

pub mod config;
pub mod data;
pub mod metrics;
pub mod model;
pub mod recipe;
pub mod report;
pub mod split;
pub mod stats;
pub mod workflow;
