//! The Naive Bayes model, its builder and its persisted form.

pub mod builder;
pub mod naive_bayes;
pub mod persistence;

pub use builder::*;
pub use naive_bayes::*;
pub use persistence::*;
