//! Emissions assistant: library crate for the query pipeline.
//!
//! A query flows through `resolver` (prompt + text generator), the call
//! extractor/parser from `ea-protocol`, the `registry` dispatcher, and
//! `normalize`, ending as a `NormalizedResult` or a `PipelineError`.
//! `assistant` adds the narrative stage and chat session on top.

pub mod assistant;
pub mod config;
pub mod error;
pub mod inference;
pub mod mock;
pub mod narrate;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod session;
