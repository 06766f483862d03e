//! Shared data contracts between `cohesion-ast` and `cohesion-cc`: the
//! compiler configuration, the cloud resource-identifier builder, and the
//! retry/catch rule shapes that appear verbatim in emitted workflow JSON.

pub mod arn;
pub mod config;
pub mod rules;

pub use arn::ResourceNamer;
pub use config::Config;
pub use rules::{CatchRule, RetryRule};
