//! Whole-program semantic analyzer for Datalog± programs.
//!
//! Feature-first layout:
//! - `shared/`    : the program graph IR, error type, small pure helpers
//! - `features/`  : one module per pipeline stage (parsing → graph
//!   builder → base analysis → fragment/semantic analyzers → decorator)
//! - `adapters/`  : the single external entry point, `analyze`, plus the
//!   read-only query helpers over its result
//!
//! Control flow is fixed and runs once per `analyze()` call: reference
//! parser → program-graph builder (C2) → base analyzer (C3) → fragment
//! and semantic analyzers (C4, C5) → token decorator (C7) → adapters (C8).

pub mod adapters;
pub mod features;
pub mod shared;

pub use adapters::{analyze, AnalysisResult, AnalyzerSession};
pub use features::decorator::TargetFragment;
pub use shared::models::{AnalyzerError, Result};
