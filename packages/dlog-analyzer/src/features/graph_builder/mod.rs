//! C2 — Program Graph Builder.
//!
//! Domain: [`domain::SymbolTables`] and the annotation value records it
//! holds. Infrastructure: the parse-tree walk itself
//! ([`infrastructure::build`]). Application: [`application::ProgramGraphBuilderUseCase`],
//! the single entry point the rest of the crate calls.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{ProgramGraphBuildResult, ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};
pub use domain::{BindingInfo, MappingEntry, SymbolTables};
