//! Pure models produced while walking the parse tree: the symbol tables
//! the annotation dispatch table populates, independent of how the walk
//! itself is driven.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::shared::models::LexicalToken;

/// One `@bind`/`@qbind` declaration.
#[derive(Debug, Clone)]
pub struct BindingInfo {
    pub data_source: String,
    pub outermost_container: String,
    /// The innermost container for `@bind`, or the query text for `@qbind`.
    pub inner: String,
    pub is_query_bind: bool,
    pub token: LexicalToken,
}

/// One column of an `@mapping` declaration.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub position: u32,
    pub column_name: String,
    pub column_type: String,
    pub token: LexicalToken,
}

/// Symbol tables assembled by the annotation dispatch table while
/// walking the parse tree, consumed by the semantic analyzers (C5)
/// rather than stored on the graph itself.
#[derive(Debug, Clone, Default)]
pub struct SymbolTables {
    /// Every `@output(name)` occurrence, in declaration order — including
    /// duplicates, so `DuplicateOutputAnalyzer` can flag the second and
    /// later ones.
    pub output_declarations: Vec<(String, LexicalToken)>,
    pub input_atom_names: FxHashSet<String>,
    /// Atoms that have at least one `@bind`/`@qbind` declaration.
    pub atom_bindings: FxHashSet<String>,
    pub bindings: FxHashMap<String, Vec<BindingInfo>>,
    pub mappings: FxHashMap<String, Vec<MappingEntry>>,
    pub module_names: FxHashSet<String>,
    /// Atoms tagged `@temporal(name)`, seeding temporal propagation (C5).
    pub temporal_atom_names: FxHashSet<String>,
    /// First non-empty Vadoc block found immediately above any
    /// declaration of the atom, keyed by atom name.
    pub atom_vadoc: FxHashMap<String, String>,
}

impl SymbolTables {
    pub fn output_atom_names(&self) -> FxHashSet<String> {
        self.output_declarations.iter().map(|(name, _)| name.clone()).collect()
    }
}
