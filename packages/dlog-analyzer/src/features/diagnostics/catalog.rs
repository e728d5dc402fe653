//! C6 — Diagnostic catalog: a closed enumeration of diagnostic kinds,
//! each with a fixed code, severity, message template and doc suffix
//! (spec §4.6). The source system numbers codes `"1000".."1047"`;
//! this implementation assigns stable codes in declaration order
//! starting at 1000 and documents the mapping here rather than trying
//! to recover the exact original numbering, which spec.md does not
//! specify per-name.

use super::severity::Severity;

macro_rules! catalog {
    ($($variant:ident => { name: $name:expr, severity: $sev:expr, template: $tmpl:expr $(,)? }),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum DiagnosticKind {
            $($variant),+
        }

        impl DiagnosticKind {
            /// Stable numeric code, assigned by declaration order starting at 1000.
            pub fn code(self) -> String {
                (1000 + self as u32).to_string()
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(DiagnosticKind::$variant => $name),+
                }
            }

            pub fn severity(self) -> Severity {
                match self {
                    $(DiagnosticKind::$variant => $sev),+
                }
            }

            pub fn template(self) -> &'static str {
                match self {
                    $(DiagnosticKind::$variant => $tmpl),+
                }
            }
        }
    };
}

catalog! {
    ErrEmptyDefinition => {
        name: "ERR_EMPTY_DEFINITION",
        severity: Severity::Error,
        template: "Annotation argument must not be empty",
    },
    ErrUndeclaredAtom => {
        name: "ERR_UNDECLARED_ATOM_0",
        severity: Severity::Error,
        template: "Atom '{atom}' is used but never declared",
    },
    ErrInputAtomInHead => {
        name: "ERR_INPUT_ATOM_IN_HEAD_0",
        severity: Severity::Warning,
        template: "Atom '{atom}' is declared as @input but also appears in a rule head",
    },
    ErrAtomAlreadyOutput => {
        name: "ERR_ATOM_0_ALREADY_OUTPUT",
        severity: Severity::Error,
        template: "Atom '{atom}' is already declared as @output",
    },
    ErrNonExistingOutput => {
        name: "ERR_NON_EXISTING_OUTPUT_0",
        severity: Severity::Error,
        template: "Atom '{atom}' is declared as @output but is neither declared nor an input",
    },
    ErrNoBindingsForInput => {
        name: "ERR_NO_BINDINGS_FOR_INPUT_0",
        severity: Severity::Warning,
        template: "Input atom '{atom}' has no @bind declaration",
    },
    NoBindingsForOutput => {
        name: "NO_BINDINGS_FOR_OUTPUT_0",
        severity: Severity::Hint,
        template: "Output atom '{atom}' has no @bind declaration",
    },
    ErrBindingOnUnknownAtom => {
        name: "ERR_BINDING_ON_UNKNOWN_ATOM",
        severity: Severity::Error,
        template: "Atom '{atom}' has a binding but is neither @input nor @output",
    },
    ErrNoVariablesInFact => {
        name: "ERR_NO_VARIABLES_IN_FACT",
        severity: Severity::Error,
        template: "Facts may not contain variables, found '{variable}'",
    },
    ErrNoExtensionalAtomAsOutput => {
        name: "ERR_NO_EXTENSIONAL_ATOM_AS_OUTPUT",
        severity: Severity::Error,
        template: "Extensional atom '{atom}' may not be declared as @output",
    },
    AnonymousVariable => {
        name: "ANONYMOUS_VARIABLE",
        severity: Severity::Warning,
        template: "Variable '{variable}' is used only once and has no effect",
    },
    ErrUnusedAtom => {
        name: "ERR_UNUSED_ATOM",
        severity: Severity::Warning,
        template: "Atom '{atom}' is never used in any rule body, @output or @exports",
    },
    ErrKeywordUsedAsAtomName => {
        name: "ERR_KEYWORD_USED_AS_ATOM_NAME",
        severity: Severity::Error,
        template: "'{atom}' is a reserved keyword and cannot be used as an atom name",
    },
    ErrAnnotationArity => {
        name: "ANNOTATION_PARAMETERS",
        severity: Severity::Error,
        template: "Annotation '@{annotation}' expects {expected} argument(s), found {actual}",
    },
    ErrMappingArity => {
        name: "ATOM_SIGNATURE_TERMS",
        severity: Severity::Error,
        template: "@mapping for '{atom}' declares {mapped} column(s) but the atom has {actual} term(s)",
    },
    ErrMappingPositionMustBeIndex => {
        name: "MAPPING_POSITION_MUST_BE_INDEX",
        severity: Severity::Error,
        template: "@mapping position '{position}' must be a non-negative integer index",
    },
    ErrUnknownMappingColumnType => {
        name: "ERR_UNKNOWN_MAPPING_COLUMN_TYPE",
        severity: Severity::Error,
        template: "Unknown @mapping column type '{column_type}'",
    },
    ErrCycleInConditionVariables => {
        name: "ERR_CYCLE_IN_CONDITION_VARIABLES",
        severity: Severity::Error,
        template: "Variables {cycle} form a cycle of equality conditions",
    },
    InvalidNegationPositiveBody => {
        name: "INVALID_NEGATION_POSITIVE_BODY_0",
        severity: Severity::Error,
        template: "Variable '{variable}' occurs in the head and in a negated literal but is not bound by a positive body atom",
    },
    HintEgd => {
        name: "HINT_EGD_0_1",
        severity: Severity::Hint,
        template: "Equality-generating dependency between '{lhs}' and '{rhs}'",
    },
    ExistentialVariableInDatalog => {
        name: "EXISTENTIAL_VARIABLE_IN_DATALOG",
        severity: Severity::Error,
        template: "Existential variable '{variable}' is not allowed in plain Datalog",
    },
    NonLinearRule => {
        name: "NON_LINEAR_RULE",
        severity: Severity::Error,
        template: "Rule is not linear: its body has more than one atom",
    },
    NonAfratiLinearJoin => {
        name: "NON_AFRATI_LINEAR_JOIN",
        severity: Severity::Error,
        template: "Join between intensional atoms violates Afrati-linearity",
    },
    ErrAtomNotInGuardedRule => {
        name: "ERR_ATOM_NOT_IN_GUARDED_RULE",
        severity: Severity::Error,
        template: "Rule has no guard atom covering all body variables",
    },
    ErrAtomNotInFrontierGuardedRule => {
        name: "ERR_ATOM_NOT_IN_FRONTIER_GUARDED_RULE",
        severity: Severity::Error,
        template: "Rule has no guard atom covering all head (frontier) variables",
    },
    ErrAtomNotInWeaklyGuardedRule => {
        name: "ERR_ATOM_NOT_IN_WEAKLY_GUARDED_RULE",
        severity: Severity::Error,
        template: "Rule has no guard atom covering all dangerous variables",
    },
    ErrAtomNotInWeaklyFrontierGuardedRule => {
        name: "ERR_ATOM_NOT_IN_WEAKLY_FRONTIER_GUARDED_RULE",
        severity: Severity::Error,
        template: "Rule has no guard atom covering all dangerous frontier variables",
    },
    ErrVariableIsUnwarded => {
        name: "ERR_VARIABLE_IS_UNWARDED_0",
        severity: Severity::Error,
        template: "Dangerous variable '{variable}' is not covered by a single ward",
    },
    ErrVariableIsEgdHarmful => {
        name: "ERR_VARIABLE_IS_EGD_HARMFUL_0",
        severity: Severity::Error,
        template: "Tainted variable '{variable}' is used in a join across body atoms",
    },
    ErrVariableInTaintedPositionUsedInFilter => {
        name: "ERR_VARIABLE_IN_TAINTED_POSITION_IS_USED_IN_FILTER_0",
        severity: Severity::Error,
        template: "Tainted variable '{variable}' is used in a filter condition",
    },
    ErrLiteralInTaintedPosition => {
        name: "ERR_LITERAL_IN_TAINTED_POSITION",
        severity: Severity::Error,
        template: "Literal '{literal}' occupies a tainted position",
    },
    ErrConstantUsedInTaintedPosition => {
        name: "ERR_CONSTANT_USED_IN_TAINTED_POSITION",
        severity: Severity::Error,
        template: "Constant '{literal}' is used in a tainted position of an EGD rule",
    },
    ErrAtomNotViolatingShyS1 => {
        name: "ERR_ATOM_NOT_VIOLATING_SHY_S1_CONDITION",
        severity: Severity::Error,
        template: "Variable '{variable}' occurs in more than one body atom but is not protected (S1)",
    },
    ErrAtomNotViolatingShyS2 => {
        name: "ERR_ATOM_NOT_VIOLATING_SHY_S2_CONDITION",
        severity: Severity::Error,
        template: "Attacked variables '{variable}' and '{other}' share an attacker and both reach the head (S2)",
    },
    ParseError => {
        name: "PARSE_ERROR",
        severity: Severity::Error,
        template: "{message}",
    },
}

pub fn doc_href(kind: DiagnosticKind) -> String {
    format!("https://docs.datalogplus.dev/diagnostic-codes.html#{}", kind.code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_sequential() {
        assert_eq!(DiagnosticKind::ErrEmptyDefinition.code(), "1000");
        assert_eq!(DiagnosticKind::ErrUndeclaredAtom.code(), "1001");
    }

    #[test]
    fn href_embeds_code() {
        assert!(doc_href(DiagnosticKind::ErrUnusedAtom).contains(&DiagnosticKind::ErrUnusedAtom.code()));
    }
}
