//! Identifier classification.
//!
//! Decides, for every identifier a formula reads, whether it is a context
//! path supplied by the orchestrator or a reference to another component.

use std::collections::BTreeMap;

use crate::config::ContextSchema;
use crate::formula::Identifier;
use crate::models::ComponentDefinition;

/// What an identifier in a formula refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reference {
    /// External data declared by the schema.
    Context(String),
    /// Another component, by roster index.
    Component(usize),
    /// Neither; reported as an unknown identifier.
    Unknown(String),
}

/// Canonical component names mapped to the roster indices that carry them.
#[derive(Debug, Default)]
pub(crate) struct NameIndex {
    by_name: BTreeMap<String, Vec<usize>>,
}

impl NameIndex {
    /// Indexes the given canonical names; `None` entries are skipped.
    pub(crate) fn new(names: &[Option<String>]) -> Self {
        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, name) in names.iter().enumerate() {
            if let Some(name) = name {
                by_name.entry(name.clone()).or_default().push(index);
            }
        }
        Self { by_name }
    }

    /// Finds the component `from` may reference under `name`.
    ///
    /// A component in the same scope wins over a `GLOBAL` one.
    pub(crate) fn lookup(
        &self,
        name: &str,
        from: &ComponentDefinition,
        defs: &[ComponentDefinition],
    ) -> Option<usize> {
        let candidates = self.by_name.get(name)?;
        let same_scope = candidates.iter().copied().find(|&index| {
            defs[index]
                .country_scope
                .eq_ignore_ascii_case(&from.country_scope)
        });
        same_scope.or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|&index| from.can_reference(&defs[index]))
        })
    }
}

/// Classifies one identifier read by `from`'s formula.
///
/// Bare identifiers are checked against the roster before the schema's
/// variables, so a component shadows a variable of the same name.
pub(crate) fn classify(
    identifier: &Identifier,
    from: &ComponentDefinition,
    defs: &[ComponentDefinition],
    names: &NameIndex,
    schema: &ContextSchema,
) -> Reference {
    if !identifier.is_dotted() {
        if let Some(index) = names.lookup(identifier.path(), from, defs) {
            return Reference::Component(index);
        }
    }
    if schema.is_context_path(identifier) {
        Reference::Context(identifier.path().to_string())
    } else {
        Reference::Unknown(identifier.path().to_string())
    }
}
