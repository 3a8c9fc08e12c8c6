//! Path canonicalization and field-mask membership.

use std::collections::HashSet;

use muster_reflect::wire_name;

/// Canonicalize a dotted field path so mask membership is an exact-match
/// test on one spelling.
///
/// Both the declared (`user.first_name`) and wire (`user.firstName`)
/// spellings converge to the wire form. Pure and total: malformed input
/// (empty segments, stray underscores) produces a string that never
/// matches a well-formed mask entry.
pub fn normalize_path(path: &str) -> String {
    wire_name(path)
}

/// A caller-supplied set of field paths scoping which mask-conditioned
/// assertions apply.
///
/// Absent mask (no paths supplied) means mask-scoped conditions never
/// apply: a validator built without a mask skips every `when_in_mask`
/// assertion. This is a deliberate default-deny, not default-allow.
#[derive(Clone, Debug, Default)]
pub struct FieldMask {
    paths: Option<HashSet<String>>,
}

impl FieldMask {
    /// No mask supplied; `contains` is always false.
    pub fn none() -> Self {
        Self { paths: None }
    }

    /// Build a mask from path strings, canonicalizing each entry. An
    /// empty iterator yields the absent mask.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: HashSet<String> = paths
            .into_iter()
            .map(|p| normalize_path(p.as_ref()))
            .collect();
        if set.is_empty() {
            Self::none()
        } else {
            Self { paths: Some(set) }
        }
    }

    /// O(1) membership test against the canonical spelling of `path`.
    ///
    /// Request masks are commonly spelled relative to the entity being
    /// written (`first_name` meaning `user.first_name`), so a path whose
    /// full spelling misses falls back to its leaf field name.
    pub fn contains(&self, path: &str) -> bool {
        let Some(set) = &self.paths else {
            return false;
        };
        let canonical = normalize_path(path);
        if set.contains(&canonical) {
            return true;
        }
        match canonical.rsplit_once('.') {
            Some((_, leaf)) => set.contains(leaf),
            None => false,
        }
    }

    /// Whether a mask was supplied at all.
    pub fn is_present(&self) -> bool {
        self.paths.is_some()
    }
}
