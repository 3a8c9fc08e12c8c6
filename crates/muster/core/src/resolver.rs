//! Memoizing field presence resolution over nested messages.

use std::collections::HashMap;

use muster_reflect::{FieldValue, MessageInspect};

use crate::path::normalize_path;

struct CachedField<'a> {
    set: bool,
    value: Option<FieldValue<'a>>,
}

/// Answers "has this field been explicitly set" for dotted paths,
/// memoizing every traversed prefix.
///
/// A resolver is scoped to one validator execution over one message: the
/// cache borrows nested message values, so it can never outlive the root
/// message or leak across executions. Repeated queries against
/// overlapping prefixes cost O(1) after the first traversal; "field
/// unknown to the schema" is cached as a terminal unset result.
#[derive(Default)]
pub struct PresenceResolver<'a> {
    cache: HashMap<String, CachedField<'a>>,
}

impl<'a> PresenceResolver<'a> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Walk `path` segment by segment from `root`.
    ///
    /// Per segment: consult the cache under the prefix seen so far; on a
    /// miss, resolve the descriptor by the declared spelling (falling
    /// back to the wire spelling), query presence, and descend into the
    /// nested message when segments remain. Descent into anything other
    /// than a set nested message answers `false`. Empty paths and lone
    /// delimiters are always `false`. The message is never mutated.
    pub fn is_set(&mut self, path: &str, root: &'a dyn MessageInspect) -> bool {
        if path.is_empty() || path == "." {
            return false;
        }

        let segments: Vec<&str> = path.split('.').collect();
        let mut current = root;
        let mut prefix = String::new();

        for (i, segment) in segments.iter().enumerate() {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            let last = i == segments.len() - 1;

            if let Some(cached) = self.cache.get(&prefix) {
                if !cached.set {
                    return false;
                }
                if last {
                    return true;
                }
                match cached.value.as_ref().and_then(FieldValue::as_message) {
                    Some(nested) => {
                        current = nested;
                        continue;
                    }
                    None => return false,
                }
            }

            let descriptor = current
                .field_by_name(segment)
                .or_else(|| current.field_by_name(&normalize_path(segment)));
            let Some(descriptor) = descriptor else {
                // unknown field: terminal unset, cached so repeats are free
                self.cache
                    .insert(prefix.clone(), CachedField { set: false, value: None });
                return false;
            };

            let set = current.has_field(&descriptor);
            let value = current.field_value(&descriptor);
            let nested = value.as_message();
            self.cache.insert(
                prefix.clone(),
                CachedField {
                    set,
                    value: Some(value),
                },
            );

            if last {
                return set;
            }
            if !set {
                return false;
            }
            match nested {
                Some(m) => current = m,
                // set, but not a message: nothing to descend into
                None => return false,
            }
        }

        false
    }
}
