//! Descriptions of compiled sets, and differences between two of them.
//!
//! Validators built by hand and validators compiled from IR describe
//! identically when they have the same shape, so comparing description maps
//! is how two builds of the same schema set are checked for equivalence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::registry::CompiledSet;

/// Name → description of every entry
pub fn describe(compiled: &CompiledSet) -> BTreeMap<String, String> {
    compiled
        .iter()
        .map(|(name, entry)| (name.clone(), entry.description().to_string()))
        .collect()
}

/// One difference between two description maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescriptionDiff {
    OnlyLeft { name: String, description: String },
    OnlyRight { name: String, description: String },
    /// Word-level fragments removed from the left and added on the right
    Changed {
        name: String,
        removed: Vec<String>,
        added: Vec<String>,
    },
}

impl DescriptionDiff {
    pub fn name(&self) -> &str {
        match self {
            DescriptionDiff::OnlyLeft { name, .. }
            | DescriptionDiff::OnlyRight { name, .. }
            | DescriptionDiff::Changed { name, .. } => name,
        }
    }
}

/// Compare two description maps name by name; empty when equivalent
pub fn diff_descriptions(
    left: &BTreeMap<String, String>,
    right: &BTreeMap<String, String>,
) -> Vec<DescriptionDiff> {
    let mut diffs = Vec::new();

    for (name, old) in left {
        match right.get(name) {
            None => diffs.push(DescriptionDiff::OnlyLeft {
                name: name.clone(),
                description: old.clone(),
            }),
            Some(new) if new != old => {
                let mut removed = Vec::new();
                let mut added = Vec::new();
                for change in TextDiff::from_words(old.as_str(), new.as_str()).iter_all_changes() {
                    let fragment = change.value().trim();
                    if fragment.is_empty() {
                        continue;
                    }
                    match change.tag() {
                        ChangeTag::Delete => removed.push(fragment.to_string()),
                        ChangeTag::Insert => added.push(fragment.to_string()),
                        ChangeTag::Equal => {}
                    }
                }
                diffs.push(DescriptionDiff::Changed { name: name.clone(), removed, added });
            }
            Some(_) => {}
        }
    }

    for (name, new) in right {
        if !left.contains_key(name) {
            diffs.push(DescriptionDiff::OnlyRight {
                name: name.clone(),
                description: new.clone(),
            });
        }
    }

    diffs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(items: &[(&str, &str)]) -> BTreeMap<String, String> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_identical_maps_have_no_diff() {
        let m = map(&[("A", "object{a: string}")]);
        assert!(diff_descriptions(&m, &m).is_empty());
    }

    #[test]
    fn test_missing_names_reported_both_ways() {
        let left = map(&[("A", "string"), ("B", "number")]);
        let right = map(&[("B", "number"), ("C", "boolean")]);
        let diffs = diff_descriptions(&left, &right);
        assert_eq!(
            diffs,
            vec![
                DescriptionDiff::OnlyLeft { name: "A".into(), description: "string".into() },
                DescriptionDiff::OnlyRight { name: "C".into(), description: "boolean".into() },
            ]
        );
    }

    #[test]
    fn test_changed_description_lists_fragments() {
        let left = map(&[("A", "object{a: string, b: number}")]);
        let right = map(&[("A", "object{a: string, b: boolean}")]);
        let diffs = diff_descriptions(&left, &right);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].name(), "A");
        match &diffs[0] {
            DescriptionDiff::Changed { removed, added, .. } => {
                assert!(removed.iter().any(|f| f.contains("number")));
                assert!(added.iter().any(|f| f.contains("boolean")));
            }
            other => panic!("Expected Changed, got {:?}", other),
        }
    }
}
