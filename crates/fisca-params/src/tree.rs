//! # ScaleTree — String-Keyed Hierarchy of Scales
//!
//! Legislation organises contribution scales by legislative section
//! (a shared "common" section, private-sector sections, a public-sector
//! section with its own subsections). [`ScaleTree`] is that hierarchy.
//!
//! ## Ownership
//!
//! A tree exclusively owns every [`Scale`] reachable from it. There is no
//! shared interior mutability anywhere in the structure, so
//! [`ScaleTree::deep_copy()`] yields a tree whose later mutation can never be
//! observed through the original. Restructuring operations consume or borrow
//! their inputs and return new trees; [`merge`](ScaleTree::merge) in
//! particular never mutates either side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ParamsError, ParamsResult};
use crate::scale::Scale;

/// A tree entry: either a leaf scale or a nested tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleNode {
    Scale(Scale),
    Tree(ScaleTree),
}

impl ScaleNode {
    pub fn as_scale(&self) -> Option<&Scale> {
        match self {
            Self::Scale(s) => Some(s),
            Self::Tree(_) => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ScaleTree> {
        match self {
            Self::Scale(_) => None,
            Self::Tree(t) => Some(t),
        }
    }

    fn scaled(&self, factor: f64) -> ParamsResult<Self> {
        Ok(match self {
            Self::Scale(s) => Self::Scale(s.scaled(factor)?),
            Self::Tree(t) => Self::Tree(t.scaled(factor)?),
        })
    }
}

impl From<Scale> for ScaleNode {
    fn from(scale: Scale) -> Self {
        Self::Scale(scale)
    }
}

impl From<ScaleTree> for ScaleNode {
    fn from(tree: ScaleTree) -> Self {
        Self::Tree(tree)
    }
}

/// Mapping from string key to [`ScaleNode`]. Keys are unique; order is not
/// significant (iteration is sorted for deterministic output).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleTree {
    entries: BTreeMap<String, ScaleNode>,
}

impl ScaleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, returning the previous node.
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<ScaleNode>) -> Option<ScaleNode> {
        self.entries.insert(key.into(), node.into())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_entry(mut self, key: impl Into<String>, node: impl Into<ScaleNode>) -> Self {
        self.insert(key, node);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ScaleNode> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ScaleNode> {
        self.entries.get_mut(key)
    }

    pub fn scale(&self, key: &str) -> Option<&Scale> {
        self.get(key).and_then(ScaleNode::as_scale)
    }

    pub fn subtree(&self, key: &str) -> Option<&ScaleTree> {
        self.get(key).and_then(ScaleNode::as_tree)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScaleNode)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of scales reachable from this tree.
    pub fn scale_count(&self) -> usize {
        self.entries
            .values()
            .map(|node| match node {
                ScaleNode::Scale(_) => 1,
                ScaleNode::Tree(t) => t.scale_count(),
            })
            .sum()
    }

    /// Overlay `overlay` onto a copy of `self`.
    ///
    /// Keys only in `self` are kept; every key of `overlay` ends up with
    /// `overlay`'s value. Conflicts are resolved by shallow overwrite, not
    /// by merging nested trees. Neither input is modified.
    pub fn merge(&self, overlay: &ScaleTree) -> ScaleTree {
        let mut merged = self.clone();
        for (key, node) in &overlay.entries {
            merged.entries.insert(key.clone(), node.clone());
        }
        merged
    }

    /// Remove `key` and return the removed node.
    ///
    /// # Errors
    ///
    /// [`ParamsError::KeyNotFound`] if `key` is absent.
    pub fn remove(&mut self, key: &str) -> ParamsResult<ScaleNode> {
        match self.entries.remove(key) {
            Some(node) => Ok(node),
            None => Err(ParamsError::key_not_found(key, self.entries.keys())),
        }
    }

    /// Remove every key in `keys`, failing on the first absent one.
    pub fn without(mut self, keys: &[&str]) -> ParamsResult<ScaleTree> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(self)
    }

    /// Move the entry at `old` to `new`, overwriting any entry at `new`.
    pub fn rename(mut self, old: &str, new: &str) -> ParamsResult<ScaleTree> {
        let node = self.remove(old)?;
        self.entries.insert(new.to_string(), node);
        Ok(self)
    }

    /// Remove and return the subtree at `key`.
    ///
    /// # Errors
    ///
    /// [`ParamsError::KeyNotFound`] if absent, [`ParamsError::UnexpectedNode`]
    /// if the entry is a scale (the entry is left in place).
    pub fn take_subtree(&mut self, key: &str) -> ParamsResult<ScaleTree> {
        match self.remove(key)? {
            ScaleNode::Tree(tree) => Ok(tree),
            node @ ScaleNode::Scale(_) => {
                self.entries.insert(key.to_string(), node);
                Err(ParamsError::UnexpectedNode {
                    path: key.to_string(),
                    expected: "subtree",
                })
            }
        }
    }

    /// A fully independent copy. Every scale is cloned; nothing is shared
    /// with `self`.
    pub fn deep_copy(&self) -> ScaleTree {
        self.clone()
    }

    /// Copy of the tree with every scale's thresholds multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> ParamsResult<ScaleTree> {
        let entries = self
            .entries
            .iter()
            .map(|(k, node)| Ok((k.clone(), node.scaled(factor)?)))
            .collect::<ParamsResult<BTreeMap<_, _>>>()?;
        Ok(Self { entries })
    }

    /// Lift the entries of the nested subtree at `nested` up to this level
    /// and drop the then-empty nested key. Lifted entries overwrite entries
    /// of the same name. A missing `nested` key leaves the tree unchanged.
    pub fn lift(mut self, nested: &str) -> ParamsResult<ScaleTree> {
        if !self.contains_key(nested) {
            return Ok(self);
        }
        let inner = self.take_subtree(nested)?;
        self.entries.extend(inner.entries);
        Ok(self)
    }

    /// Drop `key` if present; absent keys are ignored.
    pub fn discard(mut self, key: &str) -> ScaleTree {
        self.entries.remove(key);
        self
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, ScaleNode> {
        self.entries
    }
}

impl FromIterator<(String, ScaleNode)> for ScaleTree {
    fn from_iter<I: IntoIterator<Item = (String, ScaleNode)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, ScaleNode>> for ScaleTree {
    fn from(entries: BTreeMap<String, ScaleNode>) -> Self {
        Self { entries }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn tree_strategy() -> impl Strategy<Value = ScaleTree> {
        prop::collection::btree_map("[a-f]{1,3}", 0.0f64..1.0, 0..8).prop_map(|m| {
            m.into_iter()
                .map(|(k, rate)| (k, ScaleNode::Scale(Scale::flat(rate).unwrap())))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn merge_never_mutates_inputs(base in tree_strategy(), overlay in tree_strategy()) {
            let base_before = base.clone();
            let overlay_before = overlay.clone();
            let _ = base.merge(&overlay);
            prop_assert_eq!(base, base_before);
            prop_assert_eq!(overlay, overlay_before);
        }

        #[test]
        fn merge_is_idempotent(base in tree_strategy(), overlay in tree_strategy()) {
            let once = base.merge(&overlay);
            prop_assert_eq!(&once, &base.merge(&overlay));
            prop_assert_eq!(once.merge(&overlay), once);
        }

        #[test]
        fn merged_keys_are_the_union(base in tree_strategy(), overlay in tree_strategy()) {
            let merged = base.merge(&overlay);
            for key in overlay.keys() {
                prop_assert_eq!(merged.get(key), overlay.get(key));
            }
            for key in base.keys().filter(|k| !overlay.contains_key(k)) {
                prop_assert_eq!(merged.get(key), base.get(key));
            }
            prop_assert!(merged.len() <= base.len() + overlay.len());
        }
    }
}
