//! # Legislation Snapshots
//!
//! A [`LegislationSnapshot`] is an immutable tree of legislated parameters
//! (plain values, bracket scales, nested sections) in force from a given
//! instant. A [`Legislation`] is the ordered sequence of such versions; a
//! lookup at an instant resolves against the latest version that started on
//! or before it.
//!
//! Parameters are addressed by dotted path, e.g. `al.loyers_plafond.zone2.L1`.

use std::collections::BTreeMap;

use fisca_core::Instant;
use serde::{Deserialize, Serialize};

use crate::error::{ParamsError, ParamsResult};
use crate::scale::Scale;
use crate::tree::{ScaleNode, ScaleTree};

/// One node of a legislation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterNode {
    Value(f64),
    Scale(Scale),
    Tree(BTreeMap<String, ParameterNode>),
}

impl ParameterNode {
    pub fn as_value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_scale(&self) -> Option<&Scale> {
        match self {
            Self::Scale(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&BTreeMap<String, ParameterNode>> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// Convert a section into a [`ScaleTree`]. Every leaf must be a scale;
    /// `path` is used for error context.
    pub fn to_scale_tree(&self, path: &str) -> ParamsResult<ScaleTree> {
        let entries = self.as_tree().ok_or_else(|| ParamsError::UnexpectedNode {
            path: path.to_string(),
            expected: "subtree",
        })?;
        entries
            .iter()
            .map(|(key, node)| {
                let child_path = join(path, key);
                let converted = match node {
                    Self::Scale(s) => ScaleNode::Scale(s.clone()),
                    Self::Tree(_) => ScaleNode::Tree(node.to_scale_tree(&child_path)?),
                    Self::Value(_) => {
                        return Err(ParamsError::UnexpectedNode {
                            path: child_path,
                            expected: "scale or subtree",
                        })
                    }
                };
                Ok((key.clone(), converted))
            })
            .collect()
    }
}

impl From<ScaleTree> for ParameterNode {
    fn from(tree: ScaleTree) -> Self {
        Self::Tree(
            tree.into_entries()
                .into_iter()
                .map(|(key, node)| {
                    let converted = match node {
                        ScaleNode::Scale(s) => Self::Scale(s),
                        ScaleNode::Tree(t) => Self::from(t),
                    };
                    (key, converted)
                })
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// LegislationSnapshot
// ---------------------------------------------------------------------------

/// An immutable parameter tree in force from `valid_from`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegislationSnapshot {
    valid_from: Instant,
    root: BTreeMap<String, ParameterNode>,
}

impl LegislationSnapshot {
    pub fn new(valid_from: Instant, root: BTreeMap<String, ParameterNode>) -> Self {
        Self { valid_from, root }
    }

    /// Build from a root node, which must be a tree.
    pub fn from_node(valid_from: Instant, root: ParameterNode) -> ParamsResult<Self> {
        match root {
            ParameterNode::Tree(root) => Ok(Self { valid_from, root }),
            _ => Err(ParamsError::UnexpectedNode {
                path: String::new(),
                expected: "subtree at the legislation root",
            }),
        }
    }

    pub fn valid_from(&self) -> Instant {
        self.valid_from
    }

    pub fn root(&self) -> &BTreeMap<String, ParameterNode> {
        &self.root
    }

    /// Resolve a dotted path.
    ///
    /// # Errors
    ///
    /// [`ParamsError::ParameterNotFound`] if any segment is missing or
    /// descends into a non-tree node.
    pub fn lookup(&self, path: &str) -> ParamsResult<&ParameterNode> {
        let not_found = || ParamsError::ParameterNotFound {
            path: path.to_string(),
            instant: self.valid_from,
        };
        let mut segments = path.split('.');
        let first = segments.next().ok_or_else(not_found)?;
        let mut node = self.root.get(first).ok_or_else(not_found)?;
        for segment in segments {
            node = node
                .as_tree()
                .and_then(|children| children.get(segment))
                .ok_or_else(not_found)?;
        }
        Ok(node)
    }

    /// Resolve a dotted path to a plain value.
    pub fn value(&self, path: &str) -> ParamsResult<f64> {
        self.lookup(path)?
            .as_value()
            .ok_or_else(|| ParamsError::UnexpectedNode {
                path: path.to_string(),
                expected: "value",
            })
    }

    /// Resolve a dotted path to a scale.
    pub fn scale(&self, path: &str) -> ParamsResult<&Scale> {
        self.lookup(path)?
            .as_scale()
            .ok_or_else(|| ParamsError::UnexpectedNode {
                path: path.to_string(),
                expected: "scale",
            })
    }

    /// Resolve a dotted path to a section of scales.
    pub fn scale_tree(&self, path: &str) -> ParamsResult<ScaleTree> {
        self.lookup(path)?.to_scale_tree(path)
    }

    /// A copy of this snapshot with `node` placed at `path`. Missing
    /// intermediate sections are created; an existing node at `path` is
    /// replaced. `self` is not modified.
    pub fn with_node(&self, path: &str, node: ParameterNode) -> ParamsResult<Self> {
        let mut next = self.clone();
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| ParamsError::UnexpectedNode {
                path: path.to_string(),
                expected: "non-empty path",
            })?;

        let mut cursor = &mut next.root;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = cursor
                .entry((*segment).to_string())
                .or_insert_with(|| ParameterNode::Tree(BTreeMap::new()));
            cursor = match entry {
                ParameterNode::Tree(children) => children,
                _ => {
                    return Err(ParamsError::UnexpectedNode {
                        path: segments[..=depth].join("."),
                        expected: "subtree",
                    })
                }
            };
        }
        cursor.insert((*last).to_string(), node);
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Legislation (versioned)
// ---------------------------------------------------------------------------

/// Versioned legislation: snapshots ordered by `valid_from`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Legislation {
    versions: Vec<LegislationSnapshot>,
}

impl Legislation {
    /// Build from versions in any order. Later duplicates of the same
    /// `valid_from` win.
    pub fn new(mut versions: Vec<LegislationSnapshot>) -> Self {
        versions.sort_by_key(|v| v.valid_from);
        versions.reverse();
        versions.dedup_by_key(|v| v.valid_from);
        versions.reverse();
        Self { versions }
    }

    /// A single version valid for every instant.
    pub fn single(root: BTreeMap<String, ParameterNode>) -> Self {
        Self {
            versions: vec![LegislationSnapshot::new(Instant::MIN, root)],
        }
    }

    pub fn versions(&self) -> &[LegislationSnapshot] {
        &self.versions
    }

    /// The version in force at `instant`.
    pub fn at(&self, instant: Instant) -> ParamsResult<&LegislationSnapshot> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.valid_from <= instant)
            .ok_or(ParamsError::NoLegislationInForce { instant })
    }

    /// Resolve `path` at `instant`.
    ///
    /// # Errors
    ///
    /// [`ParamsError::ParameterNotFound`] carrying the requested instant if
    /// no version is in force or the path does not exist in it.
    pub fn lookup(&self, path: &str, instant: Instant) -> ParamsResult<&ParameterNode> {
        let not_found = || ParamsError::ParameterNotFound {
            path: path.to_string(),
            instant,
        };
        self.at(instant)
            .map_err(|_| not_found())?
            .lookup(path)
            .map_err(|_| not_found())
    }

    /// Apply a fallible rewrite to every version.
    pub fn try_map(
        &self,
        f: impl Fn(&LegislationSnapshot) -> ParamsResult<LegislationSnapshot>,
    ) -> ParamsResult<Legislation> {
        let versions = self.versions.iter().map(f).collect::<ParamsResult<Vec<_>>>()?;
        Ok(Self::new(versions))
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> LegislationSnapshot {
        let root: BTreeMap<String, ParameterNode> = serde_json::from_str(
            r#"{
                "al": {
                    "pp": { "taux": 0.0085, "min": 34.13 },
                    "bareme": { "brackets": [{ "threshold": 0, "rate": 0.1 }] }
                },
                "cotsoc": { "pat": { "commun": { "maladie": { "brackets": [{ "threshold": 0, "rate": 0.128 }] } } } }
            }"#,
        )
        .unwrap();
        LegislationSnapshot::new(Instant::from_ymd(2014, 1, 1).unwrap(), root)
    }

    #[test]
    fn lookup_resolves_dotted_paths() {
        let s = snapshot();
        assert_eq!(s.value("al.pp.taux").unwrap(), 0.0085);
        assert_eq!(s.scale("al.bareme").unwrap().brackets()[0].rate, 0.1);
        assert!(s.lookup("al.pp").unwrap().as_tree().is_some());
    }

    #[test]
    fn missing_path_is_parameter_not_found() {
        let err = snapshot().value("al.pp.absent").unwrap_err();
        assert!(matches!(err, ParamsError::ParameterNotFound { .. }));
        // descending through a value is also a miss
        assert!(snapshot().lookup("al.pp.taux.deeper").is_err());
    }

    #[test]
    fn wrong_shape_is_unexpected_node() {
        let err = snapshot().value("al.bareme").unwrap_err();
        assert!(matches!(err, ParamsError::UnexpectedNode { expected: "value", .. }));
    }

    #[test]
    fn scale_tree_conversion_rejects_values() {
        let s = snapshot();
        assert_eq!(s.scale_tree("cotsoc.pat").unwrap().scale_count(), 1);
        let err = s.scale_tree("al.pp").unwrap_err();
        assert!(format!("{err}").contains("al.pp.min"));
    }

    #[test]
    fn with_node_does_not_touch_original() {
        let s = snapshot();
        let next = s
            .with_node("cotsoc.derived.x", ParameterNode::Value(1.0))
            .unwrap();
        assert_eq!(next.value("cotsoc.derived.x").unwrap(), 1.0);
        assert!(s.lookup("cotsoc.derived").is_err());
        assert!(s.with_node("al.pp.taux.x", ParameterNode::Value(1.0)).is_err());
    }

    #[test]
    fn versioned_lookup_picks_version_in_force() {
        let mut older = BTreeMap::new();
        older.insert("rate".to_string(), ParameterNode::Value(1.0));
        let mut newer = BTreeMap::new();
        newer.insert("rate".to_string(), ParameterNode::Value(2.0));
        let leg = Legislation::new(vec![
            LegislationSnapshot::new(Instant::from_ymd(2015, 1, 1).unwrap(), newer),
            LegislationSnapshot::new(Instant::from_ymd(2010, 1, 1).unwrap(), older),
        ]);

        let at = |y, m, d| Instant::from_ymd(y, m, d).unwrap();
        assert_eq!(leg.lookup("rate", at(2012, 6, 1)).unwrap().as_value(), Some(1.0));
        assert_eq!(leg.lookup("rate", at(2015, 1, 1)).unwrap().as_value(), Some(2.0));
        let err = leg.lookup("rate", at(2009, 1, 1)).unwrap_err();
        assert!(matches!(err, ParamsError::ParameterNotFound { .. }));
    }
}
