//! # Values and Holders
//!
//! A variable is defined either per individual or per family
//! ([`EntityKind`]). Its value for one period is a [`Holder`]: one
//! [`Value`] per family member (in member order) or a single family value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar variable value.
///
/// Deserialized untagged, so household files can write `true`, `3`,
/// `412.5` or `"2A004"` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    /// Numeric view. Integers widen; booleans are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view. Floats with no fractional part are accepted, since
    /// JSON and YAML writers do not always preserve the distinction.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// Code view: text as is, integers in decimal.
    pub fn as_code(&self) -> Option<String> {
        match self {
            Self::Text(v) => Some(v.clone()),
            Self::Int(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// The level a variable is defined at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Individual,
    Family,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Family => "family",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of one variable for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Holder {
    /// One value for the whole family.
    Family(Value),
    /// One value per member, in the family's member order.
    Members(Vec<Value>),
}

impl Holder {
    pub fn entity(&self) -> EntityKind {
        match self {
            Self::Family(_) => EntityKind::Family,
            Self::Members(_) => EntityKind::Individual,
        }
    }

    /// A holder of `kind` filled with `value` for a family of `size` members.
    pub fn filled(kind: EntityKind, value: Value, size: usize) -> Self {
        match kind {
            EntityKind::Family => Self::Family(value),
            EntityKind::Individual => Self::Members(vec![value; size]),
        }
    }

    pub fn as_family(&self) -> Option<&Value> {
        match self {
            Self::Family(v) => Some(v),
            Self::Members(_) => None,
        }
    }

    pub fn as_members(&self) -> Option<&[Value]> {
        match self {
            Self::Members(values) => Some(values),
            Self::Family(_) => None,
        }
    }
}

impl From<Value> for Holder {
    fn from(v: Value) -> Self {
        Self::Family(v)
    }
}

impl From<f64> for Holder {
    fn from(v: f64) -> Self {
        Self::Family(Value::Float(v))
    }
}

impl From<bool> for Holder {
    fn from(v: bool) -> Self {
        Self::Family(Value::Bool(v))
    }
}

impl From<i64> for Holder {
    fn from(v: i64) -> Self {
        Self::Family(Value::Int(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<f64>> for Holder {
    fn from(values: Vec<f64>) -> Self {
        Self::Members(values.into_iter().map(Value::Float).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_parsing_picks_narrowest_variant() {
        let values: Vec<Value> = serde_json::from_str(r#"[true, 3, 412.5, "2A004"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Bool(true),
                Value::Int(3),
                Value::Float(412.5),
                Value::Text("2A004".to_string())
            ]
        );
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Int(4).as_f64(), Some(4.0));
        assert_eq!(Value::Bool(true).as_f64(), None);
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::Int(1).as_bool(), None);
        assert_eq!(Value::Int(75056).as_code().as_deref(), Some("75056"));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn filled_holder_matches_kind() {
        let h = Holder::filled(EntityKind::Individual, Value::Bool(false), 3);
        assert_eq!(h.as_members().map(|m| m.len()), Some(3));
        assert_eq!(
            Holder::filled(EntityKind::Family, Value::Int(2), 3).entity(),
            EntityKind::Family
        );
    }
}
