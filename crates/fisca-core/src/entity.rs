//! # Household Entities
//!
//! An individual belongs to exactly one [`Family`] and holds exactly one
//! [`Role`] in it. Family-level quantities are derived from their members'
//! values by role-filtered aggregation, so roles are the only structure a
//! formula may rely on; member order is not significant.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Position of an individual inside a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The benefit applicant. Exactly one per family.
    Head,
    /// Spouse or partner of the head. At most one per family.
    Partner,
    /// Dependent child.
    Child,
}

impl Role {
    /// Head and partner: the roles whose income counts as the couple's.
    pub const PARENTS: [Role; 2] = [Role::Head, Role::Partner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Partner => "partner",
            Self::Child => "child",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" => Ok(Self::Head),
            "partner" => Ok(Self::Partner),
            "child" => Ok(Self::Child),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// Identifier of an individual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualId(pub String);

/// Identifier of a family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(pub String);

impl std::fmt::Display for IndividualId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "individual:{}", self.0)
    }
}

impl std::fmt::Display for FamilyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "family:{}", self.0)
    }
}

/// One member of a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: IndividualId,
    pub role: Role,
}

impl Member {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: IndividualId(id.into()),
            role,
        }
    }
}

/// A validated household: one head, at most one partner, any number of
/// children, all member ids distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFamily")]
pub struct Family {
    id: FamilyId,
    members: Vec<Member>,
}

#[derive(Deserialize)]
struct RawFamily {
    id: FamilyId,
    members: Vec<Member>,
}

impl TryFrom<RawFamily> for Family {
    type Error = CoreError;

    fn try_from(raw: RawFamily) -> Result<Self, Self::Error> {
        Family::new(raw.id.0, raw.members)
    }
}

impl Family {
    /// Validate and build a family.
    pub fn new(id: impl Into<String>, members: Vec<Member>) -> Result<Self, CoreError> {
        let id = FamilyId(id.into());
        let invalid = |reason: String| CoreError::InvalidFamily {
            family: id.0.clone(),
            reason,
        };

        let heads = members.iter().filter(|m| m.role == Role::Head).count();
        if heads != 1 {
            return Err(invalid(format!("expected exactly one head, found {heads}")));
        }
        let partners = members.iter().filter(|m| m.role == Role::Partner).count();
        if partners > 1 {
            return Err(invalid(format!("expected at most one partner, found {partners}")));
        }
        let mut seen = BTreeSet::new();
        for member in &members {
            if !seen.insert(&member.id) {
                return Err(invalid(format!("duplicate member {}", member.id.0)));
            }
        }

        Ok(Self { id, members })
    }

    /// A family with a single head and no other member.
    pub fn single(family_id: impl Into<String>, head_id: impl Into<String>) -> Self {
        Self {
            id: FamilyId(family_id.into()),
            members: vec![Member::new(head_id, Role::Head)],
        }
    }

    pub fn id(&self) -> &FamilyId {
        &self.id
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a validated family; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Position of the member with the given id.
    pub fn position_of(&self, id: &IndividualId) -> Option<usize> {
        self.members.iter().position(|m| &m.id == id)
    }

    /// Positions (in member order) of members holding one of `roles`.
    pub fn positions_with_roles(&self, roles: &[Role]) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| roles.contains(&m.role))
            .map(|(i, _)| i)
            .collect()
    }

    /// Position of the single member holding `role`, for head and partner.
    pub fn position_of_role(&self, role: Role) -> Option<usize> {
        self.members.iter().position(|m| m.role == role)
    }

    pub fn has_partner(&self) -> bool {
        self.position_of_role(Role::Partner).is_some()
    }

    pub fn child_count(&self) -> usize {
        self.members.iter().filter(|m| m.role == Role::Child).count()
    }
}
