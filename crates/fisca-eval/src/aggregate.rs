//! Role-filtered aggregation of per-member values into family values.
//!
//! These are pure functions over a [`Family`] and a slice aligned with its
//! member order. [`EvaluationContext`](crate::EvaluationContext) wraps them
//! for variables; formulas call them directly on arrays they derived
//! themselves.

use fisca_core::{Family, Role};

/// Sum of the values of members holding one of `roles`.
pub fn sum_by_roles(family: &Family, values: &[f64], roles: &[Role]) -> f64 {
    family
        .positions_with_roles(roles)
        .into_iter()
        .filter_map(|i| values.get(i))
        .sum()
}

/// Sum over every member.
pub fn sum_all(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Whether any member holding one of `roles` has a true value.
pub fn any_by_roles(family: &Family, values: &[bool], roles: &[Role]) -> bool {
    family
        .positions_with_roles(roles)
        .into_iter()
        .any(|i| values.get(i).copied().unwrap_or(false))
}

/// Count of members holding one of `roles` with a true value.
pub fn count_by_roles(family: &Family, values: &[bool], roles: &[Role]) -> usize {
    family
        .positions_with_roles(roles)
        .into_iter()
        .filter(|i| values.get(*i).copied().unwrap_or(false))
        .count()
}

/// Member values split by role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleSplit<T> {
    pub head: T,
    pub partner: Option<T>,
    pub children: Vec<T>,
}

impl<T: Clone> RoleSplit<T> {
    /// Partner value, or `absent` for single-adult families.
    pub fn partner_or(&self, absent: T) -> T {
        self.partner.clone().unwrap_or(absent)
    }
}

/// Split `values` by role. The head slot falls back to `T::default()` only
/// if `values` is shorter than the family.
pub fn split_by_roles<T: Clone + Default>(family: &Family, values: &[T]) -> RoleSplit<T> {
    let at = |i: usize| values.get(i).cloned();
    RoleSplit {
        head: family
            .position_of_role(Role::Head)
            .and_then(at)
            .unwrap_or_default(),
        partner: family.position_of_role(Role::Partner).and_then(at),
        children: family
            .positions_with_roles(&[Role::Child])
            .into_iter()
            .filter_map(at)
            .collect(),
    }
}
