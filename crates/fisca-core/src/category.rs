//! # Employment Category — Single Source of Truth
//!
//! Defines the seven employment-status classes that select which social
//! contribution schedule applies to a salary. This is the ONE definition
//! used across the stack; every `match` on [`Category`] is exhaustive, so a
//! restructuring step that forgets a category fails to compile instead of
//! silently producing an incomplete schedule set.
//!
//! The string identifiers are the keys under which the preprocessed
//! schedules are published in the legislation tree
//! (`cotsoc.cotisations_patronales.<id>`).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// Employment-status class governing contribution schedules.
///
/// | # | Category | Identifier |
/// |---|----------|------------|
/// | 1 | Private sector, non-executive | `prive_non_cadre` |
/// | 2 | Private sector, executive | `prive_cadre` |
/// | 3 | Public, tenured, state | `public_titulaire_etat` |
/// | 4 | Public, tenured, military | `public_titulaire_militaire` |
/// | 5 | Public, tenured, territorial | `public_titulaire_territoriale` |
/// | 6 | Public, tenured, hospital | `public_titulaire_hospitaliere` |
/// | 7 | Public, non-tenured | `public_non_titulaire` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "prive_non_cadre")]
    PrivateNonExecutive,
    #[serde(rename = "prive_cadre")]
    PrivateExecutive,
    #[serde(rename = "public_titulaire_etat")]
    PublicTenuredState,
    #[serde(rename = "public_titulaire_militaire")]
    PublicTenuredMilitary,
    #[serde(rename = "public_titulaire_territoriale")]
    PublicTenuredTerritorial,
    #[serde(rename = "public_titulaire_hospitaliere")]
    PublicTenuredHospital,
    #[serde(rename = "public_non_titulaire")]
    PublicNonTenured,
}

/// Total number of categories. Used for compile-time and builder assertions.
pub const CATEGORY_COUNT: usize = 7;

impl Category {
    /// All categories in canonical order.
    pub fn all() -> &'static [Category; CATEGORY_COUNT] {
        &[
            Self::PrivateNonExecutive,
            Self::PrivateExecutive,
            Self::PublicTenuredState,
            Self::PublicTenuredMilitary,
            Self::PublicTenuredTerritorial,
            Self::PublicTenuredHospital,
            Self::PublicNonTenured,
        ]
    }

    /// The legislation-tree key for this category. Matches serde.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrivateNonExecutive => "prive_non_cadre",
            Self::PrivateExecutive => "prive_cadre",
            Self::PublicTenuredState => "public_titulaire_etat",
            Self::PublicTenuredMilitary => "public_titulaire_militaire",
            Self::PublicTenuredTerritorial => "public_titulaire_territoriale",
            Self::PublicTenuredHospital => "public_titulaire_hospitaliere",
            Self::PublicNonTenured => "public_non_titulaire",
        }
    }

    pub fn is_public(&self) -> bool {
        !matches!(self, Self::PrivateNonExecutive | Self::PrivateExecutive)
    }

    /// Tenured civil servants (titulaires) contribute under special schemes.
    pub fn is_tenured(&self) -> bool {
        matches!(
            self,
            Self::PublicTenuredState
                | Self::PublicTenuredMilitary
                | Self::PublicTenuredTerritorial
                | Self::PublicTenuredHospital
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}
