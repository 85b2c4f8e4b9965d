//! # Housing-Cost Zones
//!
//! Rent ceilings depend on one of three zones assigned per locality. The
//! assignment comes from two tables:
//!
//! - locality code → zone cell. Only the first character of the cell is
//!   significant, so `"1bis"` is zone 1.
//! - sub-locality code → parent locality code (districts, merged
//!   communes). A sub-locality takes its parent's zone, following parent
//!   chains until a zoned locality is reached.
//!
//! ## Lifecycle
//!
//! [`ZoneResolver`] loads its tables at most once, on first use, under a
//! lock; concurrent first callers block until loading completes. Afterwards
//! the table is read-only and lookups take no lock. A resolver can also be
//! built from an already-loaded [`ZoneTable`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ZoneError;

/// A housing-cost zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Zone {
    One,
    Two,
    Three,
}

impl Zone {
    /// Zone used for localities missing from the table.
    pub const DEFAULT: Zone = Zone::Two;

    pub fn all() -> &'static [Zone; 3] {
        &[Zone::One, Zone::Two, Zone::Three]
    }

    /// 1, 2 or 3.
    pub fn number(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    /// Parse a zone cell: `"1"`, `"1bis"`, `"2"`, `"3"`.
    pub fn parse_cell(cell: &str) -> Option<Self> {
        cell.trim()
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .and_then(|d| Self::from_number(d as u8))
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Zone> for u8 {
    fn from(zone: Zone) -> u8 {
        zone.number()
    }
}

impl TryFrom<u8> for Zone {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n).ok_or_else(|| format!("invalid zone {n}"))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone {}", self.number())
    }
}

// ---------------------------------------------------------------------------
// ZoneTable
// ---------------------------------------------------------------------------

/// A zone cell as written in a table file: a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ZoneCell {
    Number(u64),
    Text(String),
}

impl ZoneCell {
    fn text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Resolved locality → zone mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneTable {
    zones: HashMap<String, Zone>,
}

impl ZoneTable {
    /// Build from parsed zone cells and sub-locality links.
    ///
    /// # Errors
    ///
    /// [`ZoneError::InvalidZone`] for a cell not starting with 1–3,
    /// [`ZoneError::UnknownParent`] for a sub-locality whose parent chain
    /// does not reach a zoned locality.
    pub fn from_cells(
        cells: BTreeMap<String, String>,
        parents: BTreeMap<String, String>,
    ) -> Result<Self, ZoneError> {
        let mut zones = HashMap::with_capacity(cells.len() + parents.len());
        for (code, cell) in cells {
            let zone = Zone::parse_cell(&cell).ok_or_else(|| ZoneError::InvalidZone {
                code: code.clone(),
                value: cell.clone(),
            })?;
            zones.insert(code, zone);
        }

        let mut resolved = Vec::with_capacity(parents.len());
        for (sublocality, parent) in &parents {
            let mut current = parent;
            let mut hops = 0;
            let zone = loop {
                if let Some(zone) = zones.get(current) {
                    break *zone;
                }
                match parents.get(current) {
                    Some(next) if hops < parents.len() => {
                        current = next;
                        hops += 1;
                    }
                    _ => {
                        return Err(ZoneError::UnknownParent {
                            sublocality: sublocality.clone(),
                            parent: parent.clone(),
                        })
                    }
                }
            };
            resolved.push((sublocality.clone(), zone));
        }
        zones.extend(resolved);
        Ok(Self { zones })
    }

    /// Load from the configured files. Missing paths give empty tables.
    pub fn load(source: &ZoneSource) -> Result<Self, ZoneError> {
        let cells = match &source.zone_table {
            Some(path) => fisca_params::load_typed::<BTreeMap<String, ZoneCell>>(path)?
                .into_iter()
                .map(|(code, cell)| (code, cell.text()))
                .collect(),
            None => BTreeMap::new(),
        };
        let parents = match &source.sublocality_table {
            Some(path) => fisca_params::load_typed::<BTreeMap<String, String>>(path)?,
            None => BTreeMap::new(),
        };
        Self::from_cells(cells, parents)
    }

    pub fn get(&self, code: &str) -> Option<Zone> {
        self.zones.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ZoneResolver
// ---------------------------------------------------------------------------

/// Files a [`ZoneResolver`] loads on first use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSource {
    pub zone_table: Option<PathBuf>,
    pub sublocality_table: Option<PathBuf>,
}

/// Lazily loaded, then read-only, locality → zone lookup.
#[derive(Debug, Default)]
pub struct ZoneResolver {
    source: ZoneSource,
    table: OnceLock<ZoneTable>,
    init: Mutex<()>,
}

impl ZoneResolver {
    /// A resolver that loads `source` on first lookup.
    pub fn new(source: ZoneSource) -> Self {
        Self {
            source,
            table: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// A resolver over an already-loaded table.
    pub fn from_table(table: ZoneTable) -> Self {
        let resolver = Self::default();
        // A fresh OnceLock is empty, so this always stores `table`.
        let _ = resolver.table.set(table);
        resolver
    }

    /// Load the tables now instead of on first lookup.
    pub fn preload(&self) -> Result<(), ZoneError> {
        self.table().map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    fn table(&self) -> Result<&ZoneTable, ZoneError> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let _guard = self.init.lock();
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let table = ZoneTable::load(&self.source)?;
        tracing::info!(
            localities = table.len(),
            zone_table = ?self.source.zone_table,
            sublocality_table = ?self.source.sublocality_table,
            "zone table loaded"
        );
        Ok(self.table.get_or_init(|| table))
    }

    /// Zone of `code`, or [`Zone::DEFAULT`] if the code is unknown.
    ///
    /// # Errors
    ///
    /// Only if the tables fail to load.
    pub fn zone_of(&self, code: &str) -> Result<Zone, ZoneError> {
        Ok(match self.table()?.get(code) {
            Some(zone) => zone,
            None => {
                tracing::warn!(code, default = %Zone::DEFAULT, "locality has no zone, using default");
                Zone::DEFAULT
            }
        })
    }
}
