//! Shared YAML/JSON loading.
//!
//! Legislation files, zone tables and household descriptions are all
//! loaded through these functions so that errors consistently carry the
//! offending file path. The format is chosen by extension (`.yaml`, `.yml`,
//! `.json`).
//!
//! ## Legislation file shapes
//!
//! Either a single parameter tree, valid for every instant:
//!
//! ```yaml
//! al:
//!   pp: { taux: 0.0085, min: 34.13 }
//! ```
//!
//! or a list of dated versions:
//!
//! ```yaml
//! - effective_from: 2014-01-01
//!   parameters: { al: { pp: { taux: 0.0085, min: 34.13 } } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use fisca_core::Instant;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ParamsError, ParamsResult};
use crate::legislation::{Legislation, LegislationSnapshot, ParameterNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> ParamsResult<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        _ => Err(ParamsError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn read_file(path: &Path) -> ParamsResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ParamsError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ParamsError::Io(e)
        }
    })
}

/// Load a YAML file into a strongly-typed struct.
pub fn load_yaml_typed<T: DeserializeOwned>(path: &Path) -> ParamsResult<T> {
    let content = read_file(path)?;
    serde_yaml::from_str(&content).map_err(|e| ParamsError::YamlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a JSON file into a strongly-typed struct.
pub fn load_json_typed<T: DeserializeOwned>(path: &Path) -> ParamsResult<T> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| ParamsError::JsonParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a YAML or JSON file, choosing the parser by extension.
pub fn load_typed<T: DeserializeOwned>(path: &Path) -> ParamsResult<T> {
    match format_of(path)? {
        Format::Yaml => load_yaml_typed(path),
        Format::Json => load_json_typed(path),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegislationFile {
    Versioned(Vec<VersionEntry>),
    Single(BTreeMap<String, ParameterNode>),
}

#[derive(Deserialize)]
struct VersionEntry {
    effective_from: Instant,
    parameters: BTreeMap<String, ParameterNode>,
}

/// Load a legislation file (single tree or dated versions).
pub fn load_legislation(path: &Path) -> ParamsResult<Legislation> {
    let file: LegislationFile = load_typed(path)?;
    let legislation = match file {
        LegislationFile::Single(root) => Legislation::single(root),
        LegislationFile::Versioned(entries) => Legislation::new(
            entries
                .into_iter()
                .map(|e| LegislationSnapshot::new(e.effective_from, e.parameters))
                .collect(),
        ),
    };
    tracing::info!(
        path = %path.display(),
        versions = legislation.versions().len(),
        "loaded legislation"
    );
    Ok(legislation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_single_tree_yaml() {
        let file = write_temp(".yaml", "al:\n  pp:\n    taux: 0.0085\n    min: 34.13\n");
        let leg = load_legislation(file.path()).unwrap();
        assert_eq!(leg.versions().len(), 1);
        let at = Instant::from_ymd(2015, 1, 1).unwrap();
        assert_eq!(leg.lookup("al.pp.min", at).unwrap().as_value(), Some(34.13));
    }

    #[test]
    fn loads_versioned_json() {
        let file = write_temp(
            ".json",
            r#"[
                {"effective_from": "2014-01-01", "parameters": {"x": 1}},
                {"effective_from": "2015-01-01", "parameters": {"x": 2}}
            ]"#,
        );
        let leg = load_legislation(file.path()).unwrap();
        assert_eq!(leg.versions().len(), 2);
        let at = Instant::from_ymd(2014, 6, 1).unwrap();
        assert_eq!(leg.lookup("x", at).unwrap().as_value(), Some(1.0));
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = load_legislation(Path::new("/nonexistent/legislation.yaml")).unwrap_err();
        assert!(matches!(err, ParamsError::FileNotFound { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_temp(".toml", "x = 1");
        let err = load_legislation(file.path()).unwrap_err();
        assert!(matches!(err, ParamsError::UnsupportedFormat { .. }));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let file = write_temp(".yaml", "al: [unclosed");
        let err = load_legislation(file.path()).unwrap_err();
        assert!(matches!(err, ParamsError::YamlParse { .. }));
    }
}
