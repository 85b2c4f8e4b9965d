//! # Zone Subcommand
//!
//! Resolves the housing-cost zone of a locality code.

use anyhow::Result;
use clap::Args;
use fisca_housing::ZoneResolver;
use serde_json::json;

use crate::ZoneTableArgs;

/// Arguments for `fisca zone`.
#[derive(Args, Debug)]
pub struct ZoneArgs {
    /// Locality or sub-locality code.
    pub code: String,

    #[command(flatten)]
    pub zones: ZoneTableArgs,
}

/// Execute the zone subcommand.
pub fn run_zone(args: &ZoneArgs) -> Result<u8> {
    crate::print_json(&zone_json(args)?)?;
    Ok(0)
}

pub fn zone_json(args: &ZoneArgs) -> Result<serde_json::Value> {
    let resolver = ZoneResolver::new(args.zones.config()?.zone_source());
    let zone = resolver.zone_of(&args.code)?;
    Ok(json!({ "code": args.code, "zone": zone.number() }))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    fn args(code: &str) -> ZoneArgs {
        ZoneArgs {
            code: code.to_string(),
            zones: ZoneTableArgs {
                zones: Some(fixture("zones.yaml")),
                sublocalities: Some(fixture("sublocalities.json")),
            },
        }
    }

    #[test]
    fn resolves_sublocality_through_parent() {
        let json = zone_json(&args("75101")).unwrap();
        assert_eq!(json["zone"], 1);
    }

    #[test]
    fn unknown_code_gets_default_zone() {
        assert_eq!(zone_json(&args("00000")).unwrap()["zone"], 2);
    }

    #[test]
    fn third_zone() {
        assert_eq!(zone_json(&args("23001")).unwrap()["zone"], 3);
    }
}
