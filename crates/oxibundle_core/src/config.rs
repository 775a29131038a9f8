use anyhow::{Context, Result};
use log::{debug, trace};
use serde::Deserialize;
use std::{convert::Infallible, fs, path::Path, str::FromStr};

pub const DEFAULT_JOINER: &str = "\n\n";

/// How files shared between entries are handled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCommon")]
pub enum CommonOption {
    /// Shared files stay in every entry that reaches them.
    #[default]
    Disabled,
    /// Shared files are extracted, with no designated destination.
    Enabled,
    /// Shared files are extracted. The pattern picks the carrier entry, or is
    /// used verbatim as the output path when it exists.
    Pattern(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommon {
    Flag(bool),
    Pattern(String),
}

impl From<RawCommon> for CommonOption {
    fn from(raw: RawCommon) -> Self {
        match raw {
            RawCommon::Flag(true) => CommonOption::Enabled,
            RawCommon::Flag(false) => CommonOption::Disabled,
            RawCommon::Pattern(p) if p.is_empty() => CommonOption::Disabled,
            RawCommon::Pattern(p) => CommonOption::Pattern(p),
        }
    }
}

impl FromStr for CommonOption {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "true" => CommonOption::Enabled,
            "false" | "" => CommonOption::Disabled,
            pattern => CommonOption::Pattern(pattern.to_string()),
        })
    }
}

impl CommonOption {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CommonOption::Disabled)
    }

    pub fn pattern(&self) -> Option<&str> {
        match self {
            CommonOption::Pattern(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BundleOptions {
    pub common: CommonOption,
    /// Separator placed between concatenated code blocks
    pub joiner: String,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self { common: CommonOption::Disabled, joiner: DEFAULT_JOINER.to_string() }
    }
}

impl BundleOptions {
    /// Read options from a JSON file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading bundle options from {}", path.display());
        let txt = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let opts: BundleOptions = serde_json::from_str(&txt)
            .with_context(|| format!("Invalid bundle options in {}", path.display()))?;
        trace!("Loaded bundle options: {:?}", opts);
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let opts = BundleOptions::default();
        assert_eq!(opts.common, CommonOption::Disabled);
        assert_eq!(opts.joiner, "\n\n");
    }

    #[test]
    fn test_common_from_json_values() {
        let opts: BundleOptions = serde_json::from_str(r#"{ "common": true }"#).unwrap();
        assert_eq!(opts.common, CommonOption::Enabled);
        assert_eq!(opts.joiner, DEFAULT_JOINER);

        let opts: BundleOptions = serde_json::from_str(r#"{ "common": false }"#).unwrap();
        assert_eq!(opts.common, CommonOption::Disabled);

        let opts: BundleOptions =
            serde_json::from_str(r#"{ "common": "src/common.js", "joiner": ";\n" }"#).unwrap();
        assert_eq!(opts.common, CommonOption::Pattern("src/common.js".to_string()));
        assert_eq!(opts.joiner, ";\n");
    }

    #[test]
    fn test_empty_pattern_is_disabled() {
        let opts: BundleOptions = serde_json::from_str(r#"{ "common": "" }"#).unwrap();
        assert!(!opts.common.is_enabled());
    }

    #[test]
    fn test_common_from_str() {
        assert_eq!("true".parse::<CommonOption>().unwrap(), CommonOption::Enabled);
        assert_eq!("false".parse::<CommonOption>().unwrap(), CommonOption::Disabled);
        assert_eq!(
            "**/main.js".parse::<CommonOption>().unwrap().pattern(),
            Some("**/main.js")
        );
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("oxibundle.json");
        fs::write(&path, r#"{ "common": "dist/common.js" }"#).unwrap();

        let opts = BundleOptions::from_file(&path).unwrap();
        assert_eq!(opts.common.pattern(), Some("dist/common.js"));
        assert_eq!(opts.joiner, DEFAULT_JOINER);
    }

    #[test]
    fn test_from_file_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("oxibundle.json");
        fs::write(&path, "{ common: ").unwrap();
        assert!(BundleOptions::from_file(&path).is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(BundleOptions::from_file(&temp_dir.path().join("nope.json")).is_err());
    }
}
