// Run settings
// Loaded from ./yearlink.toml, else ~/.config/yearlink/config.toml

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use yearlink_xref::UnknownKindPolicy;

use crate::error::ConfigError;

pub const LOCAL_CONFIG: &str = "yearlink.toml";

/// Input file and optional output file of one collection, relative to `data_dir`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionFiles {
    pub file: String,
    /// Defaults to `file`: the collection is rewritten in place.
    #[serde(default)]
    pub output: Option<String>,
}

impl CollectionFiles {
    pub fn output_name(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.file)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Sorted keys, four-space indent.
    #[serde(default)]
    pub pretty_print: bool,

    /// Records whose kind has no comparison fields: abort or leave unlinked.
    #[serde(default)]
    pub unknown_kind: UnknownKindPolicy,

    pub transactees: CollectionFiles,
    pub parties: CollectionFiles,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Settings {
    /// `./yearlink.toml` when present, else the per-user config file.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yearlink")
            .join("config.toml")
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate `path`. A relative `data_dir` is taken
    /// relative to the config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml(&input)?;
        if settings.data_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            settings.data_dir = base.join(&settings.data_dir);
        }
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("data_dir must not be empty".into()));
        }
        for (name, files) in [("transactees", &self.transactees), ("parties", &self.parties)] {
            if files.file.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name}.file must not be empty")));
            }
            if files.output.as_deref().is_some_and(|o| o.trim().is_empty()) {
                return Err(ConfigError::Validation(format!("{name}.output must not be empty")));
            }
        }
        if self.output_path(&self.transactees) == self.output_path(&self.parties) {
            return Err(ConfigError::Validation(
                "transactees and parties would be written to the same file".into(),
            ));
        }
        Ok(())
    }

    pub fn input_path(&self, files: &CollectionFiles) -> PathBuf {
        self.data_dir.join(&files.file)
    }

    pub fn output_path(&self, files: &CollectionFiles) -> PathBuf {
        self.data_dir.join(files.output_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
[transactees]
file = "transactees.json"

[parties]
file = "parties.json"
"#;

    #[test]
    fn minimal_config_defaults() {
        let s = Settings::from_toml(MINIMAL).unwrap();
        assert_eq!(s.data_dir, PathBuf::from("."));
        assert!(!s.pretty_print);
        assert_eq!(s.unknown_kind, UnknownKindPolicy::Fail);
        // written back in place
        assert_eq!(s.output_path(&s.parties), s.input_path(&s.parties));
    }

    #[test]
    fn full_config() {
        let s = Settings::from_toml(
            r#"
data_dir = "/srv/disclosure"
pretty_print = true
unknown_kind = "isolate"

[transactees]
file = "transactees.json"
output = "transactees.linked.json"

[parties]
file = "parties.json"
"#,
        )
        .unwrap();
        assert!(s.pretty_print);
        assert_eq!(s.unknown_kind, UnknownKindPolicy::Isolate);
        assert_eq!(
            s.output_path(&s.transactees),
            PathBuf::from("/srv/disclosure/transactees.linked.json")
        );
        assert_eq!(s.input_path(&s.parties), PathBuf::from("/srv/disclosure/parties.json"));
    }

    #[test]
    fn missing_collection_is_a_parse_error() {
        let err = Settings::from_toml("[transactees]\nfile = \"t.json\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_policy_value_is_rejected() {
        let err = Settings::from_toml(&format!("unknown_kind = \"skip\"\n{MINIMAL}")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_file_name_fails_validation() {
        let err = Settings::from_toml("[transactees]\nfile = \"\"\n[parties]\nfile = \"p.json\"\n").unwrap_err();
        assert!(err.to_string().contains("transactees.file"));
    }

    #[test]
    fn shared_output_fails_validation() {
        let err = Settings::from_toml("[transactees]\nfile = \"all.json\"\n[parties]\nfile = \"all.json\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn load_resolves_data_dir_against_config_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("yearlink.toml");
        fs::write(&path, format!("data_dir = \"data\"\n{MINIMAL}")).unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.data_dir, dir.path().join("data"));
        assert_eq!(s.input_path(&s.transactees), dir.path().join("data").join("transactees.json"));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempdir().unwrap();
        let err = Settings::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
