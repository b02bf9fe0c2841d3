use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{ErrorKind, PathioError, PathioResult};

/// Setting key naming the charset used to decode text handles.
pub const CHARSET_KEY: &str = "charset";

/// Charset used when no `charset` setting is present.
pub const DEFAULT_CHARSET: &str = "utf-8";

/* 📖 # Why is the settings lookup a trait instead of a global?

Readers look up the charset every time they open a file. Passing the lookup
in as a trait object keeps that dependency visible and lets tests swap in an
in-memory source and change it between calls. Implementations only need to
answer single key lookups; nothing is cached on this side.
*/

/// Read-only key/value configuration lookup.
pub trait SettingsSource: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the value for `key`, or `None` if it is not set.
    fn get_setting(&self, key: &str) -> Option<String>;

    /// Returns the configured charset name, falling back to `utf-8`.
    fn charset(&self) -> String {
        self.get_setting(CHARSET_KEY)
            .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
    }
}

/// Shared handle to a settings source.
///
/// Wraps `Arc<dyn SettingsSource>` so it can be cloned into every reader.
#[derive(Debug, Clone)]
pub struct SettingsHandle(Arc<dyn SettingsSource>);

impl SettingsHandle {
    pub fn new(source: impl SettingsSource) -> Self {
        Self(Arc::new(source))
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(MapSettings::new())
    }
}

impl std::ops::Deref for SettingsHandle {
    type Target = dyn SettingsSource;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// In-memory settings that can be changed while readers hold a handle to them.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`MapSettings::set`].
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

impl SettingsSource for MapSettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

/// Settings read from environment variables named `<PREFIX>_<KEY>`.
///
/// The key is upper-cased and every character that is not alphanumeric
/// becomes `_`, so `charset` is looked up as `PATHIO_CHARSET` by default.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    prefix: String,
}

impl EnvSettings {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, key: &str) -> String {
        let key: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_{}", self.prefix, key)
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::with_prefix("PATHIO")
    }
}

impl SettingsSource for EnvSettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        std::env::var(self.variable_name(key)).ok()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SettingValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
    Other(toml::Value),
}

/// Flat key/value settings loaded from TOML.
///
/// ```toml
/// charset = "latin1"
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlSettings {
    values: BTreeMap<String, String>,
}

impl TomlSettings {
    /// Parses settings from TOML text. Nested tables and arrays are rejected.
    pub fn parse(text: &str) -> PathioResult<Self> {
        let raw: BTreeMap<String, SettingValue> = toml::from_str(text)
            .map_err(|e| Box::new(PathioError::message(format!("Invalid settings TOML: {}", e))))?;
        let mut values = BTreeMap::new();
        for (key, value) in raw {
            let value = match value {
                SettingValue::Text(text) => text,
                SettingValue::Integer(number) => number.to_string(),
                SettingValue::Float(number) => number.to_string(),
                SettingValue::Flag(flag) => flag.to_string(),
                SettingValue::Other(other) => {
                    crate::bail!(
                        "Setting '{}' must be a string, number or boolean, found {}",
                        key,
                        other.type_str()
                    );
                }
            };
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    /// Reads and parses a TOML settings file.
    #[instrument]
    pub fn load(path: &Path) -> PathioResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Box::new(PathioError::new(ErrorKind::FileError {
                path: path.to_path_buf(),
                source: e,
            }))
        })?;
        let settings = Self::parse(&text).map_err(|cause| {
            Box::new(
                PathioError::message(format!("Cannot load settings from {}", path.display()))
                    .caused_by(*cause),
            )
        })?;
        debug!(count = settings.values.len(), "loaded settings");
        Ok(settings)
    }
}

impl SettingsSource for TomlSettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Ordered list of sources; the first source that knows a key wins.
#[derive(Debug, Clone, Default)]
pub struct LayeredSettings {
    layers: Vec<SettingsHandle>,
}

impl LayeredSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source with lower priority than the ones already added.
    pub fn layer(mut self, source: impl SettingsSource) -> Self {
        self.layers.push(SettingsHandle::new(source));
        self
    }
}

impl SettingsSource for LayeredSettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get_setting(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_charset_defaults_to_utf8() {
        let settings = SettingsHandle::default();
        assert_eq!(settings.get_setting(CHARSET_KEY), None);
        assert_eq!(settings.charset(), "utf-8");
    }

    #[test]
    fn test_map_settings_changes_are_visible_through_handle() {
        let settings = MapSettings::new();
        let handle = SettingsHandle::new(settings.clone());
        assert_eq!(handle.charset(), "utf-8");

        settings.set(CHARSET_KEY, "latin1");
        assert_eq!(handle.charset(), "latin1");

        settings.remove(CHARSET_KEY);
        assert_eq!(handle.charset(), "utf-8");
    }

    #[test]
    fn test_env_settings_variable_name() {
        let env = EnvSettings::default();
        assert_eq!(env.variable_name("charset"), "PATHIO_CHARSET");
        assert_eq!(
            EnvSettings::with_prefix("APP").variable_name("text.charset"),
            "APP_TEXT_CHARSET"
        );
    }

    #[test]
    fn test_env_settings_missing_variable() {
        let env = EnvSettings::with_prefix("PATHIO_TEST_UNSET_PREFIX");
        assert_eq!(env.get_setting("charset"), None);
    }

    #[test]
    fn test_toml_settings_parse() {
        let settings = TomlSettings::parse(
            r#"
            charset = "iso-8859-1"
            retries = 3
            strict = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.charset(), "iso-8859-1");
        assert_eq!(settings.get_setting("retries").as_deref(), Some("3"));
        assert_eq!(settings.get_setting("strict").as_deref(), Some("true"));
        assert_eq!(settings.get_setting("missing"), None);
    }

    #[test]
    fn test_toml_settings_rejects_nested_table() {
        let err = TomlSettings::parse("[reader]\ncharset = \"utf-8\"\n").unwrap_err();
        assert!(err.to_string().contains("'reader'"), "{}", err);
    }

    #[test]
    fn test_toml_settings_rejects_invalid_toml() {
        let err = TomlSettings::parse("charset = ").unwrap_err();
        assert!(err.to_string().starts_with("Invalid settings TOML"));
    }

    #[test]
    fn test_toml_settings_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pathio.toml");
        std::fs::write(&path, "charset = \"utf-16le\"\n").unwrap();

        let settings = TomlSettings::load(&path).unwrap();
        assert_eq!(settings.charset(), "utf-16le");
    }

    #[test]
    fn test_toml_settings_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = TomlSettings::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::FileError { .. }));
    }

    #[test]
    fn test_toml_settings_load_invalid_file_keeps_cause() {
        use std::error::Error;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[reader]\ncharset = \"utf-8\"\n").unwrap();

        let err = TomlSettings::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("Cannot load settings from "), "{}", err);
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("'reader'"), "{}", cause);
        assert!(format!("{:?}", err).contains("└─ cause: Setting 'reader'"));
    }

    #[test]
    fn test_layered_settings_first_hit_wins() {
        let overrides = MapSettings::new().with(CHARSET_KEY, "ascii");
        let defaults = TomlSettings::parse("charset = \"latin1\"\nother = \"x\"").unwrap();
        let layered = LayeredSettings::new().layer(overrides.clone()).layer(defaults);

        assert_eq!(layered.charset(), "ascii");
        assert_eq!(layered.get_setting("other").as_deref(), Some("x"));

        overrides.remove(CHARSET_KEY);
        assert_eq!(layered.charset(), "latin1");
    }
}
