use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::oci::NamespaceMapping;
use crate::restore::{RegistryAnnotations, ANNOTATION_BACKUP_REGISTRY, ANNOTATION_RESTORE_REGISTRY};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub annotations: AnnotationSettings,
    /// Old namespace -> new namespace applied to every relocated image
    #[serde(default)]
    pub namespace_mapping: NamespaceMapping,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnnotationSettings {
    /// Annotation naming the registry images were backed up from
    #[serde(default = "default_backup_registry_annotation")]
    pub backup_registry: String,
    /// Annotation naming the registry images are restored into
    #[serde(default = "default_restore_registry_annotation")]
    pub restore_registry: String,
}

fn default_backup_registry_annotation() -> String {
    ANNOTATION_BACKUP_REGISTRY.to_string()
}

fn default_restore_registry_annotation() -> String {
    ANNOTATION_RESTORE_REGISTRY.to_string()
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            backup_registry: default_backup_registry_annotation(),
            restore_registry: default_restore_registry_annotation(),
        }
    }
}

impl From<&AnnotationSettings> for RegistryAnnotations {
    fn from(settings: &AnnotationSettings) -> Self {
        Self {
            backup_registry: settings.backup_registry.clone(),
            restore_registry: settings.restore_registry.clone(),
        }
    }
}

impl Settings {
    /// Load settings from an optional config file (toml, yaml or yml), then
    /// from `RELOCATE_*` environment variables (`__` separates nested keys)
    pub fn new(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::Message(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            tracing::info!("Loading config file: {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("RELOCATE")
                .prefix_separator("_")
                .separator("__"),
        );

        let json_value: serde_json::Value = builder.build()?.try_deserialize()?;

        // Deserialize and collect unused fields
        let mut unused_fields = Vec::new();
        let settings: Settings = serde_ignored::deserialize(json_value, |path| {
            unused_fields.push(path.to_string());
        })
        .map_err(|e| ConfigError::Message(format!("Failed to deserialize settings: {}", e)))?;

        for field in &unused_fields {
            tracing::warn!("Unknown configuration field: {}", field);
        }

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.annotations.backup_registry.is_empty()
            || self.annotations.restore_registry.is_empty()
        {
            return Err(ConfigError::Message(
                "Registry annotation names must not be empty".to_string(),
            ));
        }

        for (from, to) in &self.namespace_mapping {
            if from.is_empty() || to.is_empty() || from.contains('/') || to.contains('/') {
                return Err(ConfigError::Message(format!(
                    "Invalid namespace mapping '{}' -> '{}': namespaces must be non-empty and contain no '/'",
                    from, to
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let settings = Settings::new(None).unwrap();
        assert_eq!(
            settings.annotations.backup_registry,
            "openshift.io/backup-registry-hostname"
        );
        assert_eq!(
            settings.annotations.restore_registry,
            "openshift.io/restore-registry-hostname"
        );
    }

    #[test]
    fn test_load_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("relocate.toml");
        fs::write(
            &path,
            r#"
[annotations]
backup_registry = "example.com/from"

[namespace_mapping]
dev = "prod"
legacy = "apps"
"#,
        )
        .unwrap();

        let settings = Settings::new(Some(&path)).unwrap();

        assert_eq!(settings.annotations.backup_registry, "example.com/from");
        assert_eq!(
            settings.annotations.restore_registry,
            "openshift.io/restore-registry-hostname"
        );
        assert_eq!(settings.namespace_mapping.get("dev").map(String::as_str), Some("prod"));
        assert_eq!(settings.namespace_mapping.get("legacy").map(String::as_str), Some("apps"));
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("relocate.yaml");
        fs::write(
            &path,
            "namespace_mapping:\n  dev: prod\nunknown_section:\n  key: value\n",
        )
        .unwrap();

        let settings = Settings::new(Some(&path)).unwrap();
        assert_eq!(settings.namespace_mapping.get("dev").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_namespace_mapping_from_environment() {
        env::set_var("RELOCATE_NAMESPACE_MAPPING__STAGING", "qa");
        let result = Settings::new(None);
        env::remove_var("RELOCATE_NAMESPACE_MAPPING__STAGING");

        let settings = result.unwrap();
        assert_eq!(
            settings.namespace_mapping.get("staging").map(String::as_str),
            Some("qa")
        );
    }

    #[test]
    fn test_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Settings::new(Some(&temp_dir.path().join("missing.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_namespace_mapping() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("relocate.toml");
        fs::write(&path, "[namespace_mapping]\ndev = \"prod/team\"\n").unwrap();

        let err = Settings::new(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid namespace mapping"));
    }
}
