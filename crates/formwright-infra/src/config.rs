//! Editor configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.formwright/` in
//! production) and deserializes it into [`EditorConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::Path;

use formwright_types::config::EditorConfig;

/// Load editor configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`EditorConfig::default()`].
/// - Unreadable or unparsable file: logs a warning, returns the default.
/// - `resource_components_enabled = true` is accepted but has no effect.
pub async fn load_editor_config(data_dir: &Path) -> EditorConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return EditorConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return EditorConfig::default();
        }
    };

    match toml::from_str::<EditorConfig>(&content) {
        Ok(config) => {
            if config.resource_components_enabled {
                tracing::warn!(
                    "resource_components_enabled is set in {} but resource components are never offered",
                    config_path.display()
                );
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            EditorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_types::widget::GroupCategory;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_editor_config(tmp.path()).await;
        assert_eq!(config, EditorConfig::default());
    }

    #[tokio::test]
    async fn valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
origin = "https://forms.example.com"
list_path = "/dashboard/forms"
default_group = "data"
default_title = "Untitled"
"#,
        )
        .await
        .unwrap();

        let config = load_editor_config(tmp.path()).await;
        assert_eq!(config.origin, "https://forms.example.com");
        assert_eq!(config.list_path, "/dashboard/forms");
        assert_eq!(config.default_group, GroupCategory::Data);
        assert_eq!(config.default_title, "Untitled");
        assert_eq!(config.editor_base, "/forms/edit");
    }

    #[tokio::test]
    async fn malformed_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "origin = [not toml")
            .await
            .unwrap();
        let config = load_editor_config(tmp.path()).await;
        assert_eq!(config, EditorConfig::default());
    }

    #[tokio::test]
    async fn resource_flag_is_ignored() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "resource_components_enabled = true\n",
        )
        .await
        .unwrap();
        let config = load_editor_config(tmp.path()).await;
        assert!(!config.builder_options().resource_enabled);
    }
}
