//! Editor configuration types.
//!
//! `EditorConfig` represents the `config.toml` in the data directory that
//! controls public URLs, navigation targets, and palette defaults.

use serde::{Deserialize, Serialize};

use crate::widget::{BuilderOptions, GroupCategory};

/// Top-level configuration for the form editor.
///
/// Loaded from `~/.formwright/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Origin used to build public form URLs.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Base path of the edit view; a new form redirects to `{editor_base}/{id}`.
    #[serde(default = "default_editor_base")]
    pub editor_base: String,

    /// Path of the list view, the redirect target after a load failure.
    #[serde(default = "default_list_path")]
    pub list_path: String,

    /// Palette section expanded when a session starts.
    #[serde(default = "default_group")]
    pub default_group: GroupCategory,

    /// Title given to a new, unsaved form.
    #[serde(default)]
    pub default_title: String,

    /// Accepted for compatibility but ignored: resource components are
    /// never offered offline.
    #[serde(default)]
    pub resource_components_enabled: bool,
}

fn default_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_editor_base() -> String {
    "/forms/edit".to_string()
}

fn default_list_path() -> String {
    "/forms".to_string()
}

fn default_group() -> GroupCategory {
    GroupCategory::Basic
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            editor_base: default_editor_base(),
            list_path: default_list_path(),
            default_group: default_group(),
            default_title: String::new(),
            resource_components_enabled: false,
        }
    }
}

impl EditorConfig {
    /// Palette options for a new widget instance.
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            groups: GroupCategory::ALL.to_vec(),
            default_group: self.default_group,
            resource_enabled: false,
        }
    }

    /// Edit-view path for a stored form.
    pub fn edit_path(&self, id: &impl std::fmt::Display) -> String {
        format!("{}/{id}", self.editor_base.trim_end_matches('/'))
    }
}
