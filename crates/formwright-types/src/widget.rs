//! Vocabulary exchanged with the embedded builder widget.
//!
//! `WidgetConfig` is what a session hands to the widget on construction;
//! `WidgetEvent` is what the widget emits back while the user edits.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::form::{Component, DisplayMode, Settings};

/// Side-panel palette categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupCategory {
    Basic,
    Advanced,
    Layout,
    Data,
}

impl GroupCategory {
    /// Every category, in panel order.
    pub const ALL: [GroupCategory; 4] = [
        GroupCategory::Basic,
        GroupCategory::Advanced,
        GroupCategory::Layout,
        GroupCategory::Data,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupCategory::Basic => "basic",
            GroupCategory::Advanced => "advanced",
            GroupCategory::Layout => "layout",
            GroupCategory::Data => "data",
        }
    }
}

impl fmt::Display for GroupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(GroupCategory::Basic),
            "advanced" => Ok(GroupCategory::Advanced),
            "layout" => Ok(GroupCategory::Layout),
            "data" => Ok(GroupCategory::Data),
            other => Err(format!("invalid group category: '{other}'")),
        }
    }
}

/// Palette options handed to the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderOptions {
    /// Palette sections to render, in order.
    pub groups: Vec<GroupCategory>,
    /// Section expanded when the panel first appears.
    pub default_group: GroupCategory,
    /// Remotely-defined "resource" components. Always false offline.
    pub resource_enabled: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            groups: GroupCategory::ALL.to_vec(),
            default_group: GroupCategory::Basic,
            resource_enabled: false,
        }
    }
}

/// Configuration used to construct one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub display: DisplayMode,
    pub title: String,
    pub name: String,
    pub path: String,
    pub components: Vec<Component>,
    pub settings: Settings,
    pub builder: BuilderOptions,
}

/// Schema as emitted by the widget.
///
/// Every field is optional: the widget reports what it knows, and anything
/// it omits is left untouched in the store. The widget has no notion of the
/// user-facing title, so `title` is accepted but never applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetSchema {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub display: Option<DisplayMode>,
    #[serde(default)]
    pub components: Option<Vec<Component>>,
    #[serde(default)]
    pub settings: Option<Settings>,
}

/// Kinds of widget event a session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetEventKind {
    Change,
    SaveComponent,
    DeleteComponent,
}

/// Events emitted by a live widget instance.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// The schema changed in any way.
    Change(WidgetSchema),
    /// A component's settings dialog was confirmed.
    SaveComponent { component: Component, schema: WidgetSchema },
    /// A component was removed from the canvas.
    DeleteComponent { key: String, schema: WidgetSchema },
}

impl WidgetEvent {
    pub fn kind(&self) -> WidgetEventKind {
        match self {
            WidgetEvent::Change(_) => WidgetEventKind::Change,
            WidgetEvent::SaveComponent { .. } => WidgetEventKind::SaveComponent,
            WidgetEvent::DeleteComponent { .. } => WidgetEventKind::DeleteComponent,
        }
    }

    /// The schema snapshot every event carries.
    pub fn schema(&self) -> &WidgetSchema {
        match self {
            WidgetEvent::Change(schema) => schema,
            WidgetEvent::SaveComponent { schema, .. } => schema,
            WidgetEvent::DeleteComponent { schema, .. } => schema,
        }
    }
}
