use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Free-form settings map carried by a form definition.
pub type Settings = Map<String, Value>;

/// Component types that hold child components and never contribute a
/// submission key of their own.
pub const CONTAINER_TYPES: &[&str] = &["panel", "fieldset", "columns", "well", "table", "tabs"];

/// Unique identifier for a stored form, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormId(pub Uuid);

impl FormId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for FormId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// How the form is presented: a single page, or a multi-step wizard whose
/// top-level components are pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Form,
    Wizard,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Form => write!(f, "form"),
            DisplayMode::Wizard => write!(f, "wizard"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "form" => Ok(DisplayMode::Form),
            "wizard" => Ok(DisplayMode::Wizard),
            other => Err(format!("invalid display mode: '{other}'")),
        }
    }
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::Form
    }
}

/// One node of the component tree.
///
/// Only the type tag, the key, and the child sequence are interpreted;
/// everything else is type-specific configuration kept verbatim so that a
/// load-then-save cycle reproduces the same definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
    /// Child components. `None` when the definition carries no
    /// `components` key, so an explicit empty list survives a save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

impl Component {
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
            components: None,
            config: Map::new(),
        }
    }

    /// A wizard page: an empty `panel` container with a title.
    pub fn page(key: impl Into<String>, title: impl Into<String>) -> Self {
        let mut page = Self::new("panel", key);
        page.components = Some(Vec::new());
        page.config.insert("title".to_string(), Value::String(title.into()));
        page.config.insert("input".to_string(), Value::Bool(false));
        page
    }

    /// Builder-style helper for setting a configuration entry.
    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.config.insert(name.to_string(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<Component>) -> Self {
        self.components = Some(children);
        self
    }

    pub fn children(&self) -> &[Component] {
        self.components.as_deref().unwrap_or_default()
    }

    /// Mutable child list, created empty on first use.
    pub fn children_mut(&mut self) -> &mut Vec<Component> {
        self.components.get_or_insert_with(Vec::new)
    }

    pub fn is_container(&self) -> bool {
        CONTAINER_TYPES.contains(&self.kind.as_str())
    }

    /// Whether this component produces a value in a submission.
    ///
    /// Containers never do; other components do unless configured with
    /// `"input": false` (buttons, static content).
    pub fn is_input(&self) -> bool {
        if self.is_container() {
            return false;
        }
        !matches!(self.config.get("input"), Some(Value::Bool(false)))
    }
}

/// In-memory form definition edited by the builder.
///
/// `title` is owned by the user; the widget never writes it. `public_url`
/// is present exactly when `is_public` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    /// Assigned by the store on first save.
    pub id: Option<FormId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Internal machine name, derived from the title.
    pub name: String,
    /// URL path segment, derived from the title.
    pub path: String,
    pub display: DisplayMode,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub public_url: Option<String>,
}

impl FormRecord {
    /// A fresh, unsaved form with the given title and default layout.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Self {
            id: None,
            title,
            description: String::new(),
            name: slug.clone(),
            path: slug,
            display: DisplayMode::Form,
            components: Vec::new(),
            settings: Settings::new(),
            is_public: false,
            public_url: None,
        }
    }

    /// Set the title and re-derive `name` and `path` from it.
    pub fn retitle(&mut self, title: impl Into<String>) {
        self.title = title.into();
        let slug = slugify(&self.title);
        self.name = slug.clone();
        self.path = slug;
    }
}

/// The `schema` object nested inside a persisted payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub display: DisplayMode,
    /// Always `"form"`; the widget's resource type is never produced.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub settings: Settings,
}

/// What the editor writes to the persistence backend on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormPayload {
    /// The human-facing title.
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub display_type: DisplayMode,
    pub schema: SchemaDocument,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub is_public: bool,
    /// Owning user, taken from the authentication context at save time.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A payload as returned by the persistence backend, with server metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredForm {
    pub id: FormId,
    #[serde(flatten)]
    pub payload: FormPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public URL convention for a published form.
pub fn public_url(origin: &str, id: &FormId) -> String {
    format!("{}/public/form/{id}", origin.trim_end_matches('/'))
}

/// Generate a URL-safe slug from a display title.
///
/// ```
/// use formwright_types::form::slugify;
///
/// assert_eq!(slugify("Customer Intake"), "customer-intake");
/// assert_eq!(slugify("  Sign-up: 2024!  "), "sign-up-2024");
/// ```
pub fn slugify(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_was_hyphen = true;
    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("New Form"), "new-form");
        assert_eq!(slugify("---a---b---"), "a-b");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_form_id_display_parse() {
        let id = FormId::new();
        let parsed: FormId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_display_mode_parse() {
        assert_eq!("Wizard".parse::<DisplayMode>().unwrap(), DisplayMode::Wizard);
        assert_eq!(DisplayMode::Form.to_string(), "form");
        assert!("slides".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_new_record_derives_slugs() {
        let record = FormRecord::new("Customer Intake");
        assert_eq!(record.name, "customer-intake");
        assert_eq!(record.path, "customer-intake");
        assert!(record.components.is_empty());
        assert!(record.public_url.is_none());
    }

    #[test]
    fn test_component_keeps_type_specific_config() {
        let raw = json!({
            "type": "textfield",
            "key": "firstName",
            "label": "First name",
            "validate": { "required": true }
        });
        let component: Component = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(component.kind, "textfield");
        assert_eq!(component.config["label"], json!("First name"));
        assert_eq!(serde_json::to_value(&component).unwrap(), raw);
    }

    #[test]
    fn test_empty_container_keeps_components_key() {
        let raw = json!({"type": "panel", "key": "page1", "title": "Page 1", "components": []});
        let component: Component = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(component.components, Some(Vec::new()));
        assert_eq!(serde_json::to_value(&component).unwrap(), raw);

        let leaf: Component =
            serde_json::from_value(json!({"type": "textfield", "key": "name"})).unwrap();
        assert!(leaf.components.is_none());
        assert!(leaf.children().is_empty());
        assert!(serde_json::to_value(&leaf).unwrap().get("components").is_none());
    }

    #[test]
    fn test_seeded_page_serializes_empty_children() {
        let value = serde_json::to_value(Component::page("page1", "Page 1")).unwrap();
        assert_eq!(value["components"], json!([]));
    }

    #[test]
    fn test_component_input_classification() {
        assert!(!Component::page("page1", "Page 1").is_input());
        assert!(Component::new("email", "email").is_input());
        assert!(!Component::new("button", "submit").with("input", json!(false)).is_input());
    }

    #[test]
    fn test_public_url_convention() {
        let id = FormId::new();
        assert_eq!(
            public_url("https://forms.example.com/", &id),
            format!("https://forms.example.com/public/form/{id}")
        );
    }

    #[test]
    fn test_stored_form_flattens_payload() {
        let stored = StoredForm {
            id: FormId::new(),
            payload: FormPayload {
                name: "Survey".to_string(),
                description: String::new(),
                display_type: DisplayMode::Wizard,
                schema: SchemaDocument {
                    display: DisplayMode::Wizard,
                    kind: "form".to_string(),
                    components: vec![Component::page("page1", "Page 1")],
                    settings: Settings::new(),
                },
                settings: Settings::new(),
                is_public: false,
                user_id: Some("u-1".to_string()),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["display_type"], json!("wizard"));
        assert_eq!(value["schema"]["components"][0]["key"], json!("page1"));
    }
}
