//! Schema synchronization between the in-memory record, the widget, and
//! the persisted payload.

use formwright_types::form::{
    Component, DisplayMode, FormPayload, FormRecord, SchemaDocument, StoredForm, public_url,
    slugify,
};
use formwright_types::widget::{BuilderOptions, WidgetConfig, WidgetSchema};

/// Key of the page seeded into an empty wizard.
pub const DEFAULT_PAGE_KEY: &str = "page1";

/// The single page container an empty wizard starts with.
pub fn default_wizard_page() -> Component {
    Component::page(DEFAULT_PAGE_KEY, "Page 1")
}

/// Whether `record` shown in `display` mode needs the default page.
pub fn needs_wizard_seed(record: &FormRecord, display: DisplayMode) -> bool {
    display == DisplayMode::Wizard && record.components.is_empty()
}

/// Build the widget configuration for `record` in `display` mode.
///
/// An empty wizard gets the default page. Resource-backed palette
/// categories are always disabled.
pub fn widget_config(
    record: &FormRecord,
    display: DisplayMode,
    builder: BuilderOptions,
) -> WidgetConfig {
    let components = if needs_wizard_seed(record, display) {
        vec![default_wizard_page()]
    } else {
        record.components.clone()
    };
    WidgetConfig {
        display,
        title: record.title.clone(),
        name: slugify(&record.title),
        path: slugify(&record.title),
        components,
        settings: record.settings.clone(),
        builder: BuilderOptions {
            resource_enabled: false,
            ..builder
        },
    }
}

/// Merge a widget schema into `record` field by field.
///
/// The title is owned by the user and is never taken from the widget.
/// Returns true if anything changed.
pub fn apply_widget_schema(record: &mut FormRecord, schema: &WidgetSchema) -> bool {
    let before = record.clone();
    if let Some(name) = &schema.name {
        record.name = name.clone();
    }
    if let Some(path) = &schema.path {
        record.path = path.clone();
    }
    if let Some(display) = schema.display {
        record.display = display;
    }
    if let Some(components) = &schema.components {
        record.components = components.clone();
    }
    if let Some(settings) = &schema.settings {
        record.settings = settings.clone();
    }
    *record != before
}

/// Persisted payload for `record`, owned by `user_id`.
pub fn payload_from_record(record: &FormRecord, user_id: Option<String>) -> FormPayload {
    FormPayload {
        name: record.title.clone(),
        description: record.description.clone(),
        display_type: record.display,
        schema: SchemaDocument {
            display: record.display,
            kind: "form".to_string(),
            components: record.components.clone(),
            settings: record.settings.clone(),
        },
        settings: record.settings.clone(),
        is_public: record.is_public,
        user_id,
    }
}

/// In-memory record for a stored form.
///
/// The nested schema settings win; the top-level copy is the fallback for
/// payloads written without them.
pub fn record_from_stored(stored: &StoredForm, origin: &str) -> FormRecord {
    let payload = &stored.payload;
    let settings = if payload.schema.settings.is_empty() {
        payload.settings.clone()
    } else {
        payload.schema.settings.clone()
    };
    let slug = slugify(&payload.name);
    FormRecord {
        id: Some(stored.id),
        title: payload.name.clone(),
        description: payload.description.clone(),
        name: slug.clone(),
        path: slug,
        display: payload.display_type,
        components: payload.schema.components.clone(),
        settings,
        is_public: payload.is_public,
        public_url: payload.is_public.then(|| public_url(origin, &stored.id)),
    }
}

/// Field keys of every value-producing component in `components`, depth first.
pub fn field_keys(components: &[Component]) -> Vec<String> {
    let mut keys = Vec::new();
    collect_keys(components, &mut keys);
    keys
}

fn collect_keys(components: &[Component], keys: &mut Vec<String>) {
    for component in components {
        if component.is_input() && !component.key.is_empty() {
            keys.push(component.key.clone());
        }
        collect_keys(component.children(), keys);
    }
}
