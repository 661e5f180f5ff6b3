//! Form CLI commands: new, list, show, export, import, publish, unpublish.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use formwright_core::sync::{DEFAULT_PAGE_KEY, field_keys};
use formwright_types::form::{Component, DisplayMode, FormId, FormPayload, StoredForm, public_url};

use super::activity;
use crate::state::AppState;

fn parse_id(id: &str) -> Result<FormId> {
    id.parse::<FormId>()
        .with_context(|| format!("'{id}' is not a valid form ID"))
}

/// Parse a `type:key` field argument. A bare key is a text field.
fn parse_field(raw: &str) -> Result<Component> {
    let (kind, key) = raw.split_once(':').unwrap_or(("textfield", raw));
    let (kind, key) = (kind.trim(), key.trim());
    if kind.is_empty() || key.is_empty() {
        anyhow::bail!("invalid field '{raw}', expected type:key");
    }
    Ok(Component::new(kind, key).with("label", serde_json::Value::String(key.to_string())))
}

/// Create a form by driving a headless editor: mount, title, display,
/// fields through the live widget, then save.
pub async fn new_form(
    state: &AppState,
    title: String,
    description: Option<String>,
    wizard: bool,
    fields: &[String],
    json: bool,
) -> Result<StoredForm> {
    let components = fields
        .iter()
        .map(|f| parse_field(f))
        .collect::<Result<Vec<_>>>()?;

    let editor = state.editor();
    let mut events = editor.events().subscribe();
    editor.mount(None).await?;
    editor.set_title(title);
    if let Some(description) = description {
        editor.set_description(description);
    }
    if wizard {
        editor.set_display_mode(DisplayMode::Wizard).await?;
    }

    if !components.is_empty() {
        let widget = editor
            .sessions()
            .host()
            .current()
            .context("the builder is not running")?;
        let parent = wizard.then_some(DEFAULT_PAGE_KEY);
        for component in components {
            widget.save_component(component, parent)?;
        }
    }

    let id = editor.save().await?;
    editor.unmount();
    let activity = activity::drain(&mut events);

    let stored = state.form_service.get_form(&id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(stored);
    }

    println!();
    println!("  {} Form created", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Title:").bold(), style(&stored.payload.name).cyan());
    println!("  {}  {}", style("Display:").bold(), stored.payload.display_type);
    println!("  {}  {}", style("ID:").bold(), style(stored.id.to_string()).dim());
    println!(
        "  {}  {} field(s) added in {} builder session(s)",
        style("Builder:").bold(),
        field_keys(&stored.payload.schema.components).len(),
        activity.sessions
    );
    println!(
        "  {}  {}",
        style("Edit:").bold(),
        style(state.config.edit_path(&stored.id)).yellow()
    );
    println!();
    Ok(stored)
}

/// List all forms in a table.
pub async fn list_forms(state: &AppState, json: bool) -> Result<()> {
    let forms = state.form_service.list_forms().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forms)?);
        return Ok(());
    }

    if forms.is_empty() {
        println!();
        println!("  No forms yet. Create one with {}", style("fwr new -t <title>").yellow());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Title").fg(Color::Cyan),
            Cell::new("Display").fg(Color::Cyan),
            Cell::new("Fields").fg(Color::Cyan),
            Cell::new("Public").fg(Color::Cyan),
            Cell::new("Updated").fg(Color::Cyan),
            Cell::new("ID").fg(Color::Cyan),
        ]);

    for form in &forms {
        let public = if form.payload.is_public {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&form.payload.name),
            Cell::new(form.payload.display_type.to_string()),
            Cell::new(field_keys(&form.payload.schema.components).len()),
            public,
            Cell::new(form.updated_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(form.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!("  {} form(s)", forms.len());
    Ok(())
}

/// Show one form with its component tree.
pub async fn show_form(state: &AppState, id: &str, json: bool) -> Result<()> {
    let form = state.form_service.get_form(&parse_id(id)?).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&form)?);
        return Ok(());
    }

    let payload = &form.payload;
    println!();
    println!("  {}", style(&payload.name).cyan().bold());
    if !payload.description.is_empty() {
        println!("  {}", style(&payload.description).dim());
    }
    println!();
    println!("  {}  {}", style("Display:").bold(), payload.display_type);
    println!("  {}  {}", style("Owner:").bold(), payload.user_id.as_deref().unwrap_or("-"));
    println!("  {}  {}", style("Created:").bold(), form.created_at.to_rfc3339());
    println!("  {}  {}", style("Updated:").bold(), form.updated_at.to_rfc3339());
    if payload.is_public {
        println!(
            "  {}  {}",
            style("Public:").bold(),
            style(public_url(&state.config.origin, &form.id)).green()
        );
    }
    println!();
    println!("  {}", style("Components").bold());
    if payload.schema.components.is_empty() {
        println!("    {}", style("(empty)").dim());
    } else {
        print_tree(&payload.schema.components, 2);
    }
    println!();
    Ok(())
}

fn print_tree(components: &[Component], depth: usize) {
    let indent = "  ".repeat(depth);
    for component in components {
        let marker = if component.is_input() {
            style("•").green()
        } else {
            style("▸").dim()
        };
        println!("{indent}{marker} {} {}", component.key, style(&component.kind).dim());
        print_tree(component.children(), depth + 1);
    }
}

/// Write the payload of a form as pretty JSON.
pub async fn export_form(state: &AppState, id: &str, output: Option<&Path>) -> Result<()> {
    let form = state.form_service.get_form(&parse_id(id)?).await?;
    let body = serde_json::to_string_pretty(&form.payload)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, body)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "  {} Exported '{}' to {}",
                style("✓").green().bold(),
                form.payload.name,
                path.display()
            );
        }
        None => println!("{body}"),
    }
    Ok(())
}

/// Create a form from an exported payload file.
///
/// The imported form always starts unpublished and is owned by the
/// current user.
pub async fn import_form(state: &AppState, file: &Path, json: bool) -> Result<StoredForm> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut payload: FormPayload =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a form payload", file.display()))?;
    payload.is_public = false;
    payload.user_id = state.user.clone();

    let stored = state.form_service.create_form(&payload).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
    } else {
        println!(
            "  {} Imported '{}' as {}",
            style("✓").green().bold(),
            stored.payload.name,
            style(stored.id.to_string()).dim()
        );
    }
    Ok(stored)
}

/// Publish or unpublish through the editor so the same rules apply as
/// in the UI. Returns the public URL while published.
pub async fn set_published(
    state: &AppState,
    id: &str,
    publish: bool,
    json: bool,
) -> Result<Option<String>> {
    let id = parse_id(id)?;
    let editor = state.editor();
    let mut events = editor.events().subscribe();
    editor.mount(Some(id)).await?;

    if editor.record().is_public != publish {
        editor.toggle_publish().await?;
    }
    let url = editor.record().public_url;
    editor.unmount();
    activity::drain(&mut events);

    if json {
        let out = serde_json::json!({ "id": id, "is_public": publish, "public_url": url });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if let Some(url) = &url {
        println!("  {} Published at {}", style("✓").green().bold(), style(url).cyan());
    } else {
        println!("  {} Unpublished", style("✓").green().bold());
    }
    Ok(url)
}
