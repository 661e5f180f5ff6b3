//! SQLite form repository implementation.
//!
//! Implements `FormRepository` from `formwright-core`. The nested schema
//! and the top-level settings copy are stored as JSON text columns.

use chrono::{DateTime, Utc};
use sqlx::Row;

use formwright_core::repository::FormRepository;
use formwright_types::error::RepositoryError;
use formwright_types::form::{DisplayMode, FormId, FormPayload, SchemaDocument, Settings, StoredForm};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `FormRepository`.
#[derive(Clone)]
pub struct SqliteFormRepository {
    pool: DatabasePool,
}

impl SqliteFormRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to `StoredForm`.
struct FormRow {
    id: String,
    name: String,
    description: String,
    display_type: String,
    schema_json: String,
    settings_json: String,
    is_public: bool,
    user_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl FormRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            display_type: row.try_get("display_type")?,
            schema_json: row.try_get("schema_json")?,
            settings_json: row.try_get("settings_json")?,
            is_public: row.try_get("is_public")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_stored(self) -> Result<StoredForm, RepositoryError> {
        let id = self
            .id
            .parse::<FormId>()
            .map_err(|e| RepositoryError::Query(format!("invalid form id: {e}")))?;

        let display_type: DisplayMode = self
            .display_type
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let schema: SchemaDocument = serde_json::from_str(&self.schema_json)
            .map_err(|e| RepositoryError::Query(format!("invalid schema JSON: {e}")))?;

        let settings: Settings = serde_json::from_str(&self.settings_json)
            .map_err(|e| RepositoryError::Query(format!("invalid settings JSON: {e}")))?;

        Ok(StoredForm {
            id,
            payload: FormPayload {
                name: self.name,
                description: self.description,
                display_type,
                schema,
                settings,
                is_public: self.is_public,
                user_id: self.user_id,
            },
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn encode_json(payload: &FormPayload) -> Result<(String, String), RepositoryError> {
    let schema = serde_json::to_string(&payload.schema)
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let settings = serde_json::to_string(&payload.settings)
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    Ok((schema, settings))
}

impl FormRepository for SqliteFormRepository {
    async fn get(&self, id: &FormId) -> Result<Option<StoredForm>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM forms WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let form_row =
                    FormRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(form_row.into_stored()?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, payload: &FormPayload) -> Result<StoredForm, RepositoryError> {
        let (schema_json, settings_json) = encode_json(payload)?;
        let id = FormId::new();
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO forms (id, name, description, display_type, schema_json, settings_json, is_public, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.display_type.to_string())
        .bind(&schema_json)
        .bind(&settings_json)
        .bind(payload.is_public)
        .bind(&payload.user_id)
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(StoredForm {
                id,
                payload: payload.clone(),
                created_at: now,
                updated_at: now,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!("form '{id}' already exists")))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn update(&self, id: &FormId, payload: &FormPayload) -> Result<StoredForm, RepositoryError> {
        let (schema_json, settings_json) = encode_json(payload)?;
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE forms SET name = ?, description = ?, display_type = ?, schema_json = ?, settings_json = ?, is_public = ?, user_id = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.display_type.to_string())
        .bind(&schema_json)
        .bind(&settings_json)
        .bind(payload.is_public)
        .bind(&payload.user_id)
        .bind(format_datetime(&now))
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        // Read back through the writer so the new row is visible immediately.
        let row = sqlx::query("SELECT * FROM forms WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        FormRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_stored()
    }

    async fn list(&self) -> Result<Vec<StoredForm>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM forms ORDER BY updated_at DESC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut forms = Vec::with_capacity(rows.len());
        for row in &rows {
            let form_row =
                FormRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            forms.push(form_row.into_stored()?);
        }
        Ok(forms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_core::sync::payload_from_record;
    use formwright_types::form::{Component, FormRecord};
    use serde_json::json;

    async fn test_repo() -> (SqliteFormRepository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("forms.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (SqliteFormRepository::new(pool), dir)
    }

    fn sample_payload() -> FormPayload {
        let mut record = FormRecord::new("Customer Intake");
        record.display = DisplayMode::Wizard;
        record.description = "Front desk".to_string();
        record.components = vec![
            Component::page("page1", "Page 1")
                .with_children(vec![Component::new("textfield", "email").with("label", json!("Email"))]),
        ];
        record.settings.insert("theme".to_string(), json!("compact"));
        payload_from_record(&record, Some("user-1".to_string()))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, _dir) = test_repo().await;
        let payload = sample_payload();

        let created = repo.create(&payload).await.unwrap();
        let fetched = repo.get(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.payload, payload);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (repo, _dir) = test_repo().await;
        assert!(repo.get(&FormId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_overwrites_payload() {
        let (repo, _dir) = test_repo().await;
        let created = repo.create(&sample_payload()).await.unwrap();

        let mut payload = sample_payload();
        payload.name = "Renamed".to_string();
        payload.is_public = true;
        payload.schema.components.clear();

        let updated = repo.update(&created.id, &payload).await.unwrap();
        assert_eq!(updated.payload.name, "Renamed");
        assert!(updated.payload.is_public);
        assert!(updated.updated_at >= created.updated_at);

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert!(fetched.payload.schema.components.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (repo, _dir) = test_repo().await;
        let err = repo.update(&FormId::new(), &sample_payload()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_list_returns_all() {
        let (repo, _dir) = test_repo().await;
        repo.create(&sample_payload()).await.unwrap();
        repo.create(&sample_payload()).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }
}
