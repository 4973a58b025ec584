//! `SQLite` implementation of [`ObjectRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use domo_app::ports::ObjectRepository;
use domo_domain::error::DomoError;
use domo_domain::id::{ObjectId, WidgetId};
use domo_domain::object::{NewObject, Object, ObjectFilter};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Object);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Object> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let widget_id: i64 = row.try_get("widget_id")?;
        let options_json: String = row.try_get("options")?;
        let options = serde_json::from_str(&options_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Object {
            id: ObjectId::new(id),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            kind: row.try_get("kind")?,
            status: row.try_get("status")?,
            value: row.try_get("value")?,
            widget_id: WidgetId::new(widget_id),
            options,
            technology: row.try_get("technology")?,
            technology_id: row.try_get("technology_id")?,
            enabled: row.try_get("enabled")?,
            visible: row.try_get("visible")?,
            protected: row.try_get("protected")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO objects (name, description, kind, status, value, widget_id, options, technology, technology_id, enabled, visible, protected)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM objects WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM objects ORDER BY id";

const UPDATE: &str = r"
    UPDATE objects
    SET name = ?, description = ?, kind = ?, status = ?, value = ?, widget_id = ?,
        options = ?, technology = ?, technology_id = ?, enabled = ?, visible = ?, protected = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM objects WHERE id = ?";

/// `SQLite`-backed object repository.
pub struct SqliteObjectRepository {
    pool: SqlitePool,
}

impl SqliteObjectRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ObjectRepository for SqliteObjectRepository {
    async fn create(&self, object: NewObject) -> Result<Object, DomoError> {
        let options_json = serde_json::to_string(&object.options).map_err(StorageError::from)?;

        let result = sqlx::query(INSERT)
            .bind(&object.name)
            .bind(&object.description)
            .bind(&object.kind)
            .bind(object.status)
            .bind(&object.value)
            .bind(object.widget_id.as_i64())
            .bind(&options_json)
            .bind(&object.technology)
            .bind(&object.technology_id)
            .bind(object.enabled)
            .bind(object.visible)
            .bind(object.protected)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(object.into_object(ObjectId::new(result.last_insert_rowid())))
    }

    async fn get_by_id(&self, id: ObjectId) -> Result<Option<Object>, DomoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Object>, DomoError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find(&self, filter: ObjectFilter) -> Result<Vec<Object>, DomoError> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM objects WHERE 1 = 1");
        if let Some(name) = filter.name {
            builder.push(" AND name = ").push_bind(name);
        }
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(value) = filter.value {
            builder.push(" AND value = ").push_bind(value);
        }
        if let Some(widget_id) = filter.widget_id {
            builder.push(" AND widget_id = ").push_bind(widget_id.as_i64());
        }
        if let Some(technology) = filter.technology {
            builder.push(" AND technology = ").push_bind(technology);
        }
        if let Some(technology_id) = filter.technology_id {
            builder.push(" AND technology_id = ").push_bind(technology_id);
        }
        if let Some(enabled) = filter.enabled {
            builder.push(" AND enabled = ").push_bind(enabled);
        }
        if let Some(visible) = filter.visible {
            builder.push(" AND visible = ").push_bind(visible);
        }
        if let Some(protected) = filter.protected {
            builder.push(" AND protected = ").push_bind(protected);
        }
        builder.push(" ORDER BY id");

        let rows: Vec<Wrapper> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, object: Object) -> Result<Object, DomoError> {
        let options_json = serde_json::to_string(&object.options).map_err(StorageError::from)?;

        sqlx::query(UPDATE)
            .bind(&object.name)
            .bind(&object.description)
            .bind(&object.kind)
            .bind(object.status)
            .bind(&object.value)
            .bind(object.widget_id.as_i64())
            .bind(&options_json)
            .bind(&object.technology)
            .bind(&object.technology_id)
            .bind(object.enabled)
            .bind(object.visible)
            .bind(object.protected)
            .bind(object.id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(object)
    }

    async fn delete(&self, id: ObjectId) -> Result<(), DomoError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use serde_json::json;

    async fn setup() -> SqliteObjectRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteObjectRepository::new(db.pool().clone())
    }

    fn lamp() -> NewObject {
        Object::builder()
            .name("Living room lamp")
            .kind("dimmer")
            .value("35")
            .technology("zwave")
            .technology_id("4-38-1-0")
            .options(json!({"icon": "lamp"}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_assign_ids_in_insertion_order() {
        let repo = setup().await;
        let first = repo.create(lamp()).await.unwrap();
        let second = repo
            .create(Object::builder().name("Hall switch").build().unwrap())
            .await
            .unwrap();
        assert!(second.id.as_i64() > first.id.as_i64());
    }

    #[tokio::test]
    async fn should_roundtrip_all_fields() {
        let repo = setup().await;
        let created = repo.create(lamp()).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Living room lamp");
        assert_eq!(fetched.kind, "dimmer");
        assert_eq!(fetched.value, "35");
        assert_eq!(fetched.widget_id, WidgetId::UNASSIGNED);
        assert_eq!(fetched.options, json!({"icon": "lamp"}));
        assert_eq!(fetched.technology, "zwave");
        assert_eq!(fetched.technology_id.as_deref(), Some("4-38-1-0"));
        assert!(fetched.enabled);
        assert!(!fetched.protected);
    }

    #[tokio::test]
    async fn should_return_none_when_object_missing() {
        let repo = setup().await;
        let result = repo.get_by_id(ObjectId::new(42)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_find_by_technology_key() {
        let repo = setup().await;
        repo.create(lamp()).await.unwrap();
        repo.create(Object::builder().name("Virtual item").build().unwrap())
            .await
            .unwrap();

        let found = repo
            .find(ObjectFilter {
                technology: Some("zwave".to_string()),
                technology_id: Some("4-38-1-0".to_string()),
                ..ObjectFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Living room lamp");
    }

    #[tokio::test]
    async fn should_find_by_flags() {
        let repo = setup().await;
        repo.create(lamp()).await.unwrap();
        repo.create(
            Object::builder()
                .name("Hidden item")
                .visible(false)
                .build()
                .unwrap(),
        )
        .await
        .unwrap();

        let hidden = repo
            .find(ObjectFilter {
                visible: Some(false),
                ..ObjectFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].name, "Hidden item");
    }

    #[tokio::test]
    async fn should_persist_updates() {
        let repo = setup().await;
        let mut object = repo.create(lamp()).await.unwrap();

        object.value = "100".to_string();
        object.status = 1;
        repo.update(object.clone()).await.unwrap();

        let fetched = repo.get_by_id(object.id).await.unwrap().unwrap();
        assert_eq!(fetched.value, "100");
        assert_eq!(fetched.status, 1);
    }

    #[tokio::test]
    async fn should_delete_and_tolerate_absent_ids() {
        let repo = setup().await;
        let object = repo.create(lamp()).await.unwrap();

        repo.delete(object.id).await.unwrap();
        assert!(repo.get_by_id(object.id).await.unwrap().is_none());

        // Deleting again is a no-op, not an error.
        repo.delete(object.id).await.unwrap();
    }
}
