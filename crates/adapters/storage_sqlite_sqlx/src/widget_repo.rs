//! `SQLite` implementation of [`WidgetRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use domo_app::ports::WidgetRepository;
use domo_domain::error::DomoError;
use domo_domain::id::WidgetId;
use domo_domain::widget::{NewWidget, Widget, WidgetFilter};

use crate::error::StorageError;

struct Wrapper(Widget);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Widget> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let options_json: String = row.try_get("options")?;
        let options = serde_json::from_str(&options_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Widget {
            id: WidgetId::new(id),
            name: row.try_get("name")?,
            model: row.try_get("model")?,
            options,
            visible: row.try_get("visible")?,
            protected: row.try_get("protected")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO widgets (name, model, options, visible, protected)
    VALUES (?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM widgets WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM widgets ORDER BY id";

const UPDATE: &str = r"
    UPDATE widgets
    SET name = ?, model = ?, options = ?, visible = ?, protected = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM widgets WHERE id = ?";

/// `SQLite`-backed widget repository.
pub struct SqliteWidgetRepository {
    pool: SqlitePool,
}

impl SqliteWidgetRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl WidgetRepository for SqliteWidgetRepository {
    async fn create(&self, widget: NewWidget) -> Result<Widget, DomoError> {
        let options_json = serde_json::to_string(&widget.options).map_err(StorageError::from)?;

        let result = sqlx::query(INSERT)
            .bind(&widget.name)
            .bind(&widget.model)
            .bind(&options_json)
            .bind(widget.visible)
            .bind(widget.protected)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(widget.into_widget(WidgetId::new(result.last_insert_rowid())))
    }

    async fn get_by_id(&self, id: WidgetId) -> Result<Option<Widget>, DomoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Widget>, DomoError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find(&self, filter: WidgetFilter) -> Result<Vec<Widget>, DomoError> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM widgets WHERE 1 = 1");
        if let Some(name) = filter.name {
            builder.push(" AND name = ").push_bind(name);
        }
        if let Some(model) = filter.model {
            builder.push(" AND model = ").push_bind(model);
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

    async fn update(&self, widget: Widget) -> Result<Widget, DomoError> {
        let options_json = serde_json::to_string(&widget.options).map_err(StorageError::from)?;

        sqlx::query(UPDATE)
            .bind(&widget.name)
            .bind(&widget.model)
            .bind(&options_json)
            .bind(widget.visible)
            .bind(widget.protected)
            .bind(widget.id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(widget)
    }

    async fn delete(&self, id: WidgetId) -> Result<(), DomoError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
