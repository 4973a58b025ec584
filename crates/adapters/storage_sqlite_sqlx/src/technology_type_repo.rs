//! `SQLite` implementation of [`TechnologyTypeRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use domo_app::ports::TechnologyTypeRepository;
use domo_domain::error::DomoError;
use domo_domain::id::TechnologyTypeId;
use domo_domain::technology_type::{NewTechnologyType, TechnologyType, TechnologyTypeFilter};

use crate::error::StorageError;

struct Wrapper(TechnologyType);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<TechnologyType> {
        value.map(|t| t.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;

        Ok(Self(TechnologyType {
            id: TechnologyTypeId::new(id),
            kind: row.try_get("kind")?,
            language: row.try_get("language")?,
            path: row.try_get("path")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO technology_types (kind, language, path)
    VALUES (?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM technology_types WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM technology_types ORDER BY id";

const UPDATE: &str = r"
    UPDATE technology_types
    SET kind = ?, language = ?, path = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM technology_types WHERE id = ?";

/// `SQLite`-backed technology-type repository.
pub struct SqliteTechnologyTypeRepository {
    pool: SqlitePool,
}

impl SqliteTechnologyTypeRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TechnologyTypeRepository for SqliteTechnologyTypeRepository {
    async fn create(
        &self,
        technology_type: NewTechnologyType,
    ) -> Result<TechnologyType, DomoError> {
        let result = sqlx::query(INSERT)
            .bind(&technology_type.kind)
            .bind(&technology_type.language)
            .bind(&technology_type.path)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(technology_type.into_technology_type(TechnologyTypeId::new(result.last_insert_rowid())))
    }

    async fn get_by_id(&self, id: TechnologyTypeId) -> Result<Option<TechnologyType>, DomoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<TechnologyType>, DomoError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|t| t.0).collect())
    }

    async fn find(&self, filter: TechnologyTypeFilter) -> Result<Vec<TechnologyType>, DomoError> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM technology_types WHERE 1 = 1");
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind);
        }
        if let Some(language) = filter.language {
            builder.push(" AND language = ").push_bind(language);
        }
        builder.push(" ORDER BY id");

        let rows: Vec<Wrapper> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|t| t.0).collect())
    }

    async fn update(&self, technology_type: TechnologyType) -> Result<TechnologyType, DomoError> {
        sqlx::query(UPDATE)
            .bind(&technology_type.kind)
            .bind(&technology_type.language)
            .bind(&technology_type.path)
            .bind(technology_type.id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(technology_type)
    }

    async fn delete(&self, id: TechnologyTypeId) -> Result<(), DomoError> {
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

    async fn setup() -> SqliteTechnologyTypeRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteTechnologyTypeRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn should_create_and_fetch_technology_type() {
        let repo = setup().await;
        let technology_type = repo
            .create(
                TechnologyType::builder()
                    .kind("zwave")
                    .language("rust")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let fetched = repo.get_by_id(technology_type.id).await.unwrap().unwrap();
        assert_eq!(fetched.kind, "zwave");
        assert_eq!(fetched.language, "rust");
    }

    #[tokio::test]
    async fn should_find_by_kind() {
        let repo = setup().await;
        repo.create(TechnologyType::builder().kind("zwave").build().unwrap())
            .await
            .unwrap();
        repo.create(TechnologyType::builder().kind("demo").build().unwrap())
            .await
            .unwrap();

        let found = repo
            .find(TechnologyTypeFilter {
                kind: Some("demo".to_string()),
                ..TechnologyTypeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "demo");
    }

    #[tokio::test]
    async fn should_update_and_delete() {
        let repo = setup().await;
        let mut technology_type = repo
            .create(TechnologyType::builder().kind("zwave").build().unwrap())
            .await
            .unwrap();

        technology_type.path = "/opt/domo/zwave".to_string();
        repo.update(technology_type.clone()).await.unwrap();
        let fetched = repo.get_by_id(technology_type.id).await.unwrap().unwrap();
        assert_eq!(fetched.path, "/opt/domo/zwave");

        repo.delete(technology_type.id).await.unwrap();
        assert!(repo.get_by_id(technology_type.id).await.unwrap().is_none());
    }
}
