//! `SQLite` implementation of [`RelationRepository`].
//!
//! Listing queries order by `order_num` so siblings of a parent come back in
//! their configured propagation order.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use domo_app::ports::RelationRepository;
use domo_domain::error::DomoError;
use domo_domain::id::{NodeId, RelationId};
use domo_domain::relation::{NewRelation, Relation, RelationFilter};

use crate::error::StorageError;

struct Wrapper(Relation);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Relation> {
        value.map(|r| r.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let parent_id: i64 = row.try_get("parent_id")?;
        let child_id: i64 = row.try_get("child_id")?;
        let options_json: String = row.try_get("options")?;
        let options = serde_json::from_str(&options_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Relation {
            id: RelationId::new(id),
            parent_id: NodeId::new(parent_id),
            child_id: NodeId::new(child_id),
            kind: row.try_get("kind")?,
            event: row.try_get("event")?,
            options,
            order_num: row.try_get("order_num")?,
            enabled: row.try_get("enabled")?,
            visible: row.try_get("visible")?,
            protected: row.try_get("protected")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO relations (parent_id, child_id, kind, event, options, order_num,
                           enabled, visible, protected)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM relations WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM relations ORDER BY order_num, id";

const UPDATE: &str = r"
    UPDATE relations
    SET parent_id = ?, child_id = ?, kind = ?, event = ?, options = ?,
        order_num = ?, enabled = ?, visible = ?, protected = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM relations WHERE id = ?";

/// `SQLite`-backed relation repository.
pub struct SqliteRelationRepository {
    pool: SqlitePool,
}

impl SqliteRelationRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RelationRepository for SqliteRelationRepository {
    async fn create(&self, relation: NewRelation) -> Result<Relation, DomoError> {
        let options_json = serde_json::to_string(&relation.options).map_err(StorageError::from)?;

        let result = sqlx::query(INSERT)
            .bind(relation.parent_id.as_i64())
            .bind(relation.child_id.as_i64())
            .bind(&relation.kind)
            .bind(&relation.event)
            .bind(&options_json)
            .bind(relation.order_num)
            .bind(relation.enabled)
            .bind(relation.visible)
            .bind(relation.protected)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(relation.into_relation(RelationId::new(result.last_insert_rowid())))
    }

    async fn get_by_id(&self, id: RelationId) -> Result<Option<Relation>, DomoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Relation>, DomoError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn find(&self, filter: RelationFilter) -> Result<Vec<Relation>, DomoError> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM relations WHERE 1 = 1");
        if let Some(parent_id) = filter.parent_id {
            builder.push(" AND parent_id = ").push_bind(parent_id.as_i64());
        }
        if let Some(child_id) = filter.child_id {
            builder.push(" AND child_id = ").push_bind(child_id.as_i64());
        }
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind);
        }
        if let Some(event) = filter.event {
            builder.push(" AND event = ").push_bind(event);
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
        builder.push(" ORDER BY order_num, id");

        let rows: Vec<Wrapper> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn update(&self, relation: Relation) -> Result<Relation, DomoError> {
        let options_json = serde_json::to_string(&relation.options).map_err(StorageError::from)?;

        sqlx::query(UPDATE)
            .bind(relation.parent_id.as_i64())
            .bind(relation.child_id.as_i64())
            .bind(&relation.kind)
            .bind(&relation.event)
            .bind(&options_json)
            .bind(relation.order_num)
            .bind(relation.enabled)
            .bind(relation.visible)
            .bind(relation.protected)
            .bind(relation.id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(relation)
    }

    async fn delete(&self, id: RelationId) -> Result<(), DomoError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
