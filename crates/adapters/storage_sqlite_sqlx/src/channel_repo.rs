//! `SQLite` implementation of [`ChannelRepository`].
//!
//! Two field names collide with SQL keywords, so the table stores them under
//! `value_list` (the `values` list, JSON text) and `idx` (the value `index`).

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use domo_app::ports::ChannelRepository;
use domo_domain::channel::{Channel, ChannelFilter, NewChannel};
use domo_domain::error::DomoError;
use domo_domain::id::ChannelId;

use crate::error::StorageError;

struct Wrapper(Channel);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Channel> {
        value.map(|c| c.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let values_json: String = row.try_get("value_list")?;
        let values = serde_json::from_str(&values_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Channel {
            id: ChannelId::new(id),
            value_id: row.try_get("value_id")?,
            name: row.try_get("name")?,
            value: row.try_get("value")?,
            values,
            min_value: row.try_get("min_value")?,
            max_value: row.try_get("max_value")?,
            node_id: row.try_get("node_id")?,
            class_id: row.try_get("class_id")?,
            genre: row.try_get("genre")?,
            kind: row.try_get("kind")?,
            instance: row.try_get("instance")?,
            index: row.try_get("idx")?,
            units: row.try_get("units")?,
            read_only: row.try_get("read_only")?,
            write_only: row.try_get("write_only")?,
            polled: row.try_get("polled")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO channels (value_id, name, value, value_list, min_value, max_value,
                          node_id, class_id, genre, kind, instance, idx, units,
                          read_only, write_only, polled)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM channels WHERE id = ?";
const SELECT_BY_VALUE_ID: &str = "SELECT * FROM channels WHERE value_id = ?";
const SELECT_ALL: &str = "SELECT * FROM channels ORDER BY id";

const UPDATE: &str = r"
    UPDATE channels
    SET value_id = ?, name = ?, value = ?, value_list = ?, min_value = ?,
        max_value = ?, node_id = ?, class_id = ?, genre = ?, kind = ?,
        instance = ?, idx = ?, units = ?, read_only = ?, write_only = ?,
        polled = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM channels WHERE id = ?";
const DELETE_BY_NODE_ID: &str = "DELETE FROM channels WHERE node_id = ?";

/// `SQLite`-backed channel repository.
pub struct SqliteChannelRepository {
    pool: SqlitePool,
}

impl SqliteChannelRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ChannelRepository for SqliteChannelRepository {
    async fn create(&self, channel: NewChannel) -> Result<Channel, DomoError> {
        let values_json = serde_json::to_string(&channel.values).map_err(StorageError::from)?;

        let result = sqlx::query(INSERT)
            .bind(&channel.value_id)
            .bind(&channel.name)
            .bind(&channel.value)
            .bind(&values_json)
            .bind(channel.min_value)
            .bind(channel.max_value)
            .bind(channel.node_id)
            .bind(channel.class_id)
            .bind(&channel.genre)
            .bind(&channel.kind)
            .bind(channel.instance)
            .bind(channel.index)
            .bind(&channel.units)
            .bind(channel.read_only)
            .bind(channel.write_only)
            .bind(channel.polled)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(channel.into_channel(ChannelId::new(result.last_insert_rowid())))
    }

    async fn get_by_id(&self, id: ChannelId) -> Result<Option<Channel>, DomoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_by_value_id(&self, value_id: &str) -> Result<Option<Channel>, DomoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_VALUE_ID)
            .bind(value_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Channel>, DomoError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|c| c.0).collect())
    }

    async fn find(&self, filter: ChannelFilter) -> Result<Vec<Channel>, DomoError> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM channels WHERE 1 = 1");
        if let Some(value_id) = filter.value_id {
            builder.push(" AND value_id = ").push_bind(value_id);
        }
        if let Some(node_id) = filter.node_id {
            builder.push(" AND node_id = ").push_bind(node_id);
        }
        if let Some(class_id) = filter.class_id {
            builder.push(" AND class_id = ").push_bind(class_id);
        }
        if let Some(genre) = filter.genre {
            builder.push(" AND genre = ").push_bind(genre);
        }
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind);
        }
        builder.push(" ORDER BY id");

        let rows: Vec<Wrapper> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|c| c.0).collect())
    }

    async fn update(&self, channel: Channel) -> Result<Channel, DomoError> {
        let values_json = serde_json::to_string(&channel.values).map_err(StorageError::from)?;

        sqlx::query(UPDATE)
            .bind(&channel.value_id)
            .bind(&channel.name)
            .bind(&channel.value)
            .bind(&values_json)
            .bind(channel.min_value)
            .bind(channel.max_value)
            .bind(channel.node_id)
            .bind(channel.class_id)
            .bind(&channel.genre)
            .bind(&channel.kind)
            .bind(channel.instance)
            .bind(channel.index)
            .bind(&channel.units)
            .bind(channel.read_only)
            .bind(channel.write_only)
            .bind(channel.polled)
            .bind(channel.id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(channel)
    }

    async fn delete(&self, id: ChannelId) -> Result<(), DomoError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn delete_by_node_id(&self, node_id: i64) -> Result<(), DomoError> {
        sqlx::query(DELETE_BY_NODE_ID)
            .bind(node_id)
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

    async fn setup() -> SqliteChannelRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteChannelRepository::new(db.pool().clone())
    }

    fn switch(node_id: i64) -> NewChannel {
        Channel::builder()
            .value_id(format!("{node_id}-37-1-0"))
            .name("Switch")
            .node_id(node_id)
            .class_id(37)
            .genre("user")
            .kind("bool")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_and_fetch_channel() {
        let repo = setup().await;
        let channel = repo.create(switch(5)).await.unwrap();

        let fetched = repo.get_by_id(channel.id).await.unwrap().unwrap();
        assert_eq!(fetched.value_id, "5-37-1-0");
        assert_eq!(fetched.class_id, 37);
        assert_eq!(fetched.instance, 1);
    }

    #[tokio::test]
    async fn should_round_trip_value_list_and_index() {
        let repo = setup().await;
        let channel = repo
            .create(
                Channel::builder()
                    .value_id("5-112-1-4")
                    .node_id(5)
                    .values(vec!["Off".to_string(), "On".to_string()])
                    .index(4)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let fetched = repo.get_by_id(channel.id).await.unwrap().unwrap();
        assert_eq!(fetched.values, vec!["Off".to_string(), "On".to_string()]);
        assert_eq!(fetched.index, 4);
    }

    #[tokio::test]
    async fn should_fetch_by_value_id() {
        let repo = setup().await;
        repo.create(switch(5)).await.unwrap();
        repo.create(switch(9)).await.unwrap();

        let fetched = repo.get_by_value_id("9-37-1-0").await.unwrap().unwrap();
        assert_eq!(fetched.node_id, 9);
        assert!(repo.get_by_value_id("12-37-1-0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_find_by_node_and_genre() {
        let repo = setup().await;
        repo.create(switch(5)).await.unwrap();
        repo.create(
            Channel::builder()
                .value_id("5-128-1-0")
                .node_id(5)
                .genre("system")
                .build()
                .unwrap(),
        )
        .await
        .unwrap();

        let found = repo
            .find(ChannelFilter {
                node_id: Some(5),
                genre: Some("user".to_string()),
                ..ChannelFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value_id, "5-37-1-0");
    }

    #[tokio::test]
    async fn should_delete_all_channels_of_a_node() {
        let repo = setup().await;
        repo.create(switch(5)).await.unwrap();
        repo.create(
            Channel::builder()
                .value_id("5-49-1-1")
                .node_id(5)
                .build()
                .unwrap(),
        )
        .await
        .unwrap();
        let kept = repo.create(switch(9)).await.unwrap();

        repo.delete_by_node_id(5).await.unwrap();

        let remaining = repo.get_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
    }

    #[tokio::test]
    async fn should_update_channel_value() {
        let repo = setup().await;
        let mut channel = repo.create(switch(5)).await.unwrap();

        channel.value = "True".to_string();
        repo.update(channel.clone()).await.unwrap();

        let fetched = repo.get_by_value_id("5-37-1-0").await.unwrap().unwrap();
        assert_eq!(fetched.value, "True");
    }
}
