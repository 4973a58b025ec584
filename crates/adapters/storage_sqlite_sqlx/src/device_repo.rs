//! `SQLite` implementation of [`DeviceRepository`].
//!
//! `node_id` carries a UNIQUE constraint; inclusion reconciles by node id, so
//! the same physical node never yields two rows.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use domo_app::ports::DeviceRepository;
use domo_domain::device::{Device, DeviceFilter, NewDevice};
use domo_domain::error::DomoError;
use domo_domain::id::DeviceId;

use crate::error::StorageError;

struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|d| d.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;

        Ok(Self(Device {
            id: DeviceId::new(id),
            node_id: row.try_get("node_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            product: row.try_get("product")?,
            product_type: row.try_get("product_type")?,
            product_id: row.try_get("product_id")?,
            manufacturer: row.try_get("manufacturer")?,
            manufacturer_id: row.try_get("manufacturer_id")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO devices (node_id, name, description, product, product_type,
                         product_id, manufacturer, manufacturer_id)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE id = ?";
const SELECT_BY_NODE_ID: &str = "SELECT * FROM devices WHERE node_id = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY id";

const UPDATE: &str = r"
    UPDATE devices
    SET node_id = ?, name = ?, description = ?, product = ?, product_type = ?,
        product_id = ?, manufacturer = ?, manufacturer_id = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM devices WHERE id = ?";
const DELETE_BY_NODE_ID: &str = "DELETE FROM devices WHERE node_id = ?";

/// `SQLite`-backed device repository.
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    async fn create(&self, device: NewDevice) -> Result<Device, DomoError> {
        let result = sqlx::query(INSERT)
            .bind(device.node_id)
            .bind(&device.name)
            .bind(&device.description)
            .bind(&device.product)
            .bind(&device.product_type)
            .bind(&device.product_id)
            .bind(&device.manufacturer)
            .bind(&device.manufacturer_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(device.into_device(DeviceId::new(result.last_insert_rowid())))
    }

    async fn get_by_id(&self, id: DeviceId) -> Result<Option<Device>, DomoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_by_node_id(&self, node_id: i64) -> Result<Option<Device>, DomoError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NODE_ID)
            .bind(node_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Device>, DomoError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|d| d.0).collect())
    }

    async fn find(&self, filter: DeviceFilter) -> Result<Vec<Device>, DomoError> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM devices WHERE 1 = 1");
        if let Some(node_id) = filter.node_id {
            builder.push(" AND node_id = ").push_bind(node_id);
        }
        if let Some(name) = filter.name {
            builder.push(" AND name = ").push_bind(name);
        }
        if let Some(manufacturer) = filter.manufacturer {
            builder.push(" AND manufacturer = ").push_bind(manufacturer);
        }
        if let Some(product) = filter.product {
            builder.push(" AND product = ").push_bind(product);
        }
        builder.push(" ORDER BY id");

        let rows: Vec<Wrapper> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|d| d.0).collect())
    }

    async fn update(&self, device: Device) -> Result<Device, DomoError> {
        sqlx::query(UPDATE)
            .bind(device.node_id)
            .bind(&device.name)
            .bind(&device.description)
            .bind(&device.product)
            .bind(&device.product_type)
            .bind(&device.product_id)
            .bind(&device.manufacturer)
            .bind(&device.manufacturer_id)
            .bind(device.id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(device)
    }

    async fn delete(&self, id: DeviceId) -> Result<(), DomoError> {
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
