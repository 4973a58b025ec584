//! Storage port — repository traits for persistence.
//!
//! One trait per schema table. Every trait offers create/read/update/delete
//! keyed by primary key plus a query-by-filter operation; the store assigns
//! primary keys on create, so `create` accepts the `New*` draft form and
//! returns the persisted row.

use std::future::Future;

use domo_domain::channel::{Channel, ChannelFilter, NewChannel};
use domo_domain::device::{Device, DeviceFilter, NewDevice};
use domo_domain::error::DomoError;
use domo_domain::id::{ChannelId, DeviceId, ObjectId, RelationId, TechnologyTypeId, WidgetId};
use domo_domain::object::{NewObject, Object, ObjectFilter};
use domo_domain::relation::{NewRelation, Relation, RelationFilter};
use domo_domain::technology_type::{NewTechnologyType, TechnologyType, TechnologyTypeFilter};
use domo_domain::widget::{NewWidget, Widget, WidgetFilter};

/// Repository for [`Object`] rows.
pub trait ObjectRepository {
    /// Persist a new object and return it with its assigned id.
    fn create(&self, object: NewObject)
    -> impl Future<Output = Result<Object, DomoError>> + Send;

    /// Get an object by its primary key.
    fn get_by_id(
        &self,
        id: ObjectId,
    ) -> impl Future<Output = Result<Option<Object>, DomoError>> + Send;

    /// List all objects.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Object>, DomoError>> + Send;

    /// List objects matching every set field of `filter`.
    fn find(
        &self,
        filter: ObjectFilter,
    ) -> impl Future<Output = Result<Vec<Object>, DomoError>> + Send;

    /// Replace an existing row, keyed by `object.id`.
    fn update(&self, object: Object) -> impl Future<Output = Result<Object, DomoError>> + Send;

    /// Delete an object by id. Deleting an absent id is a no-op.
    fn delete(&self, id: ObjectId) -> impl Future<Output = Result<(), DomoError>> + Send;
}

/// Repository for [`Widget`] rows.
pub trait WidgetRepository {
    /// Persist a new widget and return it with its assigned id.
    fn create(&self, widget: NewWidget)
    -> impl Future<Output = Result<Widget, DomoError>> + Send;

    /// Get a widget by its primary key.
    fn get_by_id(
        &self,
        id: WidgetId,
    ) -> impl Future<Output = Result<Option<Widget>, DomoError>> + Send;

    /// List all widgets.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Widget>, DomoError>> + Send;

    /// List widgets matching every set field of `filter`.
    fn find(
        &self,
        filter: WidgetFilter,
    ) -> impl Future<Output = Result<Vec<Widget>, DomoError>> + Send;

    /// Replace an existing row, keyed by `widget.id`.
    fn update(&self, widget: Widget) -> impl Future<Output = Result<Widget, DomoError>> + Send;

    /// Delete a widget by id. Deleting an absent id is a no-op.
    fn delete(&self, id: WidgetId) -> impl Future<Output = Result<(), DomoError>> + Send;
}

/// Repository for [`Relation`] rows.
///
/// Listing operations return relations ordered by `order_num` ascending,
/// ties broken by id, so graph walks see siblings in a stable order.
pub trait RelationRepository {
    /// Persist a new relation and return it with its assigned id.
    fn create(
        &self,
        relation: NewRelation,
    ) -> impl Future<Output = Result<Relation, DomoError>> + Send;

    /// Get a relation by its primary key.
    fn get_by_id(
        &self,
        id: RelationId,
    ) -> impl Future<Output = Result<Option<Relation>, DomoError>> + Send;

    /// List all relations, ordered by `order_num` ascending.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Relation>, DomoError>> + Send;

    /// List relations matching every set field of `filter`, ordered by
    /// `order_num` ascending.
    fn find(
        &self,
        filter: RelationFilter,
    ) -> impl Future<Output = Result<Vec<Relation>, DomoError>> + Send;

    /// Replace an existing row, keyed by `relation.id`.
    fn update(
        &self,
        relation: Relation,
    ) -> impl Future<Output = Result<Relation, DomoError>> + Send;

    /// Delete a relation by id. Deleting an absent id is a no-op.
    fn delete(&self, id: RelationId) -> impl Future<Output = Result<(), DomoError>> + Send;
}

/// Repository for [`TechnologyType`] rows.
pub trait TechnologyTypeRepository {
    /// Persist a new technology type and return it with its assigned id.
    fn create(
        &self,
        technology_type: NewTechnologyType,
    ) -> impl Future<Output = Result<TechnologyType, DomoError>> + Send;

    /// Get a technology type by its primary key.
    fn get_by_id(
        &self,
        id: TechnologyTypeId,
    ) -> impl Future<Output = Result<Option<TechnologyType>, DomoError>> + Send;

    /// List all technology types.
    fn get_all(&self) -> impl Future<Output = Result<Vec<TechnologyType>, DomoError>> + Send;

    /// List technology types matching every set field of `filter`.
    fn find(
        &self,
        filter: TechnologyTypeFilter,
    ) -> impl Future<Output = Result<Vec<TechnologyType>, DomoError>> + Send;

    /// Replace an existing row, keyed by `technology_type.id`.
    fn update(
        &self,
        technology_type: TechnologyType,
    ) -> impl Future<Output = Result<TechnologyType, DomoError>> + Send;

    /// Delete a technology type by id. Deleting an absent id is a no-op.
    fn delete(&self, id: TechnologyTypeId) -> impl Future<Output = Result<(), DomoError>> + Send;
}

/// Repository for [`Device`] rows.
pub trait DeviceRepository {
    /// Persist a new device and return it with its assigned id.
    fn create(&self, device: NewDevice)
    -> impl Future<Output = Result<Device, DomoError>> + Send;

    /// Get a device by its primary key.
    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, DomoError>> + Send;

    /// Get a device by its network node id (unique per network).
    fn get_by_node_id(
        &self,
        node_id: i64,
    ) -> impl Future<Output = Result<Option<Device>, DomoError>> + Send;

    /// List all devices.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, DomoError>> + Send;

    /// List devices matching every set field of `filter`.
    fn find(
        &self,
        filter: DeviceFilter,
    ) -> impl Future<Output = Result<Vec<Device>, DomoError>> + Send;

    /// Replace an existing row, keyed by `device.id`.
    fn update(&self, device: Device) -> impl Future<Output = Result<Device, DomoError>> + Send;

    /// Delete a device by id. Deleting an absent id is a no-op.
    fn delete(&self, id: DeviceId) -> impl Future<Output = Result<(), DomoError>> + Send;

    /// Delete the device with the given network node id, if any.
    fn delete_by_node_id(&self, node_id: i64)
    -> impl Future<Output = Result<(), DomoError>> + Send;
}

/// Repository for [`Channel`] rows.
pub trait ChannelRepository {
    /// Persist a new channel and return it with its assigned id.
    fn create(
        &self,
        channel: NewChannel,
    ) -> impl Future<Output = Result<Channel, DomoError>> + Send;

    /// Get a channel by its primary key.
    fn get_by_id(
        &self,
        id: ChannelId,
    ) -> impl Future<Output = Result<Option<Channel>, DomoError>> + Send;

    /// Get a channel by its controller-assigned value id (unique per network).
    fn get_by_value_id(
        &self,
        value_id: &str,
    ) -> impl Future<Output = Result<Option<Channel>, DomoError>> + Send;

    /// List all channels.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Channel>, DomoError>> + Send;

    /// List channels matching every set field of `filter`.
    fn find(
        &self,
        filter: ChannelFilter,
    ) -> impl Future<Output = Result<Vec<Channel>, DomoError>> + Send;

    /// Replace an existing row, keyed by `channel.id`.
    fn update(&self, channel: Channel) -> impl Future<Output = Result<Channel, DomoError>> + Send;

    /// Delete a channel by id. Deleting an absent id is a no-op.
    fn delete(&self, id: ChannelId) -> impl Future<Output = Result<(), DomoError>> + Send;

    /// Delete every channel belonging to the given network node.
    fn delete_by_node_id(&self, node_id: i64)
    -> impl Future<Output = Result<(), DomoError>> + Send;
}
