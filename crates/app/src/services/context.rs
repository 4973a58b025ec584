//! Concrete [`TechnologyContext`] backed by application services.

use std::sync::Arc;

use async_trait::async_trait;

use domo_domain::addressable::ZWAVE_TECHNOLOGY;
use domo_domain::channel::{Channel, NewChannel};
use domo_domain::device::{Device, NewDevice};
use domo_domain::error::DomoError;
use domo_domain::event::Event;
use domo_domain::object::{NewObject, Object, ObjectFilter};

use crate::ports::{
    ChannelRepository, DeviceRepository, EventPublisher, ObjectRepository, TechnologyContext,
    WidgetRepository,
};
use crate::services::channel_service::ChannelService;
use crate::services::device_service::DeviceService;
use crate::services::object_service::ObjectService;

/// [`TechnologyContext`] implementation that delegates to the object,
/// device, and channel services plus an [`EventPublisher`].
///
/// Wraps `Arc`-ed services so it is cheaply cloneable and `Send + Sync`.
/// The generic parameters are confined to this struct — technologies see
/// only the [`TechnologyContext`] trait.
pub struct ServiceContext<OR, WR, DR, CR, EP> {
    object_service: Arc<ObjectService<OR, WR, EP>>,
    device_service: Arc<DeviceService<DR>>,
    channel_service: Arc<ChannelService<CR>>,
    event_publisher: EP,
}

impl<OR, WR, DR, CR, EP> ServiceContext<OR, WR, DR, CR, EP> {
    /// Create a new context backed by the given services and event publisher.
    pub fn new(
        object_service: Arc<ObjectService<OR, WR, EP>>,
        device_service: Arc<DeviceService<DR>>,
        channel_service: Arc<ChannelService<CR>>,
        event_publisher: EP,
    ) -> Self {
        Self {
            object_service,
            device_service,
            channel_service,
            event_publisher,
        }
    }
}

impl<OR, WR, DR, CR, EP: Clone> Clone for ServiceContext<OR, WR, DR, CR, EP> {
    fn clone(&self) -> Self {
        Self {
            object_service: Arc::clone(&self.object_service),
            device_service: Arc::clone(&self.device_service),
            channel_service: Arc::clone(&self.channel_service),
            event_publisher: self.event_publisher.clone(),
        }
    }
}

#[async_trait]
impl<OR, WR, DR, CR, EP> TechnologyContext for ServiceContext<OR, WR, DR, CR, EP>
where
    OR: ObjectRepository + Send + Sync + 'static,
    WR: WidgetRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    CR: ChannelRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    async fn upsert_object(&self, object: NewObject) -> Result<Object, DomoError> {
        self.object_service.upsert_object(object).await
    }

    async fn update_object_value(
        &self,
        technology: &str,
        technology_id: &str,
        value: String,
        status: i64,
    ) -> Result<Object, DomoError> {
        self.object_service
            .update_object_value(technology, technology_id, value, status)
            .await
    }

    async fn upsert_device(&self, device: NewDevice) -> Result<Device, DomoError> {
        self.device_service.upsert_device(device).await
    }

    async fn upsert_channel(&self, channel: NewChannel) -> Result<Channel, DomoError> {
        self.channel_service.upsert_channel(channel).await
    }

    async fn update_channel_value(
        &self,
        value_id: &str,
        value: String,
    ) -> Result<Channel, DomoError> {
        self.channel_service.update_value(value_id, value).await
    }

    async fn remove_node(&self, node_id: i64) -> Result<(), DomoError> {
        // Mirror objects first, then the channels they mirror, then the
        // device row. Driver-initiated cleanup overrides protection.
        let channels = self.channel_service.list_by_node(node_id).await?;
        for channel in channels {
            let mirrors = self
                .object_service
                .find_objects(ObjectFilter {
                    technology: Some(ZWAVE_TECHNOLOGY.to_owned()),
                    technology_id: Some(channel.value_id.clone()),
                    ..ObjectFilter::default()
                })
                .await?;
            for mirror in mirrors {
                self.object_service.remove_object(mirror.id, true).await?;
            }
        }
        self.channel_service.delete_by_node(node_id).await?;
        self.device_service.delete_by_node(node_id).await
    }

    async fn publish(&self, event: Event) -> Result<(), DomoError> {
        self.event_publisher.publish(event).await
    }
}
