//! Channel service — use-cases for managing device value channels.

use domo_domain::channel::{Channel, ChannelFilter, NewChannel};
use domo_domain::error::{DomoError, NotFoundError};
use domo_domain::id::ChannelId;

use crate::ports::ChannelRepository;

/// Application service for channel CRUD operations.
///
/// Channels are keyed externally by the controller-assigned `value_id`;
/// everything the driver reports flows through `upsert_channel`.
pub struct ChannelService<R> {
    channels: R,
}

impl<R: ChannelRepository> ChannelService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(channels: R) -> Self {
        Self { channels }
    }

    /// Create a new channel after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail, or a storage
    /// error propagated from the repository.
    #[tracing::instrument(skip(self, channel), fields(value_id = %channel.value_id))]
    pub async fn create_channel(&self, channel: NewChannel) -> Result<Channel, DomoError> {
        channel.validate()?;
        self.channels.create(channel).await
    }

    /// Look up a channel by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] when no channel with `id` exists, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_channel(&self, id: ChannelId) -> Result<Channel, DomoError> {
        self.channels.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Channel",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Look up a channel by its controller value id.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] when no channel carries `value_id`,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_value_id(&self, value_id: &str) -> Result<Channel, DomoError> {
        self.channels.get_by_value_id(value_id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Channel",
                id: value_id.to_owned(),
            }
            .into()
        })
    }

    /// List all channels.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_channels(&self) -> Result<Vec<Channel>, DomoError> {
        self.channels.get_all().await
    }

    /// List channels matching every set field of `filter`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_channels(&self, filter: ChannelFilter) -> Result<Vec<Channel>, DomoError> {
        self.channels.find(filter).await
    }

    /// List every channel belonging to the given network node.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_by_node(&self, node_id: i64) -> Result<Vec<Channel>, DomoError> {
        self.channels
            .find(ChannelFilter {
                node_id: Some(node_id),
                ..ChannelFilter::default()
            })
            .await
    }

    /// Update an existing channel.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, channel), fields(channel_id = %channel.id))]
    pub async fn update_channel(&self, channel: Channel) -> Result<Channel, DomoError> {
        channel.validate()?;
        self.channels.update(channel).await
    }

    /// Create or update a channel by its `value_id`.
    ///
    /// If a channel with the same value id already exists, its reported
    /// fields are refreshed (preserving the store id). Otherwise a new
    /// channel is created.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail, or a storage
    /// error propagated from the repository.
    #[tracing::instrument(skip(self, channel), fields(value_id = %channel.value_id))]
    pub async fn upsert_channel(&self, channel: NewChannel) -> Result<Channel, DomoError> {
        channel.validate()?;
        if let Some(existing) = self.channels.get_by_value_id(&channel.value_id).await? {
            let updated = channel.into_channel(existing.id);
            return self.channels.update(updated).await;
        }
        self.channels.create(channel).await
    }

    /// Record a reported value on the channel addressed by `value_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] when no channel carries that value id,
    /// or a storage error propagated from the repository.
    #[tracing::instrument(skip(self, value))]
    pub async fn update_value(&self, value_id: &str, value: String) -> Result<Channel, DomoError> {
        let mut channel = self.get_by_value_id(value_id).await?;
        channel.value = value;
        self.channels.update(channel).await
    }

    /// Delete a channel by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_channel(&self, id: ChannelId) -> Result<(), DomoError> {
        self.channels.delete(id).await
    }

    /// Delete every channel belonging to the given network node.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_node(&self, node_id: i64) -> Result<(), DomoError> {
        self.channels.delete_by_node_id(node_id).await
    }
}
