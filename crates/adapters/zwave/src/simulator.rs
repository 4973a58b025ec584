//! In-process scripted Z-Wave controller.
//!
//! Lets the daemon and the tests run the full pair/set/unpair cycle without
//! a serial stick. Each inclusion adds one scripted wall-switch node with a
//! switch channel and a read-only temperature channel; node 1 is reserved
//! for the controller itself.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;

use domo_domain::channel::NewChannel;
use domo_domain::device::NewDevice;

use crate::address::ValueAddress;
use crate::driver::{ZWaveDriver, ZWaveNotification};
use crate::error::ZWaveError;

const FIRST_NODE_ID: i64 = 2;
const NOTIFICATION_CAPACITY: usize = 16;

struct SimulatedNode {
    device: NewDevice,
    channels: Vec<NewChannel>,
}

impl SimulatedNode {
    fn wall_switch(node_id: i64, secure: bool) -> Self {
        let device = NewDevice {
            node_id,
            name: "Simulated wall switch".to_string(),
            description: if secure {
                "included with key exchange".to_string()
            } else {
                String::new()
            },
            product: "SIM-SW1".to_string(),
            product_type: "0x0001".to_string(),
            product_id: "0x0001".to_string(),
            manufacturer: "Domo Labs".to_string(),
            manufacturer_id: "0xdead".to_string(),
        };

        let switch = NewChannel {
            value_id: ValueAddress::new(node_id, 37, 1, 0).to_string(),
            name: "Switch".to_string(),
            value: "False".to_string(),
            values: Vec::new(),
            min_value: 0,
            max_value: 0,
            node_id,
            class_id: 37,
            genre: "user".to_string(),
            kind: "bool".to_string(),
            instance: 1,
            index: 0,
            units: String::new(),
            read_only: false,
            write_only: false,
            polled: false,
        };

        let temperature = NewChannel {
            value_id: ValueAddress::new(node_id, 49, 1, 1).to_string(),
            name: "Temperature".to_string(),
            value: "21.0".to_string(),
            values: Vec::new(),
            min_value: -40,
            max_value: 85,
            node_id,
            class_id: 49,
            genre: "user".to_string(),
            kind: "decimal".to_string(),
            instance: 1,
            index: 1,
            units: "C".to_string(),
            read_only: true,
            write_only: false,
            polled: true,
        };

        Self {
            device,
            channels: vec![switch, temperature],
        }
    }
}

struct SimulatorState {
    running: bool,
    next_node_id: i64,
    nodes: BTreeMap<i64, SimulatedNode>,
}

/// Scripted [`ZWaveDriver`] implementation.
pub struct SimulatedDriver {
    state: Mutex<SimulatorState>,
    notifications: broadcast::Sender<ZWaveNotification>,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            state: Mutex::new(SimulatorState {
                running: false,
                next_node_id: FIRST_NODE_ID,
                nodes: BTreeMap::new(),
            }),
            notifications,
        }
    }
}

impl SimulatedDriver {
    /// Number of nodes currently on the simulated network.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.lock_state().nodes.len()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SimulatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, notification: ZWaveNotification) {
        // broadcast::send fails only when there are zero receivers,
        // which is fine here.
        let _ = self.notifications.send(notification);
    }
}

#[async_trait]
impl ZWaveDriver for SimulatedDriver {
    async fn connect(&self) -> Result<(), ZWaveError> {
        self.lock_state().running = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ZWaveError> {
        self.lock_state().running = false;
        Ok(())
    }

    async fn add_node(&self, secure: bool) -> Result<(), ZWaveError> {
        let (device, channels) = {
            let mut state = self.lock_state();
            if !state.running {
                return Err(ZWaveError::NotRunning);
            }

            let node_id = state.next_node_id;
            state.next_node_id += 1;

            let node = SimulatedNode::wall_switch(node_id, secure);
            let device = node.device.clone();
            let channels = node.channels.clone();
            state.nodes.insert(node_id, node);
            (device, channels)
        };

        self.notify(ZWaveNotification::NodeAdded { device });
        for channel in channels {
            self.notify(ZWaveNotification::ValueAdded { channel });
        }
        Ok(())
    }

    async fn cancel(&self) -> Result<(), ZWaveError> {
        if !self.lock_state().running {
            return Err(ZWaveError::NotRunning);
        }
        Ok(())
    }

    async fn remove_node(&self) -> Result<(), ZWaveError> {
        let removed = {
            let mut state = self.lock_state();
            if !state.running {
                return Err(ZWaveError::NotRunning);
            }
            state.nodes.pop_last().map(|(node_id, _)| node_id)
        };

        // Exclusion on an empty network completes without a notification.
        if let Some(node_id) = removed {
            self.notify(ZWaveNotification::NodeRemoved { node_id });
        }
        Ok(())
    }

    async fn reset(&self, hard: bool) -> Result<(), ZWaveError> {
        let removed: Vec<i64> = {
            let mut state = self.lock_state();
            if !state.running {
                return Err(ZWaveError::NotRunning);
            }
            if !hard {
                return Ok(());
            }
            state.next_node_id = FIRST_NODE_ID;
            std::mem::take(&mut state.nodes).into_keys().collect()
        };

        for node_id in removed {
            self.notify(ZWaveNotification::NodeRemoved { node_id });
        }
        Ok(())
    }

    async fn set_value(&self, address: &ValueAddress, value: &str) -> Result<(), ZWaveError> {
        let value_id = address.to_string();
        {
            let mut state = self.lock_state();
            if !state.running {
                return Err(ZWaveError::NotRunning);
            }

            let channel = state
                .nodes
                .get_mut(&address.node_id)
                .and_then(|node| {
                    node.channels
                        .iter_mut()
                        .find(|channel| channel.value_id == value_id)
                })
                .ok_or_else(|| ZWaveError::UnknownValue {
                    address: value_id.clone(),
                })?;
            channel.value = value.to_string();
        }

        self.notify(ZWaveNotification::ValueChanged {
            value_id,
            value: value.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ZWaveNotification> {
        self.notifications.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_reject_commands_before_connect() {
        let driver = SimulatedDriver::default();
        assert!(matches!(
            driver.add_node(false).await,
            Err(ZWaveError::NotRunning)
        ));
        assert!(matches!(
            driver.set_value(&ValueAddress::new(2, 37, 1, 0), "True").await,
            Err(ZWaveError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn should_include_scripted_node_when_pairing() {
        let driver = SimulatedDriver::default();
        let mut rx = driver.subscribe();
        driver.connect().await.unwrap();

        driver.add_node(true).await.unwrap();

        let added = rx.recv().await.unwrap();
        let ZWaveNotification::NodeAdded { device } = added else {
            panic!("expected NodeAdded, got {added:?}");
        };
        assert_eq!(device.node_id, 2);
        assert!(device.description.contains("key exchange"));

        for _ in 0..2 {
            let value = rx.recv().await.unwrap();
            assert!(matches!(value, ZWaveNotification::ValueAdded { .. }));
        }
        assert_eq!(driver.node_count(), 1);
    }

    #[tokio::test]
    async fn should_emit_value_changed_when_setting_existing_channel() {
        let driver = SimulatedDriver::default();
        driver.connect().await.unwrap();
        driver.add_node(false).await.unwrap();
        let mut rx = driver.subscribe();

        driver
            .set_value(&ValueAddress::new(2, 37, 1, 0), "True")
            .await
            .unwrap();

        let notification = rx.recv().await.unwrap();
        let ZWaveNotification::ValueChanged { value_id, value } = notification else {
            panic!("expected ValueChanged, got {notification:?}");
        };
        assert_eq!(value_id, "2-37-1-0");
        assert_eq!(value, "True");
    }

    #[tokio::test]
    async fn should_error_on_unknown_address() {
        let driver = SimulatedDriver::default();
        driver.connect().await.unwrap();

        let result = driver.set_value(&ValueAddress::new(9, 37, 1, 0), "True").await;
        assert!(matches!(
            result,
            Err(ZWaveError::UnknownValue { ref address }) if address == "9-37-1-0"
        ));
    }

    #[tokio::test]
    async fn should_exclude_most_recent_node() {
        let driver = SimulatedDriver::default();
        driver.connect().await.unwrap();
        driver.add_node(false).await.unwrap();
        driver.add_node(false).await.unwrap();
        let mut rx = driver.subscribe();

        driver.remove_node().await.unwrap();

        let notification = rx.recv().await.unwrap();
        assert!(matches!(
            notification,
            ZWaveNotification::NodeRemoved { node_id: 3 }
        ));
        assert_eq!(driver.node_count(), 1);
    }

    #[tokio::test]
    async fn should_complete_exclusion_quietly_on_empty_network() {
        let driver = SimulatedDriver::default();
        driver.connect().await.unwrap();
        let mut rx = driver.subscribe();

        driver.remove_node().await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_wipe_network_on_hard_reset() {
        let driver = SimulatedDriver::default();
        driver.connect().await.unwrap();
        driver.add_node(false).await.unwrap();
        driver.add_node(false).await.unwrap();
        let mut rx = driver.subscribe();

        driver.reset(true).await.unwrap();

        assert_eq!(driver.node_count(), 0);
        for _ in 0..2 {
            let notification = rx.recv().await.unwrap();
            assert!(matches!(
                notification,
                ZWaveNotification::NodeRemoved { .. }
            ));
        }

        // Node ids restart after a wipe.
        driver.add_node(false).await.unwrap();
        let added = rx.recv().await.unwrap();
        let ZWaveNotification::NodeAdded { device } = added else {
            panic!("expected NodeAdded, got {added:?}");
        };
        assert_eq!(device.node_id, 2);
    }

    #[tokio::test]
    async fn should_keep_network_on_soft_reset() {
        let driver = SimulatedDriver::default();
        driver.connect().await.unwrap();
        driver.add_node(false).await.unwrap();

        driver.reset(false).await.unwrap();
        assert_eq!(driver.node_count(), 1);
    }
}
