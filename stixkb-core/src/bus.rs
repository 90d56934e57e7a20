//! Process-wide publish/subscribe bus for knowledge events.

use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use tokio::sync::broadcast;
use tracing::debug;

use crate::auth::Actor;
use crate::database::entities::stix_cyber_observables;
use crate::utils::EventBroadcaster;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum BusTopic {
    #[strum(serialize = "STIX_CYBER_OBSERVABLE_EDIT_TOPIC")]
    ObservableEdit,
    #[strum(serialize = "STIX_CYBER_OBSERVABLE_ADDED_TOPIC")]
    ObservableAdded,
    #[strum(serialize = "STIX_CYBER_OBSERVABLE_DELETE_TOPIC")]
    ObservableDeleted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BusUser {
    pub id: String,
    pub name: String,
}

impl BusUser {
    pub fn from_actor(actor: &Actor) -> Self {
        Self {
            id: actor.user_id.clone().unwrap_or_default(),
            name: actor.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BusMessage {
    Edit {
        user: BusUser,
        instance: stix_cyber_observables::Model,
    },
    Added {
        user: BusUser,
        instance: stix_cyber_observables::Model,
    },
    Deleted {
        user: BusUser,
        id: String,
    },
    /// The user's session ended; every stream opened by that user must end.
    Disconnected { user_id: String },
}

impl BusMessage {
    pub fn user_id(&self) -> &str {
        match self {
            BusMessage::Edit { user, .. }
            | BusMessage::Added { user, .. }
            | BusMessage::Deleted { user, .. } => &user.id,
            BusMessage::Disconnected { user_id } => user_id,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    broadcaster: EventBroadcaster<BusTopic, BusMessage>,
}

impl EventBus {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            broadcaster: EventBroadcaster::new(buffer_size),
        }
    }

    pub fn subscribe(&self, topic: BusTopic) -> broadcast::Receiver<BusMessage> {
        self.broadcaster.subscribe(topic)
    }

    pub fn publish(&self, topic: BusTopic, message: BusMessage) -> usize {
        let delivered = self.broadcaster.publish(&topic, message);
        debug!(%topic, delivered, "bus message published");
        delivered
    }

    pub fn notify_edit(&self, actor: &Actor, instance: stix_cyber_observables::Model) -> usize {
        self.publish(
            BusTopic::ObservableEdit,
            BusMessage::Edit {
                user: BusUser::from_actor(actor),
                instance,
            },
        )
    }

    pub fn notify_added(&self, actor: &Actor, instance: stix_cyber_observables::Model) -> usize {
        self.publish(
            BusTopic::ObservableAdded,
            BusMessage::Added {
                user: BusUser::from_actor(actor),
                instance,
            },
        )
    }

    pub fn notify_deleted(&self, actor: &Actor, id: String) -> usize {
        self.publish(
            BusTopic::ObservableDeleted,
            BusMessage::Deleted {
                user: BusUser::from_actor(actor),
                id,
            },
        )
    }

    /// Fans the disconnect out on every topic so any stream of the user ends.
    pub fn disconnect(&self, user_id: &str) -> usize {
        BusTopic::iter()
            .map(|topic| {
                self.publish(
                    topic,
                    BusMessage::Disconnected {
                        user_id: user_id.to_string(),
                    },
                )
            })
            .sum()
    }

    /// Drops topic channels nobody listens to any more.
    pub fn cleanup_idle(&self) -> usize {
        self.broadcaster.cleanup_idle()
    }

    /// Topics that currently have a channel.
    pub fn topic_count(&self) -> usize {
        self.broadcaster.channel_count()
    }
}
