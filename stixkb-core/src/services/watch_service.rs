use std::pin::Pin;

use futures_util::Stream;
use sea_orm::{DatabaseConnection, EntityTrait};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::{capabilities, require_capability, Actor};
use crate::bus::{BusMessage, BusTopic, EventBus};
use crate::database::entities::stix_cyber_observables::{self, Entity as StixCyberObservables};
use crate::errors::{CoreError, CoreResult};
use crate::presence::{EditContextRegistry, PresenceGuard};

pub type ObservableStream = Pin<Box<dyn Stream<Item = stix_cyber_observables::Model> + Send>>;

/// Live edits of one observable, as seen by one user.
#[derive(Clone)]
pub struct WatchService {
    db: DatabaseConnection,
    bus: EventBus,
    presence: EditContextRegistry,
}

impl WatchService {
    pub fn new(db: DatabaseConnection, bus: EventBus, presence: EditContextRegistry) -> Self {
        Self { db, bus, presence }
    }

    /// Opens a watch on observable `id`.
    ///
    /// Caller and observable are validated before anything is registered, so
    /// a rejected watch leaves no marker behind. Once open, the stream yields
    /// the observable after every edit made by someone else, in bus order.
    /// It ends when `cancel` fires, when the bus announces the caller's
    /// disconnect, or when the bus closes. Its presence marker is cleared
    /// exactly once, including when the stream is dropped early.
    pub async fn watch_observable(
        &self,
        actor: Actor,
        id: String,
        cancel: CancellationToken,
    ) -> CoreResult<ObservableStream> {
        let user_id = actor.require_user_id()?.to_string();
        require_capability(&actor, capabilities::KNOWLEDGE)?;
        StixCyberObservables::find_by_id(id.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Stix-Cyber-Observable", id.as_str()))?;

        let mut rx = self.bus.subscribe(BusTopic::ObservableEdit);
        let guard = PresenceGuard::acquire(&self.presence, &id, &user_id, &actor.name);
        debug!(id = %id, user_id = %user_id, "watch opened");

        let db = self.db.clone();
        let bus = self.bus.clone();
        let stream = async_stream::stream! {
            loop {
                let received = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    received = rx.recv() => Some(received),
                };
                let Some(received) = received else {
                    debug!(id = %id, user_id = %user_id, "watch cancelled");
                    break;
                };
                match received {
                    Ok(BusMessage::Edit { user, instance }) => {
                        if instance.id == id && user.id != user_id {
                            yield instance;
                        }
                    }
                    Ok(BusMessage::Disconnected { user_id: gone }) if gone == user_id => {
                        debug!(id = %id, user_id = %user_id, "watch ended by disconnect");
                        break;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(id = %id, skipped, "watch lagging behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            // Let remaining watchers know the context changed.
            if guard.release() {
                if let Ok(Some(instance)) = StixCyberObservables::find_by_id(id.clone()).one(&db).await {
                    bus.notify_edit(&actor, instance);
                }
            }
            drop(rx);
            let dropped = bus.cleanup_idle();
            if dropped > 0 {
                debug!(dropped, remaining = bus.topic_count(), "idle bus topics dropped");
            }
        };

        Ok(Box::pin(stream))
    }
}
