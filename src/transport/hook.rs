use super::{EventRouter, Publisher, TransportError};
use crate::event::{
    names, AnonymousPayload, GetPayload, InboundEvent, RemovePayload, ScatterPayload,
    UpsertPayload, ValidationError,
};
use crate::surface::{RenderingSurface, SceneReplay, SceneSnapshot};
use crate::tracker::{EntityView, LiveEntityTracker, Position, ScatterArea};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Work item for the event loop that owns the tracker
#[derive(Debug)]
pub enum TrackerCommand {
    /// Route an inbound event to its handlers
    Event(InboundEvent),
    /// Snapshot every tracked entity
    List(oneshot::Sender<Vec<EntityView>>),
    /// Snapshot one entity
    Get(String, oneshot::Sender<Option<EntityView>>),
    /// Draw commands rebuilding the current scene, plus the stream after it
    Replay(oneshot::Sender<SceneSnapshot>),
}

/// Cloneable handle for talking to a running event loop
#[derive(Clone, Debug)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerCommand>,
}

impl TrackerHandle {
    pub fn new(tx: mpsc::Sender<TrackerCommand>) -> Self {
        Self { tx }
    }

    /// Queue an event without waiting for queue space
    pub fn push(&self, event: InboundEvent) -> Result<(), TransportError> {
        self.tx
            .try_send(TrackerCommand::Event(event))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            })
    }

    pub async fn list(&self) -> Result<Vec<EntityView>, TransportError> {
        self.request(TrackerCommand::List).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<EntityView>, TransportError> {
        let id = id.to_string();
        self.request(|reply| TrackerCommand::Get(id, reply)).await
    }

    pub async fn replay(&self) -> Result<SceneSnapshot, TransportError> {
        self.request(TrackerCommand::Replay).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> TrackerCommand,
    ) -> Result<T, TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| TransportError::Closed)?;
        reply_rx.await.map_err(|_| TransportError::Closed)
    }
}

/// Build the router with every tracker event subscribed.
///
/// `area` bounds where `scatter_entities` places random entities, and
/// `max_scatter` caps how many one event may ask for.
pub fn tracker_router<S>(
    area: ScatterArea,
    max_scatter: usize,
) -> EventRouter<LiveEntityTracker<S>>
where
    S: RenderingSurface + 'static,
{
    let mut router = EventRouter::new();

    router.subscribe(names::UPSERT_ENTITY, |tracker: &mut LiveEntityTracker<S>, event, _| {
        let payload: UpsertPayload = event.parse_payload()?;
        tracker.upsert(
            payload.id,
            Position::new(payload.lat, payload.lng),
            payload.heading,
            payload.metadata,
        )?;
        Ok(())
    });

    router.subscribe(names::ADD_ENTITY, |tracker: &mut LiveEntityTracker<S>, event, publisher| {
        let payload: AnonymousPayload = event.parse_payload()?;
        let view = tracker
            .upsert_anonymous(
                &mut rand::thread_rng(),
                Position::new(payload.lat, payload.lng),
                payload.heading,
                payload.metadata,
            )?
            .view();
        publisher.publish(names::ENTITY_UPSERTED, serde_json::to_value(view)?)?;
        Ok(())
    });

    router.subscribe(names::REMOVE_ENTITY, |tracker: &mut LiveEntityTracker<S>, event, publisher| {
        let payload: RemovePayload = event.parse_payload()?;
        let existed = tracker.remove(&payload.id)?;
        publisher.publish(
            names::ENTITY_REMOVED,
            json!({ "id": payload.id, "existed": existed }),
        )?;
        Ok(())
    });

    router.subscribe(names::CLEAR_ENTITIES, |tracker: &mut LiveEntityTracker<S>, _, publisher| {
        let count = tracker.clear()?;
        publisher.publish(names::ENTITIES_CLEARED, json!({ "count": count }))?;
        Ok(())
    });

    router.subscribe(names::LIST_ENTITIES, |tracker: &mut LiveEntityTracker<S>, _, publisher| {
        publisher.publish(names::ENTITY_IDS, json!({ "ids": tracker.list_ids() }))?;
        Ok(())
    });

    router.subscribe(names::GET_ENTITY, |tracker: &mut LiveEntityTracker<S>, event, publisher| {
        let payload: GetPayload = event.parse_payload()?;
        let view = tracker.get(&payload.id).map(|entity| entity.view());
        publisher.publish(names::ENTITY, json!({ "id": payload.id, "entity": view }))?;
        Ok(())
    });

    router.subscribe(
        names::SCATTER_ENTITIES,
        move |tracker: &mut LiveEntityTracker<S>, event, publisher| {
            let payload: ScatterPayload = event.parse_payload()?;
            if payload.count > max_scatter {
                return Err(ValidationError::InvalidPayload(
                    event.event.clone(),
                    format!("count {} exceeds limit of {}", payload.count, max_scatter),
                )
                .into());
            }
            let ids = tracker.scatter(&mut rand::thread_rng(), payload.count, area)?;
            publisher.publish(names::ENTITIES_SCATTERED, json!({ "ids": ids }))?;
            Ok(())
        },
    );

    router
}

/// Own the tracker and apply commands one at a time until every sender
/// is dropped, then hand the tracker back.
///
/// Handler failures are logged and do not stop the loop.
pub async fn run_event_loop<S>(
    mut tracker: LiveEntityTracker<S>,
    mut router: EventRouter<LiveEntityTracker<S>>,
    publisher: Arc<dyn Publisher>,
    mut rx: mpsc::Receiver<TrackerCommand>,
) -> LiveEntityTracker<S>
where
    S: RenderingSurface + SceneReplay,
{
    info!("Tracker event loop started");

    while let Some(command) = rx.recv().await {
        match command {
            TrackerCommand::Event(event) => {
                let event_id = event.event_id.as_deref().unwrap_or("-");
                match router.dispatch(&mut tracker, &event, publisher.as_ref()) {
                    Ok(0) => {
                        warn!(event = %event.event, event_id = %event_id, "No handler for event, skipping");
                    }
                    Ok(_) => {
                        debug!(event = %event.event, event_id = %event_id, "Event handled");
                    }
                    Err(e) => {
                        error!(event = %event.event, event_id = %event_id, error = %e, "Failed to handle event");
                    }
                }
            }
            TrackerCommand::List(reply) => {
                let _ = reply.send(tracker.views());
            }
            TrackerCommand::Get(id, reply) => {
                let _ = reply.send(tracker.get(&id).map(|entity| entity.view()));
            }
            TrackerCommand::Replay(reply) => {
                let _ = reply.send(tracker.surface().snapshot());
            }
        }
    }

    info!(entities = tracker.len(), "Tracker event loop stopped");
    tracker
}
