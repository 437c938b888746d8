use super::Publisher;
use crate::event::InboundEvent;
use std::collections::HashMap;

/// Handler invoked with the routing context, the event, and a publisher
/// for response events
pub type Handler<C> =
    Box<dyn FnMut(&mut C, &InboundEvent, &dyn Publisher) -> anyhow::Result<()> + Send>;

/// Routes named events to subscribed handlers
pub struct EventRouter<C> {
    handlers: HashMap<String, Vec<Handler<C>>>,
}

impl<C> EventRouter<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `event`; handlers for the same name run in
    /// registration order
    pub fn subscribe<F>(&mut self, event: &str, handler: F)
    where
        F: FnMut(&mut C, &InboundEvent, &dyn Publisher) -> anyhow::Result<()> + Send + 'static,
    {
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    pub fn is_subscribed(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Run every handler registered for the event.
    ///
    /// Stops at the first failing handler. Returns how many handlers ran;
    /// zero means nobody subscribed to this name.
    pub fn dispatch(
        &mut self,
        ctx: &mut C,
        event: &InboundEvent,
        publisher: &dyn Publisher,
    ) -> anyhow::Result<usize> {
        let Some(handlers) = self.handlers.get_mut(&event.event) else {
            return Ok(0);
        };

        for handler in handlers.iter_mut() {
            handler(ctx, event, publisher)?;
        }
        Ok(handlers.len())
    }
}

impl<C> Default for EventRouter<C> {
    fn default() -> Self {
        Self::new()
    }
}
