//! Channels from the layout engine to whoever listens to it.
//!
//! Every message carries the span it was sent from, so a consumer on another
//! thread can log under the engine's context.

use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{Span, trace};

pub mod broadcast;

pub struct Sender<Event>(UnboundedSender<(Span, Event)>);
pub type Receiver<Event> = UnboundedReceiver<(Span, Event)>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    /// Sends `event`, dropping it if nobody is listening any more.
    pub fn send(&self, event: Event) {
        if self.try_send(event).is_err() {
            trace!("receiver is gone, event dropped");
        }
    }

    pub fn try_send(&self, event: Event) -> Result<(), SendError<(Span, Event)>> {
        self.0.send((Span::current(), event))
    }

    /// Whether the receiving side has been dropped.
    pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Event> std::fmt::Debug for Sender<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("actor::Sender(...)")
    }
}

/// Everything queued on `rx` right now, oldest first. Never waits.
pub fn drain<Event>(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok((_span, event)) = rx.try_recv() {
        events.push(event);
    }
    events
}
