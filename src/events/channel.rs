//! Progress channel built on crossbeam-channel.
//!
//! Stage workers run on pool threads, so the sender is cheap to clone and
//! never blocks the pipeline when nobody is listening.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sending half handed to the pipeline and its stages.
#[derive(Clone)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Wrap a raw crossbeam sender.
    pub fn new(sender: Sender<Event>) -> Self {
        Self {
            inner: Some(sender),
        }
    }

    /// A sender that drops every event.
    pub fn null() -> Self {
        Self { inner: None }
    }

    /// Emit an event.
    ///
    /// A disconnected receiver is not an error; the event is dropped.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }
}

/// Receiving half used by the CLI (or any other front end).
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event arrives, or the pipeline drops its sender
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Take an event if one is queued
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate until every sender has been dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Drain whatever is queued right now
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Factory for connected sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create an unbounded channel.
    ///
    /// Events are small and the pipeline emits at most a handful per image.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }
}

/// A sender for headless runs and tests.
pub fn null_sender() -> EventSender {
    EventSender::null()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LoadEvent, LoadProgress, PipelineEvent};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn events_cross_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Load(LoadEvent::Progress(LoadProgress {
                completed: 3,
                total: 10,
                current_path: PathBuf::from("/shots/IMG_0003.jpg"),
            })));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Load(LoadEvent::Progress(p)) => {
                assert_eq!(p.completed, 3);
                assert_eq!(p.total, 10);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_discards_events() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn receiver_ends_when_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Pipeline(PipelineEvent::Started));
        drop(sender);

        assert_eq!(receiver.iter().count(), 1);
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn drain_returns_queued_events() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Pipeline(PipelineEvent::Started));
        sender.send(Event::Pipeline(PipelineEvent::Started));

        assert_eq!(receiver.drain().len(), 2);
        assert!(receiver.try_recv().is_none());
    }
}
