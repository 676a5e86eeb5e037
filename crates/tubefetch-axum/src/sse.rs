//! SSE progress streamer.
//!
//! Each `/progress` connection owns one bus [`Subscription`]. Events are
//! forwarded as `data: <json>` frames; an idle window without events yields a
//! `data: {}` keep-alive frame. Dropping the response stream (client gone)
//! drops the subscription.

use std::convert::Infallible;

use axum::response::sse::{Event, Sse};
use futures_util::stream::{Stream, StreamExt};
use tubefetch_core::{BusMessage, ProgressBus};

/// Data payload of the keep-alive frame.
pub const KEEP_ALIVE_DATA: &str = "{}";

/// Subscribe to `bus` and build the SSE response for one observer.
///
/// The subscription is taken before returning, so the observer sees every
/// event published after this call.
pub fn progress_stream(
    bus: &ProgressBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + use<>> {
    let subscription = bus.subscribe();
    tracing::debug!(subscriber = subscription.id(), "Progress stream opened");

    let stream = subscription
        .into_stream()
        .filter_map(|message| async move { to_event(&message).map(Ok) });

    Sse::new(stream)
}

fn to_event(message: &BusMessage) -> Option<Event> {
    match message {
        BusMessage::Event(event) => match event.to_json() {
            Ok(json) => Some(Event::default().data(json)),
            Err(e) => {
                tracing::warn!("Failed to serialize progress event: {}", e);
                None
            }
        },
        BusMessage::KeepAlive => Some(Event::default().data(KEEP_ALIVE_DATA)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubefetch_core::{JobId, ProgressEvent};

    #[test]
    fn keep_alive_becomes_empty_object_frame() {
        assert!(to_event(&BusMessage::KeepAlive).is_some());
    }

    #[test]
    fn events_become_frames() {
        let event = ProgressEvent::completed(JobId::new(), "Download complete");
        assert!(to_event(&BusMessage::Event(event)).is_some());
    }

    #[tokio::test]
    async fn stream_subscribes_immediately() {
        let bus = ProgressBus::with_defaults();
        let sse = progress_stream(&bus);
        assert_eq!(bus.subscriber_count(), 1);
        drop(sse);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_does_not_borrow_the_bus() {
        let bus = ProgressBus::with_defaults();
        let sse = {
            let borrowed = bus.clone();
            progress_stream(&borrowed)
        };
        assert_eq!(bus.subscriber_count(), 1);
        drop(sse);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
