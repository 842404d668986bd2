//! Consumer ("server") role

use std::sync::Arc;

use crate::core::errors::FrameworkError;
use crate::exchange::channel::SharedChannel;
use crate::exchange::envelope::{DeliveryState, MessageId};

/// Consumer-side state of every request it took, in delivery order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub outcomes: Vec<(MessageId, DeliveryState)>,
}

impl ConsumerReport {
    pub fn delivered(&self) -> Vec<MessageId> {
        self.outcomes.iter().map(|(id, _)| *id).collect()
    }

    pub fn acknowledged(&self) -> Vec<MessageId> {
        self.outcomes
            .iter()
            .filter(|(_, state)| *state == DeliveryState::Acknowledged)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn state_of(&self, id: MessageId) -> Option<DeliveryState> {
        self.outcomes
            .iter()
            .find(|(other, _)| *other == id)
            .map(|(_, state)| *state)
    }
}

fn advance(state: DeliveryState) -> DeliveryState {
    state.next().unwrap_or(state)
}

/// Answers every request with an acknowledgment.
///
/// Once the channel is closed the consumer still answers the requests left
/// in it, then stops.
pub struct Consumer {
    channel: Arc<SharedChannel>,
}

impl Consumer {
    pub fn new(channel: Arc<SharedChannel>) -> Self {
        Self { channel }
    }

    pub fn run(&self) -> ConsumerReport {
        let mut report = ConsumerReport::default();
        loop {
            let request = match self.channel.recv_request() {
                Ok(request) => request,
                Err(FrameworkError::ChannelClosed) => break,
                Err(e) => {
                    tracing::error!(stage = "exchange", error = %e, "Server receive failed");
                    break;
                }
            };
            let mut state = advance(DeliveryState::Pending);
            tracing::info!(id = request.id, body = %request.body, "Server received");

            match self.channel.push(request.acknowledge()) {
                Ok(()) => state = advance(state),
                Err(e) => tracing::error!(
                    id = request.id,
                    stage = "exchange",
                    error = %e,
                    "Server could not acknowledge"
                ),
            }
            report.outcomes.push((request.id, state));
        }
        tracing::info!(delivered = report.outcomes.len(), "Server stopped");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::envelope::Envelope;
    use std::thread;

    #[test]
    fn test_acks_each_request_then_stops_on_close() {
        let channel = Arc::new(SharedChannel::unbounded());
        for i in 0..3 {
            channel.push(Envelope::request(i, format!("m{i}"))).unwrap();
        }

        let consumer = {
            let channel = channel.clone();
            thread::spawn(move || Consumer::new(channel).run())
        };
        while channel.snapshot().iter().filter(|e| e.is_ack()).count() < 3 {
            thread::yield_now();
        }
        channel.close();
        let report = consumer.join().unwrap();

        assert_eq!(report.delivered(), vec![0, 1, 2]);
        assert_eq!(report.acknowledged(), vec![0, 1, 2]);
        let bodies: Vec<_> = channel.snapshot().into_iter().map(|e| e.body).collect();
        assert_eq!(bodies, vec!["ack:m0", "ack:m1", "ack:m2"]);
    }

    #[test]
    fn test_requests_left_at_close_are_still_acknowledged() {
        let channel = Arc::new(SharedChannel::unbounded());
        channel.push(Envelope::request(0, "m0")).unwrap();
        channel.push(Envelope::request(1, "m1")).unwrap();
        channel.close();

        let report = Consumer::new(channel.clone()).run();
        assert_eq!(report.delivered(), report.acknowledged());
        assert_eq!(report.state_of(1), Some(DeliveryState::Acknowledged));
        assert!(channel.snapshot().iter().all(Envelope::is_ack));
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn test_closed_empty_channel_returns_immediately() {
        let channel = Arc::new(SharedChannel::unbounded());
        channel.close();
        let report = Consumer::new(channel).run();
        assert!(report.outcomes.is_empty());
    }
}
