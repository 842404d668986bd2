//! Producer ("client") role

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::errors::{FrameworkError, Result};
use crate::exchange::channel::SharedChannel;
use crate::exchange::envelope::{DeliveryState, Envelope, MessageId};

/// Final state of every message the producer sent, in send order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProducerReport {
    pub outcomes: Vec<(MessageId, DeliveryState)>,
    /// Acknowledgments that arrived after their wait had ended
    pub late_acks: Vec<MessageId>,
    /// The channel closed before every message was sent
    pub cancelled: bool,
}

impl ProducerReport {
    pub fn sent(&self) -> usize {
        self.outcomes.len()
    }

    pub fn received(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, state)| *state == DeliveryState::Received)
            .count()
    }
}

/// Sends a fixed number of requests, waiting for each acknowledgment
pub struct Producer {
    channel: Arc<SharedChannel>,
    count: usize,
    reply_timeout: Duration,
}

impl Producer {
    pub fn new(channel: Arc<SharedChannel>, count: usize, reply_timeout: Duration) -> Self {
        Self {
            channel,
            count,
            reply_timeout,
        }
    }

    /// Run the producer protocol to completion.
    ///
    /// Closing the channel cancels the run: the report then covers the
    /// messages sent so far, the one in flight left `Pending`.
    pub fn run(&self) -> Result<ProducerReport> {
        let mut report = ProducerReport::default();

        for i in 0..self.count {
            let id = i as MessageId;
            let request = Envelope::request(id, format!("m{i}"));
            tracing::info!(id, body = %request.body, "Client sending");
            match self.channel.push(request) {
                Ok(()) => {}
                Err(FrameworkError::ChannelClosed) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            }

            match self.await_ack(id, &mut report) {
                Ok(state) => report.outcomes.push((id, state)),
                Err(FrameworkError::ChannelClosed) => {
                    report.outcomes.push((id, DeliveryState::Pending));
                    report.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if report.cancelled {
            tracing::warn!(
                sent = report.sent(),
                stage = "exchange",
                "Client cancelled by channel close"
            );
        }
        tracing::info!(
            sent = report.sent(),
            received = report.received(),
            "Client finished"
        );
        Ok(report)
    }

    /// Wait for the acknowledgment of `id`. Older acknowledgments still in
    /// the channel belong to requests whose wait already ended.
    fn await_ack(&self, id: MessageId, report: &mut ProducerReport) -> Result<DeliveryState> {
        let deadline = Instant::now().checked_add(self.reply_timeout);
        loop {
            let remaining =
                deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()));
            match self.channel.recv_matching(Envelope::is_ack, remaining)? {
                Some(ack) if ack.id == id => {
                    tracing::info!(id, body = %ack.body, "Client received");
                    return Ok(DeliveryState::Received);
                }
                Some(stale) => {
                    tracing::warn!(
                        expected = id,
                        got = stale.id,
                        stage = "exchange",
                        "Discarding acknowledgment for another message"
                    );
                    report.late_acks.push(stale.id);
                }
                None => {
                    let timeout_ms =
                        u64::try_from(self.reply_timeout.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(
                        id,
                        stage = "exchange",
                        timeout_ms,
                        "No acknowledgment before timeout"
                    );
                    return Ok(DeliveryState::Pending);
                }
            }
        }
    }
}
