//! Runs the producer and the consumer on their own threads

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::core::config::ExchangeConfig;
use crate::core::errors::{FrameworkError, Result};
use crate::exchange::channel::SharedChannel;
use crate::exchange::consumer::{Consumer, ConsumerReport};
use crate::exchange::envelope::{DeliveryState, MessageId};
use crate::exchange::producer::{Producer, ProducerReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReport {
    pub producer: ProducerReport,
    pub consumer: ConsumerReport,
}

impl ExchangeReport {
    /// Furthest state each sent message reached on either side, in send order
    pub fn states(&self) -> Vec<(MessageId, DeliveryState)> {
        self.producer
            .outcomes
            .iter()
            .map(|&(id, state)| match state {
                DeliveryState::Received => (id, state),
                _ => (id, self.consumer.state_of(id).unwrap_or(state)),
            })
            .collect()
    }

    /// Every sent message finished its round trip on at least one side
    pub fn is_settled(&self) -> bool {
        self.states().iter().all(|(_, state)| state.is_terminal())
    }
}

/// A running producer/consumer pair sharing one channel
pub struct Exchange {
    channel: Arc<SharedChannel>,
    producer: JoinHandle<Result<ProducerReport>>,
    consumer: JoinHandle<ConsumerReport>,
}

impl Exchange {
    /// Spawn the consumer, then the producer
    pub fn start(channel: Arc<SharedChannel>, config: &ExchangeConfig) -> Result<Self> {
        tracing::info!("Starting server...");
        let consumer = {
            let consumer = Consumer::new(channel.clone());
            thread::Builder::new()
                .name("titanoboa-server".to_string())
                .spawn(move || consumer.run())
                .map_err(|e| FrameworkError::io("spawn server thread", e))?
        };

        tracing::info!("Starting client...");
        let producer = Producer::new(channel.clone(), config.message_count, config.reply_timeout());
        let producer = match thread::Builder::new()
            .name("titanoboa-client".to_string())
            .spawn(move || producer.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                channel.close();
                let _ = consumer.join();
                return Err(FrameworkError::io("spawn client thread", e));
            }
        };

        Ok(Self {
            channel,
            producer,
            consumer,
        })
    }

    pub fn channel(&self) -> &Arc<SharedChannel> {
        &self.channel
    }

    /// Wait for the producer to send everything, then stop the consumer
    pub fn finish(self) -> Result<ExchangeReport> {
        let producer = self.producer.join();
        self.channel.close();
        let consumer = join(self.consumer, "server")?;
        let producer = producer
            .map_err(|_| FrameworkError::internal("client thread panicked"))??;
        Ok(ExchangeReport { producer, consumer })
    }

    /// Cancel both roles now.
    ///
    /// The producer stops where it is and reports what it sent; the consumer
    /// answers the requests still queued, then stops.
    pub fn shutdown(self) -> Result<ExchangeReport> {
        self.channel.close();
        let consumer = join(self.consumer, "server")?;
        let producer = join(self.producer, "client")??;
        Ok(ExchangeReport { producer, consumer })
    }
}

fn join<T>(handle: JoinHandle<T>, role: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| FrameworkError::internal(format!("{role} thread panicked")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_for_every_message() {
        let channel = Arc::new(SharedChannel::unbounded());
        let config = ExchangeConfig {
            message_count: 5,
            reply_timeout_ms: 2000,
            capacity: None,
        };
        let report = Exchange::start(channel.clone(), &config)
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(report.consumer.delivered(), vec![0, 1, 2, 3, 4]);
        assert_eq!(report.consumer.acknowledged(), vec![0, 1, 2, 3, 4]);
        assert_eq!(report.producer.received(), 5);
        assert!(report
            .states()
            .iter()
            .all(|(_, state)| *state == DeliveryState::Received));
        assert!(report.is_settled());
        assert!(channel.is_empty());
        assert!(channel.is_closed());
    }

    #[test]
    fn test_shutdown_with_nothing_to_send() {
        let channel = Arc::new(SharedChannel::bounded(2));
        let config = ExchangeConfig {
            message_count: 0,
            reply_timeout_ms: 10,
            capacity: Some(2),
        };
        let exchange = Exchange::start(channel, &config).unwrap();
        let report = exchange.shutdown().unwrap();
        assert!(report.consumer.outcomes.is_empty());
        assert_eq!(report.producer.sent(), 0);
    }

    #[test]
    fn test_shutdown_mid_run_keeps_partial_reports() {
        let channel = Arc::new(SharedChannel::unbounded());
        let config = ExchangeConfig {
            message_count: 1_000_000,
            reply_timeout_ms: 2000,
            capacity: None,
        };
        let exchange = Exchange::start(channel.clone(), &config).unwrap();
        let report = exchange.shutdown().unwrap();

        assert!(report.producer.cancelled);
        assert!(report.producer.sent() < 1_000_000);
        assert_eq!(channel.queued_requests(), 0);
        // every request the consumer took was answered
        assert_eq!(report.consumer.delivered(), report.consumer.acknowledged());
        for (id, state) in report.states() {
            assert!(
                state == DeliveryState::Pending || state.is_terminal(),
                "message {id} stuck in {state:?}"
            );
        }
    }
}
