//! Producer/consumer exchange over one shared channel

pub mod channel;
pub mod consumer;
pub mod envelope;
pub mod producer;
pub mod session;

pub use channel::SharedChannel;
pub use consumer::{Consumer, ConsumerReport};
pub use envelope::{DeliveryState, Envelope, EnvelopeKind, MessageId};
pub use producer::{Producer, ProducerReport};
pub use session::{Exchange, ExchangeReport};
