use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeKind {
    Request,
    Ack,
}

/// One entry on the shared channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: MessageId,
    pub kind: EnvelopeKind,
    pub body: String,
    pub timestamp: NaiveDateTime,
}

impl Envelope {
    pub fn request(id: MessageId, body: impl Into<String>) -> Self {
        Self {
            id,
            kind: EnvelopeKind::Request,
            body: body.into(),
            timestamp: chrono::Utc::now().naive_utc(),
        }
    }

    /// The acknowledgment answering this envelope; it carries the same id
    pub fn acknowledge(&self) -> Self {
        Self {
            id: self.id,
            kind: EnvelopeKind::Ack,
            body: format!("ack:{}", self.body),
            timestamp: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn is_request(&self) -> bool {
        self.kind == EnvelopeKind::Request
    }

    pub fn is_ack(&self) -> bool {
        self.kind == EnvelopeKind::Ack
    }
}

/// Where a message is in its round trip.
///
/// `Pending -> Delivered -> Acknowledged` happens on the consumer side,
/// `Acknowledged -> Received` on the producer side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryState {
    Pending,
    Delivered,
    Acknowledged,
    Received,
}

impl DeliveryState {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Delivered),
            Self::Delivered => Some(Self::Acknowledged),
            Self::Acknowledged => Some(Self::Received),
            Self::Received => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Acknowledged | Self::Received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledge_keeps_id() {
        let request = Envelope::request(3, "m3");
        let ack = request.acknowledge();
        assert_eq!(ack.id, 3);
        assert!(ack.is_ack());
        assert_eq!(ack.body, "ack:m3");
    }

    #[test]
    fn test_state_progression() {
        let mut state = DeliveryState::Pending;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            state = next;
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                DeliveryState::Pending,
                DeliveryState::Delivered,
                DeliveryState::Acknowledged,
                DeliveryState::Received
            ]
        );
        assert!(!DeliveryState::Delivered.is_terminal());
    }
}
