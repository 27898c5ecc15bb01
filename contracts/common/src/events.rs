//! Pool Events
//!
//! Events are emitted while a call executes and can be indexed off-chain
//! for dashboards and notifications. They are only kept when the call's
//! group commits.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use crate::types::{Address, AppId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Pool Events (0x01 - 0x1F)
    PoolCreated = 0x01,
    FundsWithdrawn = 0x02,

    // Participant Events (0x20 - 0x3F)
    ParticipantEnrolled = 0x20,
    ContributionReceived = 0x21,
    ParticipantPaidInFull = 0x22,
    ParticipantExited = 0x23,
    LocalStateCleared = 0x24,
}

/// Main event enum containing all pool events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolEvent {
    // ============ Pool Events ============

    /// Emitted when the pool is instantiated
    PoolCreated {
        app_id: AppId,
        creator: Address,
        pool_name: Vec<u8>,
        contribution_amount: u64,
        round: u64,
    },

    /// Emitted when the creator withdraws
    FundsWithdrawn {
        creator: Address,
        amount: u64,
        total_funds: u64,
        round: u64,
    },

    // ============ Participant Events ============

    /// Emitted when an account opts in (or re-enrolls)
    ParticipantEnrolled {
        account: Address,
        round: u64,
    },

    /// Emitted for every accepted contribution
    ContributionReceived {
        account: Address,
        amount: u64,
        amount_paid: u64,
        total_funds: u64,
        round: u64,
    },

    /// Emitted once, on the contribution that completes the required amount
    ParticipantPaidInFull {
        account: Address,
        amount_paid: u64,
        round: u64,
    },

    /// Emitted on close-out; `amount_paid` stays in the pool
    ParticipantExited {
        account: Address,
        amount_paid: u64,
        round: u64,
    },

    /// Emitted when local state is forcibly cleared
    LocalStateCleared {
        account: Address,
        round: u64,
    },
}

impl PoolEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::PoolCreated { .. } => EventType::PoolCreated,
            Self::FundsWithdrawn { .. } => EventType::FundsWithdrawn,
            Self::ParticipantEnrolled { .. } => EventType::ParticipantEnrolled,
            Self::ContributionReceived { .. } => EventType::ContributionReceived,
            Self::ParticipantPaidInFull { .. } => EventType::ParticipantPaidInFull,
            Self::ParticipantExited { .. } => EventType::ParticipantExited,
            Self::LocalStateCleared { .. } => EventType::LocalStateCleared,
        }
    }

    /// Get the round when the event occurred
    pub fn round(&self) -> u64 {
        match self {
            Self::PoolCreated { round, .. } => *round,
            Self::FundsWithdrawn { round, .. } => *round,
            Self::ParticipantEnrolled { round, .. } => *round,
            Self::ContributionReceived { round, .. } => *round,
            Self::ParticipantPaidInFull { round, .. } => *round,
            Self::ParticipantExited { round, .. } => *round,
            Self::LocalStateCleared { round, .. } => *round,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<PoolEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Move every event of `other` to the end of this log
    pub fn append(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&PoolEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = PoolEvent::ContributionReceived {
            account: [2u8; 32],
            amount: 1_000_000,
            amount_paid: 1_000_000,
            total_funds: 1_000_000,
            round: 100,
        };

        assert_eq!(event.event_type(), EventType::ContributionReceived);
        assert_eq!(event.round(), 100);
    }

    #[test]
    fn test_event_serialization() {
        let event = PoolEvent::PoolCreated {
            app_id: 1001,
            creator: [1u8; 32],
            pool_name: b"Groceries".to_vec(),
            contribution_amount: 1_000_000,
            round: 200,
        };

        let bytes = event.to_bytes();
        let restored = PoolEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(PoolEvent::ParticipantEnrolled {
            account: [2u8; 32],
            round: 100,
        });

        log.emit(PoolEvent::ContributionReceived {
            account: [2u8; 32],
            amount: 500_000,
            amount_paid: 500_000,
            total_funds: 500_000,
            round: 101,
        });

        assert_eq!(log.len(), 2);
        assert!(!log.is_empty());

        let enrollments = log.filter_by_type(EventType::ParticipantEnrolled);
        assert_eq!(enrollments.len(), 1);

        let mut other = EventLog::new();
        other.emit(PoolEvent::LocalStateCleared {
            account: [2u8; 32],
            round: 102,
        });
        log.append(other);
        assert_eq!(log.len(), 3);
    }
}
