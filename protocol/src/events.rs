//! # Event Handles
//!
//! Append-only event streams, one per handle.
//!
//! A handle is identified by an [`EventGuid`]: the owning account plus a
//! per-account creation number. The ledger keeps each handle's counter and
//! its records, so emission rolls back together with every other mutation
//! of a failed operation.
//!
//! Payloads are stored as `serde_json::Value` next to a string `type_tag`.
//! Typed views are the callers' business (see the contracts crate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::AccountAddress;

/// Globally unique identifier of an event handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventGuid {
    /// Account that created the handle.
    pub address: AccountAddress,
    /// Per-account creation counter at the time the handle was made.
    pub creation_number: u64,
}

impl fmt::Display for EventGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.address, self.creation_number)
    }
}

impl fmt::Debug for EventGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventGuid({}#{})", self.address.short(), self.creation_number)
    }
}

/// Ledger-side state of one handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHandle {
    /// The handle's identity.
    pub guid: EventGuid,
    /// Number of events emitted so far; also the next sequence number.
    pub counter: u64,
}

impl EventHandle {
    /// A fresh handle with no events.
    pub fn new(guid: EventGuid) -> Self {
        Self { guid, counter: 0 }
    }
}

/// A single emitted event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Handle the event was emitted on.
    pub guid: EventGuid,
    /// Position within the handle's stream, starting at 0.
    pub sequence_number: u64,
    /// Payload kind, e.g. `"Minted"`.
    pub type_tag: String,
    /// Payload body.
    pub data: serde_json::Value,
    /// Wall-clock emission time.
    pub emitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handle_starts_at_zero() {
        let guid = EventGuid {
            address: AccountAddress::from_name("token"),
            creation_number: 3,
        };
        let handle = EventHandle::new(guid);
        assert_eq!(handle.counter, 0);
        assert_eq!(handle.guid, guid);
    }

    #[test]
    fn guid_display_includes_creation_number() {
        let guid = EventGuid {
            address: AccountAddress::ZERO,
            creation_number: 7,
        };
        assert!(guid.to_string().ends_with("#7"));
    }

    #[test]
    fn record_serializes_with_guid_and_tag() {
        let record = EventRecord {
            guid: EventGuid {
                address: AccountAddress::ZERO,
                creation_number: 0,
            },
            sequence_number: 1,
            type_tag: "Minted".into(),
            data: serde_json::json!({ "amount": 5 }),
            emitted_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type_tag"], "Minted");
        assert_eq!(json["sequence_number"], 1);
        assert_eq!(json["data"]["amount"], 5);
    }
}
