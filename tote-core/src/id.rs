//! # Identifiers
//!
//! Newtype identifiers for the engine's entities. All of them are opaque:
//! the engine compares them for equality and nothing else, so hosts are
//! free to mint actor ids from whatever identity layer they run.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID (for hosts that persist ids).
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a market registry entry.
    MarketId
);
uuid_id!(
    /// Identifier of a prediction event.
    EventId
);
uuid_id!(
    /// Identifier of a bettor's position.
    PositionId
);
uuid_id!(
    /// Identifier of an acting party: admin, event creator, oracle, or bettor.
    ActorId
);

/// Identifier of an oracle price feed: 32 raw bytes, hex in transit.
///
/// A price-driven event pins one feed id at creation and refuses readings
/// from any other feed at resolution time.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct FeedId([u8; 32]);

impl FeedId {
    /// Byte length of a feed id.
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string into a feed id.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| EngineError::Validation(format!("feed id is not valid hex: {e}")))?;
        let bytes: [u8; Self::LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            EngineError::Validation(format!(
                "feed id must be {} bytes, got {}",
                Self::LEN,
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", self.to_hex())
    }
}

impl TryFrom<String> for FeedId {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<FeedId> for String {
    fn from(id: FeedId) -> Self {
        id.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(MarketId::new(), MarketId::new());
        assert_ne!(EventId::new(), EventId::new());
        assert_ne!(PositionId::new(), PositionId::new());
        assert_ne!(ActorId::new(), ActorId::new());
    }

    #[test]
    fn test_id_serde_roundtrip() {
        let id = EventId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back, "event id should survive serialization");
    }

    #[test]
    fn test_feed_id_hex_roundtrip() {
        let hex = "ee96d4b9c5e16f3b11e33bb27fe39ae7a57daa6b24210de5b39237993742cc0a";
        let feed = FeedId::from_hex(hex).unwrap();
        assert_eq!(feed.to_hex(), hex);
        assert_eq!(feed.to_string(), hex);
    }

    #[test]
    fn test_feed_id_rejects_bad_input() {
        assert!(FeedId::from_hex("zz").is_err(), "non-hex should be rejected");
        assert!(
            FeedId::from_hex("aabb").is_err(),
            "short input should be rejected"
        );
        let long = "00".repeat(33);
        assert!(
            FeedId::from_hex(&long).is_err(),
            "long input should be rejected"
        );
    }

    #[test]
    fn test_feed_id_serde_as_hex_string() {
        let hex = "00".repeat(32);
        let feed = FeedId::from_hex(&hex).unwrap();
        let json = serde_json::to_string(&feed).unwrap();
        assert_eq!(json, format!("\"{hex}\""));
        let back: FeedId = serde_json::from_str(&json).unwrap();
        assert_eq!(feed, back);
    }
}
