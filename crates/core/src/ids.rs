use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Width of the stored binary identifier column.
pub const PLAYER_ID_LEN: usize = 16;

/// Opaque 128-bit player identifier.
///
/// Stored as 16 bytes: the high 64 bits followed by the low 64 bits, each
/// half big-endian. This matches the canonical byte order of a UUID, so the
/// hyphenated form printed by `Display` is the one hosts usually hand out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; PLAYER_ID_LEN] {
        let (high, low) = self.0.as_u64_pair();
        let mut buf = [0u8; PLAYER_ID_LEN];
        buf[..8].copy_from_slice(&high.to_be_bytes());
        buf[8..].copy_from_slice(&low.to_be_bytes());
        buf
    }

    pub fn from_bytes(bytes: [u8; PLAYER_ID_LEN]) -> Self {
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&bytes[..8]);
        low.copy_from_slice(&bytes[8..]);
        Self(Uuid::from_u64_pair(
            u64::from_be_bytes(high),
            u64::from_be_bytes(low),
        ))
    }

    /// Decode a stored identifier of unknown length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; PLAYER_ID_LEN] = bytes
            .try_into()
            .map_err(|_| CoreError::MalformedIdentifier { len: bytes.len() })?;
        Ok(Self::from_bytes(arr))
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", &self.0.to_string()[..8])
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::InvalidIdentifier(e.to_string()))
    }
}

impl From<Uuid> for PlayerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
