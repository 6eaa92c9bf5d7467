use serde::{Serialize, de::DeserializeOwned};

/// Largest encoded snapshot accepted in either direction.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024; // 256 KiB

#[derive(Debug)]
pub enum SnapshotError {
    Empty,
    TooLarge(usize),
    Serialize(String),
    Deserialize(String),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty snapshot"),
            Self::TooLarge(size) => {
                write!(
                    f,
                    "snapshot too large: {size} bytes (max {MAX_SNAPSHOT_SIZE})"
                )
            },
            Self::Serialize(e) => write!(f, "serialize error: {e}"),
            Self::Deserialize(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Encode state as MessagePack.
pub fn encode_snapshot<T: Serialize>(state: &T) -> Result<Vec<u8>, SnapshotError> {
    let bytes = rmp_serde::to_vec(state).map_err(|e| SnapshotError::Serialize(e.to_string()))?;
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(SnapshotError::TooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Decode state produced by [`encode_snapshot`].
pub fn decode_snapshot<T: DeserializeOwned>(data: &[u8]) -> Result<T, SnapshotError> {
    if data.is_empty() {
        return Err(SnapshotError::Empty);
    }
    if data.len() > MAX_SNAPSHOT_SIZE {
        return Err(SnapshotError::TooLarge(data.len()));
    }
    rmp_serde::from_slice(data).map_err(|e| SnapshotError::Deserialize(e.to_string()))
}
