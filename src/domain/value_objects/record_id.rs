use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TEMP_ID_PREFIX: &str = "temp_";

const TEMP_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TEMP_SUFFIX_LEN: usize = 9;

/// Stable identifier of a farm record.
///
/// Ids minted on the device carry the `temp_` prefix so they can never collide
/// with identifiers issued by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    /// `temp_<ms timestamp>_<random base36>`.
    pub fn temporary() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..TEMP_SUFFIX_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..TEMP_SUFFIX_ALPHABET.len());
                TEMP_SUFFIX_ALPHABET[idx] as char
            })
            .collect();
        Self(format!(
            "{TEMP_ID_PREFIX}{}_{suffix}",
            Utc::now().timestamp_millis()
        ))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Record id cannot be empty".to_string());
        }
        if value.len() > 256 {
            return Err("Record id is too long".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}
