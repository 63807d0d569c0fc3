use super::RecordId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ID_KEY: &str = "id";

/// Bare domain payload of a record: a JSON object carrying an `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Value")]
pub struct RecordPayload(Value);

impl RecordPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn from_record<T: Serialize>(record: &T) -> Result<Self, String> {
        let value =
            serde_json::to_value(record).map_err(|e| format!("Unserializable record: {e}"))?;
        Self::new(value)
    }

    /// `{ "id": <id> }`, the payload carried by delete entries.
    pub fn identity(id: &RecordId) -> Self {
        let mut map = Map::new();
        map.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        Self(Value::Object(map))
    }

    pub fn record_id(&self) -> Result<RecordId, String> {
        match self.0.get(ID_KEY) {
            Some(Value::String(id)) => RecordId::new(id.clone()),
            Some(_) => Err("Record payload id must be a string".to_string()),
            None => Err("Record payload has no id".to_string()),
        }
    }

    /// Copy of the payload with `id` replaced.
    pub fn with_id(&self, id: &RecordId) -> Self {
        let mut map = self.to_map();
        map.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        Self(Value::Object(map))
    }

    /// Shallow merge: every key in `patch` overwrites the stored value.
    pub fn merged_with(&self, patch: &RecordPatch) -> Self {
        let mut map = self.to_map();
        for (key, value) in patch.as_map() {
            map.insert(key.clone(), value.clone());
        }
        Self(Value::Object(map))
    }

    /// Everything except `id`, as a patch.
    pub fn without_id(&self) -> RecordPatch {
        let mut map = self.to_map();
        map.remove(ID_KEY);
        RecordPatch(map)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    fn to_map(&self) -> Map<String, Value> {
        self.0.as_object().cloned().unwrap_or_default()
    }

    fn validate(value: &Value) -> Result<(), String> {
        if !value.is_object() {
            return Err("Record payload must be a JSON object".to_string());
        }
        Ok(())
    }
}

impl TryFrom<Value> for RecordPayload {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordPayload> for Value {
    fn from(payload: RecordPayload) -> Self {
        payload.0
    }
}

/// Partial record used by updates. Keys present overwrite, keys absent are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordPatch(Map<String, Value>);

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err("Record patch must be a JSON object".to_string()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON patch: {e}"))?;
        Self::from_value(value)
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get(ID_KEY)
    }

    pub fn remove_id(&mut self) -> Option<Value> {
        self.0.remove(ID_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// `{ "id": <id>, ...patch }`, the payload carried by update entries.
    pub fn to_payload(&self, id: &RecordId) -> RecordPayload {
        RecordPayload::identity(id).merged_with(self).with_id(id)
    }
}
