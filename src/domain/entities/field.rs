use super::FarmRecord;
use crate::domain::value_objects::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: RecordId,
    pub name: String,
    pub area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Attributes the core does not model are carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, area: f64) -> Self {
        Self::with_id(RecordId::temporary(), name, area)
    }

    pub fn with_id(id: RecordId, name: impl Into<String>, area: f64) -> Self {
        Self {
            id,
            name: name.into(),
            area,
            area_unit: None,
            crop_type: None,
            location: None,
            soil_type: None,
            notes: None,
            extra: Map::new(),
        }
    }
}

impl FarmRecord for Field {
    const KIND: EntityKind = EntityKind::Fields;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}
