use super::FarmRecord;
use crate::domain::value_objects::{EntityKind, RecordId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: RecordId,
    pub source: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<RecordId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Income {
    pub fn new(source: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self {
            id: RecordId::temporary(),
            source: source.into(),
            amount,
            date,
            description: None,
            field_id: None,
            extra: Map::new(),
        }
    }
}

impl FarmRecord for Income {
    const KIND: EntityKind = EntityKind::Income;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}
