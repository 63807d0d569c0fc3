use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four record families kept in the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Fields,
    Expenses,
    Income,
    Tasks,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Fields,
        EntityKind::Expenses,
        EntityKind::Income,
        EntityKind::Tasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Fields => "fields",
            EntityKind::Expenses => "expenses",
            EntityKind::Income => "income",
            EntityKind::Tasks => "tasks",
        }
    }

    /// SQLite table holding records of this kind.
    pub fn table_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "fields" | "field" => Ok(EntityKind::Fields),
            "expenses" | "expense" => Ok(EntityKind::Expenses),
            "income" | "incomes" => Ok(EntityKind::Income),
            "tasks" | "task" => Ok(EntityKind::Tasks),
            other => Err(format!("Unknown entity store: {other}")),
        }
    }
}
