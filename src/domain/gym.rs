use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gym {
    pub id: i64,
    pub name: String,
    pub status: GymStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GymStatus {
    Active,
    Inactive,
}

impl GymStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GymStatus::Active => "active",
            GymStatus::Inactive => "inactive",
        }
    }
}
