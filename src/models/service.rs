use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An offering from the catalog. `price` is in the smallest currency unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub duration_minutes: Option<i32>,
    pub created_at: NaiveDateTime,
}
