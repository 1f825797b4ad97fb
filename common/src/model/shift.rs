use crate::model::choices::Shift;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Planned shift of one foreman on one day. At most one row per `(date, foreman)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSchedule {
    pub id: i64,
    pub date: NaiveDate,
    pub foreman_id: i64,
    pub shift: Shift,
    pub department: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// Shift planned for the foreman at `index` (ordered by id) `offset` days
/// after the rotation start.
pub fn rotation_shift(index: usize, offset: usize) -> Shift {
    Shift::ROTATION[(index + offset) % Shift::ROTATION.len()]
}
