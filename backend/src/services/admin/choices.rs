//! Select options shared by the admin forms.

use crate::error::AppError;
use crate::store::users;
use crate::web::views::UserView;
use common::model::choices::{Department, Role, Shift};
use rusqlite::Connection;
use serde_json::{json, Value};

pub fn user_form_choices(conn: &Connection) -> Result<Value, AppError> {
    let leaders: Vec<UserView> = users::list_by_role(conn, Role::Leader, true)?
        .iter()
        .map(|u| UserView::new(u, None))
        .collect();
    let roles: Vec<Value> = Role::ALL
        .iter()
        .map(|r| json!({"value": r.as_str(), "label": r.label()}))
        .collect();
    let departments: Vec<Value> = Department::ALL
        .iter()
        .map(|d| json!({"value": d.as_str(), "label": d.label()}))
        .collect();
    let shifts: Vec<Value> = [Shift::First, Shift::Second, Shift::Off]
        .iter()
        .map(|s| json!({"value": s.as_i64(), "label": s.label()}))
        .collect();
    Ok(json!({
        "available_leaders": leaders,
        "roles": roles,
        "departments": departments,
        "shifts": shifts,
    }))
}

/// Merges `extra` into the choice object.
pub fn with_choices(conn: &Connection, extra: Value) -> Result<Value, AppError> {
    let mut context = user_form_choices(conn)?;
    if let (Value::Object(base), Value::Object(extra)) = (&mut context, extra) {
        base.extend(extra);
    }
    Ok(context)
}
