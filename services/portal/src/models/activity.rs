//! Activity log model

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A recorded action, shown in the admin activity feed
#[derive(Debug, Clone, Serialize)]
pub struct ActivityLog {
    pub id: Uuid,
    /// Acting user; None for anonymous actions such as inquiry submissions
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

/// New activity log entry
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub detail: String,
}

impl NewActivityLog {
    pub fn new(actor_id: Option<Uuid>, action: &str, detail: impl Into<String>) -> Self {
        Self {
            actor_id,
            action: action.to_string(),
            detail: detail.into(),
        }
    }
}
