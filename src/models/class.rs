use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The two orders class lists are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOrder {
    /// Oldest first, used to populate the student form's class picker.
    Insertion,
    /// Used by the class management page.
    NewestFirst,
}
