use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

use crate::errors::ApiError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub class_id: Option<i64>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row of the home page list.
#[derive(Serialize, Debug, Clone, sqlx::FromRow)]
pub struct StudentListing {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub class_name: Option<String>,
    pub image: Option<String>,
}

#[derive(Serialize, Debug, Clone, sqlx::FromRow)]
pub struct StudentDetail {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
    pub image: Option<String>,
}

/// Submitted, user-editable fields. The image travels separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFields {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub class_id: Option<i64>,
}

impl StudentFields {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("Name is required!".into()));
        }
        Ok(())
    }
}
