//! Client records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub street: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub email: String,
}

/// Input for creating or updating a client.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClientPayload {
    #[validate(length(min = 1, message = "Client name is required"))]
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub street2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}
