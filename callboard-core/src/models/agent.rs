use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agent {
    pub id: String,
    #[serde(skip_serializing)]
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
}
