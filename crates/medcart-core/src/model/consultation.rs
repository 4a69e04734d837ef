use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRoom {
    pub id: u64,
    pub doctor_id: u64,
    pub user_id: u64,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub room_id: u64,
    pub sender_id: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
