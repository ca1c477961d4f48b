use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallationStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

text_enum!(InstallationStatus {
    Pending => "pending",
    InProgress => "in-progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl InstallationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InstallationStatus::Pending => "Pendente",
            InstallationStatus::InProgress => "Em andamento",
            InstallationStatus::Completed => "Concluída",
            InstallationStatus::Cancelled => "Cancelada",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Installation {
    pub id: Option<i64>,
    pub quote_id: i64,
    pub client_name: String,
    pub address: String,
    pub scheduled_date: String,
    pub status: InstallationStatus,
    pub notes: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
