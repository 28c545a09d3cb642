use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of the connect handshake (`_apis/connectionData`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionData {
    pub authenticated_user: Identity,
    #[serde(default)]
    pub instance_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub provider_display_name: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> String {
        self.provider_display_name
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}
