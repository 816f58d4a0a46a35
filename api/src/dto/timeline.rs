use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tlc_core::domain::entities::{DelegationToken, TimelineEntity};

/// Body of `PUT /v2/timeline/apps/{app_id}`
#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    /// User the application runs as
    pub user: String,
}

/// Delegation token material handed to the publishing client
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub kind: String,
    pub service: String,
    pub owner: String,
    pub renewer: String,
    pub sequence_number: i64,
    pub max_date: DateTime<Utc>,
    /// Bearer credential for subsequent publish requests
    pub token: String,
}

impl From<&DelegationToken> for TokenResponse {
    fn from(token: &DelegationToken) -> Self {
        Self {
            kind: token.kind.clone(),
            service: token.service.clone(),
            owner: token.identifier.owner.clone(),
            renewer: token.identifier.renewer.clone(),
            sequence_number: token.identifier.sequence_number,
            max_date: token.identifier.max_date,
            token: token.password.clone(),
        }
    }
}

/// Response to a successful registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub app_id: String,
    #[serde(flatten)]
    pub token: TokenResponse,
}

/// Body of `POST /v2/timeline/apps/{app_id}/entities`
#[derive(Debug, Deserialize, Serialize)]
pub struct PublishRequest {
    pub entities: Vec<TimelineEntity>,
}

/// Response to a successful publish
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub written: usize,
}

/// Response to an application removal
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub removed: bool,
}
