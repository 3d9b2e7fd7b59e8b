use serde::{Deserialize, Serialize};

/// How the viewer link handed to viewers is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Origin plus any repository path the viewer page is served under.
    pub base_url: String,
    pub viewer_page: String,
    /// Query parameter carrying the sender identity.
    pub query_param: String,
    /// Prefix for generated sender identities.
    pub id_prefix: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            viewer_page: "viewer.html".into(),
            query_param: "view".into(),
            id_prefix: screenbeam_common::SENDER_ID_PREFIX.into(),
        }
    }
}
