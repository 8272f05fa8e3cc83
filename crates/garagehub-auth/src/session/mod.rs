//! Sessions: refresh token rotation and the login orchestrator.

pub mod orchestrator;
pub mod rotation;

pub use orchestrator::{LoginOrchestrator, LoginOutcome, RefreshOutcome};
pub use rotation::{RotatedPair, RotationProtocol};

/// Client metadata attached to every authentication operation.
///
/// Flows explicitly through the core; nothing here reads ambient request
/// state.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    /// Origin IP of the client as seen by the server.
    pub origin_ip: String,
    /// Client user-agent header, if any.
    pub user_agent: Option<String>,
}

impl ClientMeta {
    /// Build metadata from request parts.
    pub fn new(origin_ip: impl Into<String>, user_agent: Option<&str>) -> Self {
        Self {
            origin_ip: origin_ip.into(),
            user_agent: user_agent.map(str::to_string),
        }
    }
}
