//! Agent connection and status boundary for the PeerTray indicator.
//!
//! The indicator core consumes the mesh agent through this crate:
//! connection and configuration flags, the live status surface (running
//! flag plus incoming/outgoing peering counts), and a subscription hub
//! yielding one notification channel per event category. The wire
//! protocol the agent speaks is not this crate's concern.

mod client;
mod status;
mod types;

pub use client::AgentClient;
pub use status::AgentStatus;
pub use types::{NotifyChannel, NotifyEvent, PeerDirection};
