//! Public types for the agent boundary.

/// Direction of an active peering relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerDirection {
    Incoming,
    Outgoing,
}

/// Event categories the agent pushes notifications on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyChannel {
    /// A new peering became active.
    PeeringAdded,
    /// An active peering ended.
    PeeringRemoved,
    /// Agent connectivity toward the mesh changed.
    Connectivity,
    /// Agent configuration was reloaded.
    Configuration,
}

/// One notification delivered on a [`NotifyChannel`].
#[derive(Debug, Clone)]
pub struct NotifyEvent {
    pub channel: NotifyChannel,
    /// Optional event detail, e.g. the peer name involved.
    pub detail: Option<String>,
}

impl NotifyEvent {
    pub fn new(channel: NotifyChannel) -> Self {
        Self {
            channel,
            detail: None,
        }
    }

    pub fn with_detail(channel: NotifyChannel, detail: impl Into<String>) -> Self {
        Self {
            channel,
            detail: Some(detail.into()),
        }
    }
}
