//! Tray icon identifiers and their embedded image assets.

/// Icon displayed in the tray bar.
///
/// Each variant except [`Icon::Nil`] maps to one of the PNG assets
/// embedded from `assets/icons/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Main,
    NoConn,
    Off,
    Warning,
    Orange,
    Green,
    Purple,
    Red,
    Yellow,
    Cyan,
    /// Sentinel: setting this icon is a no-op.
    Nil,
}

impl Icon {
    /// The embedded image for this icon, or `None` for [`Icon::Nil`].
    pub fn resolve(self) -> Option<&'static [u8]> {
        match self {
            Icon::Main => Some(include_bytes!("../assets/icons/main.png")),
            Icon::NoConn => Some(include_bytes!("../assets/icons/noconn.png")),
            Icon::Off => Some(include_bytes!("../assets/icons/off.png")),
            Icon::Warning => Some(include_bytes!("../assets/icons/warning.png")),
            Icon::Orange => Some(include_bytes!("../assets/icons/orange.png")),
            Icon::Green => Some(include_bytes!("../assets/icons/green.png")),
            Icon::Purple => Some(include_bytes!("../assets/icons/purple.png")),
            Icon::Red => Some(include_bytes!("../assets/icons/red.png")),
            Icon::Yellow => Some(include_bytes!("../assets/icons/yellow.png")),
            Icon::Cyan => Some(include_bytes!("../assets/icons/cyan.png")),
            Icon::Nil => None,
        }
    }
}
