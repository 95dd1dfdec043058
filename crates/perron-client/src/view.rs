//! State of the watched route.

use perron_core::{Connection, SavedConnection};

/// What the client knows about the route the user is looking at.
///
/// `Loading` and an empty `Loaded` are different: the first means no answer
/// yet, the second that the companion answered with nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionView {
    /// No route is watched.
    #[default]
    Idle,
    /// A request went out and nothing has arrived yet.
    Loading {
        /// Watched route.
        route: SavedConnection,
    },
    /// Connection data arrived for the route.
    Loaded {
        /// Watched route.
        route: SavedConnection,
        /// Latest connections, replaced wholesale on each update.
        connections: Vec<Connection>,
    },
}

impl ConnectionView {
    /// Watched route, if any.
    pub fn route(&self) -> Option<&SavedConnection> {
        match self {
            Self::Idle => None,
            Self::Loading { route } | Self::Loaded { route, .. } => Some(route),
        }
    }

    /// Latest connections. Empty unless loaded.
    pub fn connections(&self) -> &[Connection] {
        match self {
            Self::Loaded { connections, .. } => connections,
            _ => &[],
        }
    }

    /// Whether a request is outstanding with no data yet.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}
