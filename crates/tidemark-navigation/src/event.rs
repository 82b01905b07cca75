//! Browser-dispatched navigation events

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationEvent {
    /// The active history entry changed (back, forward, go, fragment navigation)
    PopState,
    /// The fragment identifier of the URL changed
    HashChange,
}

impl NavigationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationEvent::PopState => "popstate",
            NavigationEvent::HashChange => "hashchange",
        }
    }
}

impl std::fmt::Display for NavigationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NavigationEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "popstate" => Ok(NavigationEvent::PopState),
            "hashchange" => Ok(NavigationEvent::HashChange),
            _ => Err(format!("Unknown navigation event: {}", s)),
        }
    }
}
