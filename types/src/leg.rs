use std::fmt;

/// Identifies one call leg. Events and pending operations never cross legs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LegId(String);

impl LegId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LegId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LegId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
