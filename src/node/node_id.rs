use serde::{Deserialize, Serialize};

/// Unique name of a node in the cluster; sent as `origin` / `node_id` on the wire
#[derive(
    Clone, Debug, Default, Deserialize, Serialize, PartialEq, PartialOrd, Ord, Eq, Hash,
)]
#[serde(transparent)]
pub struct NodeName(String);

impl NodeName {
    pub fn new(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        NodeName::new(name.to_string())
    }
}

impl From<String> for NodeName {
    fn from(name: String) -> Self {
        NodeName::new(name)
    }
}

impl std::str::FromStr for NodeName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeName::from(s))
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
