use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of one blob store server. Each distinct endpoint gets exactly one
/// connection in a [`StoreRegistry`](crate::StoreRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn display_is_host_port() {
        assert_eq!(Endpoint::new("db.local", 27017).to_string(), "db.local:27017");
    }

    #[test]
    fn equal_endpoints_hash_alike() {
        let mut set = HashSet::new();
        set.insert(Endpoint::new("a", 1));
        set.insert(Endpoint::new("a", 1));
        set.insert(Endpoint::new("a", 2));
        assert_eq!(set.len(), 2);
    }
}
