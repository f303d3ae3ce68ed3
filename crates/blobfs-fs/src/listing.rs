//! Directory listing codec.
//!
//! A directory's payload is UTF-8 text with one child name per line. Readers
//! accept `\n` and `\r\n` line endings and skip empty lines; writers emit one
//! `\n`-terminated line per name.

/// Decode a listing payload into child names, in stored order.
///
/// Invalid UTF-8 is replaced rather than rejected. Duplicate lines are kept;
/// de-duplication happens when the listing is rewritten.
pub fn parse_listing(payload: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(payload)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `name` survives a round trip through a listing.
///
/// A line break inside a name would split it into several listed names that
/// no later removal could match.
pub fn is_listable_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['\n', '\r'])
}

/// Encode child names as a listing payload.
pub fn encode_listing(names: &ChildNames) -> Vec<u8> {
    let mut payload = Vec::with_capacity(names.iter().map(|n| n.len() + 1).sum());
    for name in names.iter() {
        payload.extend_from_slice(name.as_bytes());
        payload.push(b'\n');
    }
    payload
}

/// The set of child names of one directory, in insertion order.
///
/// Insertion order keeps rewritten listings deterministic: existing names
/// stay where they were and new names go to the end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChildNames {
    names: Vec<String>,
}

impl ChildNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from names, dropping duplicates after the first.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name.into());
        }
        set
    }

    /// Add `name`. Returns `true` if the set changed.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Remove `name`. Returns `true` if the set changed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names
    }
}
