use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Mappings every process starts with.
pub const BUILTIN_DOMAINS: [(&str, &str); 3] = [
    ("hello123123.com", "http://192.168.1.100:8080"),
    ("myapp.local", "http://localhost:3000"),
    ("testsite.dev", "http://127.0.0.1:9000"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMapping {
    pub hostname: String,
    #[serde(rename = "target")]
    pub target_base: String,
}

impl DomainMapping {
    pub fn new(hostname: impl Into<String>, target_base: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            target_base: target_base.into(),
        }
    }
}

/// How hostnames are compared against the mapping keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostMatching {
    /// Byte-for-byte comparison of whatever the URL parser yields.
    #[default]
    Exact,
    /// Keys are stored and looked up in ASCII lowercase.
    CaseInsensitive,
}

/// Process-wide hostname -> target base table.
///
/// Writes go through a single write lock so concurrent updates cannot
/// lose each other, and readers never observe a half-written entry.
#[derive(Debug)]
pub struct DomainMap {
    entries: RwLock<HashMap<String, String>>,
    matching: HostMatching,
}

impl Default for DomainMap {
    fn default() -> Self {
        Self::new(HostMatching::default())
    }
}

impl DomainMap {
    pub fn new(matching: HostMatching) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            matching,
        }
    }

    /// Creates a map seeded with [`BUILTIN_DOMAINS`].
    pub fn with_builtin(matching: HostMatching) -> Self {
        let map = Self::new(matching);
        for (hostname, target) in BUILTIN_DOMAINS {
            map.insert(hostname, target);
        }
        map
    }

    pub fn matching(&self) -> HostMatching {
        self.matching
    }

    fn key<'a>(&self, hostname: &'a str) -> Cow<'a, str> {
        match self.matching {
            HostMatching::Exact => Cow::Borrowed(hostname),
            HostMatching::CaseInsensitive => Cow::Owned(hostname.to_ascii_lowercase()),
        }
    }

    /// Looks up the target base for a hostname.
    pub fn get(&self, hostname: &str) -> Option<String> {
        let entries = self.entries.read();
        entries.get(self.key(hostname).as_ref()).cloned()
    }

    /// Inserts or overwrites a mapping, returning the previous target.
    pub fn insert(&self, hostname: &str, target_base: &str) -> Option<String> {
        let key = self.key(hostname).into_owned();
        let mut entries = self.entries.write();
        entries.insert(key, target_base.to_string())
    }

    /// Copies every entry out of the table, sorted by hostname.
    pub fn snapshot(&self) -> Vec<DomainMapping> {
        let mut mappings: Vec<DomainMapping> = {
            let entries = self.entries.read();
            entries
                .iter()
                .map(|(hostname, target)| DomainMapping::new(hostname.as_str(), target.as_str()))
                .collect()
        };
        mappings.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        mappings
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_seed() {
        let map = DomainMap::with_builtin(HostMatching::Exact);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("myapp.local").as_deref(), Some("http://localhost:3000"));
        assert_eq!(
            map.get("hello123123.com").as_deref(),
            Some("http://192.168.1.100:8080")
        );
        assert_eq!(map.get("testsite.dev").as_deref(), Some("http://127.0.0.1:9000"));
    }

    #[test]
    fn test_insert_returns_previous_target() {
        let map = DomainMap::default();
        assert_eq!(map.len(), 0);
        assert_eq!(map.insert("a.test", "http://localhost:1"), None);
        assert_eq!(
            map.insert("a.test", "http://localhost:2").as_deref(),
            Some("http://localhost:1")
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_exact_matching_is_case_sensitive() {
        let map = DomainMap::new(HostMatching::Exact);
        map.insert("MyApp.Local", "http://localhost:3000");
        assert!(map.get("myapp.local").is_none());
        assert!(map.get("MyApp.Local").is_some());
    }

    #[test]
    fn test_case_insensitive_matching_folds_keys() {
        let map = DomainMap::new(HostMatching::CaseInsensitive);
        map.insert("MyApp.Local", "http://localhost:3000");
        assert_eq!(map.get("myapp.local").as_deref(), Some("http://localhost:3000"));
        assert_eq!(map.get("MYAPP.LOCAL").as_deref(), Some("http://localhost:3000"));
        assert_eq!(map.snapshot()[0].hostname, "myapp.local");
    }

    #[test]
    fn test_snapshot_is_sorted_copy() {
        let map = DomainMap::with_builtin(HostMatching::Exact);
        let snapshot = map.snapshot();
        let hostnames: Vec<&str> = snapshot.iter().map(|m| m.hostname.as_str()).collect();
        assert_eq!(hostnames, ["hello123123.com", "myapp.local", "testsite.dev"]);

        map.insert("myapp.local", "http://localhost:9999");
        assert_eq!(snapshot[1].target_base, "http://localhost:3000");
    }
}
