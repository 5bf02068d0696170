use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Separates the sections of a hierarchical configuration key, as in
/// `Database:Password`.
pub const KEY_DELIMITER: &str = ":";

fn fold(key: &str) -> String {
    key.to_lowercase()
}

/// An immutable, flat configuration map with case-insensitive keys.
///
/// Keys keep the spelling they were inserted with; lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationSnapshot {
    // folded key -> (key as inserted, value)
    entries: BTreeMap<String, (String, String)>,
}

impl ConfigurationSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold(key)).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by key, ignoring case.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The entries below `section`, with the `section:` prefix removed.
    ///
    /// Delimiters around `section` are ignored; an empty section is the
    /// whole snapshot.
    pub fn section(&self, section: &str) -> ConfigurationSnapshot {
        let section = section.trim_matches(|c| KEY_DELIMITER.contains(c));
        if section.is_empty() {
            return self.clone();
        }
        let prefix = fold(&format!("{}{}", section, KEY_DELIMITER));
        // folding may change byte lengths, so strip by segment count
        let depth = section.split(KEY_DELIMITER).count();
        let entries = self
            .entries
            .range(prefix.clone()..)
            .take_while(|(folded, _)| folded.starts_with(&prefix))
            .map(|(folded, (key, value))| {
                let rest = key
                    .splitn(depth + 1, KEY_DELIMITER)
                    .nth(depth)
                    .unwrap_or_default();
                (
                    folded[prefix.len()..].to_string(),
                    (rest.to_string(), value.clone()),
                )
            })
            .collect();
        ConfigurationSnapshot { entries }
    }

    /// The distinct first path segments of all keys.
    pub fn child_keys(&self) -> Vec<&str> {
        let mut seen = Vec::<String>::new();
        let mut r = Vec::new();
        for (key, _) in self.entries.values() {
            let child = key.split(KEY_DELIMITER).next().unwrap_or(key);
            let folded = fold(child);
            if !seen.contains(&folded) {
                seen.push(folded);
                r.push(child);
            }
        }
        r
    }
}

/// Collects entries for a [`ConfigurationSnapshot`], refusing to overwrite.
#[derive(Debug, Default)]
pub(crate) struct SnapshotBuilder {
    entries: BTreeMap<String, (String, String)>,
}

impl SnapshotBuilder {
    pub(crate) fn insert(&mut self, key: String, value: String) -> Result<()> {
        let folded = fold(&key);
        if self.entries.contains_key(&folded) {
            return Err(Error::DuplicateKey(key));
        }
        self.entries.insert(folded, (key, value));
        Ok(())
    }

    pub(crate) fn freeze(self) -> ConfigurationSnapshot {
        ConfigurationSnapshot {
            entries: self.entries,
        }
    }
}
