//! Identifier minting.
//!
//! Native identifiers have the form `{prefix}-{unix millis}-{suffix}`, where
//! the suffix is a short lowercase base-36 string drawn from a random UUID.
//! Identifiers are opaque: nothing parses them back.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

/// Length of the random suffix on element and relationship identifiers.
pub const SUFFIX_LEN: usize = 9;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mints a new identifier with the given prefix.
///
/// The result is unique with overwhelming probability. Callers that need a
/// hard guarantee against an existing set of identifiers should use
/// [`FreshIds`].
#[must_use]
pub fn mint(prefix: &str) -> String {
    format!(
        "{prefix}-{}-{}",
        Utc::now().timestamp_millis(),
        random_suffix(SUFFIX_LEN)
    )
}

/// Returns `len` random base-36 characters (at most 16).
#[must_use]
pub fn random_suffix(len: usize) -> String {
    Uuid::new_v4()
        .into_bytes()
        .iter()
        .take(len)
        .map(|byte| char::from(ALPHABET[usize::from(*byte) % ALPHABET.len()]))
        .collect()
}

/// A set of identifiers already in use, which mints only identifiers not in
/// the set.
#[derive(Debug, Default, Clone)]
pub struct FreshIds {
    taken: HashSet<String>,
}

impl FreshIds {
    /// Creates a minter that avoids every identifier in `taken`.
    pub fn new<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: taken.into_iter().map(Into::into).collect(),
        }
    }

    /// Records an identifier as taken.
    ///
    /// Returns `false` if it was already taken.
    pub fn reserve(&mut self, id: &str) -> bool {
        self.taken.insert(id.to_string())
    }

    /// Mints `{prefix}-{millis}-{suffix}`, retrying until the result is new.
    pub fn mint(&mut self, prefix: &str) -> String {
        loop {
            let id = mint(prefix);
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Mints `{prefix}-{millis}-{infix}-{suffix}` with a short suffix,
    /// retrying until the result is new.
    ///
    /// Used when a foreign identifier should stay visible in the native one.
    pub fn mint_with_infix(&mut self, prefix: &str, infix: &str) -> String {
        loop {
            let id = format!(
                "{prefix}-{}-{infix}-{}",
                Utc::now().timestamp_millis(),
                random_suffix(5)
            );
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_carry_prefix_and_suffix() {
        let id = mint("system");
        let parts: Vec<_> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "system");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn fresh_ids_never_repeat() {
        let mut ids = FreshIds::default();
        let minted: HashSet<_> = (0..500).map(|_| ids.mint("rel")).collect();
        assert_eq!(minted.len(), 500);
    }

    #[test]
    fn reserve_reports_duplicates() {
        let mut ids = FreshIds::new(["a"]);
        assert!(!ids.reserve("a"));
        assert!(ids.reserve("b"));
    }

    #[test]
    fn infix_is_embedded() {
        let mut ids = FreshIds::default();
        let id = ids.mint_with_infix("person", "7");
        assert!(id.starts_with("person-"));
        assert!(id.contains("-7-"));
    }
}
