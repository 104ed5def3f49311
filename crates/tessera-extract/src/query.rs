//! Query string pairs.

/// Decoded query string as ordered `(key, value)` pairs.
///
/// Repeated keys are kept in request order so sequence parameters can
/// collect every occurrence.
///
/// # Example
///
/// ```rust
/// use tessera_extract::QueryPairs;
///
/// let query = QueryPairs::parse("q-2=1&q-2=2&needy=sooo%20needy");
/// assert_eq!(query.get_all("q-2"), ["1", "2"]);
/// assert_eq!(query.get("needy"), Some("sooo needy"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryPairs {
    pairs: Vec<(String, String)>,
}

impl QueryPairs {
    /// Decodes a raw query string (without the leading `?`).
    ///
    /// `+` decodes to a space. A query string that cannot be decoded yields
    /// no pairs.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "undecodable query string ignored");
            Vec::new()
        });
        Self { pairs }
    }

    /// Returns the first value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for a key, in request order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates all pairs in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
