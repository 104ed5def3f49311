//! Injected collaborators of the demo handlers.
//!
//! Handlers never reach for globals: the credential check and the item
//! records come from [`AppState`](crate::AppState), so tests can swap
//! either one.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use tessera_core::ModelInstance;

/// The token clients must send in `X-Token`.
pub const DEMO_SECRET_TOKEN: &str = "coneofsilence";

/// Checks a caller-supplied token.
pub trait CredentialVerifier: Send + Sync {
    /// Returns true if the token is accepted.
    fn verify(&self, token: &str) -> bool;
}

/// Accepts exactly one configured token.
#[derive(Debug, Clone)]
pub struct StaticTokenVerifier {
    token: String,
}

impl StaticTokenVerifier {
    /// Creates a verifier for the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Default for StaticTokenVerifier {
    fn default() -> Self {
        Self::new(DEMO_SECRET_TOKEN)
    }
}

impl CredentialVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> bool {
        self.token == token
    }
}

/// Read-only item records keyed by integer id.
pub trait ItemStore: Send + Sync {
    /// Returns the record for `id`.
    fn get(&self, id: i64) -> Option<ModelInstance>;

    /// Returns true if a record exists for `id`.
    fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }
}

/// Fixed in-memory records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemStore {
    records: BTreeMap<i64, ModelInstance>,
}

impl InMemoryItemStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the store with the two demo records.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new()
            .with_record(1, record("1", "Foo", "There goes my hero"))
            .with_record(2, record("2", "Bar", "The bartenders"))
    }

    /// Adds or replaces a record.
    #[must_use]
    pub fn with_record(mut self, id: i64, record: ModelInstance) -> Self {
        self.records.insert(id, record);
        self
    }
}

impl ItemStore for InMemoryItemStore {
    fn get(&self, id: i64) -> Option<ModelInstance> {
        self.records.get(&id).cloned()
    }

    fn contains(&self, id: i64) -> bool {
        self.records.contains_key(&id)
    }
}

// Stored ids are text, as in the records the demo was written against.
fn record(id: &str, name: &str, description: &str) -> ModelInstance {
    ModelInstance::new("ItemRecord")
        .with("id", id)
        .with("name", name)
        .with("description", description)
        .with("price", Decimal::new(100, 2))
}
