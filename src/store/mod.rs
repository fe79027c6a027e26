//! Narrow interfaces to the collaborators that own documents, credentials and
//! job definitions, plus in-memory implementations used by the server and
//! tests.

pub mod memory;

use crate::model::JobDefinition;
use crate::scope::{ScopeLevel, ScopePath};

pub use memory::{MemoryCredentialStore, MemoryDocumentStore, MemoryJobCatalog};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            content: content.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

pub trait DocumentStore: Send + Sync {
    fn get_by_id(&self, id: &str, level: &ScopeLevel) -> Option<Document>;

    /// Documents registered exactly at `level`, in registration order.
    fn list(&self, level: &ScopeLevel) -> Vec<Document>;
}

/// Credential as classified by the credential store.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    UsernameSecretPair { username: String, secret: String },
    OpaqueSecret { secret: String },
    /// Any kind the remote resolver cannot turn into an Authorization header.
    Other { kind: String },
}

impl Credential {
    pub fn kind_name(&self) -> &str {
        match self {
            Credential::UsernameSecretPair { .. } => "username_password",
            Credential::OpaqueSecret { .. } => "secret",
            Credential::Other { kind } => kind,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::UsernameSecretPair { username, .. } => f
                .debug_struct("UsernameSecretPair")
                .field("username", username)
                .field("secret", &"******")
                .finish(),
            Credential::OpaqueSecret { .. } => f
                .debug_struct("OpaqueSecret")
                .field("secret", &"******")
                .finish(),
            Credential::Other { kind } => f.debug_struct("Other").field("kind", kind).finish(),
        }
    }
}

/// Looks up a credential visible from `scope`.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, id: &str, scope: &ScopePath) -> Option<Credential>;
}

impl<F> CredentialStore for F
where
    F: Fn(&str, &ScopePath) -> Option<Credential> + Send + Sync,
{
    fn lookup(&self, id: &str, scope: &ScopePath) -> Option<Credential> {
        (self)(id, scope)
    }
}

/// Source of job definitions, keyed by full job path.
pub trait JobCatalog: Send + Sync {
    fn job(&self, path: &ScopePath) -> Option<JobDefinition>;
}
