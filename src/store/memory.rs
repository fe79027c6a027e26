use std::collections::HashMap;

use crate::model::JobDefinition;
use crate::scope::{ScopeLevel, ScopePath};

use super::{Credential, CredentialStore, Document, DocumentStore, JobCatalog};

#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    levels: HashMap<ScopeLevel, Vec<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `document` at `level`, replacing any document with the same
    /// id at that level.
    pub fn register(&mut self, level: ScopeLevel, document: Document) {
        let docs = self.levels.entry(level).or_default();
        if let Some(existing) = docs.iter_mut().find(|doc| doc.id == document.id) {
            *existing = document;
        } else {
            docs.push(document);
        }
    }

    pub fn register_global(&mut self, document: Document) {
        self.register(ScopeLevel::Global, document);
    }

    pub fn register_folder(&mut self, folder: impl Into<ScopePath>, document: Document) {
        self.register(ScopeLevel::from_scope(folder.into()), document);
    }

    pub fn len(&self) -> usize {
        self.levels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get_by_id(&self, id: &str, level: &ScopeLevel) -> Option<Document> {
        self.levels
            .get(level)?
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
    }

    fn list(&self, level: &ScopeLevel) -> Vec<Document> {
        self.levels.get(level).cloned().unwrap_or_default()
    }
}

/// Credentials registered per scope level. Lookups walk from the caller's
/// scope up to global; the nearest registration wins.
#[derive(Default, Clone)]
pub struct MemoryCredentialStore {
    levels: HashMap<ScopeLevel, HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, level: ScopeLevel, id: impl Into<String>, credential: Credential) {
        self.levels
            .entry(level)
            .or_default()
            .insert(id.into(), credential);
    }

    pub fn register_global(&mut self, id: impl Into<String>, credential: Credential) {
        self.register(ScopeLevel::Global, id, credential);
    }

    pub fn len(&self) -> usize {
        self.levels.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn lookup(&self, id: &str, scope: &ScopePath) -> Option<Credential> {
        ScopeLevel::chain(scope).iter().find_map(|level| {
            self.levels
                .get(level)
                .and_then(|entries| entries.get(id))
                .cloned()
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryJobCatalog {
    jobs: HashMap<ScopePath, JobDefinition>,
}

impl MemoryJobCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: JobDefinition) {
        self.jobs.insert(job.path.clone(), job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobCatalog for MemoryJobCatalog {
    fn job(&self, path: &ScopePath) -> Option<JobDefinition> {
        self.jobs.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_replaces_same_id_at_level() {
        let mut store = MemoryDocumentStore::new();
        store.register_global(Document::new("users", "[1]"));
        store.register_global(Document::new("users", "[2]"));
        assert_eq!(store.len(), 1);
        let doc = store.get_by_id("users", &ScopeLevel::Global).unwrap();
        assert_eq!(doc.content, "[2]");
    }

    #[test]
    fn folder_registration_at_root_is_global() {
        let mut store = MemoryDocumentStore::new();
        store.register_folder("", Document::new("users", "[]"));
        assert!(store.get_by_id("users", &ScopeLevel::Global).is_some());
    }

    #[test]
    fn credential_lookup_prefers_nearest_scope() {
        let mut store = MemoryCredentialStore::new();
        store.register_global(
            "api",
            Credential::OpaqueSecret {
                secret: "global".into(),
            },
        );
        store.register(
            ScopeLevel::Folder(ScopePath::parse("team")),
            "api",
            Credential::OpaqueSecret {
                secret: "team".into(),
            },
        );

        let nested = store.lookup("api", &ScopePath::parse("team/app")).unwrap();
        assert_eq!(
            nested,
            Credential::OpaqueSecret {
                secret: "team".into()
            }
        );
        let outside = store.lookup("api", &ScopePath::parse("other")).unwrap();
        assert_eq!(
            outside,
            Credential::OpaqueSecret {
                secret: "global".into()
            }
        );
        assert!(store.lookup("missing", &ScopePath::root()).is_none());
    }

    #[test]
    fn credential_debug_hides_secrets() {
        let credential = Credential::UsernameSecretPair {
            username: "user".into(),
            secret: "hunter2".into(),
        };
        let printed = format!("{credential:?}");
        assert!(printed.contains("user"));
        assert!(!printed.contains("hunter2"));
    }
}
