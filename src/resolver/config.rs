use std::collections::HashSet;

use serde_json::json;

use crate::logging::{log_debug, log_warn};
use crate::model::{ConfigRef, OptionItem};
use crate::result::{Failure, JsonResult};
use crate::scope::{ScopeLevel, ScopePath};
use crate::store::DocumentStore;

const NONE_PLACEHOLDER: &str = "- none -";

/// Resolves configuration-document references to raw JSON text.
pub struct ConfigResolver<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Levels probed for `descriptor` on behalf of a caller in `caller`,
    /// nearest first.
    ///
    /// Folder references always walk up from the caller's own scope, so a job
    /// never reads documents registered outside its folder chain. A root
    /// caller only sees global documents.
    pub fn lookup_order(descriptor: &ConfigRef, caller: &ScopePath) -> Vec<ScopeLevel> {
        match descriptor {
            ConfigRef::Global { .. } => vec![ScopeLevel::Global],
            ConfigRef::Folder { .. } if caller.is_root() => vec![ScopeLevel::Global],
            ConfigRef::Folder { .. } => ScopeLevel::chain(caller),
        }
    }

    pub fn resolve(&self, descriptor: &ConfigRef, caller: &ScopePath) -> JsonResult<String> {
        let id = descriptor.id();
        for level in Self::lookup_order(descriptor, caller) {
            if let Some(document) = self.store.get_by_id(id, &level) {
                log_debug(
                    "config document resolved",
                    Some(json!({ "id": id, "level": level.to_string(), "caller": caller.to_string() })),
                    Some(json!({ "module": "config-resolver" })),
                );
                return JsonResult::success(document.content);
            }
        }
        log_warn(
            "config document not found",
            Some(json!({ "id": id, "caller": caller.to_string() })),
            Some(json!({ "module": "config-resolver", "reason": "not-found" })),
        );
        JsonResult::failure(Failure::NotFound { id: id.to_string() })
    }

    /// Documents visible from `scope`, de-duplicated by id so that the entry
    /// listed is the one a lookup would resolve. Starts with an empty-value
    /// placeholder.
    pub fn available_documents(&self, scope: &ScopePath) -> Vec<OptionItem> {
        let mut items = vec![OptionItem::new(NONE_PLACEHOLDER, "")];
        let mut seen = HashSet::new();
        for level in ScopeLevel::chain(scope) {
            for document in self.store.list(&level) {
                if document.id.is_empty() || !seen.insert(document.id.clone()) {
                    continue;
                }
                let label = format!("{} (ID: {})", document.name, document.id);
                items.push(OptionItem::new(label, document.id));
            }
        }
        items
    }
}
