pub mod config;
pub mod remote;

pub use config::ConfigResolver;
pub use remote::{authorization_header, RemoteResolver};

use crate::model::SourceDescriptor;
use crate::result::JsonResult;
use crate::scope::ScopePath;
use crate::store::{CredentialStore, DocumentStore};

/// Fetches the raw JSON text behind `source` on behalf of a caller in `scope`.
pub fn resolve_source(
    source: &SourceDescriptor,
    scope: &ScopePath,
    documents: &dyn DocumentStore,
    credentials: &dyn CredentialStore,
    remote: &RemoteResolver,
) -> JsonResult<String> {
    match source {
        SourceDescriptor::Config(config) => ConfigResolver::new(documents).resolve(config, scope),
        SourceDescriptor::Remote(target) => remote.resolve(target, credentials, scope),
    }
}
