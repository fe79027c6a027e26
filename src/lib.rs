pub mod config;
pub mod debounce;
pub mod endpoint;
pub mod http;
pub mod logging;
pub mod model;
pub mod query;
pub mod reference;
pub mod resolver;
pub mod result;
pub mod scope;
pub mod store;

pub use config::{load_config, ServerConfig};
pub use debounce::{RefreshDebouncer, TriggerAction, TriggerEvent};
pub use endpoint::{OptionsEndpoint, Refresh, RefreshStage};
pub use http::{start_options_host, HostSettings, HttpHostControl};
pub use model::{
    ConfigRef, JobDefinition, OptionItem, ParameterDefinition, RemoteSource, SourceDescriptor,
};
pub use resolver::{ConfigResolver, RemoteResolver};
pub use result::{Failure, FailureKind, JsonResult};
pub use scope::{ScopeLevel, ScopePath};
pub use store::{
    Credential, CredentialStore, Document, DocumentStore, JobCatalog, MemoryCredentialStore,
    MemoryDocumentStore, MemoryJobCatalog,
};
