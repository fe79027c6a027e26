use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use serde::Deserialize;
use serde_json::json;

use crate::endpoint::OptionsEndpoint;
use crate::http::HostSettings;
use crate::logging::log_warn;
use crate::model::{
    ConfigRef, JobDefinition, ParameterDefinition, RemoteSource, SourceDescriptor,
};
use crate::reference;
use crate::resolver::RemoteResolver;
use crate::scope::{ScopeLevel, ScopePath};
use crate::store::{
    Credential, Document, MemoryCredentialStore, MemoryDocumentStore, MemoryJobCatalog,
};

const HOST_ENV: &str = "JSON_PARAM_HOST";
const PORT_ENV: &str = "JSON_PARAM_PORT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub documents: Vec<DocumentEntry>,
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        let host = HostSettings::default();
        Self {
            host: host.host,
            port: host.port,
            base_path: host.base_path,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Folder the document is registered on; omitted means global.
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialEntry {
    pub id: String,
    #[serde(default)]
    pub scope: Option<String>,
    pub kind: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub secret: Option<String>,
    /// Environment variable holding the secret, read at load time.
    #[serde(default)]
    pub secret_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobEntry {
    pub path: String,
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterEntry {
    pub name: String,
    #[serde(default)]
    pub default_value: String,
    pub query: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub source: SourceSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    Config {
        #[serde(default)]
        scope: ConfigScope,
        id: String,
        #[serde(default)]
        path: Option<String>,
    },
    Remote {
        url: String,
        #[serde(default)]
        credential: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    #[default]
    Global,
    Folder,
}

pub fn load_config(path: &Path) -> Result<ServerConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let config: ServerConfig = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&text)
            .with_context(|| format!("invalid config YAML {}", path.display()))?,
        "json" => serde_json::from_str(&text)
            .with_context(|| format!("invalid config JSON {}", path.display()))?,
        _ => toml::from_str(&text)
            .with_context(|| format!("invalid config TOML {}", path.display()))?,
    };
    Ok(config)
}

impl ServerConfig {
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = env::var(HOST_ENV) {
            if !host.trim().is_empty() {
                self.server.host = host.trim().to_string();
            }
        }
        if let Ok(port) = env::var(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV} must be a port number, got '{port}'"))?;
        }
        Ok(())
    }

    pub fn host_settings(&self) -> HostSettings {
        HostSettings {
            host: self.server.host.clone(),
            port: self.server.port,
            base_path: self.server.base_path.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.server.timeout_ms.max(1))
    }

    /// `base_dir` anchors relative `content_file` paths.
    pub fn build_documents(&self, base_dir: &Path) -> Result<MemoryDocumentStore> {
        let mut store = MemoryDocumentStore::new();
        for entry in &self.documents {
            let content = match (&entry.content, &entry.content_file) {
                (Some(content), None) => content.clone(),
                (None, Some(file)) => {
                    let full = base_dir.join(file);
                    fs::read_to_string(&full).with_context(|| {
                        format!("unable to read document {} from {}", entry.id, full.display())
                    })?
                }
                (Some(_), Some(_)) => {
                    bail!("document {} sets both content and content_file", entry.id)
                }
                (None, None) => bail!("document {} needs content or content_file", entry.id),
            };
            let mut document = Document::new(entry.id.clone(), content);
            if let Some(name) = &entry.name {
                document = document.with_name(name.clone());
            }
            store.register(scope_level(entry.scope.as_deref()), document);
        }
        Ok(store)
    }

    pub fn build_credentials(&self) -> Result<MemoryCredentialStore> {
        let mut store = MemoryCredentialStore::new();
        for entry in &self.credentials {
            let secret = match (&entry.secret, &entry.secret_env) {
                (Some(secret), _) => secret.clone(),
                (None, Some(var)) => env::var(var).with_context(|| {
                    format!("credential {} reads its secret from unset {var}", entry.id)
                })?,
                (None, None) => String::new(),
            };
            let credential = match entry.kind.as_str() {
                "username_password" => Credential::UsernameSecretPair {
                    username: entry.username.clone(),
                    secret,
                },
                "secret" => Credential::OpaqueSecret { secret },
                other => Credential::Other {
                    kind: other.to_string(),
                },
            };
            store.register(scope_level(entry.scope.as_deref()), entry.id.clone(), credential);
        }
        Ok(store)
    }

    pub fn build_jobs(&self) -> Result<MemoryJobCatalog> {
        let mut catalog = MemoryJobCatalog::new();
        for entry in &self.jobs {
            let path = ScopePath::parse(&entry.path);
            if path.is_root() {
                bail!("job path must not be empty");
            }
            let mut job = JobDefinition::new(path);
            for param in &entry.parameters {
                if job.parameter(&param.name).is_some() {
                    bail!("job {} declares parameter {} twice", job.path, param.name);
                }
                let definition = param.to_definition(&job.scope())?;
                warn_unused_reference(&job, &definition);
                job = job.with_parameter(definition);
            }
            catalog.insert(job);
        }
        Ok(catalog)
    }

    pub fn build_endpoint(&self, base_dir: &Path) -> Result<OptionsEndpoint> {
        Ok(OptionsEndpoint::new(
            Arc::new(self.build_jobs()?),
            Arc::new(self.build_documents(base_dir)?),
            Arc::new(self.build_credentials()?),
            RemoteResolver::new(self.timeout()),
        ))
    }
}

impl ParameterEntry {
    /// Folder references without an explicit path anchor on the job's folder.
    pub fn to_definition(&self, job_scope: &ScopePath) -> Result<ParameterDefinition> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("parameter name must not be empty"));
        }
        let source = match &self.source {
            SourceSpec::Config { scope, id, path } => {
                let config = match scope {
                    ConfigScope::Global => ConfigRef::Global { id: id.clone() },
                    ConfigScope::Folder => ConfigRef::Folder {
                        path: path
                            .as_deref()
                            .map(ScopePath::parse)
                            .unwrap_or_else(|| job_scope.clone()),
                        id: id.clone(),
                    },
                };
                SourceDescriptor::Config(config)
            }
            SourceSpec::Remote { url, credential } => {
                SourceDescriptor::Remote(RemoteSource::new(url.clone(), credential.clone()))
            }
        };
        let mut definition = ParameterDefinition::new(self.name.clone(), source, self.query.clone())
            .with_default(self.default_value.clone());
        if let Some(reference) = &self.reference {
            definition = definition.with_reference(reference.clone());
        }
        Ok(definition)
    }
}

fn scope_level(scope: Option<&str>) -> ScopeLevel {
    ScopeLevel::from_scope(scope.map(ScopePath::parse).unwrap_or_default())
}

fn warn_unused_reference(job: &JobDefinition, definition: &ParameterDefinition) {
    let Some(name) = definition.reference_name() else {
        return;
    };
    if !reference::placeholder_names(&definition.query)
        .iter()
        .any(|used| used == name)
    {
        log_warn(
            "reference placeholder not used in query",
            Some(json!({ "job": job.path.to_string(), "param": definition.name, "reference": name })),
            Some(json!({ "module": "config" })),
        );
    }
}

/// Loads `path`, applies environment overrides and returns the config with
/// the directory relative document paths resolve against.
pub fn load_with_env(path: &Path) -> Result<(ServerConfig, PathBuf)> {
    let mut config = load_config(path)?;
    config.apply_env()?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, base_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
port = 9090

[[documents]]
id = "users"
content = '[{"name":"Alice"}]'

[[documents]]
id = "users"
scope = "team"
name = "Team users"
content = '[{"name":"Bob"}]'

[[credentials]]
id = "api"
kind = "username_password"
username = "user"
secret = "password"

[[jobs]]
path = "team/app/build"

[[jobs.parameters]]
name = "USER"
query = "$[*].name"
source = { type = "config", scope = "folder", id = "users" }

[[jobs.parameters]]
name = "EMAIL"
query = "$[?(@.name == '${USER}')].email"
reference = "USER"
source = { type = "remote", url = "http://localhost/users", credential = "api" }
"#;

    #[test]
    fn parses_sections_and_defaults() {
        let config: ServerConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.documents.len(), 2);
        assert_eq!(config.jobs[0].parameters.len(), 2);
    }

    #[test]
    fn folder_reference_defaults_to_job_folder() {
        let config: ServerConfig = toml::from_str(SAMPLE).unwrap();
        let jobs = config.build_jobs().unwrap();
        let job = crate::store::JobCatalog::job(&jobs, &ScopePath::parse("team/app/build")).unwrap();
        let user = job.parameter("USER").unwrap();
        assert_eq!(
            user.source,
            SourceDescriptor::Config(ConfigRef::Folder {
                path: ScopePath::parse("team/app"),
                id: "users".into()
            })
        );
        let email = job.parameter("EMAIL").unwrap();
        assert_eq!(email.reference_name(), Some("USER"));
    }

    #[test]
    fn document_needs_exactly_one_content_source() {
        let config: ServerConfig = toml::from_str(
            r#"
[[documents]]
id = "broken"
"#,
        )
        .unwrap();
        let err = config.build_documents(Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn unknown_credential_kind_is_kept_as_other() {
        let config: ServerConfig = toml::from_str(
            r#"
[[credentials]]
id = "cert"
kind = "certificate"
"#,
        )
        .unwrap();
        let store = config.build_credentials().unwrap();
        let credential =
            crate::store::CredentialStore::lookup(&store, "cert", &ScopePath::root()).unwrap();
        assert_eq!(credential.kind_name(), "certificate");
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let config: ServerConfig = toml::from_str(
            r#"
[[jobs]]
path = "build"
[[jobs.parameters]]
name = "A"
query = "$"
source = { type = "config", id = "x" }
[[jobs.parameters]]
name = "A"
query = "$"
source = { type = "config", id = "x" }
"#,
        )
        .unwrap();
        assert!(config.build_jobs().is_err());
    }
}
