use serde::Serialize;

use crate::reference;
use crate::scope::ScopePath;

/// Where a parameter's JSON comes from. Closed set: every consumer matches
/// all variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    Config(ConfigRef),
    Remote(RemoteSource),
}

impl SourceDescriptor {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDescriptor::Config(_) => SourceKind::Config,
            SourceDescriptor::Remote(_) => SourceKind::Remote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Config,
    Remote,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Config => "config",
            SourceKind::Remote => "remote",
        }
    }
}

/// Reference to a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigRef {
    Global { id: String },
    /// Document registered on a folder. `path` anchors the lookup for callers
    /// outside that folder.
    Folder { path: ScopePath, id: String },
}

impl ConfigRef {
    pub fn id(&self) -> &str {
        match self {
            ConfigRef::Global { id } | ConfigRef::Folder { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    pub url: String,
    pub credential: Option<String>,
}

impl RemoteSource {
    pub fn new(url: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            url: url.into(),
            credential,
        }
    }

    /// Credential id when one is configured; blank ids count as unset.
    pub fn credential_id(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// One selectable entry. Serialized in the refresh wire format
/// (`{"name", "value", "selected"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionItem {
    #[serde(rename = "name")]
    pub label: String,
    pub value: String,
    pub selected: bool,
}

impl OptionItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            selected: false,
        }
    }

    pub fn of_value(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value)
    }

    /// Disabled entry carrying an explanation instead of a selectable value.
    pub fn explanation(message: impl Into<String>) -> Self {
        Self::new(message, "")
    }
}

/// Static configuration of a JSON-backed parameter. Immutable once defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDefinition {
    pub name: String,
    pub default_value: String,
    pub source: SourceDescriptor,
    pub query: String,
    pub reference: Option<String>,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, source: SourceDescriptor, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: String::new(),
            source,
            query: query.into(),
            reference: None,
        }
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = default_value.into();
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn reference_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn placeholder(&self) -> Option<String> {
        self.reference_name().map(reference::placeholder)
    }
}

/// A job and the parameters it declares. The job's scope is its enclosing
/// folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    pub path: ScopePath,
    pub parameters: Vec<ParameterDefinition>,
}

impl JobDefinition {
    pub fn new(path: impl Into<ScopePath>) -> Self {
        Self {
            path: path.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn scope(&self) -> ScopePath {
        self.path.parent().unwrap_or_default()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|param| param.name == name)
    }
}
