use std::io;
use std::time::Duration;

use base64::Engine;
use serde_json::json;

use crate::logging::{log_debug, log_warn};
use crate::model::RemoteSource;
use crate::result::{Failure, JsonResult};
use crate::scope::ScopePath;
use crate::store::{Credential, CredentialStore};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the `Authorization` header value for `credential`.
///
/// Username/secret pairs become Basic auth, or a Bearer token when the
/// username is empty. Bare secrets are always Bearer tokens.
pub fn authorization_header(credential: &Credential) -> Result<String, Failure> {
    match credential {
        Credential::UsernameSecretPair { username, secret } if !username.is_empty() => {
            let encoded = base64::engine::general_purpose::STANDARD
                .encode(format!("{username}:{secret}").as_bytes());
            Ok(format!("Basic {encoded}"))
        }
        Credential::UsernameSecretPair { secret, .. } | Credential::OpaqueSecret { secret } => {
            Ok(format!("Bearer {secret}"))
        }
        Credential::Other { kind } => Err(Failure::UnsupportedCredentialType { kind: kind.clone() }),
    }
}

/// Fetches JSON text from remote endpoints. Honors `HTTP_PROXY`/`HTTPS_PROXY`
/// style proxy settings from the environment.
#[derive(Clone)]
pub struct RemoteResolver {
    agent: ureq::Agent,
}

impl Default for RemoteResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl RemoteResolver {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .try_proxy_from_env(true)
            .timeout(timeout)
            .build();
        Self { agent }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    pub fn resolve(
        &self,
        remote: &RemoteSource,
        credentials: &dyn CredentialStore,
        scope: &ScopePath,
    ) -> JsonResult<String> {
        let url = remote.url.as_str();
        let credential_id = remote.credential_id();

        let mut request = self.agent.get(url).set("Accept", "application/json");
        if let Some(id) = credential_id {
            let Some(credential) = credentials.lookup(id, scope) else {
                log_warn(
                    "credential not found",
                    Some(json!({ "credential": id, "scope": scope.to_string() })),
                    Some(json!({ "module": "remote-resolver", "reason": "credential" })),
                );
                return JsonResult::failure(Failure::CredentialNotFound { id: id.to_string() });
            };
            let header = match authorization_header(&credential) {
                Ok(header) => header,
                Err(failure) => return JsonResult::failure(failure),
            };
            request = request.set("Authorization", &header);
        }

        log_debug(
            "fetching remote JSON",
            Some(json!({ "url": url, "credential": credential_id })),
            Some(json!({ "module": "remote-resolver" })),
        );

        let result = match request.call() {
            Ok(response) => match response.into_string() {
                Ok(body) => Ok(body),
                Err(err) => Err(io_failure(url, credential_id, &err)),
            },
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(Failure::remote_status(url, credential_id, status, &body))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(transport_failure(url, credential_id, &transport))
            }
        };

        if let Err(failure) = &result {
            log_warn(
                "remote fetch failed",
                Some(json!({ "url": url, "error": failure.to_string() })),
                Some(json!({ "module": "remote-resolver", "code": failure.code() })),
            );
        }
        result.into()
    }
}

fn io_failure(url: &str, credential: Option<&str>, err: &io::Error) -> Failure {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted => Failure::Interrupted {
            url: url.to_string(),
            reason: err.to_string(),
        },
        _ => Failure::remote_transport(url, credential, err.to_string()),
    }
}

fn transport_failure(url: &str, credential: Option<&str>, transport: &ureq::Transport) -> Failure {
    let io_error = std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<io::Error>());
    match io_error {
        Some(err) if transport.kind() == ureq::ErrorKind::Io => io_failure(url, credential, err),
        _ => Failure::remote_transport(url, credential, transport.to_string()),
    }
}
