use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use json_param_rs::{
    Credential, Failure, FailureKind, JobDefinition, MemoryCredentialStore, MemoryDocumentStore,
    MemoryJobCatalog, OptionsEndpoint, ParameterDefinition, RemoteResolver, RemoteSource,
    ScopeLevel, ScopePath, SourceDescriptor,
};

/// Serves one canned response and hands back the request headers it saw.
fn serve_once(status: &str, body: &str) -> Result<(String, JoinHandle<Vec<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}/data", listener.local_addr()?);
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = thread::spawn(move || {
        let mut headers = Vec::new();
        if let Ok((stream, _)) = listener.accept() {
            let mut reader = BufReader::new(&stream);
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap_or(0) > 0 {
                let trimmed = line.trim_end().to_string();
                if trimmed.is_empty() {
                    break;
                }
                headers.push(trimmed);
                line.clear();
            }
            let mut writer = &stream;
            let _ = writer.write_all(response.as_bytes());
            let _ = writer.flush();
        }
        headers
    });
    Ok((url, handle))
}

fn authorization(headers: &[String]) -> Option<String> {
    headers.iter().find_map(|header| {
        let (name, value) = header.split_once(':')?;
        name.eq_ignore_ascii_case("authorization")
            .then(|| value.trim().to_string())
    })
}

#[test]
fn basic_auth_is_sent_for_username_credentials() -> Result<()> {
    let (url, server) = serve_once("200 OK", r#"[{"name":"Alpha"},{"name":"Beta"}]"#)?;
    let mut credentials = MemoryCredentialStore::new();
    credentials.register(
        ScopeLevel::Folder(ScopePath::parse("team")),
        "api",
        Credential::UsernameSecretPair {
            username: "user".into(),
            secret: "password".into(),
        },
    );

    let source = RemoteSource::new(url, Some("api".into()));
    let body = RemoteResolver::default()
        .resolve(&source, &credentials, &ScopePath::parse("team/app"))
        .into_value()
        .expect("remote body");
    assert!(body.contains("Alpha"));

    let headers = server.join().expect("server thread");
    assert_eq!(
        authorization(&headers).as_deref(),
        Some("Basic dXNlcjpwYXNzd29yZA==")
    );
    Ok(())
}

#[test]
fn bare_secret_is_sent_as_bearer_token() -> Result<()> {
    let (url, server) = serve_once("200 OK", "[]")?;
    let mut credentials = MemoryCredentialStore::new();
    credentials.register_global(
        "token",
        Credential::OpaqueSecret {
            secret: "s3cr3t".into(),
        },
    );
    let source = RemoteSource::new(url, Some("token".into()));
    let result = RemoteResolver::default().resolve(&source, &credentials, &ScopePath::root());
    assert!(result.is_success());

    let headers = server.join().expect("server thread");
    assert_eq!(authorization(&headers).as_deref(), Some("Bearer s3cr3t"));
    Ok(())
}

#[test]
fn no_credential_sends_no_authorization() -> Result<()> {
    let (url, server) = serve_once("200 OK", "[]")?;
    let source = RemoteSource::new(url, Some("   ".into()));
    let result =
        RemoteResolver::default().resolve(&source, &MemoryCredentialStore::new(), &ScopePath::root());
    assert!(result.is_success());
    let headers = server.join().expect("server thread");
    assert_eq!(authorization(&headers), None);
    Ok(())
}

#[test]
fn error_status_is_reported_with_body_snippet() -> Result<()> {
    let (url, server) = serve_once("404 Not Found", r#"{"message":"no such list"}"#)?;
    let source = RemoteSource::new(url.clone(), None);
    let result =
        RemoteResolver::default().resolve(&source, &MemoryCredentialStore::new(), &ScopePath::root());
    server.join().expect("server thread");

    match result.failure_ref() {
        Some(Failure::RemoteFetchFailed { status, reason, url: failed, .. }) => {
            assert_eq!(*status, Some(404));
            assert!(reason.contains("no such list"));
            assert_eq!(failed, &url);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_credential_fails_before_any_request() {
    let source = RemoteSource::new("http://127.0.0.1:9/never", Some("ghost".into()));
    let result =
        RemoteResolver::default().resolve(&source, &MemoryCredentialStore::new(), &ScopePath::root());
    assert_eq!(result.failure_kind(), Some(FailureKind::CredentialNotFound));
}

#[test]
fn unreachable_host_is_a_fetch_failure() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}/gone", listener.local_addr()?);
    drop(listener);
    let source = RemoteSource::new(url, None);
    let result =
        RemoteResolver::default().resolve(&source, &MemoryCredentialStore::new(), &ScopePath::root());
    assert!(matches!(
        result.failure_kind(),
        Some(FailureKind::RemoteFetchFailed) | Some(FailureKind::Interrupted)
    ));
    Ok(())
}

#[test]
fn remote_source_feeds_the_options_endpoint() -> Result<()> {
    let (url, server) = serve_once("200 OK", r#"{"envs":["dev","staging","prod"]}"#)?;
    let mut jobs = MemoryJobCatalog::new();
    jobs.insert(JobDefinition::new("deploy").with_parameter(
        ParameterDefinition::new(
            "ENV",
            SourceDescriptor::Remote(RemoteSource::new(url, None)),
            "$.envs[*]",
        )
        .with_default("staging"),
    ));
    let endpoint = OptionsEndpoint::new(
        Arc::new(jobs),
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(MemoryCredentialStore::new()),
        RemoteResolver::default(),
    );
    let options = endpoint.render("deploy", "ENV").into_value().expect("options");
    server.join().expect("server thread");

    let selected: Vec<&str> = options
        .iter()
        .filter(|option| option.selected)
        .map(|option| option.value.as_str())
        .collect();
    assert_eq!(options.len(), 3);
    assert_eq!(selected, vec!["staging"]);
    Ok(())
}
