use std::sync::Arc;

use serde_json::{json, Value};

use crate::logging::{log_debug, log_warn};
use crate::model::{JobDefinition, OptionItem, ParameterDefinition, SourceKind};
use crate::query;
use crate::reference;
use crate::resolver::{resolve_source, ConfigResolver, RemoteResolver};
use crate::result::{Failure, FailureKind, JsonResult};
use crate::scope::ScopePath;
use crate::store::{CredentialStore, DocumentStore, JobCatalog};

/// Steps of a single refresh. Nothing carries over between refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    Received,
    Resolving(SourceKind),
    Substituting,
    Evaluating,
    Succeeded,
    Failed(FailureKind),
}

#[derive(Debug, Clone)]
pub struct Refresh {
    pub stages: Vec<RefreshStage>,
    pub result: JsonResult<Vec<OptionItem>>,
}

/// Computes option lists for parameters, both on first render and when a
/// referenced parameter changes.
#[derive(Clone)]
pub struct OptionsEndpoint {
    jobs: Arc<dyn JobCatalog>,
    documents: Arc<dyn DocumentStore>,
    credentials: Arc<dyn CredentialStore>,
    remote: RemoteResolver,
}

impl OptionsEndpoint {
    pub fn new(
        jobs: Arc<dyn JobCatalog>,
        documents: Arc<dyn DocumentStore>,
        credentials: Arc<dyn CredentialStore>,
        remote: RemoteResolver,
    ) -> Self {
        Self {
            jobs,
            documents,
            credentials,
            remote,
        }
    }

    /// Refresh entry point: re-evaluates `param` of `job` with `ref_value`
    /// substituted for its reference placeholder.
    pub fn handle(&self, job: &str, param: &str, ref_value: &str) -> JsonResult<Vec<OptionItem>> {
        self.refresh(job, param, Some(ref_value)).result
    }

    /// Initial render, before any referenced value is known.
    pub fn render(&self, job: &str, param: &str) -> JsonResult<Vec<OptionItem>> {
        self.refresh(job, param, None).result
    }

    pub fn refresh(&self, job: &str, param: &str, ref_value: Option<&str>) -> Refresh {
        let mut stages = vec![RefreshStage::Received];
        let result = self.locate(job, param).and_then(|(job_def, parameter)| {
            self.options_for(&job_def, &parameter, ref_value, &mut stages)
        });
        match &result {
            JsonResult::Success(options) => {
                stages.push(RefreshStage::Succeeded);
                log_debug(
                    "options refreshed",
                    Some(json!({ "job": job, "param": param, "count": options.len() })),
                    Some(json!({ "module": "endpoint" })),
                );
            }
            JsonResult::Failure(failure) => {
                stages.push(RefreshStage::Failed(failure.kind()));
                log_warn(
                    "options refresh failed",
                    Some(json!({ "job": job, "param": param, "error": failure.to_string() })),
                    Some(json!({ "module": "endpoint", "code": failure.code() })),
                );
            }
        }
        Refresh { stages, result }
    }

    fn locate(&self, job: &str, param: &str) -> JsonResult<(JobDefinition, ParameterDefinition)> {
        let path = ScopePath::parse(job);
        let Some(job_def) = (!path.is_root()).then(|| self.jobs.job(&path)).flatten() else {
            return JsonResult::failure(Failure::NoJobContext {
                job: job.to_string(),
            });
        };
        let Some(parameter) = job_def.parameter(param).cloned() else {
            return JsonResult::failure(Failure::ParameterNotFound {
                job: path.to_string(),
                name: param.to_string(),
            });
        };
        JsonResult::success((job_def, parameter))
    }

    pub fn options_for(
        &self,
        job: &JobDefinition,
        parameter: &ParameterDefinition,
        ref_value: Option<&str>,
        stages: &mut Vec<RefreshStage>,
    ) -> JsonResult<Vec<OptionItem>> {
        stages.push(RefreshStage::Resolving(parameter.source.kind()));
        let scope = job.scope();
        let json = match resolve_source(
            &parameter.source,
            &scope,
            self.documents.as_ref(),
            self.credentials.as_ref(),
            &self.remote,
        ) {
            JsonResult::Success(json) => json,
            JsonResult::Failure(failure) => return JsonResult::failure(failure),
        };

        stages.push(RefreshStage::Substituting);
        let query = match parameter.reference_name() {
            Some(name) => reference::substitute(&parameter.query, name, ref_value.unwrap_or("")),
            None => parameter.query.clone(),
        };

        stages.push(RefreshStage::Evaluating);
        query::evaluate(&json, &query).map(|mut options| {
            select_default(&mut options, &parameter.default_value);
            options
        })
    }

    /// Documents visible from `scope`, for choosing a config reference.
    pub fn documents(&self, scope: &ScopePath) -> Vec<OptionItem> {
        ConfigResolver::new(self.documents.as_ref()).available_documents(scope)
    }
}

/// Marks the first option whose value equals `default_value` as selected.
/// Blank defaults select nothing.
pub fn select_default(options: &mut [OptionItem], default_value: &str) {
    if default_value.trim().is_empty() {
        return;
    }
    if let Some(option) = options.iter_mut().find(|option| option.value == default_value) {
        option.selected = true;
    }
}

/// Wire form of a refresh result: the option array, or a single disabled
/// entry carrying the failure message.
pub fn to_wire(result: &JsonResult<Vec<OptionItem>>) -> Value {
    let options = match result {
        JsonResult::Success(options) => options.clone(),
        JsonResult::Failure(failure) => vec![OptionItem::explanation(failure.to_string())],
    };
    serde_json::to_value(options).unwrap_or_else(|_| Value::Array(Vec::new()))
}

pub fn error_body(failure: &Failure) -> Value {
    json!({ "error": failure.to_string(), "code": failure.code() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigRef, SourceDescriptor};
    use crate::store::{Document, MemoryCredentialStore, MemoryDocumentStore, MemoryJobCatalog};

    fn endpoint(job: JobDefinition, documents: MemoryDocumentStore) -> OptionsEndpoint {
        let mut jobs = MemoryJobCatalog::new();
        jobs.insert(job);
        OptionsEndpoint::new(
            Arc::new(jobs),
            Arc::new(documents),
            Arc::new(MemoryCredentialStore::new()),
            RemoteResolver::default(),
        )
    }

    fn users_param() -> ParameterDefinition {
        ParameterDefinition::new(
            "EMAIL",
            SourceDescriptor::Config(ConfigRef::Global { id: "users".into() }),
            "$[?(@.name == \"${USERS}\")].email",
        )
        .with_reference("USERS")
    }

    fn users_store() -> MemoryDocumentStore {
        let mut documents = MemoryDocumentStore::new();
        documents.register_global(Document::new(
            "users",
            r#"[{"name":"Alice","email":"a@x.com"},{"name":"Bob","email":"b@x.com"}]"#,
        ));
        documents
    }

    #[test]
    fn refresh_walks_every_stage() {
        let job = JobDefinition::new("team/build").with_parameter(users_param());
        let endpoint = endpoint(job, users_store());
        let refresh = endpoint.refresh("team/build", "EMAIL", Some("Alice"));
        assert_eq!(
            refresh.stages,
            vec![
                RefreshStage::Received,
                RefreshStage::Resolving(SourceKind::Config),
                RefreshStage::Substituting,
                RefreshStage::Evaluating,
                RefreshStage::Succeeded,
            ]
        );
        let options = refresh.result.into_value().unwrap();
        assert_eq!(options, vec![OptionItem::of_value("a@x.com")]);
    }

    #[test]
    fn default_value_is_selected_once() {
        let param = ParameterDefinition::new(
            "NAME",
            SourceDescriptor::Config(ConfigRef::Global { id: "users".into() }),
            "$[*].name",
        )
        .with_default("Bob");
        let job = JobDefinition::new("build").with_parameter(param);
        let endpoint = endpoint(job, users_store());
        let options = endpoint.render("build", "NAME").into_value().unwrap();
        let selected: Vec<&str> = options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value.as_str())
            .collect();
        assert_eq!(selected, vec!["Bob"]);
    }

    #[test]
    fn unknown_default_selects_nothing() {
        let mut options = vec![OptionItem::of_value("a"), OptionItem::of_value("b")];
        select_default(&mut options, "c");
        select_default(&mut options, "  ");
        assert!(options.iter().all(|option| !option.selected));
    }

    #[test]
    fn missing_job_and_parameter_are_context_errors() {
        let job = JobDefinition::new("build").with_parameter(users_param());
        let endpoint = endpoint(job, users_store());

        let no_job = endpoint.handle("missing", "EMAIL", "Alice");
        assert_eq!(no_job.failure_kind(), Some(FailureKind::NoJobContext));

        let root = endpoint.handle("", "EMAIL", "Alice");
        assert_eq!(root.failure_kind(), Some(FailureKind::NoJobContext));

        let no_param = endpoint.refresh("build", "OTHER", Some("Alice"));
        assert_eq!(
            no_param.stages,
            vec![
                RefreshStage::Received,
                RefreshStage::Failed(FailureKind::ParameterNotFound)
            ]
        );
    }

    #[test]
    fn failures_render_as_single_disabled_entry() {
        let result: JsonResult<Vec<OptionItem>> = JsonResult::failure(Failure::NoData);
        let wire = to_wire(&result);
        assert_eq!(
            wire,
            json!([{ "name": Failure::NoData.to_string(), "value": "", "selected": false }])
        );
    }
}
