//! Mind manager and the mutating operations on [`Mind`].

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use serde::Serialize;
use serde_json::{json, Map, Value};
use serde_with::skip_serializing_none;
use tracing::{debug, info};

use crate::client::{ClientError, Dispatcher, MindsClient};
use crate::completion::ChatDelta;
use crate::model::{DatasourceRef, Mind, MindParameters};
use crate::resources::{found, segment, Datasources};
use crate::validators::validate_mind_name;

/// Template used when a mind is created without one.
pub const DEFAULT_PROMPT_TEMPLATE: &str =
    "Use your database tools to answer the user's question: {{question}}";

/// Model used when a mind is created without one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Project every mind lives in.
pub const PROJECT: &str = "mindsdb";

fn minds_path() -> String {
    format!("projects/{PROJECT}/minds")
}

fn mind_path(name: &str) -> String {
    format!("projects/{PROJECT}/minds/{}", segment(name))
}

/// Arguments for [`Minds::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateMind {
    pub name: String,
    pub model_name: Option<String>,
    pub provider: Option<String>,
    pub prompt_template: Option<String>,
    pub datasources: Vec<DatasourceRef>,
    pub parameters: Option<Map<String, Value>>,
    /// Destroy an existing mind with the same name first.
    pub replace: bool,
    /// Upsert by name with `PUT` instead of creating with `POST`.
    pub update: bool,
}

impl CreateMind {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn prompt_template(mut self, prompt_template: impl Into<String>) -> Self {
        self.prompt_template = Some(prompt_template.into());
        self
    }

    pub fn datasource(mut self, datasource: impl Into<DatasourceRef>) -> Self {
        self.datasources.push(datasource.into());
        self
    }

    pub fn parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }
}

/// Partial change set for [`Mind::update`]. Unset fields are left untouched
/// on the server.
#[derive(Debug, Clone, Default)]
pub struct MindUpdate {
    /// Rename the mind.
    pub name: Option<String>,
    pub model_name: Option<String>,
    pub provider: Option<String>,
    pub prompt_template: Option<String>,
    /// Replace the list of linked datasources.
    pub datasources: Option<Vec<DatasourceRef>>,
    pub parameters: Option<Map<String, Value>>,
}

impl MindUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn prompt_template(mut self, prompt_template: impl Into<String>) -> Self {
        self.prompt_template = Some(prompt_template.into());
        self
    }

    pub fn datasources<I, D>(mut self, datasources: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DatasourceRef>,
    {
        self.datasources = Some(datasources.into_iter().map(Into::into).collect());
        self
    }

    pub fn parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

#[derive(Debug, Serialize)]
struct CreateMindRequest<'a> {
    name: &'a str,
    model_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a str>,
    parameters: MindParameters,
    datasources: Vec<String>,
}

#[skip_serializing_none]
#[derive(Debug, Default, Serialize)]
struct UpdateMindRequest {
    name: Option<String>,
    model_name: Option<String>,
    provider: Option<String>,
    parameters: Option<MindParameters>,
    datasources: Option<Vec<String>>,
}

/// CRUD operations on minds.
#[derive(Clone)]
pub struct Minds {
    dispatcher: Arc<dyn Dispatcher>,
    datasources: Datasources,
}

impl Minds {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, datasources: Datasources) -> Self {
        Self {
            dispatcher,
            datasources,
        }
    }

    /// List all minds.
    pub async fn all(&self) -> Result<Vec<Mind>, ClientError> {
        match self.dispatcher.get(&minds_path()).await? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items.into_iter().map(Mind::from_payload).collect(),
            other => Err(ClientError::UnsupportedObject(format!(
                "expected a list of minds, got {other}"
            ))),
        }
    }

    /// Fetch one mind by name.
    pub async fn find(&self, name: &str) -> Result<Mind, ClientError> {
        let data = self.dispatcher.get(&mind_path(name)).await?;
        Mind::from_payload(data)
    }

    /// Delete a mind.
    pub async fn destroy(&self, name: &str) -> Result<(), ClientError> {
        self.dispatcher.delete(&mind_path(name), None).await?;
        Ok(())
    }

    /// Create a mind and return it as stored by the server.
    ///
    /// Datasources given as [`DatasourceRef::Config`] are created when they do
    /// not exist yet.
    pub async fn create(&self, request: CreateMind) -> Result<Mind, ClientError> {
        validate_mind_name(&request.name)?;

        if request.replace {
            if found(self.find(&request.name).await)?.is_some() {
                info!("Replacing mind '{}'", request.name);
                found(self.destroy(&request.name).await)?;
            } else {
                debug!("No mind '{}' to replace", request.name);
            }
        }

        let datasources = self.resolve_all(&request.datasources).await?;

        let mut parameters = request
            .parameters
            .map(MindParameters::from)
            .unwrap_or_default();
        if let Some(template) = request.prompt_template {
            parameters.prompt_template = Some(template);
        }
        parameters
            .prompt_template
            .get_or_insert_with(|| DEFAULT_PROMPT_TEMPLATE.to_string());

        let body = serde_json::to_value(CreateMindRequest {
            name: &request.name,
            model_name: request.model_name.as_deref().unwrap_or(DEFAULT_MODEL),
            provider: request.provider.as_deref(),
            parameters,
            datasources,
        })?;

        info!("Creating mind '{}'", request.name);
        if request.update {
            self.dispatcher.put(&mind_path(&request.name), body).await?;
        } else {
            self.dispatcher.post(&minds_path(), body).await?;
        }

        self.find(&request.name).await
    }

    /// Resolve a datasource reference to a name, creating the datasource
    /// when a configuration for a missing one is given.
    pub async fn resolve_datasource(&self, datasource: &DatasourceRef) -> Result<String, ClientError> {
        match datasource {
            DatasourceRef::Name(name) => Ok(name.clone()),
            DatasourceRef::Datasource(ds) => Ok(ds.name.clone()),
            DatasourceRef::Config(config) => {
                if found(self.datasources.find(&config.name).await)?.is_none() {
                    info!("Datasource '{}' not found, creating it", config.name);
                    self.datasources.create(config, false).await?;
                }
                Ok(config.name.clone())
            }
        }
    }

    async fn resolve_all(&self, datasources: &[DatasourceRef]) -> Result<Vec<String>, ClientError> {
        let mut names = Vec::with_capacity(datasources.len());
        for datasource in datasources {
            names.push(self.resolve_datasource(datasource).await?);
        }
        Ok(names)
    }
}

impl Mind {
    /// Apply a partial update, then reload every field from the server.
    ///
    /// A rename is tracked locally, so `self.name` is the new name afterwards.
    pub async fn update(&mut self, client: &MindsClient, changes: MindUpdate) -> Result<(), ClientError> {
        if let Some(name) = &changes.name {
            validate_mind_name(name)?;
        }

        let minds = client.minds();
        let datasources = match &changes.datasources {
            Some(refs) => Some(minds.resolve_all(refs).await?),
            None => None,
        };

        let parameters = match (changes.parameters, changes.prompt_template) {
            (None, None) => None,
            (parameters, template) => {
                let mut parameters = parameters.map(MindParameters::from).unwrap_or_default();
                if template.is_some() {
                    parameters.prompt_template = template;
                }
                Some(parameters)
            }
        };

        let body = serde_json::to_value(UpdateMindRequest {
            name: changes.name.clone(),
            model_name: changes.model_name,
            provider: changes.provider,
            parameters,
            datasources,
        })?;

        info!("Updating mind '{}'", self.name);
        minds.dispatcher.patch(&mind_path(&self.name), body).await?;

        if let Some(name) = changes.name {
            self.name = name;
        }

        *self = minds.find(&self.name).await?;
        Ok(())
    }

    /// Link a datasource, creating it first when given a configuration for a
    /// datasource that does not exist.
    pub async fn add_datasource(
        &mut self,
        client: &MindsClient,
        datasource: impl Into<DatasourceRef>,
    ) -> Result<(), ClientError> {
        let minds = client.minds();
        let name = minds.resolve_datasource(&datasource.into()).await?;

        minds
            .dispatcher
            .post(&format!("{}/datasources", mind_path(&self.name)), json!({ "name": name }))
            .await?;

        self.datasources = minds.find(&self.name).await?.datasources;
        Ok(())
    }

    /// Unlink a datasource. Only a name or a fetched datasource is accepted.
    pub async fn remove_datasource(
        &mut self,
        client: &MindsClient,
        datasource: impl Into<DatasourceRef>,
    ) -> Result<(), ClientError> {
        let name = match datasource.into() {
            DatasourceRef::Name(name) => name,
            DatasourceRef::Datasource(ds) => ds.name,
            DatasourceRef::Config(config) => {
                return Err(ClientError::InvalidArgument(format!(
                    "Unknown type of datasource: configuration '{}' cannot be removed, pass its name",
                    config.name
                )))
            }
        };

        let minds = client.minds();
        minds
            .dispatcher
            .delete(&format!("{}/datasources/{}", mind_path(&self.name), segment(&name)), None)
            .await?;

        self.datasources = minds.find(&self.name).await?.datasources;
        Ok(())
    }

    /// Ask the mind a question and return the full answer.
    pub async fn completion(&self, client: &MindsClient, message: &str) -> Result<String, ClientError> {
        client.gateway().complete(&self.name, message).await
    }

    /// Ask the mind a question and receive the answer incrementally.
    ///
    /// Deltas are yielded in arrival order; the stream ends with the upstream
    /// response. Dropping it closes the connection.
    pub async fn completion_stream(
        &self,
        client: &MindsClient,
        message: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ChatDelta, ClientError>> + Send>>, ClientError> {
        client.gateway().complete_stream(&self.name, message).await
    }
}
