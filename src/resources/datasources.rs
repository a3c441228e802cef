//! Datasource manager.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::{ClientError, Dispatcher};
use crate::model::{DatabaseConfig, Datasource};
use crate::resources::{found, segment};
use crate::validators::validate_datasource_name;

fn datasource_path(name: &str) -> String {
    format!("datasources/{}", segment(name))
}

/// CRUD operations on datasources.
#[derive(Clone)]
pub struct Datasources {
    dispatcher: Arc<dyn Dispatcher>,
}

impl Datasources {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Create a datasource and return it as stored by the server.
    ///
    /// With `replace`, an existing datasource with the same name is destroyed
    /// first; a missing one is not an error.
    pub async fn create(
        &self,
        config: &DatabaseConfig,
        replace: bool,
    ) -> Result<Datasource, ClientError> {
        validate_datasource_name(&config.name)?;

        if replace {
            self.remove_existing(&config.name).await?;
        }

        info!("Creating datasource '{}' ({})", config.name, config.engine);
        self.dispatcher.post("datasources", config.to_payload()?).await?;
        self.find(&config.name).await
    }

    /// Create or overwrite a datasource by name in one call.
    pub async fn upsert(&self, config: &DatabaseConfig) -> Result<Datasource, ClientError> {
        validate_datasource_name(&config.name)?;

        info!("Upserting datasource '{}' ({})", config.name, config.engine);
        self.dispatcher
            .put(&datasource_path(&config.name), config.to_payload()?)
            .await?;
        self.find(&config.name).await
    }

    /// List datasources. Entries without an `engine` are other resource kinds
    /// and are skipped.
    pub async fn all(&self) -> Result<Vec<Datasource>, ClientError> {
        let data = self.dispatcher.get("datasources").await?;

        let items = match data {
            Value::Array(items) => items,
            Value::Null => return Ok(Vec::new()),
            other => {
                return Err(ClientError::UnsupportedObject(format!(
                    "expected a list of datasources, got {other}"
                )))
            }
        };

        let mut datasources = Vec::with_capacity(items.len());
        for item in items {
            match Datasource::from_payload(item)? {
                Some(ds) => datasources.push(ds),
                None => debug!("Skipping listed item without engine"),
            }
        }
        Ok(datasources)
    }

    /// Fetch one datasource by name.
    pub async fn find(&self, name: &str) -> Result<Datasource, ClientError> {
        let data = self.dispatcher.get(&datasource_path(name)).await?;
        Datasource::from_payload(data)?
            .ok_or_else(|| ClientError::UnsupportedObject(format!("Wrong type of datasource: {name}")))
    }

    /// Delete a datasource. With `force`, it is also detached from every mind
    /// that still uses it.
    pub async fn destroy(&self, name: &str, force: bool) -> Result<(), ClientError> {
        let body = force.then(|| json!({ "cascade": true }));
        self.dispatcher.delete(&datasource_path(name), body).await?;
        Ok(())
    }

    async fn remove_existing(&self, name: &str) -> Result<(), ClientError> {
        if found(self.find(name).await)?.is_none() {
            debug!("No datasource '{}' to replace", name);
            return Ok(());
        }
        info!("Replacing datasource '{}'", name);
        found(self.destroy(name, false).await)?;
        Ok(())
    }
}
