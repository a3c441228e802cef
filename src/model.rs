//! Entity models exchanged with the Minds API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DefaultOnNull};

use crate::client::ClientError;

/// Client-side description of a datasource that should exist.
///
/// Serializes to the creation payload
/// `{name, engine, description, connection_data, tables}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseConfig {
    /// Unique datasource name.
    pub name: String,
    /// Database handler, e.g. `postgres` or `mysql`.
    pub engine: String,
    /// Tells the mind what data it can retrieve from this database.
    pub description: String,
    /// Credentials and connection parameters.
    pub connection_data: Map<String, Value>,
    /// Allow-listed tables. Empty means all tables.
    pub tables: Vec<String>,
}

impl DatabaseConfig {
    pub fn new(
        name: impl Into<String>,
        engine: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            engine: engine.into(),
            description: description.into(),
            connection_data: Map::new(),
            tables: Vec::new(),
        }
    }

    /// Set one connection parameter.
    pub fn with_connection(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.connection_data.insert(key.into(), value.into());
        self
    }

    /// Replace all connection parameters.
    pub fn with_connection_data(mut self, connection_data: Map<String, Value>) -> Self {
        self.connection_data = connection_data;
        self
    }

    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Request payload for this configuration.
    pub fn to_payload(&self) -> Result<Value, ClientError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A datasource confirmed by the server.
///
/// Only obtained from [`Datasources`](crate::Datasources); a payload without
/// an `engine` belongs to another resource kind and is rejected.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    pub name: String,
    pub engine: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub description: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub connection_data: Map<String, Value>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Datasource {
    /// Decode a server payload. Returns `Ok(None)` when the payload has no
    /// `engine`, i.e. it is not a datasource at all.
    pub fn from_payload(payload: Value) -> Result<Option<Self>, ClientError> {
        if matches!(payload.get("engine"), None | Some(Value::Null)) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(payload)?))
    }
}

impl From<Datasource> for DatabaseConfig {
    fn from(ds: Datasource) -> Self {
        Self {
            name: ds.name,
            engine: ds.engine,
            description: ds.description,
            connection_data: ds.connection_data,
            tables: ds.tables,
        }
    }
}

/// Reference to a datasource when linking it to a mind.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasourceRef {
    /// An existing datasource, by name.
    Name(String),
    /// A datasource previously fetched from the server.
    Datasource(Datasource),
    /// A datasource that is created first if it does not exist yet.
    Config(DatabaseConfig),
}

impl DatasourceRef {
    pub fn name(&self) -> &str {
        match self {
            DatasourceRef::Name(name) => name,
            DatasourceRef::Datasource(ds) => &ds.name,
            DatasourceRef::Config(config) => &config.name,
        }
    }
}

impl From<&str> for DatasourceRef {
    fn from(name: &str) -> Self {
        DatasourceRef::Name(name.to_string())
    }
}

impl From<String> for DatasourceRef {
    fn from(name: String) -> Self {
        DatasourceRef::Name(name)
    }
}

impl From<Datasource> for DatasourceRef {
    fn from(ds: Datasource) -> Self {
        DatasourceRef::Datasource(ds)
    }
}

impl From<&Datasource> for DatasourceRef {
    fn from(ds: &Datasource) -> Self {
        DatasourceRef::Datasource(ds.clone())
    }
}

impl From<DatabaseConfig> for DatasourceRef {
    fn from(config: DatabaseConfig) -> Self {
        DatasourceRef::Config(config)
    }
}

/// Mind parameters with the reserved prompt template split out of the
/// provider-specific extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MindParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt_template(mut self, prompt_template: impl Into<String>) -> Self {
        self.prompt_template = Some(prompt_template.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl From<Map<String, Value>> for MindParameters {
    fn from(mut extra: Map<String, Value>) -> Self {
        let prompt_template = match extra.remove("prompt_template") {
            Some(Value::String(template)) => Some(template),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        Self {
            prompt_template,
            extra,
        }
    }
}

/// Snapshot of a mind as last reported by the server.
///
/// Mutating operations live on `Mind` but take the originating
/// [`MindsClient`](crate::MindsClient); see `resources::minds`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Mind {
    pub name: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub parameters: MindParameters,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "linked_datasources")]
    pub datasources: Vec<String>,
}

impl Mind {
    pub fn prompt_template(&self) -> Option<&str> {
        self.parameters.prompt_template.as_deref()
    }

    pub fn from_payload(payload: Value) -> Result<Self, ClientError> {
        Ok(serde_json::from_value(payload)?)
    }
}

/// The server lists linked datasources either by name or as objects.
fn linked_datasources<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Linked {
        Name(String),
        Object { name: String },
    }

    let linked: Option<Vec<Linked>> = Option::deserialize(deserializer)?;
    Ok(linked
        .unwrap_or_default()
        .into_iter()
        .map(|entry| match entry {
            Linked::Name(name) | Linked::Object { name } => name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_config_payload() {
        let config = DatabaseConfig::new("sales_db", "postgres", "Sales data")
            .with_connection("host", "localhost")
            .with_connection("port", 5432)
            .with_tables(["orders"]);

        assert_eq!(
            config.to_payload().unwrap(),
            json!({
                "name": "sales_db",
                "engine": "postgres",
                "description": "Sales data",
                "connection_data": {"host": "localhost", "port": 5432},
                "tables": ["orders"]
            })
        );
    }

    #[test]
    fn test_datasource_requires_engine() {
        let ds = Datasource::from_payload(json!({
            "name": "sales_db",
            "engine": "postgres",
            "description": null,
            "connection_data": null,
            "created_at": "2024-10-01 10:00:00"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(ds.engine, "postgres");
        assert_eq!(ds.description, "");
        assert!(ds.connection_data.is_empty());
        assert!(ds.tables.is_empty());
        assert_eq!(ds.created_at.as_deref(), Some("2024-10-01 10:00:00"));

        assert!(Datasource::from_payload(json!({"name": "files"})).unwrap().is_none());
        assert!(Datasource::from_payload(json!({"name": "files", "engine": null}))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_mind_extracts_prompt_template() {
        let mind = Mind::from_payload(json!({
            "name": "sales_mind",
            "model_name": "gpt-4o",
            "provider": "openai",
            "parameters": {"prompt_template": "Answer: {{question}}", "max_rows": 10},
            "created_at": "2024-10-01",
            "updated_at": "2024-10-02",
            "datasources": ["sales_db", {"name": "crm_db"}]
        }))
        .unwrap();

        assert_eq!(mind.prompt_template(), Some("Answer: {{question}}"));
        assert!(!mind.parameters.extra.contains_key("prompt_template"));
        assert_eq!(mind.parameters.extra["max_rows"], 10);
        assert_eq!(mind.datasources, vec!["sales_db", "crm_db"]);
    }

    #[test]
    fn test_mind_tolerates_nulls() {
        let mind = Mind::from_payload(json!({
            "name": "bare",
            "parameters": null,
            "datasources": null
        }))
        .unwrap();
        assert_eq!(mind.prompt_template(), None);
        assert!(mind.datasources.is_empty());
        assert!(mind.model_name.is_none());
    }

    #[test]
    fn test_parameters_from_map() {
        let mut map = Map::new();
        map.insert("prompt_template".into(), json!("t"));
        map.insert("k".into(), json!(1));
        let params = MindParameters::from(map);
        assert_eq!(params.prompt_template.as_deref(), Some("t"));
        assert_eq!(serde_json::to_value(&params).unwrap(), json!({"prompt_template": "t", "k": 1}));
    }

    #[test]
    fn test_datasource_ref_names() {
        let config = DatabaseConfig::new("pending", "mysql", "");
        assert_eq!(DatasourceRef::from("by_name").name(), "by_name");
        assert_eq!(DatasourceRef::from(config).name(), "pending");
    }
}
