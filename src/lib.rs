//! # minds - Minds API client
//!
//! A small, typed Rust client for the Minds service: database-backed
//! conversational agents ("minds") and the datasources they query.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Versioned, authenticated request dispatcher with typed errors
//! - Idempotent create-or-replace semantics for minds and datasources
//! - Implicit datasource creation when linking minds to new databases
//! - Unary and streaming completions against a mind
//!
//! ## Architecture
//!
//! 1. **`MindsClient`** stores the endpoint and credentials and lazily hands out
//!    resource managers.
//! 2. **Resource managers** (`Datasources`, `Minds`) validate input and turn the
//!    dispatcher into entity-shaped CRUD operations.
//! 3. **`Dispatcher`** is the shared request layer; `RestClient` implements it
//!    with reqwest.
//! 4. **Entities** (`Datasource`, `Mind`) are detached snapshots of server state.
//!
//! ## Example
//! ```no_run
//! use minds::{ClientOptions, DatabaseConfig, MindsClient};
//! use minds::resources::CreateMind;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MindsClient::new(ClientOptions::new("your-api-key"))?;
//!
//!     let sales = DatabaseConfig::new("sales_db", "postgres", "Sales records")
//!         .with_connection("host", "localhost")
//!         .with_tables(["orders", "customers"]);
//!
//!     let mind = client
//!         .minds()
//!         .create(CreateMind::new("sales_assistant").datasource(sales).replace(true))
//!         .await?;
//!
//!     let answer = mind.completion(&client, "How many orders shipped last week?").await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod completion;
pub mod http;
pub mod model;
pub mod options;
pub mod resources;
pub mod sse;
pub mod validators;

pub use client::{ClientError, Dispatcher, MindsClient};
pub use completion::{ChatDelta, ChatGateway};
pub use http::RestClient;
pub use model::{DatabaseConfig, Datasource, DatasourceRef, Mind, MindParameters};
pub use options::{ClientOptions, TransportOptions};
pub use resources::{CreateMind, Datasources, MindUpdate, Minds};

/// Library version, reported in error logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
