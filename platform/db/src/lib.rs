//! Record store primitives: the store port, a PostgREST table client and an
//! in-memory store for local runs.

mod memory;
mod rest;

use async_trait::async_trait;
use entity::{Employee, EmployeeFields, EmployeeId};
use platform_api::{EndpointError, RemoteResult, parse_endpoint};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Table-shaped store of employee rows.
///
/// Update and delete are keyed by id and do not report whether a row
/// matched.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Full-table read, in whatever order the store returns.
    async fn list(&self) -> RemoteResult<Vec<Employee>>;
    /// Inserts one row and returns it with the store-assigned id.
    async fn insert(&self, fields: &EmployeeFields) -> RemoteResult<Employee>;
    async fn update(&self, id: &EmployeeId, fields: &EmployeeFields) -> RemoteResult<()>;
    async fn delete(&self, id: &EmployeeId) -> RemoteResult<()>;
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("store url missing (set {0})")]
    MissingUrl(&'static str),
    #[error("store api key missing (set {0})")]
    MissingApiKey(&'static str),
    #[error("invalid store url")]
    InvalidUrl(#[from] EndpointError),
}

pub type DbResult<T> = Result<T, DbError>;

const URL_KEY: &str = "STORE_URL";
const API_KEY_KEY: &str = "STORE_API_KEY";
const TABLE_KEY: &str = "STORE_TABLE";

/// Connection settings for the hosted employees table.
#[derive(Clone, Debug, Deserialize)]
pub struct StoreSettings {
    pub base_url: Url,
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "employees".to_string()
}

impl StoreSettings {
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> DbResult<Self> {
        Ok(Self {
            base_url: parse_endpoint(base_url.as_ref())?,
            api_key: api_key.into(),
            table: default_table(),
        })
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn from_env() -> DbResult<Self> {
        let base_url = std::env::var(URL_KEY).map_err(|_| DbError::MissingUrl(URL_KEY))?;
        let api_key =
            std::env::var(API_KEY_KEY).map_err(|_| DbError::MissingApiKey(API_KEY_KEY))?;
        let settings = Self::new(base_url, api_key)?;
        Ok(match std::env::var(TABLE_KEY) {
            Ok(table) if !table.trim().is_empty() => settings.with_table(table.trim()),
            _ => settings,
        })
    }

    /// `{base}/rest/v1/{table}`, keeping any path prefix of the base url.
    pub fn table_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["rest", "v1", self.table.as_str()]);
        }
        url
    }
}
