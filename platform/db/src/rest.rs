use async_trait::async_trait;
use entity::{Employee, EmployeeFields, EmployeeId};
use platform_api::{RemoteError, RemoteResult, send_checked};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::{RecordStore, StoreSettings};

const PREFER: &str = "Prefer";

/// PostgREST client for one table (Supabase-compatible).
#[derive(Clone, Debug)]
pub struct RestStore {
    client: Client,
    table_url: Url,
    api_key: String,
}

impl RestStore {
    pub fn new(settings: &StoreSettings) -> RemoteResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &StoreSettings) -> Self {
        Self {
            client,
            table_url: settings.table_url(),
            api_key: settings.api_key.clone(),
        }
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.table_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn by_id(&self, method: Method, id: &EmployeeId) -> RequestBuilder {
        self.request(method).query(&[("id", format!("eq.{id}"))])
    }
}

#[async_trait]
impl RecordStore for RestStore {
    #[instrument(skip(self), fields(url = %self.table_url))]
    async fn list(&self) -> RemoteResult<Vec<Employee>> {
        let body = send_checked(self.request(Method::GET).query(&[("select", "*")])).await?;
        let rows: Vec<Employee> = decode(&body)?;
        debug!(rows = rows.len(), "fetched employees");
        Ok(rows)
    }

    #[instrument(skip(self, fields), fields(url = %self.table_url))]
    async fn insert(&self, fields: &EmployeeFields) -> RemoteResult<Employee> {
        let request = self
            .request(Method::POST)
            .header(PREFER, "return=representation")
            .json(&[fields]);
        let body = send_checked(request).await?;
        let rows: Vec<Employee> = decode(&body)?;
        rows.into_iter().next().ok_or(RemoteError::EmptyInsert)
    }

    #[instrument(skip(self, id, fields), fields(url = %self.table_url, id = %id))]
    async fn update(&self, id: &EmployeeId, fields: &EmployeeFields) -> RemoteResult<()> {
        let request = self
            .by_id(Method::PATCH, id)
            .header(PREFER, "return=minimal")
            .json(fields);
        send_checked(request).await?;
        Ok(())
    }

    #[instrument(skip(self, id), fields(url = %self.table_url, id = %id))]
    async fn delete(&self, id: &EmployeeId) -> RemoteResult<()> {
        send_checked(self.by_id(Method::DELETE, id)).await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> RemoteResult<T> {
    serde_json::from_slice(body).map_err(|err| RemoteError::Decode(err.to_string()))
}
