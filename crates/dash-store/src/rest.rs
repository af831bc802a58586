//! REST backend for the hosted backend-as-a-service
//!
//! Speaks the PostgREST dialect: tables under `/rest/v1/<table>`, filters as
//! `column=eq.value` query pairs, upserts via `Prefer: resolution=merge-duplicates`.
//! `commit` calls the `save_tenant_config` RPC, which writes both tables in
//! one database transaction.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use crate::backend::{LayoutRow, TableBackend, TenantRow};
use crate::error::{StoreError, StoreResult};
use crate::settings::BackendSettings;

const TENANTS: &str = "tenants";
const LAYOUTS: &str = "layouts";
const USER_ROLES: &str = "user_roles";
const COMMIT_RPC: &str = "rpc/save_tenant_config";

#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: String,
}

/// HTTP client for the tenant tables
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    access_key: String,
    schema: String,
}

impl RestBackend {
    /// Build a client from complete settings
    ///
    /// # Errors
    /// Fails if the endpoint or access key is missing.
    pub fn new(settings: &BackendSettings) -> StoreResult<Self> {
        let endpoint = settings
            .endpoint
            .as_deref()
            .ok_or(StoreError::NotConfigured("endpoint"))?;
        let access_key = settings
            .access_key
            .clone()
            .ok_or(StoreError::NotConfigured("access key"))?;
        let client = Client::builder().timeout(settings.timeout()).build()?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            access_key,
            schema: settings.schema.clone(),
        })
    }

    /// URL of a table or RPC path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("apikey", &self.access_key)
            .bearer_auth(&self.access_key)
            .header("Accept-Profile", &self.schema)
            .header("Content-Profile", &self.schema)
    }

    fn upsert(&self, table: &str, conflict: &str) -> RequestBuilder {
        self.request(Method::POST, table)
            .query(&[("on_conflict", conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
    }

    async fn send(builder: RequestBuilder) -> StoreResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Backend(format!("{status}: {body}")))
    }
}

#[async_trait]
impl TableBackend for RestBackend {
    async fn fetch_tenant(&self, tenant_id: &str) -> StoreResult<Option<TenantRow>> {
        let request = self
            .request(Method::GET, TENANTS)
            .query(&[("id", format!("eq.{tenant_id}")), ("select", "*".into())]);
        let rows: Vec<TenantRow> = Self::send(request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_layouts(&self, tenant_id: &str) -> StoreResult<Vec<LayoutRow>> {
        let request = self.request(Method::GET, LAYOUTS).query(&[
            ("tenant_id", format!("eq.{tenant_id}")),
            ("select", "*".into()),
            ("order", "page_id".into()),
        ]);
        Ok(Self::send(request).await?.json().await?)
    }

    async fn upsert_tenant(&self, row: TenantRow) -> StoreResult<()> {
        Self::send(self.upsert(TENANTS, "id").json(&[row])).await?;
        Ok(())
    }

    async fn upsert_layouts(&self, rows: Vec<LayoutRow>) -> StoreResult<()> {
        Self::send(self.upsert(LAYOUTS, "tenant_id,page_id").json(&rows)).await?;
        Ok(())
    }

    async fn commit(&self, tenant: TenantRow, layouts: Vec<LayoutRow>) -> StoreResult<()> {
        let body = json!({ "tenant": tenant, "layouts": layouts });
        Self::send(self.request(Method::POST, COMMIT_RPC).json(&body)).await?;
        Ok(())
    }

    async fn delete_tenant(&self, tenant_id: &str) -> StoreResult<()> {
        let request = self
            .request(Method::DELETE, TENANTS)
            .query(&[("id", format!("eq.{tenant_id}"))]);
        Self::send(request).await?;
        Ok(())
    }

    async fn list_tenant_ids(&self) -> StoreResult<Vec<String>> {
        let request = self.request(Method::GET, TENANTS).query(&[("select", "id")]);
        let rows: Vec<IdRow> = Self::send(request).await?.json().await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    async fn fetch_user_role(&self, user_id: &str, tenant_id: &str) -> StoreResult<Option<String>> {
        let request = self.request(Method::GET, USER_ROLES).query(&[
            ("user_id", format!("eq.{user_id}")),
            ("tenant_id", format!("eq.{tenant_id}")),
            ("select", "role".into()),
        ]);
        let rows: Vec<RoleRow> = Self::send(request).await?.json().await?;
        Ok(rows.into_iter().next().map(|r| r.role))
    }
}
