//! HTTP client for the HDX CKAN action API

use crate::config::HdxConfig;
use crate::dataset::{Dataset, Resource};
use crate::error::{PublishError, Result};
use crate::hdx::endpoints;
use crate::hdx::repository::{DatasetRepository, RunStamp, UpsertAction, UpsertOutcome};
use crate::hdx::types::*;
use async_trait::async_trait;
use gem_common::types::ResourceFormat;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Longest response body quoted in an error message
const MAX_ERROR_BODY: usize = 300;

/// Where a resource upload lands
enum UploadTarget<'a> {
    Create { package_id: &'a str },
    Update { resource_id: &'a str },
}

/// API client for one HDX site
pub struct HdxClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HdxClient {
    /// Create a client sending the API key and user agent on every request
    pub fn new(config: &HdxConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&config.api_key)
            .map_err(|_| PublishError::config("HDX_KEY contains characters not allowed in a header"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fail unless the key may create datasets in `owner_org` (id or name)
    pub async fn check_write_access(&self, owner_org: &str) -> Result<()> {
        let action = "organization_list_for_user";
        let url = endpoints::organization_list_for_user_url(&self.base_url);
        let response = self.send(action, self.client.get(&url)).await?;
        let organizations: Vec<OrganizationSummary> =
            require_result(action, parse_envelope(action, response).await?)?;

        if organizations
            .iter()
            .any(|org| org.id == owner_org || org.name == owner_org)
        {
            debug!(owner_org, "Write access confirmed");
            Ok(())
        } else {
            Err(PublishError::AccessDenied(format!(
                "the API key cannot create datasets in organisation '{}'",
                owner_org
            )))
        }
    }

    async fn package_show(&self, name: &str) -> Result<Option<RemoteDataset>> {
        let action = "package_show";
        let url = endpoints::package_show_url(&self.base_url, name);
        let response = self.send(action, self.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        parse_envelope(action, response).await
    }

    async fn write_package(&self, action: &str, payload: &PackagePayload<'_>) -> Result<RemoteDataset> {
        let url = endpoints::action_url(&self.base_url, action);
        let response = self.send(action, self.client.post(&url).json(payload)).await?;
        require_result(action, parse_envelope(action, response).await?)
    }

    async fn upload_resource(
        &self,
        target: UploadTarget<'_>,
        resource: &Resource,
    ) -> Result<(RemoteResource, u64)> {
        let bytes = tokio::fs::read(&resource.path).await?;
        let size = bytes.len() as u64;

        let part = Part::bytes(bytes)
            .file_name(resource.name.clone())
            .mime_str(mime_type(resource.format))?;

        let fields = ResourceFields::from(resource);
        let form = Form::new()
            .text("name", fields.name)
            .text("description", fields.description)
            .text("format", fields.format)
            .part("upload", part);

        let (action, form) = match target {
            UploadTarget::Create { package_id } => {
                ("resource_create", form.text("package_id", package_id.to_string()))
            },
            UploadTarget::Update { resource_id } => {
                ("resource_update", form.text("id", resource_id.to_string()))
            },
        };

        let url = endpoints::action_url(&self.base_url, action);
        let response = self.send(action, self.client.post(&url).multipart(form)).await?;
        let remote = require_result(action, parse_envelope(action, response).await?)?;

        debug!(resource = %resource.name, action, size, "Uploaded resource");
        Ok((remote, size))
    }

    async fn delete_resource(&self, resource_id: &str) -> Result<()> {
        let action = "resource_delete";
        let url = endpoints::action_url(&self.base_url, action);
        let body = DeleteRequest { id: resource_id };
        let response = self.send(action, self.client.post(&url).json(&body)).await?;
        parse_envelope::<serde_json::Value>(action, response).await?;
        Ok(())
    }

    async fn reorder_resources(&self, package_id: &str, order: Vec<&str>) -> Result<()> {
        let action = "package_resource_reorder";
        let url = endpoints::action_url(&self.base_url, action);
        let body = ReorderRequest {
            id: package_id,
            order,
        };
        let response = self.send(action, self.client.post(&url).json(&body)).await?;
        parse_envelope::<serde_json::Value>(action, response).await?;
        Ok(())
    }

    async fn send(&self, action: &str, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                PublishError::timeout(format!("HDX {}", action), self.timeout_secs)
            } else {
                PublishError::Http(e)
            }
        })
    }
}

#[async_trait]
impl DatasetRepository for HdxClient {
    async fn find_by_name(&self, name: &str) -> Result<Option<RemoteDataset>> {
        self.package_show(name).await
    }

    async fn upsert(
        &self,
        dataset: &Dataset,
        existing: Option<&RemoteDataset>,
        stamp: &RunStamp,
    ) -> Result<UpsertOutcome> {
        let payload = PackagePayload::new(dataset, existing.map(|e| e.id.as_str()), stamp);
        let (action, package) = match existing {
            Some(_) => (UpsertAction::Updated, self.write_package("package_patch", &payload).await?),
            None => (UpsertAction::Created, self.write_package("package_create", &payload).await?),
        };
        info!(dataset = %package.name, id = %package.id, %action, "Dataset metadata saved");

        let mut uploaded_ids = Vec::with_capacity(dataset.resources.len());
        let mut reused_ids: Vec<&str> = Vec::new();
        let mut bytes_uploaded = 0;

        for resource in &dataset.resources {
            let target = match existing.and_then(|e| e.resource_named(&resource.name)) {
                Some(remote) => {
                    reused_ids.push(&remote.id);
                    UploadTarget::Update {
                        resource_id: &remote.id,
                    }
                },
                None => UploadTarget::Create {
                    package_id: &package.id,
                },
            };
            let (remote, size) = self.upload_resource(target, resource).await?;
            uploaded_ids.push(remote.id);
            bytes_uploaded += size;
        }

        let mut resources_removed = 0;
        if let Some(existing) = existing {
            for stale in existing
                .resources
                .iter()
                .filter(|r| !reused_ids.contains(&r.id.as_str()))
            {
                warn!(resource = %stale.name, id = %stale.id, "Removing resource not in this run");
                self.delete_resource(&stale.id).await?;
                resources_removed += 1;
            }
        }

        self.reorder_resources(&package.id, uploaded_ids.iter().map(String::as_str).collect())
            .await?;

        Ok(UpsertOutcome {
            action,
            dataset_id: package.id,
            dataset_name: package.name,
            resources_uploaded: uploaded_ids.len(),
            resources_removed,
            bytes_uploaded,
        })
    }
}

fn mime_type(format: ResourceFormat) -> &'static str {
    match format {
        ResourceFormat::Csv => "text/csv",
        ResourceFormat::GeoJson => "application/geo+json",
    }
}

/// Unwrap the CKAN envelope, turning failures into [`PublishError::Api`]
async fn parse_envelope<T: DeserializeOwned>(action: &str, response: Response) -> Result<Option<T>> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<ActionResponse<T>>(&body) {
        Ok(envelope) if envelope.success && status.is_success() => Ok(envelope.result),
        Ok(envelope) => Err(PublishError::api(
            action,
            Some(status.as_u16()),
            envelope
                .error
                .map(|e| e.describe())
                .unwrap_or_else(|| "request was not successful".to_string()),
        )),
        Err(_) => Err(PublishError::api(
            action,
            Some(status.as_u16()),
            truncate(&body, MAX_ERROR_BODY),
        )),
    }
}

fn require_result<T>(action: &str, result: Option<T>) -> Result<T> {
    result.ok_or_else(|| PublishError::api(action, None, "response had no result"))
}

fn truncate(body: &str, max: usize) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "empty response body".to_string();
    }
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
