use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use super::error::RemoteError;
use super::retry::RetryPolicy;
use super::JobsApi;
use crate::job::models::{JobId, JobInput, JobRecord};

/// `JobsApi` over the service's REST interface rooted at a base URL
pub struct HttpJobsClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpJobsClient {
    pub fn new(base_url: &str, client: Client, retry: RetryPolicy) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RemoteError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    /// `{base}/jobs` or `{base}/jobs/{id}` with the id percent-encoded
    fn endpoint(&self, id: Option<&JobId>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("jobs");
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        url
    }
}

async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl JobsApi for HttpJobsClient {
    async fn list(&self) -> Result<Vec<JobRecord>, RemoteError> {
        let client = &self.client;
        let url = &self.endpoint(None);

        self.retry
            .run("list jobs", true, move || async move {
                debug!("GET {}", url);
                let response = ensure_success(client.get(url.clone()).send().await?).await?;
                let jobs = response.json::<Vec<JobRecord>>().await?;
                debug!("Fetched {} jobs", jobs.len());
                Ok(jobs)
            })
            .await
    }

    async fn create(&self, input: &JobInput) -> Result<JobRecord, RemoteError> {
        let client = &self.client;
        let url = &self.endpoint(None);

        self.retry
            .run("create job", false, move || async move {
                debug!("POST {} company={}", url, input.company);
                let response =
                    ensure_success(client.post(url.clone()).json(input).send().await?).await?;
                Ok(response.json::<JobRecord>().await?)
            })
            .await
    }

    async fn update(&self, id: &JobId, input: &JobInput) -> Result<JobRecord, RemoteError> {
        let client = &self.client;
        let url = &self.endpoint(Some(id));

        self.retry
            .run("update job", true, move || async move {
                debug!("PUT {}", url);
                let response = client.put(url.clone()).json(input).send().await?;
                if response.status() == StatusCode::NOT_FOUND {
                    return Err(RemoteError::NotFound(id.clone()));
                }
                let response = ensure_success(response).await?;
                Ok(response.json::<JobRecord>().await?)
            })
            .await
    }

    async fn delete(&self, id: &JobId) -> Result<(), RemoteError> {
        let client = &self.client;
        let url = &self.endpoint(Some(id));

        self.retry
            .run("delete job", true, move || async move {
                debug!("DELETE {}", url);
                let response = client.delete(url.clone()).send().await?;
                if response.status() == StatusCode::NOT_FOUND {
                    debug!("Job {} already gone", id);
                    return Ok(());
                }
                ensure_success(response).await?;
                Ok(())
            })
            .await
    }
}
