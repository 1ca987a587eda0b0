use std::fmt::Display;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use reqwest::{cookie::Jar, Client, Response, StatusCode};
use serde_json::{json, Value};

use crate::account::Account;

const ME_EXPAND: &str = "customer%2Ccustomer.groups%2Ccustomer.plan%2Ccustomer.settings%2Ccustomer.timeZone%2Ccustomer.brand%2CmasterUser%2CpartnerRole%2Crole";
const DETAIL_EXPAND: &str = "hiringLead%2Cquestionnaire%2Cworkflow%2Cworkflow.workflowSteps%2CsyndicationChannels%2ChasScorecardTemplateJob";
const CLOSE_EXPAND: &str = "syndicationChannels%2ChiringLead";
const CLONE_EXPAND: &str = "classifications%2ChiringLead%2Cquestionnaire%2Cquestionnaire.questions%2Cworkflow%2Cworkflow.workflowSteps%2Cworkflow.automatedReply";

/// A non-2xx API response, carried as a value so callers can log it with
/// the offending item's id and move on.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: String,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API responded {}: {}", self.status, self.body)
    }
}

impl std::error::Error for ApiError {}

/// One method per remote endpoint. All calls ride on the cookie jar the
/// browser bridge keeps refreshed.
pub struct ApiClient {
    client: Client,
    api_url: String,
}

impl ApiClient {
    pub fn new(api_url: impl Into<String>, jar: Arc<Jar>) -> Result<Self> {
        let client = Client::builder()
            .cookie_provider(jar)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub async fn accounts(&self) -> Result<Vec<Account>> {
        let body = self
            .get_json("customerManager/hub/accounts?page=1&per_page=100")
            .await?;
        serde_json::from_value(body).context("parsing account list")
    }

    pub async fn me(&self) -> Result<Value> {
        self.get_json(&format!("user/me?expand={ME_EXPAND}")).await
    }

    /// First 500 open jobs for the given user; there is no pagination.
    pub async fn open_jobs(&self, user_id: &str) -> Result<Vec<Value>> {
        let body = self
            .get_json(&format!("user/{user_id}/job/open?per_page=500"))
            .await?;
        serde_json::from_value(body).context("parsing open-jobs listing")
    }

    pub async fn job_detail(&self, job_id: &str) -> Result<Value> {
        self.get_json(&format!("job/{job_id}?expand={DETAIL_EXPAND}"))
            .await
    }

    pub async fn close_job(&self, payload: &Value) -> Result<Value> {
        let url = format!("{}/job?expand={CLOSE_EXPAND}", self.api_url);
        let res = self
            .client
            .put(&url)
            .json(payload)
            .send()
            .await
            .context("sending close request")?;
        Self::check(res).await
    }

    /// Creates a new job as a clone of `old_job_id`.
    pub async fn clone_job(&self, old_job_id: &str, payload: &Value) -> Result<Value> {
        let url = format!(
            "{}/job?isCloning=true&oldJobId={old_job_id}&expand={CLONE_EXPAND}",
            self.api_url,
        );
        let res = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .context("sending clone request")?;
        Self::check(res).await
    }

    /// Wipes the custom field values on a freshly created job. The id is
    /// passed through as raw JSON because the create response may return
    /// it as either a string or a number.
    pub async fn clear_custom_fields(&self, job_id: &Value) -> Result<Value> {
        let url = format!("{}/job/field", self.api_url);
        let payload = json!({ "customFieldValues": [], "id": job_id });
        let res = self
            .client
            .put(&url)
            .json(&payload)
            .send()
            .await
            .context("sending custom-field clear request")?;
        Self::check(res).await
    }

    async fn get_json(&self, path_and_query: &str) -> Result<Value> {
        let url = format!("{}/{path_and_query}", self.api_url);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        Self::check(res).await
    }

    async fn check(res: Response) -> Result<Value> {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ApiError { status, body }.into());
        }
        serde_json::from_str(&body).context("parsing API response body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_reports_status_and_body() {
        let err = ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "upstream exploded".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("500"), "{rendered}");
        assert!(rendered.contains("upstream exploded"), "{rendered}");
    }

    #[test]
    fn api_error_downcasts_through_anyhow() {
        let err: anyhow::Error = ApiError {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        }
        .into();
        assert!(err.downcast_ref::<ApiError>().is_some());
    }
}
