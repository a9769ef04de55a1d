use std::io::Write;

use reqwest::{Response, StatusCode};
use sdci_model::{RunRecord, TaskName, TriggerRequest};
use serde::Deserialize;

use crate::error::ClientError;

/// Thin client over the trigger and status endpoints.
pub struct SdciClient {
    base: String,
    token: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// `host:port` → `http://host:port`, trailing slashes dropped.
pub fn normalize_server(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("http://{server}")
    }
}

impl SdciClient {
    pub fn new(server: &str, token: impl Into<String>) -> Self {
        Self {
            base: normalize_server(server),
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Trigger `task` and copy its output stream into `out` as it arrives.
    pub async fn trigger<W: Write>(
        &self,
        task: &str,
        args: &[String],
        out: &mut W,
    ) -> Result<(), ClientError> {
        let task = TaskName::new(task)?;
        let resp = self
            .http
            .post(format!("{}/tasks/{task}/", self.base))
            .bearer_auth(&self.token)
            .json(&TriggerRequest::new(args.iter().cloned()))
            .send()
            .await?;
        let mut resp = check(resp).await?;

        while let Some(chunk) = resp.chunk().await? {
            out.write_all(&chunk)?;
            out.flush()?;
        }
        Ok(())
    }

    /// Latest run record of `task`.
    pub async fn status(&self, task: &str) -> Result<RunRecord, ClientError> {
        let task = TaskName::new(task)?;
        let resp = self
            .http
            .post(format!("{}/tasks/{task}/status/", self.base))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let detail = match resp.text().await {
        Ok(text) => serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.detail)
            .unwrap_or(text),
        Err(e) => e.to_string(),
    };
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::TaskNotFound(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => ClientError::Busy(detail),
        other => ClientError::Rejected {
            status: other.as_u16(),
            detail,
        },
    })
}
