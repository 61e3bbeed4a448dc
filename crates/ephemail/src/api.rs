//! REST client for a mail.tm-style disposable inbox service.

use std::time::Duration;

use ephemail_core::{BoxFuture, InboxDeleter, MessageId, MessageRecord, MessageSource};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the mail API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Underlying HTTP client error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The operation needs an inbox token and none was configured.
    #[error("no inbox token configured")]
    MissingToken,
}

/// The authenticated inbox account.
#[derive(Debug, Clone, Deserialize)]
struct Account {
    id: String,
}

/// Client for one temporary inbox.
#[derive(Debug, Clone)]
pub struct MailApi {
    http: Client,
    base: String,
    token: Option<String>,
}

impl MailApi {
    /// Creates a client for `base` (no trailing slash needed).
    pub fn new(base: &str, token: Option<String>) -> Result<Self, ApiError> {
        let http = ClientBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ephemail/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetches a single message.
    pub async fn get_message(&self, id: &MessageId) -> Result<MessageRecord, ApiError> {
        let request = self.http.get(self.url(&format!("messages/{id}")));
        let response = self.authorized(request).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Deletes the account behind the configured token.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        if self.token.is_none() {
            return Err(ApiError::MissingToken);
        }
        let me = self.authorized(self.http.get(self.url("me"))).send().await?;
        let account: Account = check_status(me).await?.json().await?;

        let request = self.http.delete(self.url(&format!("accounts/{}", account.id)));
        check_status(self.authorized(request).send().await?).await?;
        tracing::info!(account = %account.id, "inbox account deleted");
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

impl MessageSource for MailApi {
    fn fetch(&self, id: &MessageId) -> BoxFuture<ephemail_core::Result<MessageRecord>> {
        let api = self.clone();
        let id = id.clone();
        Box::pin(async move {
            api.get_message(&id)
                .await
                .map_err(|e| ephemail_core::Error::Fetch(e.to_string()))
        })
    }
}

impl InboxDeleter for MailApi {
    fn delete_inbox(&self) -> BoxFuture<ephemail_core::Result<()>> {
        let api = self.clone();
        Box::pin(async move {
            api.delete_account()
                .await
                .map_err(|e| ephemail_core::Error::Delete(e.to_string()))
        })
    }
}
