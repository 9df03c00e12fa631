use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use shared::{ErrorBody, MessageBody, NewUser, User, UserChanges};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/users";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Status { status: StatusCode, message: String },
}

impl ServiceError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServiceError::Transport(err) => err.status(),
            ServiceError::Status { status, .. } => Some(*status),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The five user operations exposed by the api. Every call is a single
/// request; failures are returned as-is.
#[allow(async_fn_in_trait)]
pub trait UserApi {
    async fn create_user(&self, user: &NewUser) -> ServiceResult<User>;
    async fn fetch_users(&self) -> ServiceResult<Vec<User>>;
    async fn fetch_user(&self, id: i64) -> ServiceResult<User>;
    async fn update_user(&self, id: i64, changes: &UserChanges) -> ServiceResult<User>;
    async fn delete_user(&self, id: i64) -> ServiceResult<MessageBody>;
}

#[derive(Debug, Clone)]
pub struct UserService {
    client: reqwest::Client,
    base_url: String,
}

impl UserService {
    /// `base_url` points at the users collection, e.g. [`DEFAULT_BASE_URL`].
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, id: i64) -> String {
        format!("{}/{id}", self.base_url)
    }
}

async fn parse<T: DeserializeOwned>(res: reqwest::Response) -> ServiceResult<T> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }

    let body = res.text().await?;
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|body| body.error)
        .unwrap_or(body);
    tracing::debug!("Request failed with {}: {}", status, message);

    Err(ServiceError::Status { status, message })
}

impl UserApi for UserService {
    async fn create_user(&self, user: &NewUser) -> ServiceResult<User> {
        tracing::debug!("POST {}", self.base_url);
        let res = self.client.post(&self.base_url).json(user).send().await?;
        parse(res).await
    }

    async fn fetch_users(&self) -> ServiceResult<Vec<User>> {
        tracing::debug!("GET {}", self.base_url);
        let res = self.client.get(&self.base_url).send().await?;
        parse(res).await
    }

    async fn fetch_user(&self, id: i64) -> ServiceResult<User> {
        let url = self.user_url(id);
        tracing::debug!("GET {}", url);
        let res = self.client.get(url).send().await?;
        parse(res).await
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> ServiceResult<User> {
        let url = self.user_url(id);
        tracing::debug!("PUT {}", url);
        let res = self.client.put(url).json(changes).send().await?;
        parse(res).await
    }

    async fn delete_user(&self, id: i64) -> ServiceResult<MessageBody> {
        let url = self.user_url(id);
        tracing::debug!("DELETE {}", url);
        let res = self.client.delete(url).send().await?;
        parse(res).await
    }
}
