use crate::message::{ConversationKind, Message};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const BASE_URL: &str = "https://slack.com/api";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Failures at the Slack Web API surface.
///
/// Retry and backoff are deliberately not handled here; a failed call
/// surfaces immediately and the caller decides what a failure means for
/// the conversation being processed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a usable HTTP response.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// Slack answered with `ok: false`.
    #[error("slack api {method} failed: {error}")]
    Slack { method: &'static str, error: String },
    /// Slack answered `ok: true` but the payload did not have the
    /// expected shape.
    #[error("slack api {method} returned an unexpected response: {source}")]
    Decode {
        method: &'static str,
        source: serde_json::Error,
    },
}

/// One page of a conversation's history. Messages are newest-first
/// within the page.
#[derive(Debug, Deserialize)]
pub struct HistoryPage {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub has_more: bool,
}

/// Where history pages come from.
///
/// The paginator in `fetcher` only needs this one call, so tests can
/// script a source without touching the network.
pub trait HistorySource {
    /// Request up to `count` messages ending at the `latest` cursor
    /// (`None` = start from the most recent message).
    fn history_page(
        &self,
        channel_id: &str,
        latest: Option<&str>,
        count: usize,
    ) -> Result<HistoryPage, ApiError>;
}

/// Identity reported by `auth.test`.
#[derive(Debug, Deserialize)]
pub struct AuthInfo {
    pub team: String,
    pub user: String,
}

/// A channel (public or private) as returned by the list endpoints.
/// Known fields are typed; the remainder rides along in `rest` so the
/// snapshot dump reproduces the records verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

/// A direct-message conversation; `user` is the peer's user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: String,
    pub user: String,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

/// A workspace member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct ChannelList {
    channels: Vec<Channel>,
}

#[derive(Deserialize)]
struct GroupList {
    groups: Vec<Channel>,
}

#[derive(Deserialize)]
struct ImList {
    ims: Vec<DirectMessage>,
}

#[derive(Deserialize)]
struct MemberList {
    members: Vec<User>,
}

/// Thin synchronous client for the Slack Web API methods the archiver
/// needs: `auth.test`, the four list endpoints and the per-class history
/// endpoints.
pub struct SlackClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            http: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            base_url: BASE_URL.to_string(),
            token: token.into(),
        })
    }

    /// Check the token and report who we are authenticated as.
    pub fn auth_test(&self) -> Result<AuthInfo, ApiError> {
        self.call("auth.test", &[])
    }

    pub fn list_channels(&self) -> Result<Vec<Channel>, ApiError> {
        Ok(self.call::<ChannelList>("channels.list", &[])?.channels)
    }

    pub fn list_private_channels(&self) -> Result<Vec<Channel>, ApiError> {
        Ok(self.call::<GroupList>("groups.list", &[])?.groups)
    }

    pub fn list_direct_messages(&self) -> Result<Vec<DirectMessage>, ApiError> {
        Ok(self.call::<ImList>("im.list", &[])?.ims)
    }

    pub fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.call::<MemberList>("users.list", &[])?.members)
    }

    /// The history endpoint for one conversation class, as a pageable
    /// source the fetcher can drive.
    pub fn history(&self, kind: ConversationKind) -> ConversationHistory<'_> {
        ConversationHistory { client: self, kind }
    }

    /// Issue one API call and decode the response envelope. Every Slack
    /// response carries `ok`; on `ok: false` the `error` field is the
    /// machine-readable reason.
    fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let value: serde_json::Value = self
            .http
            .get(format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.token)
            .query(params)
            .send()?
            .error_for_status()?
            .json()?;

        if !value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
            let error = value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(ApiError::Slack { method, error });
        }
        serde_json::from_value(value).map_err(|source| ApiError::Decode { method, source })
    }
}

/// A class-specific history endpoint (`channels.history`, `groups.history`
/// or `im.history`) bound to a client.
pub struct ConversationHistory<'a> {
    client: &'a SlackClient,
    kind: ConversationKind,
}

impl HistorySource for ConversationHistory<'_> {
    fn history_page(
        &self,
        channel_id: &str,
        latest: Option<&str>,
        count: usize,
    ) -> Result<HistoryPage, ApiError> {
        let method = match self.kind {
            ConversationKind::Channel => "channels.history",
            ConversationKind::PrivateChannel => "groups.history",
            ConversationKind::DirectMessage => "im.history",
        };
        let mut params = vec![
            ("channel", channel_id.to_string()),
            ("oldest", "0".to_string()),
            ("count", count.to_string()),
        ];
        if let Some(latest) = latest {
            params.push(("latest", latest.to_string()));
        }
        self.client.call(method, &params)
    }
}
