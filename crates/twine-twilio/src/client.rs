//! Async HTTP client for the Twilio Messages REST API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use twine_core::{message::RawMessage, source::RemoteSource, thread::User};

use crate::{
  Error, Result,
  wire::{MessagePage, WireMessage, merge},
};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Twilio's maximum page size for the Messages list.
const PAGE_SIZE: u32 = 1000;

/// The session: account SID, auth token and the account's phone number.
///
/// Fields default to empty so a partially filled config deserialises and is
/// rejected by [`TwilioClient::login`] with a precise error instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
  #[serde(default)]
  pub sid:    String,
  #[serde(default)]
  pub token:  String,
  #[serde(default)]
  pub number: String,
}

/// A logged-in Twilio account.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TwilioClient {
  client:      Client,
  credentials: Credentials,
  base_url:    String,
}

impl TwilioClient {
  /// Validate `credentials` and build a client for them. No request is made.
  pub fn login(credentials: Credentials) -> Result<Self> {
    if credentials.sid.trim().is_empty() {
      return Err(Error::MissingCredentials("sid"));
    }
    if credentials.token.trim().is_empty() {
      return Err(Error::MissingCredentials("token"));
    }
    if credentials.number.trim().is_empty() {
      return Err(Error::MissingCredentials("number"));
    }

    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, credentials, base_url: DEFAULT_BASE_URL.to_owned() })
  }

  /// Point the client at another host (a proxy or a local stand-in).
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  /// The session, for persisting and resuming later.
  pub fn credentials(&self) -> &Credentials { &self.credentials }

  fn messages_url(&self) -> String {
    format!(
      "{}/2010-04-01/Accounts/{}/Messages.json",
      self.base_url.trim_end_matches('/'),
      self.credentials.sid
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    req.basic_auth(&self.credentials.sid, Some(&self.credentials.token))
  }

  async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { status, body });
    }
    Ok(resp.json().await?)
  }

  /// Every message whose `field` (`From` or `To`) is the account number,
  /// following Twilio's paging to the end.
  async fn list(&self, field: &str, since: Option<DateTime<Utc>>) -> Result<Vec<RawMessage>> {
    let mut query = vec![
      (field.to_owned(), self.credentials.number.clone()),
      ("PageSize".to_owned(), PAGE_SIZE.to_string()),
    ];
    if let Some(since) = since {
      query.push(("DateSent>".to_owned(), since.format("%Y-%m-%d").to_string()));
    }

    let resp = self
      .auth(self.client.get(self.messages_url()))
      .query(&query)
      .send()
      .await?;
    let mut page: MessagePage = Self::decode(resp).await?;

    let mut out = Vec::new();
    loop {
      for wire in page.messages.drain(..) {
        out.push(wire.into_raw()?);
      }
      let Some(next) = page.next_page_uri.take() else { break };
      let url = format!("{}{}", self.base_url.trim_end_matches('/'), next);
      let resp = self.auth(self.client.get(url)).send().await?;
      page = Self::decode(resp).await?;
    }

    debug!(field, count = out.len(), "listed Twilio messages");
    Ok(out)
  }
}

impl RemoteSource for TwilioClient {
  type Error = Error;

  fn current_user(&self) -> User { User::current(&self.credentials.number, None) }

  async fn messages_of_number(&self, since: Option<DateTime<Utc>>) -> Result<Vec<RawMessage>> {
    let (sent, received) = tokio::try_join!(self.list("From", since), self.list("To", since))?;
    Ok(merge(sent.into_iter().chain(received)))
  }

  async fn send_message(&self, to: &str, text: &str) -> Result<RawMessage> {
    let form = [
      ("To", to),
      ("From", self.credentials.number.as_str()),
      ("Body", text),
    ];
    let resp = self
      .auth(self.client.post(self.messages_url()))
      .form(&form)
      .send()
      .await?;
    let created: WireMessage = Self::decode(resp).await?;
    created.into_raw()
  }
}
