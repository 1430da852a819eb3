//! Reddit as the discussion service.
//!
//! Uses the OAuth API with a script app's password grant: one bearer token
//! per client, refreshed shortly before it expires.

mod links;
mod types;

pub use links::submission_id;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::bot::{DiscussionService, Mention};
use crate::config::RedditConfig;
use crate::error::{Error, Result};
use crate::post::Post;
use crate::traverse::PostSource;
use types::{CommentResponse, Listing, MessageData, SubmissionData, TokenResponse};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;
/// Refresh the token this long before reddit says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

struct Token {
    value: String,
    expires_at: Instant,
}

pub struct RedditClient {
    http: Client,
    config: RedditConfig,
    token: Mutex<Option<Token>>,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent(config.user_agent())
            .build()?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().map_err(|_| Error::Auth("token lock poisoned".into()))?;
        if let Some(token) = guard.as_ref()
            && token.expires_at > Instant::now()
        {
            return Ok(token.value.clone());
        }

        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()?;
        let body: TokenResponse = check_status(response, "access token")?.json()?;

        let value = match (body.access_token, body.error) {
            (Some(token), None) => token,
            (_, Some(error)) => return Err(Error::Auth(error)),
            (None, None) => return Err(Error::Auth("no access token in response".into())),
        };
        let lifetime = Duration::from_secs(body.expires_in.unwrap_or(3600));
        info!(user = %self.config.username, "authorised to reddit");

        *guard = Some(Token {
            value: value.clone(),
            expires_at: Instant::now() + lifetime.saturating_sub(TOKEN_SLACK),
        });
        Ok(value)
    }

    fn request(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder.bearer_auth(self.access_token()?).send()?;
        check_status(response, what)
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T> {
        let builder = self
            .http
            .get(format!("{API_BASE}{path}"))
            .query(&[("raw_json", "1")])
            .query(query);
        Ok(self.request(builder, what)?.json()?)
    }

    fn post_form(&self, path: &str, form: &[(&str, &str)], what: &str) -> Result<Response> {
        let builder = self.http.post(format!("{API_BASE}{path}")).form(form);
        self.request(builder, what)
    }
}

impl PostSource for RedditClient {
    fn resolve(&self, url: &str) -> Result<Post> {
        let id = submission_id(url)?;
        self.submission(&id)
    }
}

impl DiscussionService for RedditClient {
    fn unread_mentions(&self) -> Result<Vec<Mention>> {
        let listing: Listing<MessageData> =
            self.get("/message/mentions", &[("limit", "100")], "mentions")?;

        let mut mentions = Vec::new();
        for thing in listing.data.children {
            let message = thing.data;
            if !message.new {
                debug!(message = %message.name, "discarding read mention");
                continue;
            }
            info!(message = %message.name, "found trigger comment");
            mentions.push(Mention {
                submission_id: submission_id(&message.context).ok(),
                fullname: message.name,
                body: message.body,
                author: message.author,
            });
        }
        Ok(mentions)
    }

    fn mark_read(&self, fullname: &str) -> Result<()> {
        self.post_form("/api/read_message", &[("id", fullname)], "mark read")?;
        Ok(())
    }

    fn reply(&self, fullname: &str, text: &str) -> Result<()> {
        let response: CommentResponse = self
            .post_form(
                "/api/comment",
                &[("api_type", "json"), ("thing_id", fullname), ("text", text)],
                "reply",
            )?
            .json()?;
        if !response.json.errors.is_empty() {
            return Err(Error::Api {
                status: 200,
                message: format!("reply rejected: {:?}", response.json.errors),
            });
        }
        Ok(())
    }

    fn submission(&self, id: &str) -> Result<Post> {
        let fullname = format!("t3_{id}");
        let listing: Listing<SubmissionData> =
            self.get(&format!("/by_id/{fullname}"), &[], "submission")?;
        let post: Post = listing
            .data
            .children
            .into_iter()
            .next()
            .map(|thing| thing.data.into())
            .ok_or_else(|| Error::NotFound(fullname))?;
        info!(post = %post.id, title = %post.title, "fetched submission");
        Ok(post)
    }
}

/// Map reddit's HTTP status codes onto the error taxonomy.
fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = format!(
        "{what}: HTTP {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    );
    Err(match status {
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Error::NotFound(message),
        StatusCode::UNAUTHORIZED => Error::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => Error::Transient(message),
        s if s.is_server_error() => Error::Transient(message),
        s => Error::Api {
            status: s.as_u16(),
            message,
        },
    })
}
