//! Hosted `todos` / `daily_notes` tables
//!
//! Thin client over the backend's PostgREST endpoint. Every request carries
//! the project's anon key plus the caller's session token and is scoped to the
//! session's `user_id`; lists come back newest first.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::proxy::{build_client, classify};
use crate::summary::{Note, Todo};
use crate::time_filter::{TimeFilter, TimeRange};
use crate::{Error, Result, ZhaomuConfig};

const TODOS: &str = "todos";
const NOTES: &str = "daily_notes";

/// Signed-in user, as handed over by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
}

pub struct SupabaseStore {
    rest: Url,
    anon_key: String,
    session: Session,
    client: Client,
    timeout_ms: u64,
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl SupabaseStore {
    pub fn new(config: &ZhaomuConfig, session: Session) -> Result<Self> {
        let base = config
            .supabase_url
            .as_deref()
            .ok_or_else(|| Error::MissingKey("SUPABASE_URL".into()))?;
        let anon_key = config
            .supabase_anon_key
            .clone()
            .ok_or_else(|| Error::MissingKey("SUPABASE_ANON_KEY".into()))?;
        let rest = crate::proxy::endpoint(base, "rest/v1/")?;
        let client = build_client(config.timeout_ms, None)?;
        Ok(Self { rest, anon_key, session, client, timeout_ms: config.timeout_ms })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        let mut url = self
            .rest
            .join(table)
            .map_err(|e| Error::ConfigError(format!("bad table {}: {}", table, e)))?;
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{}", self.session.user_id));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.session.access_token)
            .header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Vec<T>> {
        let resp = req.send().await.map_err(|e| classify(&e, self.timeout_ms))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| classify(&e, self.timeout_ms))?;
        if !status.is_success() {
            let message = crate::proxy::upstream_message(&body, "message")
                .unwrap_or_else(|| format!("backend answered {}", status));
            log::warn!("store request failed: {}", message);
            return Err(Error::BackendError(message));
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| Error::ParseError(e.to_string()))
    }

    async fn list<T: DeserializeOwned>(&self, table: &str, range: Option<TimeRange>) -> Result<Vec<T>> {
        let mut url = self.table_url(table)?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("select", "*");
            if let Some(r) = range {
                q.append_pair("created_at", &format!("gte.{}", timestamp(&r.start)));
                q.append_pair("created_at", &format!("lte.{}", timestamp(&r.end)));
            }
            q.append_pair("order", "created_at.desc");
        }
        self.send(self.request(Method::GET, url)).await
    }

    async fn insert<T: DeserializeOwned>(&self, table: &str, row: serde_json::Value) -> Result<T> {
        let url = self
            .rest
            .join(table)
            .map_err(|e| Error::ConfigError(format!("bad table {}: {}", table, e)))?;
        let rows: Vec<T> = self.send(self.request(Method::POST, url).json(&[row])).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::BackendError(format!("insert into {} returned no row", table)))
    }

    /// PATCH or DELETE one row by id; the row must belong to the session user.
    async fn by_id<T: DeserializeOwned>(
        &self,
        method: Method,
        table: &str,
        id: i64,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        let mut req = self.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let rows: Vec<T> = self.send(req).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::NoData(format!("{} #{} not found", table, id)))
    }

    /// Todos in the local-time window of `filter`.
    pub async fn list_todos(&self, filter: TimeFilter) -> Result<Vec<Todo>> {
        let range = filter.range(Local::now().date_naive(), &Local)?;
        self.list_todos_in(range).await
    }

    pub async fn list_todos_in(&self, range: Option<TimeRange>) -> Result<Vec<Todo>> {
        self.list(TODOS, range).await
    }

    /// Add a todo; the title is trimmed and must not be empty.
    pub async fn add_todo(&self, title: &str) -> Result<Todo> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("todo title is empty".into()));
        }
        let row = serde_json::json!({ "title": title, "user_id": self.session.user_id });
        self.insert(TODOS, row).await
    }

    pub async fn set_todo_complete(&self, id: i64, done: bool) -> Result<Todo> {
        let body = serde_json::json!({ "is_complete": done });
        self.by_id(Method::PATCH, TODOS, id, Some(body)).await
    }

    pub async fn toggle_todo(&self, todo: &Todo) -> Result<Todo> {
        self.set_todo_complete(todo.id, !todo.is_complete).await
    }

    pub async fn delete_todo(&self, id: i64) -> Result<Todo> {
        self.by_id(Method::DELETE, TODOS, id, None).await
    }

    pub async fn list_notes(&self, filter: TimeFilter) -> Result<Vec<Note>> {
        let range = filter.range(Local::now().date_naive(), &Local)?;
        self.list_notes_in(range).await
    }

    pub async fn list_notes_in(&self, range: Option<TimeRange>) -> Result<Vec<Note>> {
        self.list(NOTES, range).await
    }

    pub async fn add_note(&self, content: &str) -> Result<Note> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("note is empty".into()));
        }
        let row = serde_json::json!({ "content": content, "user_id": self.session.user_id });
        self.insert(NOTES, row).await
    }

    pub async fn delete_note(&self, id: i64) -> Result<Note> {
        self.by_id(Method::DELETE, NOTES, id, None).await
    }
}
