//! HTTPS client for the hosted table store (PostgREST dialect).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::rows::{CATEGORY_ORDER_COLUMN, TASK_ID_COLUMN, TASK_ORDER_COLUMN};
use super::{CategoryRow, NewTaskRow, RemoteStore, StoreResult, TaskPatchRow, TaskRow};
use crate::config::StoreConfig;
use crate::error::{Error, RemoteError, Result};
use crate::task::TaskId;

const PREFER_REPRESENTATION: &str = "return=representation";

/// Store handle backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    base: Url,
    tasks_table: String,
    categories_table: String,
}

impl PostgrestStore {
    /// Build a handle from configuration. Fails when the URL or key is missing.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::InvalidConfig("store.url is not set".to_string()))?;
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::InvalidConfig("store.api_key is not set".to_string()))?;

        let base = rest_base(url, &config.rest_path)?;
        let client = Client::builder()
            .default_headers(auth_headers(api_key)?)
            .build()?;

        Ok(Self {
            client,
            base,
            tasks_table: config.tasks_table.clone(),
            categories_table: config.categories_table.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn table_url(&self, table: &str) -> StoreResult<Url> {
        self.base
            .join(table)
            .map_err(|err| RemoteError::new(format!("invalid table url for '{table}': {err}")))
    }

    fn request(&self, method: Method, table: &str, query: &[(&str, String)]) -> StoreResult<RequestBuilder> {
        let url = self.table_url(table)?;
        Ok(self.client.request(method, url).query(query))
    }

    async fn send<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> StoreResult<T> {
        let body = self.send_raw(operation, request).await?;
        serde_json::from_str(&body).map_err(|err| {
            RemoteError::new(format!("{operation}: unexpected response body: {err}"))
        })
    }

    async fn send_raw(&self, operation: &str, request: RequestBuilder) -> StoreResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(operation, status = status.as_u16(), "store response");
        if status.is_success() {
            Ok(body)
        } else {
            Err(decode_error(status, &body))
        }
    }

    async fn single_row(&self, operation: &str, request: RequestBuilder) -> StoreResult<TaskRow> {
        let rows: Vec<TaskRow> = self.send(operation, request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::new(format!("{operation}: store returned no rows")))
    }
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn select_tasks(&self) -> StoreResult<Vec<TaskRow>> {
        debug!(table = %self.tasks_table, "select tasks");
        let request = self.request(
            Method::GET,
            &self.tasks_table,
            &[select_all(), order_by(TASK_ORDER_COLUMN, false)],
        )?;
        self.send("select tasks", request).await
    }

    async fn insert_task(&self, row: NewTaskRow) -> StoreResult<TaskRow> {
        debug!(table = %self.tasks_table, "insert task");
        let body = json_body(&[row])?;
        let request = self
            .request(Method::POST, &self.tasks_table, &[])?
            .header("Prefer", PREFER_REPRESENTATION)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.single_row("insert task", request).await
    }

    async fn update_task(&self, id: &TaskId, patch: TaskPatchRow) -> StoreResult<TaskRow> {
        debug!(table = %self.tasks_table, task_id = %id, "update task");
        let body = json_body(&patch)?;
        let request = self
            .request(Method::PATCH, &self.tasks_table, &[eq_filter(TASK_ID_COLUMN, id)])?
            .header("Prefer", PREFER_REPRESENTATION)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.single_row("update task", request).await
    }

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        debug!(table = %self.tasks_table, task_id = %id, "delete task");
        let request =
            self.request(Method::DELETE, &self.tasks_table, &[eq_filter(TASK_ID_COLUMN, id)])?;
        self.send_raw("delete task", request).await?;
        Ok(())
    }

    async fn select_categories(&self) -> StoreResult<Vec<CategoryRow>> {
        debug!(table = %self.categories_table, "select categories");
        let request = self.request(
            Method::GET,
            &self.categories_table,
            &[select_all(), order_by(CATEGORY_ORDER_COLUMN, true)],
        )?;
        self.send("select categories", request).await
    }
}

/// `{url}{rest_path}/` with exactly one slash between segments, so that
/// `Url::join(table)` appends instead of replacing the last segment.
pub fn rest_base(url: &str, rest_path: &str) -> Result<Url> {
    let mut parsed = Url::parse(url.trim())
        .map_err(|err| Error::InvalidConfig(format!("store.url '{url}' is invalid: {err}")))?;
    if !matches!(parsed.scheme(), "https" | "http") {
        return Err(Error::InvalidConfig(format!(
            "store.url must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    let segments: Vec<String> = [parsed.path(), rest_path]
        .iter()
        .map(|part| part.trim().trim_matches('/'))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    if segments.is_empty() {
        parsed.set_path("/");
    } else {
        parsed.set_path(&format!("/{}/", segments.join("/")));
    }
    Ok(parsed)
}

fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let invalid = |_| Error::InvalidConfig("store.api_key contains invalid characters".to_string());
    let mut headers = HeaderMap::new();
    let mut key = HeaderValue::from_str(api_key).map_err(invalid)?;
    key.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(invalid)?;
    bearer.set_sensitive(true);
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

fn json_body<T: serde::Serialize + ?Sized>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|err| RemoteError::new(format!("failed to encode request body: {err}")))
}

fn select_all() -> (&'static str, String) {
    ("select", "*".to_string())
}

pub fn order_by(column: &str, ascending: bool) -> (&'static str, String) {
    let direction = if ascending { "asc" } else { "desc" };
    ("order", format!("{column}.{direction}"))
}

pub fn eq_filter<'a>(column: &'a str, id: &TaskId) -> (&'a str, String) {
    (column, format!("eq.{id}"))
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Turn a non-success response into a `RemoteError`, keeping whatever the
/// store said about it.
pub fn decode_error(status: StatusCode, body: &str) -> RemoteError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = match (parsed.message, parsed.details) {
        (Some(message), Some(details)) => format!("{message}: {details}"),
        (Some(message), None) => message,
        (None, Some(details)) => details,
        (None, None) if !body.trim().is_empty() => body.trim().to_string(),
        (None, None) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    RemoteError {
        status: Some(status.as_u16()),
        message,
        code: parsed.code,
        hint: parsed.hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskInput, TaskPatch};
    use chrono::Utc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[derive(Debug)]
    struct Captured {
        method: String,
        target: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }
    }

    /// Answers one connection per canned response, in order, and hands back
    /// what each request looked like on the wire.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Captured>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = tokio::spawn(async move {
            let mut captured = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.expect("accept");
                captured.push(read_request(&mut socket).await);
                let reply = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.expect("write");
                socket.shutdown().await.expect("shutdown");
            }
            captured
        });
        (url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.expect("read");
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next().expect("request line").split(' ');
        let method = request_line.next().expect("method").to_string();
        let target = request_line.next().expect("target").to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        let length: usize = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        while buf.len() < header_end + length {
            let n = socket.read(&mut chunk).await.expect("read body");
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[header_end..header_end + length]).to_string();

        Captured {
            method,
            target,
            headers,
            body,
        }
    }

    fn store_at(url: &str) -> PostgrestStore {
        PostgrestStore::from_config(&config(url, "anon-key")).expect("store")
    }

    #[tokio::test]
    async fn reads_send_ordering_and_credentials() {
        let (url, server) = serve(vec![
            (200, r#"[{"id_tarea":2,"titulo":"B"},{"id_tarea":1,"titulo":"A"}]"#),
            (200, r#"[{"id_categoria":1,"nombre":"trabajo"}]"#),
        ])
        .await;
        let store = store_at(&url);

        let rows = store.select_tasks().await.expect("tasks");
        assert_eq!(rows.len(), 2);
        let categories = store.select_categories().await.expect("categories");
        assert_eq!(categories[0].name.as_deref(), Some("trabajo"));

        let requests = server.await.expect("server");
        assert_eq!(requests[0].method, "GET");
        assert_eq!(
            requests[0].target,
            "/rest/v1/tareas?select=*&order=fecha_creacion.desc"
        );
        assert_eq!(requests[0].header("apikey"), Some("anon-key"));
        assert_eq!(requests[0].header("authorization"), Some("Bearer anon-key"));
        assert_eq!(requests[1].method, "GET");
        assert_eq!(
            requests[1].target,
            "/rest/v1/categorias?select=*&order=nombre.asc"
        );
    }

    #[tokio::test]
    async fn insert_posts_a_single_row_array() {
        let (url, server) = serve(vec![(
            201,
            r#"[{"id_tarea":9,"titulo":"B","completada":false}]"#,
        )])
        .await;
        let store = store_at(&url);

        let row = store
            .insert_task(NewTaskRow::from(&TaskInput::new("B")))
            .await
            .expect("insert");
        assert_eq!(row.title.as_deref(), Some("B"));

        let requests = server.await.expect("server");
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/rest/v1/tareas");
        assert_eq!(request.header("prefer"), Some("return=representation"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(&request.body).expect("json body");
        let rows = body.as_array().expect("array body");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["titulo"], "B");
        assert_eq!(rows[0]["completada"], false);
        assert_eq!(rows[0]["prioridad"], "media");
    }

    #[tokio::test]
    async fn update_targets_the_id_and_fails_on_empty_representation() {
        let (url, server) = serve(vec![(200, "[]")]).await;
        let store = store_at(&url);

        let err = store
            .update_task(
                &TaskId::from(7),
                TaskPatchRow::new(&TaskPatch::completion(true), Utc::now()),
            )
            .await
            .expect_err("empty representation");
        assert!(err.message.contains("no rows"), "{err}");

        let requests = server.await.expect("server");
        let request = &requests[0];
        assert_eq!(request.method, "PATCH");
        assert_eq!(request.target, "/rest/v1/tareas?id_tarea=eq.7");
        assert_eq!(request.header("prefer"), Some("return=representation"));
        let body: serde_json::Value = serde_json::from_str(&request.body).expect("json body");
        assert_eq!(body["completada"], true);
        assert!(body.get("titulo").is_none());
        assert!(body["fecha_actualizacion"].is_string());
    }

    #[tokio::test]
    async fn delete_succeeds_on_no_content_and_decodes_errors() {
        let (url, server) = serve(vec![
            (204, ""),
            (409, r#"{"message":"still referenced","code":"23503","hint":"remove links"}"#),
        ])
        .await;
        let store = store_at(&url);

        store.delete_task(&TaskId::from(3)).await.expect("delete");
        let err = store
            .delete_task(&TaskId::new("abc"))
            .await
            .expect_err("conflict");
        assert_eq!(err.status, Some(409));
        assert_eq!(err.message, "still referenced");
        assert_eq!(err.code.as_deref(), Some("23503"));
        assert_eq!(err.hint.as_deref(), Some("remove links"));

        let requests = server.await.expect("server");
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].target, "/rest/v1/tareas?id_tarea=eq.3");
        assert_eq!(requests[1].target, "/rest/v1/tareas?id_tarea=eq.abc");
    }

    fn config(url: &str, key: &str) -> StoreConfig {
        StoreConfig {
            url: Some(url.to_string()),
            api_key: Some(key.to_string()),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn rest_base_normalizes_slashes() {
        let base = rest_base("https://demo.example.co/", "/rest/v1/").expect("url");
        assert_eq!(base.as_str(), "https://demo.example.co/rest/v1/");
        assert_eq!(
            base.join("tareas").expect("join").as_str(),
            "https://demo.example.co/rest/v1/tareas"
        );
    }

    #[test]
    fn rest_base_rejects_other_schemes() {
        assert!(matches!(
            rest_base("ftp://demo.example.co", "rest/v1"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(rest_base("not a url", "rest/v1").is_err());
    }

    #[test]
    fn query_fragments_follow_store_syntax() {
        assert_eq!(
            order_by("fecha_creacion", false),
            ("order", "fecha_creacion.desc".to_string())
        );
        assert_eq!(
            eq_filter("id_tarea", &TaskId::from(42)),
            ("id_tarea", "eq.42".to_string())
        );
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let err = PostgrestStore::from_config(&config("https://demo.example.co", " "))
            .expect_err("missing key");
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = PostgrestStore::from_config(&StoreConfig::default()).expect_err("missing url");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn handle_builds_from_complete_config() {
        let store = PostgrestStore::from_config(&config("https://demo.example.co", "anon-key"))
            .expect("store");
        assert_eq!(store.base_url().as_str(), "https://demo.example.co/rest/v1/");
    }

    #[test]
    fn decode_error_prefers_store_message() {
        let err = decode_error(
            StatusCode::BAD_REQUEST,
            r#"{"message":"null value in column \"titulo\"","code":"23502","hint":null,"details":"Failing row"}"#,
        );
        assert_eq!(err.status, Some(400));
        assert_eq!(err.code.as_deref(), Some("23502"));
        assert!(err.message.starts_with("null value"));
        assert!(err.message.ends_with("Failing row"));
    }

    #[test]
    fn decode_error_falls_back_to_body_or_reason() {
        let err = decode_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.message, "upstream down");
        let err = decode_error(StatusCode::NOT_FOUND, "");
        assert_eq!(err.message, "Not Found");
    }
}
