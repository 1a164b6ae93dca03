//! Store client against a local mock of the PostgREST endpoint

use std::io::Read;
use std::sync::Once;

use chrono::{TimeZone, Utc};
use tiny_http::{Header, Method, Request, Response, Server};
use zhaomu::store::{Session, SupabaseStore};
use zhaomu::time_filter::{TimeFilter, TimeRange};
use zhaomu::ZhaomuConfig;

static INIT: Once = Once::new();
const ADDR: &str = "127.0.0.1:18181";

const TODOS: &str = r#"[
    {"id":2,"title":"写周报","is_complete":false,"created_at":"2024-05-01T03:00:00+00:00","user_id":"u-1"},
    {"id":1,"title":"买牛奶","is_complete":true,"created_at":"2024-05-01T01:00:00+00:00","user_id":"u-1"}
]"#;

fn header(req: &Request, name: &'static str) -> Option<String> {
    req.headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

fn handle(req: &mut Request) -> (u16, String) {
    if header(req, "apikey").as_deref() != Some("anon") {
        return (401, r#"{"message":"No API key found in request"}"#.into());
    }
    if header(req, "Authorization").as_deref() != Some("Bearer jwt") {
        return (401, r#"{"message":"JWT expired"}"#.into());
    }
    if header(req, "Prefer").as_deref() != Some("return=representation") {
        return (400, r#"{"message":"missing Prefer"}"#.into());
    }

    let url = req.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let mut body = String::new();
    let _ = req.as_reader().read_to_string(&mut body);

    match (req.method(), path) {
        (Method::Get, "/rest/v1/todos") => {
            if !query.contains("user_id=eq.u-1") || !query.ends_with("order=created_at.desc") {
                return (400, r#"{"message":"unscoped query"}"#.into());
            }
            if query.contains("created_at=gte.2024-04-30T16%3A00%3A00.000Z")
                && query.contains("created_at=lte.2024-05-01T15%3A59%3A59.999Z")
            {
                return (200, TODOS.into());
            }
            if query.contains("created_at=") {
                return (200, "[]".into());
            }
            (200, TODOS.into())
        }
        (Method::Post, "/rest/v1/todos") => {
            let rows: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
            let title = rows[0]["title"].as_str().unwrap_or_default();
            let user = rows[0]["user_id"].as_str().unwrap_or_default();
            (201, format!(
                r#"[{{"id":3,"title":"{}","is_complete":false,"created_at":"2024-05-01T05:00:00+00:00","user_id":"{}"}}]"#,
                title, user
            ))
        }
        (Method::Patch, "/rest/v1/todos") if query.contains("id=eq.1") => {
            let patch: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
            let done = patch["is_complete"].as_bool().unwrap_or_default();
            (200, format!(
                r#"[{{"id":1,"title":"买牛奶","is_complete":{},"created_at":"2024-05-01T01:00:00+00:00"}}]"#,
                done
            ))
        }
        (Method::Patch, "/rest/v1/todos") | (Method::Delete, "/rest/v1/todos") => (200, "[]".into()),
        (Method::Get, "/rest/v1/daily_notes") => (
            200,
            r#"[{"id":5,"content":"今天天气不错","created_at":"2024-05-01T04:00:00+00:00"}]"#.into(),
        ),
        (Method::Post, "/rest/v1/daily_notes") => {
            let rows: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
            let content = rows[0]["content"].as_str().unwrap_or_default();
            (201, format!(r#"[{{"id":6,"content":"{}","created_at":"2024-05-01T06:00:00+00:00"}}]"#, content))
        }
        (Method::Delete, "/rest/v1/daily_notes") if query.contains("id=eq.5") => (
            200,
            r#"[{"id":5,"content":"今天天气不错","created_at":"2024-05-01T04:00:00+00:00"}]"#.into(),
        ),
        _ => (404, r#"{"message":"relation does not exist"}"#.into()),
    }
}

fn start_mock_backend() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http(ADDR).unwrap();
            for mut request in server.incoming_requests() {
                let (status, body) = handle(&mut request);
                let resp = Response::from_string(body)
                    .with_status_code(status)
                    .with_header("Content-Type: application/json".parse::<Header>().unwrap());
                let _ = request.respond(resp);
            }
        });
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    format!("http://{}", ADDR)
}

fn store(token: &str) -> SupabaseStore {
    let base = start_mock_backend();
    let config = ZhaomuConfig {
        supabase_url: Some(base),
        supabase_anon_key: Some("anon".into()),
        timeout_ms: 3000,
        ..ZhaomuConfig::default()
    };
    let session = Session { access_token: token.into(), user_id: "u-1".into() };
    SupabaseStore::new(&config, session).unwrap()
}

#[tokio::test]
async fn list_all_todos_newest_first() {
    let todos = store("jwt").list_todos(TimeFilter::All).await.unwrap();
    let titles: Vec<_> = todos.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["写周报", "买牛奶"]);
    assert!(todos[1].is_complete);
}

#[tokio::test]
async fn range_is_sent_as_utc_millis() {
    let range = TimeRange {
        start: Utc.with_ymd_and_hms(2024, 4, 30, 16, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 5, 1, 15, 59, 59).unwrap() + chrono::Duration::milliseconds(999),
    };
    let todos = store("jwt").list_todos_in(Some(range)).await.unwrap();
    assert_eq!(todos.len(), 2);
}

#[tokio::test]
async fn add_todo_trims_title() {
    let todo = store("jwt").add_todo("  跑步 5 公里  ").await.unwrap();
    assert_eq!(todo.id, 3);
    assert_eq!(todo.title, "跑步 5 公里");
    assert!(!todo.is_complete);
}

#[tokio::test]
async fn toggle_flips_completion() {
    let s = store("jwt");
    let todos = s.list_todos(TimeFilter::All).await.unwrap();
    let milk = todos.iter().find(|t| t.id == 1).unwrap();
    let toggled = s.toggle_todo(milk).await.unwrap();
    assert!(!toggled.is_complete);
    let done = s.set_todo_complete(1, true).await.unwrap();
    assert!(done.is_complete);
}

#[tokio::test]
async fn missing_row_is_no_data() {
    let s = store("jwt");
    assert_eq!(s.set_todo_complete(404, true).await.unwrap_err().reason(), "no_data");
    assert_eq!(s.delete_todo(404).await.unwrap_err().reason(), "no_data");
}

#[tokio::test]
async fn notes_list_add_delete() {
    let s = store("jwt");
    let notes = s.list_notes(TimeFilter::All).await.unwrap();
    assert_eq!(notes[0].content, "今天天气不错");
    let added = s.add_note("读完了第三章").await.unwrap();
    assert_eq!(added.id, 6);
    let deleted = s.delete_note(5).await.unwrap();
    assert_eq!(deleted.id, 5);
    assert_eq!(s.add_note(" ").await.unwrap_err().reason(), "invalid_input");
}

#[tokio::test]
async fn rejected_session_is_backend_error() {
    let err = store("expired").list_notes(TimeFilter::All).await.unwrap_err();
    assert_eq!(err.reason(), "backend_error");
    assert!(err.to_string().contains("JWT expired"));
}
