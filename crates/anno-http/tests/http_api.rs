use anno_core::{AnnotationApi, ApiError, EngineConfig};
use anno_http::HttpAnnotationApi;
use anno_model::{Action, BoundaryId, SubmitForm, TaskCategory, TaskId, TokenId, UnitId};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use warp::http::StatusCode;
use warp::Filter;

fn unit_rows() -> serde_json::Value {
    json!({
        "4": {
            "verse_id": 4,
            "tokens": [[
                {"id": 40, "text": "rāmaḥ", "lemma": "rāma"},
                {"id": 41, "text": "gacchati", "lemma": "gam"}
            ]],
            "sentence_boundary": {
                "4": {"id": 4, "task_id": 1, "token_id": 41, "verse_id": 4}
            },
            "sentences": {
                "4": {
                    "40": {"id": 40, "text": "rāmaḥ"},
                    "41": {"id": 41, "text": "gacchati"}
                }
            },
            "word_order": {"4": [41, 40]},
            "heuristics": null
        }
    })
}

async fn serve() -> SocketAddr {
    let units = warp::get()
        .and(warp::path!("corpus" / "unit" / u64))
        .map(|id: u64| match id {
            4 => warp::reply::with_status(warp::reply::json(&unit_rows()), StatusCode::OK),
            500 => warp::reply::with_status(
                warp::reply::json(&json!({"error": "boom"})),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            _ => warp::reply::with_status(warp::reply::json(&json!({})), StatusCode::OK),
        });

    let api = warp::post()
        .and(warp::path("api"))
        .and(warp::body::form())
        .map(|form: HashMap<String, String>| {
            let action = form.get("action").cloned().unwrap_or_default();
            let reply = match action.as_str() {
                "add_token" => json!({
                    "success": true,
                    "message": "token added",
                    "style": "success",
                    "data": {"id": 95}
                }),
                "update_word_order" => json!({
                    "success": form.get("word_order").is_some_and(|v| v.contains("boundary-4")),
                    "message": format!("task {} saved", form.get("task_id").cloned().unwrap_or_default()),
                    "style": "success",
                    "first_task": "sentence_boundary",
                    "next_task": "token_text_annotation"
                }),
                _ => json!({"success": false, "message": "unknown action", "style": "danger"}),
            };
            warp::reply::json(&reply)
        });

    let garbage = warp::post()
        .and(warp::path("garbage"))
        .map(|| "not json");

    let (addr, server) = warp::serve(units.or(api).or(garbage)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn client(addr: SocketAddr, api_path: &str) -> HttpAnnotationApi {
    let config = EngineConfig::new()
        .with_api_url(format!("http://{addr}/{api_path}"))
        .with_unit_data_url(format!("http://{addr}/corpus/unit/{{unit_id}}"));
    HttpAnnotationApi::new(&config).unwrap()
}

#[tokio::test]
async fn fetches_the_row_keyed_by_unit_id() {
    let addr = serve().await;
    let api = client(addr, "api");

    let unit = api.fetch_unit(UnitId(4)).await.unwrap();
    assert_eq!(unit.id(), UnitId(4));
    assert_eq!(unit.word_order(BoundaryId(4)), Some(&[TokenId(41), TokenId(40)][..]));
    assert_eq!(unit.line_tokens().count(), 2);
}

#[tokio::test]
async fn missing_key_and_error_status_are_reported() {
    let addr = serve().await;
    let api = client(addr, "api");

    assert_eq!(
        api.fetch_unit(UnitId(7)).await.unwrap_err(),
        ApiError::MissingUnit(UnitId(7))
    );
    let error = api.fetch_unit(UnitId(500)).await.unwrap_err();
    assert_eq!(error, ApiError::Status(500));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn posts_the_form_envelope_and_fields() {
    let addr = serve().await;
    let api = client(addr, "api");

    let form = SubmitForm::task(TaskCategory::WordOrder, TaskId(2), UnitId(4))
        .with_field("word_order", r#"{"boundary-4":["token-button-41","token-button-40"]}"#);
    let response = api.submit(form).await.unwrap();
    assert!(response.success);
    assert_eq!(response.message, "task 2 saved");
    assert_eq!(response.next_task, Some(TaskCategory::TokenTextAnnotation));
    assert!(!response.wraps_around());

    let response = api
        .submit(SubmitForm::action(Action::AddToken, UnitId(4)).with_field("token_data", "{}"))
        .await
        .unwrap();
    assert_eq!(response.added_token_id(), Some(TokenId(95)));
}

#[tokio::test]
async fn undecodable_reply_is_not_retryable() {
    let addr = serve().await;
    let api = client(addr, "garbage");

    let error = api
        .submit(SubmitForm::action(Action::SplitToken, UnitId(4)))
        .await
        .unwrap_err();
    assert!(matches!(error, ApiError::Decode(_)));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let config = EngineConfig::new()
        .with_api_url("http://127.0.0.1:9/api")
        .with_unit_data_url("http://127.0.0.1:9/corpus/unit/{unit_id}");
    let api = HttpAnnotationApi::new(&config).unwrap();

    let error = api.fetch_unit(UnitId(1)).await.unwrap_err();
    assert!(matches!(error, ApiError::Transport(_)));
}
