use anno_core::tasks::{SentenceClassificationTask, WordOrderTask};
use anno_core::{
    AnnotationApi, ApiError, CorpusGrid, EngineConfig, PageCache, SessionPhase, SubmitOutcome,
    TaskError, TaskOrchestrator,
};
use anno_model::{
    Action, BoundaryId, NewToken, SubmitForm, SubmitResponse, TaskCategory, TokenId, UnitId,
    UnitRecord,
};
use anno_store::{MemoryStore, StateStore};
use anno_test_utils::{create_test_page, manual_token, UnitBuilder};
use async_trait::async_trait;
use mockall::mock;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;

mock! {
    pub Api {}

    #[async_trait]
    impl AnnotationApi for Api {
        async fn fetch_unit(&self, unit: UnitId) -> Result<UnitRecord, ApiError>;
        async fn submit(&self, form: SubmitForm) -> Result<SubmitResponse, ApiError>;
    }
}

struct Harness {
    orchestrator: TaskOrchestrator,
    grid: Arc<PageCache>,
    store: Arc<MemoryStore>,
}

fn harness(api: impl AnnotationApi + 'static) -> Harness {
    let grid = Arc::new(PageCache::new(create_test_page(3)));
    let store = Arc::new(MemoryStore::new());
    let orchestrator = TaskOrchestrator::new(
        EngineConfig::new().with_all_tasks(),
        Arc::new(api),
        grid.clone(),
        store.clone(),
    );
    Harness {
        orchestrator,
        grid,
        store,
    }
}

fn accepted(first: TaskCategory, next: TaskCategory) -> SubmitResponse {
    SubmitResponse {
        success: true,
        message: "saved".to_string(),
        style: "success".to_string(),
        first_task: Some(first),
        next_task: Some(next),
        data: None,
    }
}

fn action_response(data: serde_json::Value) -> SubmitResponse {
    SubmitResponse {
        success: true,
        message: "ok".to_string(),
        style: "success".to_string(),
        data: Some(data),
        ..SubmitResponse::default()
    }
}

fn serve_units(api: &mut MockApi, units: Vec<UnitRecord>) {
    api.expect_fetch_unit().returning(move |id| {
        units
            .iter()
            .find(|unit| unit.id() == id)
            .cloned()
            .ok_or(ApiError::MissingUnit(id))
    });
}

#[tokio::test]
async fn word_order_submission_advances_and_clears_stored_state() {
    let mut api = MockApi::new();
    api.expect_submit()
        .withf(|form| {
            form.action_kind() == Action::Update(TaskCategory::WordOrder)
                && form.field("word_order")
                    == Some(r#"{"boundary-1":["token-button-12","token-button-11","token-button-10"]}"#)
        })
        .times(1)
        .returning(|_| {
            Ok(accepted(
                TaskCategory::SentenceBoundary,
                TaskCategory::TokenTextAnnotation,
            ))
        });
    serve_units(&mut api, create_test_page(3));
    let h = harness(api);

    h.orchestrator.open_unit(0).unwrap();
    h.orchestrator.start_task(TaskCategory::WordOrder).unwrap();
    h.orchestrator
        .edit(|task: &mut WordOrderTask| {
            task.reorder(BoundaryId(1), &[TokenId(12), TokenId(11), TokenId(10)])
        })
        .unwrap();
    assert!(h.store.get("boundary_word_order_boundary-1").is_some());

    let outcome = h
        .orchestrator
        .submit_task(TaskCategory::WordOrder)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Advanced {
            unit: UnitId(1),
            next_task: Some(TaskCategory::TokenTextAnnotation),
            wrapped: false,
            message: "saved".to_string(),
        }
    );
    for key in [
        "boundary_word_order_boundary-1",
        "boundary_heuristic_word_order_boundary-1",
        "boundary_state_boundary-1",
    ] {
        assert_eq!(h.store.get(key), None, "{key} survived");
    }
    assert_eq!(
        h.orchestrator.phase(),
        SessionPhase::TaskActive(TaskCategory::TokenTextAnnotation)
    );
}

#[tokio::test]
async fn last_task_wraps_to_the_next_unit() {
    let mut api = MockApi::new();
    api.expect_submit().times(1).returning(|_| {
        Ok(accepted(
            TaskCategory::SentenceBoundary,
            TaskCategory::SentenceBoundary,
        ))
    });
    serve_units(&mut api, create_test_page(3));
    let h = harness(api);

    h.orchestrator.open_unit(0).unwrap();
    h.orchestrator.start_task(TaskCategory::SentenceGraph).unwrap();
    let outcome = h
        .orchestrator
        .submit_task(TaskCategory::SentenceGraph)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Advanced {
            unit: UnitId(2),
            next_task: Some(TaskCategory::SentenceBoundary),
            wrapped: true,
            message: "saved".to_string(),
        }
    );
    assert_eq!(h.grid.selected(), Some(1));
    assert_eq!(h.store.get("current_index").as_deref(), Some("1"));
    assert_eq!(h.orchestrator.open_unit_id(), Some(UnitId(2)));
}

#[tokio::test]
async fn rejection_keeps_the_task_editable() {
    let mut api = MockApi::new();
    api.expect_submit().times(1).returning(|_| {
        Ok(SubmitResponse {
            success: false,
            message: "word order incomplete".to_string(),
            style: "danger".to_string(),
            ..SubmitResponse::default()
        })
    });
    api.expect_fetch_unit().never();
    let h = harness(api);

    h.orchestrator.open_unit(0).unwrap();
    h.orchestrator.start_task(TaskCategory::WordOrder).unwrap();
    let outcome = h
        .orchestrator
        .submit_task(TaskCategory::WordOrder)
        .await
        .unwrap();

    assert!(!outcome.is_accepted());
    assert_eq!(
        h.orchestrator.phase(),
        SessionPhase::TaskFailed(TaskCategory::WordOrder)
    );
    h.orchestrator
        .edit(|task: &mut WordOrderTask| task.toggle(TokenId(11), BoundaryId(1)))
        .unwrap();
}

#[tokio::test]
async fn validation_failure_sends_nothing() {
    let mut api = MockApi::new();
    api.expect_submit().never();
    let h = harness(api);

    h.orchestrator.open_unit(1).unwrap();
    h.orchestrator
        .start_task(TaskCategory::SentenceClassification)
        .unwrap();
    let error = h
        .orchestrator
        .submit_task(TaskCategory::SentenceClassification)
        .await
        .unwrap_err();

    assert!(error.is_validation());
    assert_eq!(
        h.orchestrator.phase(),
        SessionPhase::TaskActive(TaskCategory::SentenceClassification)
    );
    let rows = h
        .orchestrator
        .with_task(|task: &SentenceClassificationTask| task.rows().len())
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn transport_failure_marks_the_task_failed() {
    let mut api = MockApi::new();
    api.expect_submit()
        .times(1)
        .returning(|_| Err(ApiError::Transport("connection reset".to_string())));
    let h = harness(api);

    h.orchestrator.open_unit(0).unwrap();
    h.orchestrator.start_task(TaskCategory::TokenGraph).unwrap();
    let error = h
        .orchestrator
        .submit_task(TaskCategory::TokenGraph)
        .await
        .unwrap_err();

    assert!(error.is_retryable());
    assert_eq!(
        h.orchestrator.phase(),
        SessionPhase::TaskFailed(TaskCategory::TokenGraph)
    );
    assert!(matches!(
        h.orchestrator.submit_task(TaskCategory::WordOrder).await,
        Err(TaskError::WrongCategory { .. })
    ));
}

/// Holds every submission until released
struct GatedApi {
    gate: Arc<Notify>,
}

#[async_trait]
impl AnnotationApi for GatedApi {
    async fn fetch_unit(&self, unit: UnitId) -> Result<UnitRecord, ApiError> {
        create_test_page(3)
            .into_iter()
            .find(|row| row.id() == unit)
            .ok_or(ApiError::MissingUnit(unit))
    }

    async fn submit(&self, _form: SubmitForm) -> Result<SubmitResponse, ApiError> {
        self.gate.notified().await;
        Ok(accepted(
            TaskCategory::SentenceBoundary,
            TaskCategory::TokenClassification,
        ))
    }
}

#[tokio::test]
async fn second_submission_is_refused_while_the_first_is_pending() {
    let gate = Arc::new(Notify::new());
    let h = harness(GatedApi { gate: gate.clone() });
    h.orchestrator.open_unit(0).unwrap();
    h.orchestrator
        .start_task(TaskCategory::TokenTextAnnotation)
        .unwrap();

    let first = h.orchestrator.submit_task(TaskCategory::TokenTextAnnotation);
    let second = async {
        tokio::task::yield_now().await;
        let unit = UnitId(1);
        let action = Action::Update(TaskCategory::TokenTextAnnotation);
        assert!(h.orchestrator.is_in_flight(unit, action));
        let duplicate = h
            .orchestrator
            .submit_task(TaskCategory::TokenTextAnnotation)
            .await;
        let edit = h
            .orchestrator
            .edit(|task: &mut anno_core::tasks::TokenTextAnnotationTask| {
                Ok(task.rows().rows().len())
            });
        gate.notify_one();
        (duplicate, edit)
    };

    let (first, (duplicate, edit)) = futures::join!(first, second);
    assert!(first.unwrap().is_accepted());
    assert!(matches!(duplicate, Err(TaskError::SubmissionInFlight { .. })));
    assert!(matches!(edit, Err(TaskError::SubmissionInFlight { .. })));
    assert!(!h
        .orchestrator
        .is_in_flight(UnitId(1), Action::Update(TaskCategory::TokenTextAnnotation)));
    assert_eq!(
        h.orchestrator.phase(),
        SessionPhase::TaskActive(TaskCategory::TokenClassification)
    );
}

#[tokio::test]
async fn merged_token_takes_the_place_of_its_parts() {
    let page = create_test_page(3);
    let refreshed = UnitBuilder::from_record(page[0].clone())
        .extra(manual_token(95, "w1a_w1b"))
        .build();

    let mut api = MockApi::new();
    api.expect_submit()
        .withf(|form| {
            form.action_kind() == Action::AddToken
                && form
                    .field("token_data")
                    .is_some_and(|data| data.contains("group_10_11"))
        })
        .times(1)
        .returning(|_| Ok(action_response(json!({"id": 95}))));
    serve_units(&mut api, vec![refreshed]);
    let h = harness(api);

    h.orchestrator.open_unit(0).unwrap();
    h.orchestrator.start_task(TaskCategory::WordOrder).unwrap();
    let id = h
        .orchestrator
        .merge_tokens(UnitId(1), TokenId(10), TokenId(11))
        .await
        .unwrap();

    assert_eq!(id, TokenId(95));
    let included = h
        .orchestrator
        .with_task(|task: &WordOrderTask| {
            task.pools()
                .boundary(BoundaryId(1))
                .map(|pool| pool.included().to_vec())
        })
        .unwrap();
    assert_eq!(included, Some(vec![TokenId(95), TokenId(12)]));
    assert!(h.grid.unit(UnitId(1)).unwrap().token(TokenId(95)).is_some());
}

#[tokio::test]
async fn split_tokens_follow_the_original() {
    let page = create_test_page(3);
    let refreshed = UnitBuilder::from_record(page[0].clone())
        .extra(manual_token(96, "w1"))
        .extra(manual_token(97, "b"))
        .build();

    let mut api = MockApi::new();
    api.expect_submit()
        .withf(|form| {
            form.action_kind() == Action::SplitToken && form.field("token_id") == Some("11")
        })
        .times(1)
        .returning(|_| Ok(action_response(json!({"splits": [96, 97]}))));
    serve_units(&mut api, vec![refreshed]);
    let h = harness(api);

    h.orchestrator.open_unit(0).unwrap();
    h.orchestrator.start_task(TaskCategory::WordOrder).unwrap();
    let parts = [NewToken::new("w1", "w1"), NewToken::new("b", "b")];
    let ids = h
        .orchestrator
        .split_token(UnitId(1), TokenId(11), &parts)
        .await
        .unwrap();

    assert_eq!(ids, vec![TokenId(96), TokenId(97)]);
    let included = h
        .orchestrator
        .with_task(|task: &WordOrderTask| {
            task.pools()
                .boundary(BoundaryId(1))
                .map(|pool| pool.included().to_vec())
        })
        .unwrap();
    assert_eq!(
        included,
        Some(vec![TokenId(10), TokenId(96), TokenId(97), TokenId(12)])
    );
}

#[tokio::test]
async fn refused_action_surfaces_the_server_message() {
    let mut api = MockApi::new();
    api.expect_submit().times(1).returning(|_| {
        Ok(SubmitResponse {
            success: false,
            message: "token exists".to_string(),
            style: "warning".to_string(),
            ..SubmitResponse::default()
        })
    });
    api.expect_fetch_unit().never();
    let h = harness(api);

    let error = h
        .orchestrator
        .add_token(UnitId(1), &NewToken::new("ca", "ca"))
        .await
        .unwrap_err();
    match error {
        TaskError::Rejected { message, style } => {
            assert_eq!(message, "token exists");
            assert_eq!(style, "warning");
        }
        other => panic!("unexpected error: {other}"),
    }
}
