#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{memory_repo, Item};
use sqlrepo_core::logging_facility::test_capture::init_test_capture;
use sqlrepo_core::predicate::eq;
use sqlrepo_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_COMPONENT, FIELD_DURATION_MS, FIELD_ENTITY,
    FIELD_ERR_CODE, FIELD_ERR_KIND, FIELD_REQUEST_ID,
};

#[tokio::test]
async fn test_operations_log_start_and_end_with_request_id() {
    let capture = init_test_capture();
    let repo = memory_repo();
    repo.register_table::<Item>().await.unwrap();
    repo.save(&Item::new(1, 10, "a")).await.unwrap();

    let events: Vec<_> = capture
        .events_for_op("save")
        .into_iter()
        .filter(|e| e.field(FIELD_ENTITY) == Some("item"))
        .collect();
    let start = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_START))
        .expect("start event");
    let request_id = start.field(FIELD_REQUEST_ID).expect("request id").to_string();

    let end = events
        .iter()
        .find(|e| {
            e.event.as_deref() == Some(EVENT_END) && e.field(FIELD_REQUEST_ID) == Some(&request_id)
        })
        .expect("matching end event");
    assert!(end.field(FIELD_DURATION_MS).is_some());
}

#[tokio::test]
async fn test_failed_operation_logs_error_code() {
    let capture = init_test_capture();
    let repo = memory_repo();
    repo.register_table::<Item>().await.unwrap();

    let err = repo
        .find_where::<Item>(&eq("missing_field_for_logging", 1))
        .await
        .unwrap_err();
    let request_id = err.request_id().expect("request id on error").to_string();

    let event = capture
        .events_for_op("find_where")
        .into_iter()
        .find(|e| {
            e.event.as_deref() == Some(EVENT_END_ERROR)
                && e.field(FIELD_REQUEST_ID) == Some(request_id.as_str())
        })
        .expect("error event for this request");
    assert_eq!(event.field(FIELD_ERR_CODE), Some("ERR_UNKNOWN_FIELD"));
    assert_eq!(event.field(FIELD_ERR_KIND), Some("UnknownField"));
    assert_eq!(event.field(FIELD_ENTITY), Some("item"));
    assert!(event
        .field(FIELD_COMPONENT)
        .is_some_and(|c| c.starts_with("sqlrepo_engine")));
}
