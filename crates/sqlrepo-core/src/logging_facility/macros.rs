//! Lifecycle events for repository operations
//!
//! Every `Repository` call emits `start`, then either `end` or `end_error`,
//! all at the boundary. Each event carries `component` (the emitting module),
//! `op` (the facade operation, e.g. `find_where`) and `event`, plus whatever
//! fields the caller appends. The repository appends `request_id` and
//! `entity`, so a single call can be followed across its events.
//!
//! The macros reach `tracing` and the schema constants through this crate,
//! so callers only depend on `sqlrepo-core`.

/// Emit the `start` event of an operation
///
/// ```
/// # use sqlrepo_core::log_op_start;
/// log_op_start!("register_table");
/// log_op_start!("save", request_id = "0190-...", entity = "item");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::logging_facility::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Emit the `end` event of a successful operation
///
/// `duration_ms` is required; the repository measures it from the matching
/// `start`.
///
/// ```
/// # use sqlrepo_core::log_op_end;
/// log_op_end!("find_all", duration_ms = 3);
/// log_op_end!("find_all", duration_ms = 3, entity = "item");
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::logging_facility::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Emit the `end_error` event of a failed operation
///
/// Takes anything convertible into `RepoError`, so a `QueryError` from the
/// compiler can be logged as is. The error's kind and stable code are
/// recorded as `err_kind` and `err_code`.
///
/// ```
/// # use sqlrepo_core::{log_op_error, errors::QueryError};
/// log_op_error!("find_where", QueryError::EmptyPredicate, duration_ms = 1);
/// log_op_error!("find_where", QueryError::EmptyPredicate, duration_ms = 1, entity = "item");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let repo_err: $crate::errors::RepoError = $err.into();
        $crate::logging_facility::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?repo_err.kind(),
            err_code = repo_err.code()
            $(, $($field)*)?
        );
    }};
}
