//! Exit codes for the CLI

use girder_core::error::GirderError;
use girder_tasks::{DagError, HistoryError};

use crate::cli::commands::TasksFailed;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Build file missing or invalid
pub const CONFIG_ERROR: i32 = 2;

/// Task graph could not be built
pub const GRAPH_ERROR: i32 = 3;

/// At least one task failed
pub const TASK_FAILED: i32 = 4;

/// Task history unreadable or unwritable
pub const HISTORY_ERROR: i32 = 5;

/// Exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<TasksFailed>().is_some() {
        return TASK_FAILED;
    }
    if err.downcast_ref::<DagError>().is_some() {
        return GRAPH_ERROR;
    }
    if err.downcast_ref::<HistoryError>().is_some() {
        return HISTORY_ERROR;
    }
    match err.downcast_ref::<GirderError>() {
        Some(GirderError::Config(_)) => CONFIG_ERROR,
        Some(GirderError::Project(_)) | Some(GirderError::Task(_)) => GRAPH_ERROR,
        _ => ERROR,
    }
}
