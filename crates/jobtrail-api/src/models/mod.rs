//! Request and response models for the activity endpoints.

pub mod activity;

pub use activity::{
    ActivityListParams, ActivityListResponse, ApiError, BulkResultsRequest, BulkResultsResponse,
    ResultRow,
};
