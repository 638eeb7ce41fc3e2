pub mod activity;

pub use activity::{bulk_job_results, list_activity};
