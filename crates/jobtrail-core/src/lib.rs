// Jobtrail Core
//
// The activity-history subsystem: query building and execution against the
// analytical store, ownership resolution, and tiered result retrieval.
// Transport framing lives in jobtrail-api; this crate is logic only.

pub mod activity;
pub mod app_context;

pub use app_context::AppContext;
