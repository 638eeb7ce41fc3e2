// Pipeline test: raw store rows for every job kind flow through the
// executor into the unified record shape.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use jobtrail_commons::JobKind;
use jobtrail_core::activity::{executor, ActivityQuery};
use jobtrail_store::{AnalyticsStore, ParamBag, RawRow, StoreError};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

struct FixedStore {
    rows: Vec<RawRow>,
}

#[async_trait]
impl AnalyticsStore for FixedStore {
    async fn query_rows(&self, _sql: &str, _params: &ParamBag) -> Result<Vec<RawRow>, StoreError> {
        Ok(self.rows.clone())
    }
}

fn obj(v: JsonValue) -> RawRow {
    match v {
        JsonValue::Object(m) => m,
        _ => unreachable!(),
    }
}

fn row_for(kind: &str, minute: u32) -> RawRow {
    obj(json!({
        "job_id": Uuid::new_v4().to_string(),
        "kind": kind,
        "created_at": format!("2026-03-05 10:{:02}:00.000", minute),
        "origin": "api",
        "url_or_query": "https://example.com",
        "success": 1,
        "credits_billed": 5,
        "num_docs": if kind == "crawl" || kind == "batch_scrape" || kind == "search" { json!(10) } else { json!(null) },
        "time_taken": 3.5,
        "message": null,
        "error_count": if kind == "crawl" { json!(0) } else { json!(null) },
        "agent_model": null,
        "scrape_options": if kind == "scrape" { json!("{\"formats\":[\"markdown\"]}") } else { json!(null) },
        "scrape_pdf_num_pages": null,
        "api_key_id": 42
    }))
}

#[tokio::test]
async fn all_eight_kinds_normalize_into_one_row_shape() {
    let kinds = [
        "scrape",
        "crawl",
        "batch_scrape",
        "map",
        "search",
        "extract",
        "deep_research",
        "agent",
    ];
    let rows: Vec<RawRow> = kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| row_for(kind, 59 - i as u32))
        .collect();
    let store = FixedStore { rows };

    let query = ActivityQuery {
        api_key_id: 42,
        start: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap(),
        mode: None,
        search: None,
        limit: 100,
        offset: 0,
    };

    let records = executor::execute(&store, &query).await.unwrap();
    assert_eq!(records.len(), 8);

    // Store order is preserved verbatim (here: descending minutes).
    for pair in records.windows(2) {
        assert!(pair[0].created_at > pair[1].created_at);
    }

    for record in &records {
        assert_eq!(record.api_key_id, 42);
        assert_eq!(record.success, Some(true));
        match record.kind {
            JobKind::Scrape => {
                assert!(record.scrape_options.is_some());
                assert_eq!(record.agent_model, None);
            }
            JobKind::Agent => {
                // Agent rows always surface a model name.
                assert!(record.agent_model.is_some());
            }
            JobKind::Crawl => {
                assert_eq!(record.num_docs, Some(10));
                assert_eq!(record.error_count, Some(0));
            }
            _ => {
                assert_eq!(record.scrape_options, None);
                assert_eq!(record.agent_model, None);
            }
        }
    }
}
