//! Builds the unified activity-log query.
//!
//! One query joins the eight independently-versioned per-kind tables into the
//! common `JobRecord` row shape. Pagination is applied to an inner selection
//! over parent rows *before* any per-kind join, so query cost tracks the page
//! size rather than the table size. Every caller-supplied value is bound as a
//! named, typed parameter; only compile-time constants (kind tags, the benign
//! error policy table) appear as literals.

use super::ActivityQuery;
use jobtrail_commons::models::job_record::DEFAULT_AGENT_MODEL;
use jobtrail_commons::JobKind;
use jobtrail_store::ParamBag;
use std::fmt::Write as _;

/// A built query: SQL text plus its bound parameters.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: ParamBag,
}

/// Child fetch failures whose error text matches one of these fragments are
/// intended crawl behavior (redirect races, include/exclude path policy,
/// depth limits), not real failures, and are excluded from `error_count`.
/// Fixed domain policy; not configurable.
pub const BENIGN_CHILD_ERRORS: [&str; 4] = [
    "redirected to a url outside of the crawl scope",
    "does not match the include paths",
    "matches an exclude path",
    "maximum crawl depth reached",
];

/// Per-kind aggregate description: which table backs the kind and which
/// columns the projection needs from it. Every column is resolved
/// last-write-wins via `argMax(col, version)` over non-deleted rows.
struct KindAgg {
    kind: JobKind,
    alias: &'static str,
    table: &'static str,
    columns: &'static [&'static str],
}

const KIND_AGGS: [KindAgg; 8] = [
    KindAgg {
        kind: JobKind::Scrape,
        alias: "sc",
        table: "scrapes",
        columns: &[
            "success",
            "credits_billed",
            "time_taken",
            "scrape_options",
            "pdf_num_pages",
        ],
    },
    KindAgg {
        kind: JobKind::Crawl,
        alias: "cr",
        table: "crawls",
        columns: &["success", "num_docs", "credits_billed", "time_taken", "message"],
    },
    KindAgg {
        kind: JobKind::BatchScrape,
        alias: "bs",
        table: "batch_scrapes",
        columns: &["success", "num_docs", "credits_billed", "time_taken"],
    },
    KindAgg {
        kind: JobKind::Map,
        alias: "mp",
        table: "maps",
        columns: &["success", "num_results", "credits_billed", "time_taken"],
    },
    KindAgg {
        kind: JobKind::Search,
        alias: "sr",
        table: "searches",
        columns: &["success", "num_docs", "credits_billed", "time_taken"],
    },
    KindAgg {
        kind: JobKind::Extract,
        alias: "ex",
        table: "extracts",
        columns: &["success", "credits_billed", "time_taken", "message"],
    },
    KindAgg {
        kind: JobKind::DeepResearch,
        alias: "dr",
        table: "deep_research",
        columns: &["success", "num_docs", "credits_billed", "time_taken"],
    },
    KindAgg {
        kind: JobKind::Agent,
        alias: "ag",
        table: "agent_runs",
        columns: &["success", "credits_billed", "time_taken", "model"],
    },
];

/// How a free-text search value is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchTerm {
    /// Canonical 8-4-4-4-12 UUID: match the request id itself, or a child
    /// single-page fetch id pointing back at its parent request.
    JobId(String),
    /// Anything else: case-insensitive substring over the target hint.
    Substring(String),
}

fn classify_search(raw: &str) -> Option<SearchTerm> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_canonical_uuid(trimmed) {
        Some(SearchTerm::JobId(trimmed.to_ascii_lowercase()))
    } else {
        Some(SearchTerm::Substring(trimmed.to_string()))
    }
}

/// Strict canonical UUID shape: 8-4-4-4-12 hex groups, case-insensitive.
/// Deliberately narrower than `Uuid::parse_str`, which also accepts braced,
/// urn and unhyphenated forms that the store would not treat as ids.
fn is_canonical_uuid(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, b) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if *b != b'-' {
                    return false;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    true
}

/// `multiIf` dispatch over `p.kind`, selecting a per-kind expression and
/// projecting NULL for kinds with no case.
fn kind_dispatch(cases: &[(JobKind, String)]) -> String {
    let mut expr = String::from("multiIf(");
    for (kind, case) in cases {
        let _ = write!(expr, "p.kind = '{}', {}, ", kind.as_str(), case);
    }
    expr.push_str("NULL)");
    expr
}

fn benign_error_array() -> String {
    let quoted: Vec<String> = BENIGN_CHILD_ERRORS
        .iter()
        .map(|s| format!("'{}'", s))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Build the list query for the given validated parameters.
pub fn build(query: &ActivityQuery) -> BuiltQuery {
    let mut params = ParamBag::new();
    params.push_u64("api_key_id", query.api_key_id);
    params.push_str(
        "start_date",
        query.start.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
    );
    params.push_str(
        "end_date",
        query.end.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
    );

    let mut sql = String::with_capacity(8 * 1024);

    // Inner page selection: parent rows only, ordered and paginated before
    // any per-kind join.
    sql.push_str(
        "WITH page AS (
    SELECT id, kind, created_at, origin, target_hint, api_key_id
    FROM requests FINAL
    WHERE api_key_id = {api_key_id:UInt64}
      AND created_at >= {start_date:DateTime64(3)}
      AND created_at <= {end_date:DateTime64(3)}
      AND is_deleted = 0
",
    );

    if let Some(mode) = query.mode {
        params.push_str("mode", mode.as_str());
        sql.push_str("      AND kind = {mode:String}\n");
    }

    match query.search.as_deref().and_then(classify_search) {
        Some(SearchTerm::JobId(id)) => {
            params.push_str("search_id", id);
            // Either the request itself, or a child single-page fetch of a
            // multi-document request (latest version, not deleted).
            sql.push_str(
                "      AND (id = {search_id:UUID} OR id IN (
          SELECT argMax(request_id, version)
          FROM scrapes
          WHERE id = {search_id:UUID}
          GROUP BY id
          HAVING argMax(is_deleted, version) = 0
             AND argMax(request_id, version) IS NOT NULL
      ))
",
            );
        }
        Some(SearchTerm::Substring(text)) => {
            params.push_str("search_text", text);
            sql.push_str(
                "      AND positionCaseInsensitive(ifNull(target_hint, ''), {search_text:String}) > 0\n",
            );
        }
        None => {}
    }

    params.push_u64("limit", u64::from(query.limit));
    params.push_u64("offset", u64::from(query.offset));
    sql.push_str(
        "    ORDER BY created_at DESC
    LIMIT {limit:UInt64} OFFSET {offset:UInt64}
)
",
    );

    // Final projection: kind-dispatched column selection.
    sql.push_str("SELECT\n");
    sql.push_str("    p.id AS job_id,\n");
    sql.push_str("    p.kind AS kind,\n");
    sql.push_str("    p.created_at AS created_at,\n");
    sql.push_str("    p.origin AS origin,\n");
    sql.push_str("    p.target_hint AS url_or_query,\n");
    sql.push_str("    p.api_key_id AS api_key_id,\n");

    let success_cases: Vec<(JobKind, String)> = KIND_AGGS
        .iter()
        .map(|agg| (agg.kind, format!("{}.success", agg.alias)))
        .collect();
    let _ = writeln!(sql, "    {} AS success,", kind_dispatch(&success_cases));

    // A search job's billed cost includes its child fetches.
    let credits_cases: Vec<(JobKind, String)> = KIND_AGGS
        .iter()
        .map(|agg| {
            let expr = if agg.kind == JobKind::Search {
                format!(
                    "{}.credits_billed + ifNull(scc.child_credits, 0)",
                    agg.alias
                )
            } else {
                format!("{}.credits_billed", agg.alias)
            };
            (agg.kind, expr)
        })
        .collect();
    let _ = writeln!(
        sql,
        "    {} AS credits_billed,",
        kind_dispatch(&credits_cases)
    );

    let num_docs_cases = vec![
        (JobKind::Crawl, "cr.num_docs".to_string()),
        (JobKind::BatchScrape, "bs.num_docs".to_string()),
        (JobKind::Map, "mp.num_results".to_string()),
        (JobKind::Search, "sr.num_docs".to_string()),
        (JobKind::DeepResearch, "dr.num_docs".to_string()),
    ];
    let _ = writeln!(sql, "    {} AS num_docs,", kind_dispatch(&num_docs_cases));

    let time_cases: Vec<(JobKind, String)> = KIND_AGGS
        .iter()
        .map(|agg| (agg.kind, format!("{}.time_taken", agg.alias)))
        .collect();
    let _ = writeln!(sql, "    {} AS time_taken,", kind_dispatch(&time_cases));

    let message_cases = vec![
        (JobKind::Crawl, "cr.message".to_string()),
        (JobKind::Extract, "ex.message".to_string()),
    ];
    let _ = writeln!(sql, "    {} AS message,", kind_dispatch(&message_cases));

    let error_count_cases: Vec<(JobKind, String)> = JobKind::ALL
        .iter()
        .filter(|k| k.is_multi_document())
        .map(|k| (*k, "ifNull(ec.error_count, 0)".to_string()))
        .collect();
    let _ = writeln!(
        sql,
        "    {} AS error_count,",
        kind_dispatch(&error_count_cases)
    );

    let agent_model_cases = vec![(
        JobKind::Agent,
        format!("ifNull(ag.model, '{}')", DEFAULT_AGENT_MODEL),
    )];
    let _ = writeln!(
        sql,
        "    {} AS agent_model,",
        kind_dispatch(&agent_model_cases)
    );

    let options_cases = vec![(JobKind::Scrape, "sc.scrape_options".to_string())];
    let _ = writeln!(
        sql,
        "    {} AS scrape_options,",
        kind_dispatch(&options_cases)
    );

    let pdf_cases = vec![(JobKind::Scrape, "sc.pdf_num_pages".to_string())];
    let _ = writeln!(
        sql,
        "    {} AS scrape_pdf_num_pages",
        kind_dispatch(&pdf_cases)
    );

    sql.push_str("FROM page AS p\n");

    // One aggregate per kind, restricted to the page's ids for that kind.
    // The ON clause carries a kind-match guard so a row can only receive
    // values from the aggregate of its own kind even if id spaces collide.
    for agg in &KIND_AGGS {
        sql.push_str("LEFT JOIN (\n    SELECT id");
        for col in agg.columns {
            let _ = write!(sql, ",\n           argMax({col}, version) AS {col}");
        }
        let _ = write!(
            sql,
            "
    FROM {}
    WHERE id IN (SELECT id FROM page WHERE kind = '{}') AND is_deleted = 0
    GROUP BY id
) AS {} ON {}.id = p.id AND p.kind = '{}'
",
            agg.table,
            agg.kind.as_str(),
            agg.alias,
            agg.alias,
            agg.kind.as_str()
        );
    }

    // Auxiliary aggregate: non-benign child fetch failures per parent.
    let _ = write!(
        sql,
        "LEFT JOIN (
    SELECT request_id, count() AS error_count
    FROM (
        SELECT id,
               argMax(request_id, version) AS request_id,
               argMax(success, version) AS success,
               argMax(error, version) AS error,
               argMax(is_deleted, version) AS deleted
        FROM scrapes
        WHERE request_id IN (SELECT id FROM page)
        GROUP BY id
    )
    WHERE deleted = 0
      AND success = 0
      AND multiSearchAnyCaseInsensitive(ifNull(error, ''), {}) = 0
    GROUP BY request_id
) AS ec ON ec.request_id = p.id
",
        benign_error_array()
    );

    // Auxiliary aggregate: child fetch credit costs for search jobs.
    sql.push_str(
        "LEFT JOIN (
    SELECT request_id, sum(credits_billed) AS child_credits
    FROM (
        SELECT id,
               argMax(request_id, version) AS request_id,
               argMax(credits_billed, version) AS credits_billed,
               argMax(is_deleted, version) AS deleted
        FROM scrapes
        WHERE request_id IN (SELECT id FROM page WHERE kind = 'search')
        GROUP BY id
    )
    WHERE deleted = 0
    GROUP BY request_id
) AS scc ON scc.request_id = p.id AND p.kind = 'search'
",
    );

    // Must match the inner page order exactly; re-sorting on anything else
    // after the joins would break pagination.
    sql.push_str("ORDER BY p.created_at DESC\n");

    // Without join_use_nulls a missed LEFT JOIN fills the right side with
    // type defaults (0, ''), so a parent row whose kind table has no row yet
    // would read as success=0 / credits=0 / model='' instead of unknown.
    sql.push_str("SETTINGS join_use_nulls = 1");

    BuiltQuery { sql, params }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use jobtrail_store::ParamValue;

    fn base_query() -> ActivityQuery {
        ActivityQuery {
            api_key_id: 42,
            start: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap(),
            mode: None,
            search: None,
            limit: 100,
            offset: 0,
        }
    }

    #[test]
    fn always_contains_the_three_base_predicates() {
        let built = build(&base_query());
        assert!(built.sql.contains("api_key_id = {api_key_id:UInt64}"));
        assert!(built.sql.contains("created_at >= {start_date:DateTime64(3)}"));
        assert!(built.sql.contains("created_at <= {end_date:DateTime64(3)}"));
        assert_eq!(
            built.params.get("api_key_id"),
            Some(&ParamValue::UInt64(42))
        );
        assert_eq!(
            built.params.get("start_date"),
            Some(&ParamValue::Str("2026-01-01 00:00:00.000".into()))
        );
    }

    #[test]
    fn mode_predicate_appears_iff_mode_given() {
        let built = build(&base_query());
        assert!(!built.sql.contains("{mode:String}"));
        assert!(built.params.get("mode").is_none());

        let mut q = base_query();
        q.mode = Some(JobKind::DeepResearch);
        let built = build(&q);
        assert!(built.sql.contains("kind = {mode:String}"));
        assert_eq!(
            built.params.get("mode"),
            Some(&ParamValue::Str("deep_research".into()))
        );
    }

    #[test]
    fn uuid_search_takes_the_id_branch() {
        let mut q = base_query();
        q.search = Some("0F8FAD5B-D9CB-469F-A165-70867728950E".into());
        let built = build(&q);
        assert!(built.sql.contains("id = {search_id:UUID}"));
        assert!(built.sql.contains("FROM scrapes"));
        assert!(!built.sql.contains("{search_text:String}"));
        // UUID value is normalized to lowercase.
        assert_eq!(
            built.params.get("search_id"),
            Some(&ParamValue::Str(
                "0f8fad5b-d9cb-469f-a165-70867728950e".into()
            ))
        );
    }

    #[test]
    fn non_uuid_search_takes_the_substring_branch() {
        let mut q = base_query();
        q.search = Some("example.com".into());
        let built = build(&q);
        assert!(built
            .sql
            .contains("positionCaseInsensitive(ifNull(target_hint, ''), {search_text:String})"));
        assert!(!built.sql.contains("{search_id:UUID}"));
        assert_eq!(
            built.params.get("search_text"),
            Some(&ParamValue::Str("example.com".into()))
        );
    }

    #[test]
    fn whitespace_only_search_is_dropped() {
        let mut q = base_query();
        q.search = Some("   \t ".into());
        let built = build(&q);
        assert!(!built.sql.contains("search_id"));
        assert!(!built.sql.contains("search_text"));
    }

    #[test]
    fn near_uuid_shapes_are_treated_as_substrings() {
        // Unhyphenated, braced, and wrong-group shapes must not hit the id
        // branch even though Uuid::parse_str would accept some of them.
        for s in [
            "0f8fad5bd9cb469fa16570867728950e",
            "{0f8fad5b-d9cb-469f-a165-70867728950e}",
            "0f8fad5b-d9cb-469f-a165-7086772895",
            "0f8fad5b-d9cb-469f-a165-70867728950g",
        ] {
            let mut q = base_query();
            q.search = Some(s.into());
            let built = build(&q);
            assert!(
                built.sql.contains("{search_text:String}"),
                "expected substring branch for {:?}",
                s
            );
        }
    }

    #[test]
    fn pagination_is_applied_inside_the_page_selection() {
        let built = build(&base_query());
        let limit_pos = built.sql.find("LIMIT {limit:UInt64}").unwrap();
        let first_join = built.sql.find("LEFT JOIN").unwrap();
        assert!(
            limit_pos < first_join,
            "LIMIT/OFFSET must be applied before any per-kind join"
        );
        assert_eq!(built.params.get("limit"), Some(&ParamValue::UInt64(100)));
        assert_eq!(built.params.get("offset"), Some(&ParamValue::UInt64(0)));
    }

    #[test]
    fn every_kind_gets_a_guarded_aggregate_join() {
        let built = build(&base_query());
        for agg in &KIND_AGGS {
            let guard = format!("AND p.kind = '{}'", agg.kind.as_str());
            assert!(
                built.sql.contains(&guard),
                "missing kind guard for {}",
                agg.kind
            );
            assert!(built.sql.contains(&format!("FROM {}", agg.table)));
        }
    }

    #[test]
    fn auxiliary_aggregates_are_unconditional() {
        let built = build(&base_query());
        assert!(built.sql.contains("AS error_count"));
        assert!(built.sql.contains("multiSearchAnyCaseInsensitive"));
        assert!(built.sql.contains("sum(credits_billed) AS child_credits"));
        for fragment in BENIGN_CHILD_ERRORS {
            assert!(built.sql.contains(fragment));
        }
    }

    #[test]
    fn output_order_matches_page_order() {
        let built = build(&base_query());
        let order_pos = built.sql.rfind("ORDER BY p.created_at DESC").unwrap();
        let last_join = built.sql.rfind("LEFT JOIN").unwrap();
        assert!(order_pos > last_join);
    }

    #[test]
    fn missed_joins_project_null_rather_than_type_defaults() {
        // A parent row whose per-kind table has no row yet (job started,
        // kind row not written) must come back with NULL columns, never
        // success=0 or an empty model name.
        let built = build(&base_query());
        assert!(built
            .sql
            .trim_end()
            .ends_with("SETTINGS join_use_nulls = 1"));
    }

    #[test]
    fn canonical_uuid_shape_checks() {
        assert!(is_canonical_uuid("0f8fad5b-d9cb-469f-a165-70867728950e"));
        assert!(is_canonical_uuid("0F8FAD5B-D9CB-469F-A165-70867728950E"));
        assert!(!is_canonical_uuid(""));
        assert!(!is_canonical_uuid("example.com"));
        assert!(!is_canonical_uuid("0f8fad5b-d9cb-469f-a165-70867728950e "));
    }
}
