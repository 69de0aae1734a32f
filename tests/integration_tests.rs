use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use line_check::clock::{Clock, ManualClock};
use line_check::config::FirestoreConfig;
use line_check::exchange::{ExchangeBoard, FirestorePostStore, NewPost, PostKind};
use line_check::fetch::HttpClient;
use line_check::infra::firestore::FirestoreClient;
use line_check::linecheck::{BusyLevel, LineCheckAggregator, LineSnapshot, ReportIngestion, percent_long};
use line_check::report::{LineStats, Location};
use line_check::store::{FirestoreStore, MemoryStore, ReportStore};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// Stand-in for the Firestore REST API: applies `commit` writes with the
/// server-time transform and answers `runQuery` with filter, descending order
/// and limit, all in memory.
struct FakeFirestore {
    clock: Arc<ManualClock>,
    docs: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl FakeFirestore {
    fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            docs: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn unavailable(clock: Arc<ManualClock>) -> Self {
        Self {
            fail: true,
            ..Self::new(clock)
        }
    }

    fn commit(&self, body: &Value) -> Value {
        let now = self.clock.now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut docs = self.docs.lock().unwrap();
        for write in body["writes"].as_array().unwrap() {
            let name = write["update"]["name"].as_str().unwrap().to_string();
            let mut fields = write["update"]["fields"].clone();
            for transform in write["updateTransforms"].as_array().unwrap() {
                assert_eq!(transform["setToServerValue"], "REQUEST_TIME");
                let path = transform["fieldPath"].as_str().unwrap();
                fields[path] = json!({ "timestampValue": now });
            }
            docs.push((name, fields));
        }
        json!({ "commitTime": now })
    }

    fn run_query(&self, body: &Value) -> Value {
        let query = &body["structuredQuery"];
        let collection = query["from"][0]["collectionId"].as_str().unwrap();
        let limit = query["limit"].as_u64().unwrap() as usize;
        let order_field = query["orderBy"][0]["field"]["fieldPath"].as_str().unwrap();
        assert_eq!(query["orderBy"][0]["direction"], "DESCENDING");

        let timestamp = |fields: &Value| -> DateTime<Utc> {
            fields[order_field]["timestampValue"]
                .as_str()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        };

        let docs = self.docs.lock().unwrap();
        let mut matching: Vec<&(String, Value)> = docs
            .iter()
            .filter(|(name, _)| name.contains(&format!("/documents/{collection}/")))
            .filter(|(_, fields)| match query.get("where") {
                None => true,
                Some(filter) => {
                    let field = filter["fieldFilter"]["field"]["fieldPath"].as_str().unwrap();
                    fields[field] == filter["fieldFilter"]["value"]
                }
            })
            .collect();
        matching.sort_by(|a, b| timestamp(&b.1).cmp(&timestamp(&a.1)));

        let rows: Vec<Value> = matching
            .into_iter()
            .take(limit)
            .map(|(name, fields)| json!({ "document": { "name": name, "fields": fields } }))
            .collect();
        if rows.is_empty() {
            json!([{ "readTime": "2025-01-01T00:00:00Z" }])
        } else {
            Value::Array(rows)
        }
    }
}

#[async_trait]
impl HttpClient for FakeFirestore {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        if self.fail {
            let resp = http::Response::builder()
                .status(503)
                .body("backend unavailable")
                .unwrap();
            return Ok(resp.into());
        }

        let body: Value = serde_json::from_slice(req.body().unwrap().as_bytes().unwrap()).unwrap();
        let path = req.url().path().to_string();
        let reply = if path.ends_with(":commit") {
            self.commit(&body)
        } else if path.ends_with(":runQuery") {
            self.run_query(&body)
        } else {
            panic!("unexpected request to {path}");
        };

        let resp = http::Response::builder()
            .status(200)
            .body(serde_json::to_vec(&reply).unwrap())
            .unwrap();
        Ok(resp.into())
    }
}

fn firestore_config() -> FirestoreConfig {
    FirestoreConfig {
        project_id: "campus-pulse".to_string(),
        base_url: "http://firestore.test/v1".to_string(),
        api_key: None,
        access_token: None,
    }
}

#[derive(Clone, Copy, Debug)]
enum Backend {
    Memory,
    Firestore,
}

const BACKENDS: [Backend; 2] = [Backend::Memory, Backend::Firestore];

/// Services wired to one backend, sharing a manual clock with it.
struct Harness {
    clock: Arc<ManualClock>,
    ingestion: ReportIngestion,
    aggregator: LineCheckAggregator,
}

fn harness(backend: Backend) -> Harness {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store: Arc<dyn ReportStore> = match backend {
        Backend::Memory => Arc::new(MemoryStore::new(clock.clone())),
        Backend::Firestore => {
            let fake = FakeFirestore::new(clock.clone());
            Arc::new(FirestoreStore::new(Arc::new(FirestoreClient::new(fake, &firestore_config()))))
        }
    };
    Harness {
        ingestion: ReportIngestion::new(store.clone()),
        aggregator: LineCheckAggregator::new(store, clock.clone()),
        clock,
    }
}

#[tokio::test]
async fn test_only_reports_inside_window_count() {
    for backend in BACKENDS {
        let h = harness(backend);
        let now = h.clock.now();
        let loc = Location::WilliamsDining.name();

        // Written oldest first, each stamped by the store at the clock's time.
        for age in [60, 31, 29, 5] {
            h.clock.set(now - TimeDelta::minutes(age));
            assert!(h.ingestion.submit_report(loc, true).await, "{backend:?}");
        }
        h.clock.set(now);

        let stats = h.aggregator.get_stats(loc).await;
        assert_eq!(stats, LineStats { total: 2, long_count: 2 }, "{backend:?}");
    }
}

#[tokio::test]
async fn test_many_old_reports_do_not_count() {
    for backend in BACKENDS {
        let h = harness(backend);
        let now = h.clock.now();
        let loc = Location::ChickFilA.name();

        h.clock.set(now - TimeDelta::minutes(45));
        for _ in 0..25 {
            h.ingestion.submit_report(loc, true).await;
        }
        h.clock.set(now - TimeDelta::minutes(10));
        h.ingestion.submit_report(loc, false).await;
        h.clock.set(now);

        assert_eq!(
            h.aggregator.get_stats(loc).await,
            LineStats { total: 1, long_count: 0 },
            "{backend:?}"
        );
    }
}

#[tokio::test]
async fn test_three_of_ten_long_is_thirty_percent_low() {
    for backend in BACKENDS {
        let h = harness(backend);
        let loc = Location::ChickFilA.name();
        for i in 0..10 {
            h.ingestion.submit_report(loc, i < 3).await;
        }

        let stats = h.aggregator.get_stats(loc).await;
        assert_eq!(percent_long(&stats), 30, "{backend:?}");
        assert_eq!(BusyLevel::classify(&stats), Some(BusyLevel::Low), "{backend:?}");
    }
}

#[test]
fn test_classification_boundaries() {
    assert_eq!(BusyLevel::from_percent(71), BusyLevel::High);
    assert_eq!(BusyLevel::from_percent(70), BusyLevel::Medium);
    assert_eq!(BusyLevel::from_percent(30), BusyLevel::Low);
}

#[tokio::test]
async fn test_no_reports_is_no_data() {
    for backend in BACKENDS {
        let h = harness(backend);
        let stats = h.aggregator.get_stats(Location::ChickFilA.name()).await;
        assert_eq!(stats, LineStats { total: 0, long_count: 0 }, "{backend:?}");

        let snapshot = LineSnapshot::new(Location::ChickFilA.name(), stats, h.clock.now());
        assert_eq!(snapshot.busy, None);
        assert_eq!(snapshot.summary(), "No reports in the last 30 min");
    }
}

#[tokio::test]
async fn test_submitted_report_is_visible() {
    for backend in BACKENDS {
        let h = harness(backend);
        let loc = Location::WilliamsDining.name();

        let before = h.aggregator.get_stats(loc).await;
        assert!(h.ingestion.submit_report(loc, true).await, "{backend:?}");
        let after = h.aggregator.get_stats(loc).await;

        assert_eq!(after.total, before.total + 1, "{backend:?}");
        assert_eq!(after.long_count, before.long_count + 1, "{backend:?}");
    }
}

#[tokio::test]
async fn test_chick_fil_a_scenario() {
    for backend in BACKENDS {
        let h = harness(backend);
        let loc = "Chick-fil-A";
        for i in 0..10 {
            assert!(h.ingestion.submit_report(loc, i % 5 < 2).await, "{backend:?}");
        }

        let stats = h.aggregator.get_stats(loc).await;
        assert_eq!(stats, LineStats { total: 10, long_count: 4 }, "{backend:?}");
        assert_eq!(percent_long(&stats), 40);
        assert_eq!(BusyLevel::classify(&stats), Some(BusyLevel::Medium));
        assert_eq!(
            LineSnapshot::new(loc, stats, h.clock.now()).summary(),
            "40% say line is long (4/10)"
        );
    }
}

#[tokio::test]
async fn test_unavailable_backend_degrades() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let fake = FakeFirestore::unavailable(clock.clone());
    let store: Arc<dyn ReportStore> =
        Arc::new(FirestoreStore::new(Arc::new(FirestoreClient::new(fake, &firestore_config()))));

    let ingestion = ReportIngestion::new(store.clone());
    let aggregator = LineCheckAggregator::new(store, clock);

    assert!(!ingestion.submit_report("Chick-fil-A", true).await);
    assert_eq!(aggregator.get_stats("Chick-fil-A").await, LineStats::default());
}

#[tokio::test]
async fn test_firestore_query_is_capped() {
    let h = harness(Backend::Firestore);
    let loc = Location::ChickFilA.name();
    for _ in 0..210 {
        h.ingestion.submit_report(loc, false).await;
    }
    assert_eq!(h.aggregator.get_stats(loc).await.total, 200);
}

#[tokio::test]
async fn test_exchange_board_on_firestore() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let client = Arc::new(FirestoreClient::new(FakeFirestore::new(clock.clone()), &firestore_config()));
    let board = ExchangeBoard::new(Arc::new(FirestorePostStore::new(client)));

    for (title, kind) in [("Desk lamp", PostKind::Sale), ("COMP 280 group", PostKind::StudyGroup)] {
        let post = NewPost {
            title: format!(" {title} "),
            kind,
            ..Default::default()
        };
        assert!(board.add_post(&post).await);
        clock.advance(TimeDelta::seconds(30));
    }

    let posts = board.recent_posts(10).await;
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].title, "COMP 280 group");
    assert_eq!(posts[0].kind, PostKind::StudyGroup);
    assert_eq!(posts[1].title, "Desk lamp");
    assert!(posts[0].timestamp > posts[1].timestamp);
}
