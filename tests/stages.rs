use abe_encounter_bench::dispatch::{DispatchMode, Dispatcher};
use abe_encounter_bench::fixture;
use abe_encounter_bench::model::{EncounterRef, User, UserMeta};
use abe_encounter_bench::stage::Bench;
use abe_encounter_bench::sweep::RetryPolicy;
use abe_encounter_bench::transport::HttpTransport;
use abe_encounter_bench::{ExpectedStatus, RunLayout, ServiceConfig, Stage};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// "bench:secret"
const BASIC_AUTH: &str = "Basic YmVuY2g6c2VjcmV0";

/// A mock encounter service. The benchmark's blocking client runs on the
/// test thread; the runtime only drives mock setup and inspection.
struct Service {
    server: MockServer,
    rt: Runtime,
}

impl Service {
    fn start() -> Result<Self> {
        let rt = Runtime::new()?;
        let server = rt.block_on(MockServer::start());
        Ok(Self { server, rt })
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn requests(&self) -> Vec<Request> {
        self.rt.block_on(self.server.received_requests()).unwrap_or_default()
    }

    fn transport(&self) -> HttpTransport {
        transport_for(&self.server.uri())
    }
}

fn transport_for(base_url: &str) -> HttpTransport {
    let mut config = ServiceConfig::new(base_url, "bench", "secret");
    config.headers.insert("X-Bench-Run".into(), "it".into());
    HttpTransport::new(config).unwrap()
}

fn header<'r>(request: &'r Request, name: &str) -> Option<&'r str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

fn bench<'a>(dir: &Path, input: &str, transport: &'a HttpTransport, mode: DispatchMode, retry: RetryPolicy) -> Bench<'a> {
    Bench {
        layout: RunLayout::new(2, 3, input, dir.join("input"), dir.join("data")),
        dispatcher: Dispatcher::new(mode),
        retry,
        expected: ExpectedStatus::default(),
        transport,
    }
}

fn user_metas(n: usize) -> Vec<UserMeta> {
    (0..n)
        .map(|i| UserMeta {
            policy: json!(format!("attr{} and doctor", i)),
            attributes: vec![format!("First{}", i), format!("Last{}", i), "doctor".into(), format!("attr{}", i)],
        })
        .collect()
}

#[test]
fn stages_chain_from_key_generation_to_query() -> Result<()> {
    let service = Service::start()?;

    let issued = Arc::new(AtomicUsize::new(0));
    let issued_clone = Arc::clone(&issued);
    service.mount(Mock::given(method("POST")).and(path("/user")).respond_with(
        move |_req: &Request| -> ResponseTemplate {
            let n = issued_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_json(json!({"user_id": format!("u{}", n), "private_key": format!("k{}", n)}))
        },
    ));
    service.mount(Mock::given(method("POST")).and(path("/encounters/")).respond_with(
        |req: &Request| -> ResponseTemplate {
            let body = json_body(req);
            let owner = body["user_id"].as_str().unwrap_or("?");
            ResponseTemplate::new(201).set_body_json(json!({"encounter_id": format!("e-{}", owner)}))
        },
    ));
    service.mount(Mock::given(method("POST")).and(path_regex(r"^/encounters/e-[^/]+$")).respond_with(
        |req: &Request| -> ResponseTemplate {
            let id = req.url.path().trim_start_matches("/encounters/").to_string();
            let body = json_body(req);
            ResponseTemplate::new(200).set_body_json(json!({"encounter_id": id, "key": body["private_key"]}))
        },
    ));

    let dir = tempfile::tempdir()?;
    let transport = service.transport();
    let pooled = DispatchMode::Pooled { workers: 3 };

    // key generation
    let keygen = bench(dir.path(), "3_users.json", &transport, pooled, RetryPolicy::Resample);
    fixture::store(&keygen.layout.input_path(), &user_metas(3))?;
    let summary = keygen.key_generation(&mut StdRng::seed_from_u64(1))?;
    assert_eq!(summary.count, 3);
    assert_eq!(summary.success_ratio, 1.0);

    let users: Vec<User> = fixture::load(&keygen.layout.users_path())?;
    assert_eq!(users.len(), 3);
    let mut ids: Vec<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["u0", "u1", "u2"]);
    for user in &users {
        assert_eq!(user.private_key, user.user_id.replace('u', "k"));
    }

    // save encounter, same label so the users file lines up
    let save = bench(dir.path(), "3_encounters.json", &transport, pooled, RetryPolicy::Resample);
    fixture::store(&save.layout.input_path(), &vec![json!({"bp": "120/80"}); 3])?;
    let summary = save.save_encounters(&mut StdRng::seed_from_u64(2))?;
    assert_eq!(summary.count, 3);
    assert_eq!(summary.success_ratio, 1.0);

    // every submitted encounter carries the user id and policy from the users file
    let submitted: Vec<Value> = service
        .requests()
        .iter()
        .filter(|r| r.url.path() == "/encounters/")
        .map(json_body)
        .collect();
    assert_eq!(submitted.len(), 3);
    for body in &submitted {
        let owner = users
            .iter()
            .find(|u| Value::String(u.user_id.clone()) == body["user_id"])
            .expect("encounter stamped with a known user");
        assert_eq!(body["policy"], owner.policy);
        assert_eq!(body["bp"], json!("120/80"));
    }

    let references: Vec<EncounterRef> = fixture::load(&save.layout.encounter_ids_path())?;
    assert_eq!(references.len(), 3);
    for reference in &references {
        assert_eq!(reference.encounter_id, format!("e-{}", reference.user.user_id));
    }

    // query encounter
    let query = bench(dir.path(), "3_encounters.json", &transport, pooled, RetryPolicy::Resample);
    let summary = query.query_encounters(&mut StdRng::seed_from_u64(3))?;
    assert_eq!(summary.count, 3);
    assert_eq!(summary.success_ratio, 1.0);

    let bodies: Vec<Value> = fixture::load(&query.layout.queried_encounters_path())?;
    assert_eq!(bodies.len(), 3);
    for body in &bodies {
        let id = body["encounter_id"].as_str().unwrap();
        let owner = id.trim_start_matches("e-");
        assert_eq!(body["key"], json!(owner.replace('u', "k")));
    }

    // every call carried basic auth, the configured header and a JSON content type
    let requests = service.requests();
    assert_eq!(requests.len(), 9);
    for request in &requests {
        assert_eq!(header(request, "authorization"), Some(BASIC_AUTH));
        assert_eq!(header(request, "x-bench-run"), Some("it"));
        assert_eq!(header(request, "content-type"), Some("application/json"));
    }

    for stage in [Stage::KeyGeneration, Stage::SaveEncounter, Stage::QueryEncounter] {
        assert!(query.layout.summary_path(stage).exists(), "{:?} summary missing", stage);
    }
    Ok(())
}

#[test]
fn failed_save_is_resampled_without_touching_first_pass() -> Result<()> {
    let service = Service::start()?;
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    service.mount(Mock::given(method("POST")).and(path("/encounters/")).respond_with(
        move |_req: &Request| -> ResponseTemplate {
            let call = calls_clone.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                ResponseTemplate::new(500).set_body_json(json!({"error": "busy"}))
            } else {
                ResponseTemplate::new(201).set_body_json(json!({"encounter_id": format!("e{}", call)}))
            }
        },
    ));

    let dir = tempfile::tempdir()?;
    let transport = service.transport();
    let save = bench(dir.path(), "4_encounters.json", &transport, DispatchMode::Sequential, RetryPolicy::Resample);

    let users: Vec<User> = (0..4)
        .map(|i| User {
            user_id: format!("u{}", i),
            private_key: format!("k{}", i),
            policy: json!("p"),
            attributes: vec![],
        })
        .collect();
    fixture::store(&save.layout.users_path(), &users)?;
    fixture::store(&save.layout.input_path(), &vec![json!({}); 4])?;

    let summary = save.save_encounters(&mut StdRng::seed_from_u64(9))?;
    assert_eq!(service.requests().len(), 5);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(summary.count, 4);
    assert_eq!(summary.successful, 3);
    assert_eq!(summary.success_samples, 4);
    assert_eq!(summary.success_ratio, 0.75);

    let report = std::fs::read_to_string(save.layout.summary_path(Stage::SaveEncounter))?;
    let blocks: Vec<&str> = report.split("\n\n").collect();
    assert!(blocks[0].contains("Total number of transactions: 4"));
    assert!(blocks[0].contains("Sweep rounds: 1"));
    assert!(blocks[0].contains("Retried transactions: 1"));
    let statuses: Vec<&str> = blocks[1].lines().map(|l| l.split(", ").next().unwrap()).collect();
    assert_eq!(statuses, vec!["500", "201", "201", "201"]);
    assert_eq!(blocks[2].lines().count(), 4);

    let references: Vec<EncounterRef> = fixture::load(&save.layout.encounter_ids_path())?;
    assert_eq!(references.len(), 4);
    Ok(())
}

#[test]
fn unreachable_service_is_recorded_and_given_up_on() -> Result<()> {
    // grab a free port, then close it so every connection is refused
    let addr = TcpListener::bind("127.0.0.1:0")?.local_addr()?;
    let dir = tempfile::tempdir()?;
    let transport = transport_for(&format!("http://{}", addr));
    let keygen = bench(
        dir.path(),
        "2_users.json",
        &transport,
        DispatchMode::Pooled { workers: 2 },
        RetryPolicy::FailedOnly { max_rounds: 2 },
    );
    fixture::store(&keygen.layout.input_path(), &user_metas(2))?;

    let summary = keygen.key_generation(&mut StdRng::seed_from_u64(0))?;
    assert_eq!(summary.count, 2);
    assert_eq!(summary.successful, 0);
    assert_eq!(summary.success_ratio, 0.0);
    assert_eq!(summary.rate_success, 0.0);

    let report = std::fs::read_to_string(keygen.layout.summary_path(Stage::KeyGeneration))?;
    assert!(report.contains("Retried transactions: 4"));
    assert!(report.contains("Unrecovered transactions: 2"));
    assert!(report.contains("\n\n0, "));

    let users: Vec<User> = fixture::load(&keygen.layout.users_path())?;
    assert!(users.is_empty());
    Ok(())
}

#[test]
fn malformed_fixture_aborts_before_any_call() -> Result<()> {
    let service = Service::start()?;
    service.mount(Mock::given(method("POST")).respond_with(ResponseTemplate::new(200).set_body_json(json!({}))));

    let dir = tempfile::tempdir()?;
    let transport = service.transport();
    let keygen = bench(dir.path(), "5_users.json", &transport, DispatchMode::Sequential, RetryPolicy::Resample);
    std::fs::create_dir_all(dir.path().join("input"))?;
    std::fs::write(keygen.layout.input_path(), "{ not json")?;

    assert!(keygen.key_generation(&mut StdRng::seed_from_u64(0)).is_err());
    assert!(service.requests().is_empty());
    Ok(())
}
