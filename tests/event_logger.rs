use scoped_event_log::config::LoggingConfiguration;
use scoped_event_log::record::LogRecord;
use scoped_event_log::scope;
use scoped_event_log::sink::MemorySink;
use scoped_event_log::{
    EventData, EventLogger, EventLoggerError, EventLoggerFactory, EventLogging, Level, Severity,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

fn logger() -> (EventLogger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (EventLogger::new("test", sink.clone()), sink)
}

fn prop<'a>(record: &'a LogRecord, key: &str) -> Option<&'a Value> {
    record.properties.get(key)
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Inner {
    quux: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeepData {
    foo: &'static str,
    bar: i32,
    baz: Inner,
}

#[test]
fn flattens_deep_event_data() {
    let (logger, sink) = logger();
    logger.info_event(
        "event",
        &DeepData {
            foo: "foo",
            bar: 42,
            baz: Inner { quux: "bazquux" },
        },
    );

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(prop(r, "Foo"), Some(&json!("foo")));
    assert_eq!(prop(r, "Bar"), Some(&json!(42)));
    assert_eq!(prop(r, "Baz.Quux"), Some(&json!("bazquux")));
}

#[test]
fn flattens_array_event_data() {
    let (logger, sink) = logger();
    logger.info_event("event", &json!({"Foo": [1, 2, 3], "Bar": {"Baz": [42]}}));

    let r = &sink.records()[0];
    assert_eq!(prop(r, "Foo[0]"), Some(&json!(1)));
    assert_eq!(prop(r, "Foo[1]"), Some(&json!(2)));
    assert_eq!(prop(r, "Foo[2]"), Some(&json!(3)));
    assert_eq!(prop(r, "Bar.Baz[0]"), Some(&json!(42)));
}

#[test]
fn records_are_tagged_with_event_and_logger_name() {
    let (logger, sink) = logger();
    logger.log_event("JobFailed", Severity::Alert, &json!({"Job": 1}));

    let r = &sink.records()[0];
    assert_eq!(r.event_name(), Some("JobFailed"));
    assert_eq!(r.logger_name(), Some("test"));
    assert_eq!(r.level, Level::Fatal);
    assert_eq!(r.message_template, "{@EventData}");
    assert!(r.exception.is_none());
}

#[test]
fn scope_data_is_merged_and_innermost_wins() {
    let (logger, sink) = logger();
    let _outer = logger
        .begin_scope(&json!({"AccountId": 42, "Tenant": "outer"}))
        .unwrap();
    {
        let _inner = logger.begin_scope(&json!({"Tenant": "inner"})).unwrap();
        logger.info_event("Inside", &json!({"Tenant": "event", "Item": 1}));
    }
    logger.info_event("Outside", &());

    let records = sink.records();
    let inside = &records[0];
    assert_eq!(prop(inside, "AccountId"), Some(&json!(42)));
    assert_eq!(prop(inside, "Tenant"), Some(&json!("inner")));
    assert_eq!(prop(inside, "Item"), Some(&json!(1)));

    let outside = &records[1];
    assert_eq!(prop(outside, "Tenant"), Some(&json!("outer")));
}

#[test]
fn begin_scope_rejects_absent_state() {
    let (logger, sink) = logger();
    assert!(matches!(
        logger.begin_scope(&None::<u32>),
        Err(EventLoggerError::NullScopeState)
    ));
    assert!(matches!(logger.begin_scope(&()), Err(EventLoggerError::NullScopeState)));
    assert!(scope::current().is_none());

    logger.info_event("After", &());
    assert_eq!(sink.records()[0].properties.len(), 2);
}

#[test]
fn prebuilt_event_data_is_copied_verbatim() {
    let (logger, sink) = logger();
    let mut data = EventData::new();
    data.insert("Request", json!({"Path": "/orders", "Retries": [1, 2]}));
    data.insert("Flat.Key", "kept");

    logger.log_event_data("Prebuilt", Severity::Warning, data);

    let r = &sink.records()[0];
    assert_eq!(r.level, Level::Warning);
    assert_eq!(prop(r, "Request"), Some(&json!({"Path": "/orders", "Retries": [1, 2]})));
    assert_eq!(prop(r, "Flat.Key"), Some(&json!("kept")));
    assert!(prop(r, "Request.Path").is_none());
    assert_eq!(r.event_name(), Some("Prebuilt"));
}

#[test]
fn count_and_set_gauge_add_their_fields() {
    let (logger, sink) = logger();
    logger.count("RequestsServed", 1, &json!({"Route": "/"}));
    logger.set_gauge("QueueDepth", 17, &());

    let records = sink.records();
    assert_eq!(prop(&records[0], "Count"), Some(&json!(1)));
    assert_eq!(prop(&records[0], "Route"), Some(&json!("/")));
    assert_eq!(prop(&records[1], "Value"), Some(&json!(17)));
    assert_eq!(records[1].level, Level::Information);
}

#[test]
fn move_gauge_logs_delta_then_reversal() {
    let (logger, sink) = logger();
    let mut metric = logger.move_gauge("ActiveJobs", 5, &json!({"Pool": "db"}));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(prop(&records[0], "Delta"), Some(&json!(5)));

    metric.add("Outcome", "ok");
    drop(metric);

    let records = sink.records();
    assert_eq!(records.len(), 2);
    let reversal = &records[1];
    assert_eq!(reversal.event_name(), Some("ActiveJobs"));
    assert_eq!(prop(reversal, "Delta"), Some(&json!(-5)));
    assert_eq!(prop(reversal, "Pool"), Some(&json!("db")));
    assert_eq!(prop(reversal, "Outcome"), Some(&json!("ok")));
}

#[test]
fn start_timer_logs_once_on_release() {
    let (logger, sink) = logger();
    let before = chrono::Utc::now();
    let timer = logger.start_timer("ImportDuration", &json!({"File": "a.csv"}));
    assert!(sink.records().is_empty());

    std::thread::sleep(Duration::from_millis(25));
    timer.finish();

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let r = &records[0];
    let elapsed = prop(r, "ElapsedMilliseconds").and_then(Value::as_u64).unwrap();
    assert!(elapsed >= 25, "elapsed {elapsed}");
    assert_eq!(prop(r, "File"), Some(&json!("a.csv")));

    let start = prop(r, "StartTime").and_then(Value::as_str).unwrap();
    let start = chrono::DateTime::parse_from_rfc3339(start)
        .unwrap()
        .with_timezone(&chrono::Utc);
    assert!(start >= before - chrono::Duration::milliseconds(1));
    assert!(start <= r.timestamp);
}

#[test]
fn terminal_metric_events_pick_up_scope_at_release() {
    let (logger, sink) = logger();
    let timer = logger.start_timer("Step", &());
    let _scope = logger.begin_scope(&json!({"Phase": "commit"})).unwrap();
    drop(timer);

    assert_eq!(prop(&sink.records()[0], "Phase"), Some(&json!("commit")));
}

#[derive(Debug)]
struct DiskFull;

impl fmt::Display for DiskFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("disk full")
    }
}

impl std::error::Error for DiskFull {}

#[derive(Debug)]
struct WriteFailed(DiskFull);

impl fmt::Display for WriteFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("write failed")
    }
}

impl std::error::Error for WriteFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[test]
fn errors_are_attached_with_their_source_chain() {
    let (logger, sink) = logger();
    logger.error_event_with_error("SaveFailed", &WriteFailed(DiskFull), &json!({"Path": "/tmp/x"}));
    logger.log_error_event("SaveRetried", &DiskFull, Severity::Warning, &());

    let records = sink.records();
    assert_eq!(records[0].level, Level::Error);
    assert_eq!(records[0].exception.as_deref(), Some("write failed\nCaused by: disk full"));
    assert_eq!(records[1].level, Level::Warning);
    assert_eq!(records[1].exception.as_deref(), Some("disk full"));
}

#[test]
fn unserializable_data_drops_only_that_call() {
    let (logger, sink) = logger();
    let mut bad = std::collections::HashMap::new();
    bad.insert((1, 2), "tuple keys are not strings");

    logger.info_event("Bad", &bad);
    let metric = logger.move_gauge("BadGauge", 1, &bad);
    drop(metric);
    logger.info_event("Good", &());

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_name(), Some("Good"));
}

#[test]
fn convenience_methods_map_to_severities() {
    let (logger, sink) = logger();
    logger.debug_event("D", &());
    logger.info_event("I", &());
    logger.warning_event("W", &());
    logger.error_event("E", &());
    logger.alert_event("A", &());
    logger.alert_event_with_error("AE", &DiskFull, &());
    logger.warning_event_with_error("WE", &DiskFull, &());

    let levels: Vec<_> = sink.records().iter().map(|r| r.level).collect();
    assert_eq!(
        levels,
        vec![
            Level::Debug,
            Level::Information,
            Level::Warning,
            Level::Error,
            Level::Fatal,
            Level::Fatal,
            Level::Warning,
        ]
    );
}

#[test]
fn logger_names_follow_types() {
    let sink = Arc::new(MemorySink::new());
    let logger = EventLogger::for_type::<String>(sink.clone());
    assert_eq!(logger.name(), "alloc::string::String");

    let factory = EventLoggerFactory::new(sink);
    let logger = factory.create_for::<(String, i32)>();
    assert_eq!(logger.name(), "(alloc::string::String, i32)");
}

#[test]
fn factory_adds_configuration_enrichers_when_absent() {
    let sink = Arc::new(MemorySink::new());
    let config = LoggingConfiguration::new("production").with_application_version("2.1.0");
    let factory = EventLoggerFactory::with_configuration(sink.clone(), &config);
    let logger = factory.create("orders");

    logger.info_event("Placed", &());
    logger.info_event("Overridden", &json!({"Environment": "canary"}));

    let records = sink.records();
    assert_eq!(prop(&records[0], "ApplicationVersion"), Some(&json!("2.1.0")));
    assert_eq!(prop(&records[0], "Environment"), Some(&json!("production")));
    assert_eq!(prop(&records[1], "Environment"), Some(&json!("canary")));
    assert_eq!(records[0].logger_name(), Some("orders"));
}

#[test]
fn events_are_emitted_in_call_order() {
    let (logger, sink) = logger();
    for i in 0..20 {
        logger.count("Tick", i, &());
    }
    let counts: Vec<_> = sink
        .take()
        .iter()
        .map(|r| prop(r, "Count").and_then(Value::as_i64).unwrap())
        .collect();
    assert_eq!(counts, (0..20).collect::<Vec<i64>>());
    assert!(sink.records().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_flows_keep_their_own_scope() {
    let (logger, sink) = logger();

    let tasks: Vec<_> = (0..4)
        .map(|worker| {
            let logger = logger.clone();
            tokio::spawn(scope::flow(async move {
                let _scope = logger.begin_scope(&json!({"Worker": worker})).unwrap();
                for _ in 0..3 {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    logger.info_event("Work", &json!({"Expected": worker}));
                }
            }))
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let records = sink.records();
    assert_eq!(records.len(), 12);
    for r in &records {
        assert_eq!(prop(r, "Worker"), prop(r, "Expected"));
    }
    assert!(scope::current().is_none());
}

#[tokio::test]
async fn scopes_in_unwrapped_tasks_are_refused() {
    let (logger, sink) = logger();
    let opened = logger.begin_scope(&json!({"Owner": "A"}));
    assert!(matches!(opened, Err(EventLoggerError::NoScopeContext)));

    logger.info_event("FromB", &());
    assert!(prop(&sink.records()[0], "Owner").is_none());
}
