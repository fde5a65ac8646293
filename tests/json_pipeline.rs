use scoped_event_log::config::LoggingConfiguration;
use scoped_event_log::console::ConsoleSink;
use scoped_event_log::init::{init_event_logging_with_config, DispatchConfig};
use scoped_event_log::record::LogRecord;
use scoped_event_log::scope;
use scoped_event_log::sink::LogSink;
use scoped_event_log::{Event, EventData, EventLogger, EventLogging};
use serde_json::{json, Value};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Writer that appends into a buffer the test can read back.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8(bytes.clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn dispatch() -> DispatchConfig {
    DispatchConfig {
        batch_size: 1,
        flush_interval: Duration::from_millis(10),
        ..DispatchConfig::default()
    }
}

/// Strip the `time` value so lines can be compared exactly.
fn without_time(line: &str) -> String {
    let start = line.find("\"time\":\"").unwrap() + "\"time\":\"".len();
    let end = start + line[start..].find('"').unwrap();
    format!("{}*{}", &line[..start], &line[end..])
}

#[tokio::test]
async fn logs_canonical_json_line() {
    let buffer = SharedBuffer::default();
    let config = LoggingConfiguration::default();
    let sink = Arc::new(ConsoleSink::new(config.json_formatter(), Box::new(buffer.clone())));

    let (factory, handle) = init_event_logging_with_config(sink, &config, dispatch()).unwrap();
    let logger = factory.create("test");
    logger.log(Event::from_serialize("UniqueEventName", &json!({"Foo": 42})).unwrap());

    drop(logger);
    drop(factory);
    handle.await.unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        without_time(&lines[0]),
        "{\"time\":\"*\",\"event\":{\"Severity\":\"Information\",\"EventName\":\"UniqueEventName\",\"LoggerName\":\"test\",\"Data\":{\"Foo\":42}}}"
    );
}

#[tokio::test]
async fn configured_source_shapes_every_line() {
    let buffer = SharedBuffer::default();
    let config = LoggingConfiguration::new("production")
        .with_application_name("billing")
        .with_application_version("3.0.1")
        .with_server_name("web-01")
        .with_index("events");
    let sink = Arc::new(ConsoleSink::new(config.json_formatter(), Box::new(buffer.clone())));

    let (factory, handle) = init_event_logging_with_config(sink, &config, dispatch()).unwrap();
    let logger = factory.create("invoices");
    scope::flow(async {
        let _scope = logger.begin_scope(&json!({"Customer": {"Id": 9}})).unwrap();
        logger.count("InvoiceSent", 2, &json!({"Lines": [10, 20]}));
    })
    .await;
    logger.move_gauge("OpenInvoices", 1, &()).finish();

    drop(logger);
    drop(factory);
    handle.await.unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), 3);

    let first: Value = serde_json::from_str(&lines[0]).unwrap();
    assert!(first["time"].as_str().unwrap().parse::<f64>().is_ok());
    assert_eq!(first["source"], json!("billing"));
    assert_eq!(first["sourcetype"], json!("httpevent"));
    assert_eq!(first["host"], json!("web-01"));
    assert_eq!(first["index"], json!("events"));

    let event = &first["event"];
    assert_eq!(event["Severity"], json!("Information"));
    assert_eq!(event["EventName"], json!("InvoiceSent"));
    assert_eq!(event["LoggerName"], json!("invoices"));
    assert_eq!(event["ApplicationVersion"], json!("3.0.1"));
    assert_eq!(event["Environment"], json!("production"));
    assert_eq!(
        event["Data"],
        json!({"Lines[0]": 10, "Lines[1]": 20, "Count": 2, "Customer.Id": 9})
    );
    assert!(event.get("Message").is_none());

    let reversal: Value = serde_json::from_str(&lines[2]).unwrap();
    assert_eq!(reversal["event"]["Data"], json!({"Delta": -1}));
}

#[tokio::test]
async fn sink_receives_merged_record() {
    struct Capture(Mutex<Vec<LogRecord>>);

    #[async_trait::async_trait]
    impl LogSink for Capture {
        async fn send(
            &self,
            record: &LogRecord,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.0.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    let capture = Arc::new(Capture(Mutex::new(Vec::new())));
    let (factory, handle) =
        init_event_logging_with_config(capture.clone(), &LoggingConfiguration::default(), dispatch())
            .unwrap();

    let logger: EventLogger = factory.create_for::<Capture>();
    let mut data = EventData::new();
    data.insert("Prebuilt.Key", "kept");
    logger.warning_event("Flat", &data);

    drop(logger);
    drop(factory);
    handle.await.unwrap();

    let records = capture.0.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].properties.get("Prebuilt.Key"), Some(&json!("kept")));
    assert!(records[0].logger_name().unwrap().ends_with("Capture"));
}
