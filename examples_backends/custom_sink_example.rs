use std::sync::Arc;

use async_trait::async_trait;
use scoped_event_log::{
    config::LoggingConfiguration,
    format::JsonEventFormatter,
    init::init_event_logging,
    record::LogRecord,
    scope,
    sink::LogSink,
    EventLogging,
};
use serde::Serialize;

/// Example of integrating a completely custom backend by implementing
/// the `LogSink` trait directly. Imagine this talks to some
/// proprietary store for which this crate does not provide a built-in
/// sink.
struct MyCustomStoreSink {
    formatter: JsonEventFormatter,
}

#[async_trait]
impl LogSink for MyCustomStoreSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Here you would call your own client library for the target store.
        // For the sake of example we just print the rendered line.
        print!("[my-custom-store] {}", self.formatter.render(record));
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Order {
    id: u64,
    lines: Vec<&'static str>,
}

#[tokio::main]
async fn main() {
    let config = LoggingConfiguration::from_env().with_application_name("custom-sink-example");
    let sink: Arc<dyn LogSink> = Arc::new(MyCustomStoreSink {
        formatter: config.json_formatter(),
    });

    let (factory, handle) = init_event_logging(sink, &config).expect("init event logging");
    let logger = factory.create("orders");

    let worker = logger.clone();
    tokio::spawn(scope::flow(async move {
        let _scope = worker.begin_scope(&serde_json::json!({"OrderId": 42})).expect("begin scope");
        let timer = worker.start_timer("OrderProcessed", &());
        worker.info_event("OrderReceived", &Order { id: 42, lines: vec!["apple", "pear"] });
        drop(timer);
    }))
    .await
    .expect("worker task");

    drop(logger);
    drop(factory);
    let _ = handle.await;
}
