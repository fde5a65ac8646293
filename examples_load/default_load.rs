use std::sync::Arc;
use std::time::Instant;

use scoped_event_log::config::LoggingConfiguration;
use scoped_event_log::init::init_event_logging;
use scoped_event_log::noop_sink::NoopSink;
use scoped_event_log::scope;
use scoped_event_log::EventLogging;
use serde_json::json;

#[tokio::main]
async fn main() {
    let sink = Arc::new(NoopSink);
    let config = LoggingConfiguration::new("load-test");
    let (factory, handle) = init_event_logging(sink, &config).expect("init event logging");
    let logger = factory.create("default_load");

    let n: i64 = 100_000;
    let start = Instant::now();

    scope::flow(async {
        let _scope = logger
            .begin_scope(&json!({"Run": "default", "Nested": {"Depth": 1}}))
            .expect("begin scope");
        for i in 0..n {
            logger.count("LoadIteration", 1, &json!({"Iteration": i}));
        }
    })
    .await;

    let elapsed = start.elapsed();
    println!("default config: logged {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Dropping every logger lets the dispatcher drain and stop.
    drop(logger);
    drop(factory);
    let _ = handle.await;
}
