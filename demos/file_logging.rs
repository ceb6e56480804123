//! File logging example
//!
//! Writes to the console and to `./logs/demo_development.log` plus its
//! `.error.log` companion, redacting credentials from the request.
//!
//! Run with: cargo run --example file_logging

use serde_json::json;
use structured_logger::prelude::*;

fn main() -> Result<()> {
    let config = LoggerConfig::new("demo")
        .with_service_name("demo-host")
        .with_level(LogLevel::Debug)
        .with_mode(ConsoleMode::Short)
        .with_log_path("logs");
    let logger = Logger::new(config)?;

    logger.info(["Application started"]);
    logger.debug([LogArg::from("Loaded configuration"), LogArg::from(json!({ "workers": 4 }))]);

    let request = json!({
        "requestId": "a1b2",
        "url": "/login",
        "method": "POST",
        "headers": { "authorization": "Bearer hidden", "accept": "application/json" },
        "body": { "user": "ana", "password": "never written" }
    });
    logger.info([LogArg::from("Login attempt"), LogArg::field("req", request)]);

    for i in 1..=5 {
        logger.info([LogArg::from("Processing item"), LogArg::field("item", i)]);
        if i == 3 {
            logger.warn(["Item 3 took longer than expected"]);
        }
    }

    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "database unreachable");
    logger.error([LogArg::from("Failed to load optional plugin"), LogArg::error(&io_err)]);

    logger.flush()?;

    let metrics = logger.metrics();
    println!(
        "\n{} calls, {} entries written, {} failures",
        metrics.total_calls(),
        metrics.written_count(),
        metrics.failure_count()
    );
    Ok(())
}
