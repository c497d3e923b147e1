//! # ctxlog
//! Synchronous multi-destination logger with context-templated messages.
//!
//! Loggers are registered under an alias, each bound to a destination
//! (`stdout`, `stderr` or a file path), an optional prompt and timestamp
//! prefix, and formatting options. Messages may contain `%expr%`
//! placeholders evaluated against a caller-supplied context in a
//! restricted sandbox: property access with dotted paths, literals and
//! basic arithmetic, nothing else.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! ctxlog = "0.1.0"
//! ```
//!
//! ```rust
//! use ctxlog::Logger;
//!
//! let log = Logger::new();
//! log.write("Hello, world!").unwrap();
//!
//! log.register("err", "stderr").unwrap();
//! log.get("err").unwrap().write("something broke").unwrap();
//! ```
//!
//! ## Templated messages
//! A context is an ordinary value tree tagged with [`contextualize`];
//! placeholders are evaluated against its fields:
//!
//! ```rust
//! use ctxlog::{Logger, contextualize};
//! use serde_json::json;
//!
//! let log = Logger::new();
//! let ctx = contextualize(json!({"user": "ada", "jobs": {"done": 3}}));
//! log.write_ctx(&ctx, "%user% finished %jobs.done% jobs", &[]).unwrap();
//! ```
//!
//! ## Logging to files
//! Every destination is opened once and shared by all loggers that target
//! it, whatever spelling of the path they were registered with. The file
//! is created if needed; pass flags `"a"` to append instead of truncate.
//!
//! ```rust
//! use ctxlog::{Logger, LoggerOptions};
//!
//! let log = Logger::with_base_dir("/tmp");
//! log.register(
//!     "app",
//!     LoggerOptions::new()
//!         .with_destination("ctxlog_doc_app.log")
//!         .with_prompt("App")
//!         .with_date_template("YE-MO-DA HO:MI:SE"),
//! )
//! .unwrap();
//! log.get("app").unwrap().write("started").unwrap();
//! assert!(
//!     std::fs::read_to_string("/tmp/ctxlog_doc_app.log")
//!         .unwrap()
//!         .ends_with("]:started\n")
//! );
//! ```

mod config;
mod date_template;
mod error;
mod expr;
mod facade;
mod format;
mod log_writer;
mod logger;
mod template;

pub use date_template::{DateFn, DateTemplate};
pub use error::{LogError, Result};
pub use facade::init_log_facade;
pub use format::{InspectOptions, format_with_options, inspect, stringify};
pub use log_writer::{
    DestinationId, Encoding, FileSink, Flags, LogSink, SharedSink, StderrSink, StdoutSink,
    WriterRegistry,
};
pub use logger::{
    DEFAULT_LOGGER_NAME, Logger, LoggerDef, LoggerHandle, LoggerOptions, Record, global,
};
pub use template::{Context, contextualize};
