//! Logger registry and the synchronous write path.
//!
//! Aliases map to configurations; each alias is a permanently attached
//! write entry point whose configuration can be updated (merged) but whose
//! identity can never be removed.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, LazyLock, RwLock},
};

use serde_json::Value;

use crate::config::CTXLOG_CONFIG;
use crate::date_template::{DateFn, DateTemplate};
use crate::error::{LogError, Result};
use crate::format::{self, InspectOptions};
use crate::log_writer::{DestinationId, Encoding, Flags, SharedSink, WriterRegistry};
use crate::template::{self, Context};

/// The reserved default alias, bound to stdout at construction.
pub const DEFAULT_LOGGER_NAME: &str = "log";

const DEFAULT_DEPTH: usize = 2;
const DEFAULT_COMPACT: bool = true;

enum DateSpec {
    Template(String),
    Custom(Arc<dyn Fn() -> String + Send + Sync>),
}

/// Options for registering or updating a logger. Unset fields fall back to
/// built-in defaults for a new alias and keep the stored value on update.
#[derive(Default)]
pub struct LoggerOptions {
    destination: Option<String>,
    prompt: Option<String>,
    date: Option<DateSpec>,
    encoding: Option<String>,
    flags: Option<String>,
    depth: Option<usize>,
    compact: Option<bool>,
    colors: Option<bool>,
}

impl LoggerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output destination: `stdout`, `stderr` or a file path.
    pub fn with_destination(self, destination: &str) -> Self {
        Self {
            destination: Some(destination.into()),
            ..self
        }
    }

    /// Static prefix prepended to every line.
    pub fn with_prompt(self, prompt: &str) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..self
        }
    }

    /// Date template compiled at registration (`DA`, `MO`, `YE`, `HO`,
    /// `MI`, `SE`, `ML` codes).
    pub fn with_date_template(self, template: &str) -> Self {
        Self {
            date: Some(DateSpec::Template(template.into())),
            ..self
        }
    }

    /// Caller-supplied timestamp function, stored as-is.
    pub fn with_date_fn<F>(self, date_fn: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            date: Some(DateSpec::Custom(Arc::new(date_fn))),
            ..self
        }
    }

    pub fn with_encoding(self, encoding: &str) -> Self {
        Self {
            encoding: Some(encoding.into()),
            ..self
        }
    }

    /// File-open flags: `w`, `a`, `wx`, `ax`.
    pub fn with_flags(self, flags: &str) -> Self {
        Self {
            flags: Some(flags.into()),
            ..self
        }
    }

    /// Inspection depth for structured arguments.
    pub fn with_depth(self, depth: usize) -> Self {
        Self {
            depth: Some(depth),
            ..self
        }
    }

    pub fn with_compact(self, compact: bool) -> Self {
        Self {
            compact: Some(compact),
            ..self
        }
    }

    /// Color request. Honored for the standard streams only: file
    /// destinations force color off whatever is asked for.
    pub fn with_colors(self, colors: bool) -> Self {
        Self {
            colors: Some(colors),
            ..self
        }
    }
}

/// Registration input: a bare destination shorthand or full options.
pub enum LoggerDef {
    Destination(String),
    Options(LoggerOptions),
}

impl From<&str> for LoggerDef {
    fn from(destination: &str) -> Self {
        Self::Destination(destination.into())
    }
}

impl From<String> for LoggerDef {
    fn from(destination: String) -> Self {
        Self::Destination(destination)
    }
}

impl From<LoggerOptions> for LoggerDef {
    fn from(options: LoggerOptions) -> Self {
        Self::Options(options)
    }
}

/// One write call's input: either a plain message or a context-templated
/// one. Resolved once at the entry point, not inferred deeper in.
pub enum Record<'a> {
    Plain {
        message: Option<&'a str>,
        args: &'a [Value],
    },
    Templated {
        context: &'a Context,
        message: Option<&'a str>,
        args: &'a [Value],
    },
}

/// Per-alias configuration. The writer is shared, never owned.
#[derive(Clone)]
struct LoggerInfo {
    writer: SharedSink,
    destination: DestinationId,
    prompt: Option<String>,
    date: Option<DateFn>,
    #[allow(dead_code)]
    encoding: Encoding,
    flags: Flags,
    inspect: InspectOptions,
}

impl LoggerInfo {
    fn write_record(&self, record: Record<'_>) -> Result<()> {
        let mut prefix = String::new();
        if let Some(prompt) = &self.prompt {
            prefix.push_str(prompt);
        }
        if let Some(date) = &self.date {
            prefix.push('[');
            prefix.push_str(&date.render());
            prefix.push(']');
        }
        if !prefix.is_empty() {
            prefix.push(':');
        }
        let (message, args) = match record {
            Record::Plain { message, args } => (message.unwrap_or_default().to_string(), args),
            Record::Templated {
                context,
                message,
                args,
            } => match message {
                Some(message) => (template::render(context, message)?, args),
                None => (String::new(), args),
            },
        };
        let rendered =
            format::format_with_options(&self.inspect, &format!("{prefix}{message}\n"), args);
        let mut sink = self.writer.lock().unwrap();
        sink.write_text(&rendered)?;
        sink.flush()?;
        Ok(())
    }
}

struct LoggerInner {
    writers: WriterRegistry,
    loggers: RwLock<HashMap<String, Arc<RwLock<LoggerInfo>>>>,
}

/// The logger facade: registry of aliases plus the default write entry
/// point. Cheap to clone, safe to share.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Fresh registries; the working directory is captured now and used to
    /// resolve relative file destinations for the lifetime of the logger.
    pub fn new() -> Self {
        Self::with_writers(WriterRegistry::new())
    }

    /// Fresh registries resolving relative destinations under `base_dir`.
    pub fn with_base_dir<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self::with_writers(WriterRegistry::with_base_dir(base_dir))
    }

    fn with_writers(writers: WriterRegistry) -> Self {
        let logger = Self {
            inner: Arc::new(LoggerInner {
                writers,
                loggers: RwLock::new(HashMap::new()),
            }),
        };
        logger
            .register(DEFAULT_LOGGER_NAME, "stdout")
            .expect("registering the default logger cannot fail");
        logger
    }

    /// Registers a new alias or updates an existing one. New aliases need a
    /// destination; updates merge the supplied fields into the stored
    /// configuration and keep everything else.
    pub fn register(&self, alias: &str, def: impl Into<LoggerDef>) -> Result<()> {
        let options = match def.into() {
            LoggerDef::Destination(destination) => {
                LoggerOptions::new().with_destination(&destination)
            }
            LoggerDef::Options(options) => options,
        };
        let LoggerOptions {
            destination,
            prompt,
            date,
            encoding,
            flags,
            depth,
            compact,
            colors,
        } = options;

        let mut loggers = self.inner.loggers.write().unwrap();
        let slot = loggers.get(alias).map(Arc::clone);
        let prev = slot.as_ref().map(|arc| arc.read().unwrap().clone());

        let flags = match flags {
            Some(raw) => Flags::parse(&raw)?,
            None => prev.as_ref().map(|p| p.flags).unwrap_or_default(),
        };
        let encoding = match encoding {
            Some(raw) => Encoding::parse(&raw)?,
            None => prev.as_ref().map(|p| p.encoding).unwrap_or_default(),
        };
        let (destination, writer) = match destination {
            Some(raw) => self.inner.writers.resolve(&raw, flags)?,
            None => match &prev {
                Some(p) => (p.destination.clone(), p.writer.clone()),
                None => {
                    return Err(LogError::Misuse(format!(
                        "logger `{alias}` needs a destination"
                    )));
                }
            },
        };
        let date = match date {
            Some(DateSpec::Template(template)) => {
                Some(DateFn::Template(DateTemplate::compile(&template)))
            }
            Some(DateSpec::Custom(date_fn)) => Some(DateFn::Custom(date_fn)),
            None => prev.as_ref().and_then(|p| p.date.clone()),
        };
        let prompt = prompt.or_else(|| prev.as_ref().and_then(|p| p.prompt.clone()));
        let depth = depth
            .or(prev.as_ref().map(|p| p.inspect.depth))
            .unwrap_or(DEFAULT_DEPTH);
        let compact = compact
            .or(prev.as_ref().map(|p| p.inspect.compact))
            .unwrap_or(DEFAULT_COMPACT);
        // color default follows the destination; an explicit request is
        // still forced off for files
        let is_std = destination.is_std();
        let requested = colors
            .or(prev.as_ref().map(|p| p.inspect.colors))
            .unwrap_or(is_std);
        let colors = is_std && requested && !CTXLOG_CONFIG.NO_COLOR;

        let info = LoggerInfo {
            writer,
            destination,
            prompt,
            date,
            encoding,
            flags,
            inspect: InspectOptions {
                depth,
                compact,
                colors,
            },
        };
        match slot {
            Some(arc) => *arc.write().unwrap() = info,
            None => {
                loggers.insert(alias.to_string(), Arc::new(RwLock::new(info)));
            }
        }
        Ok(())
    }

    /// Registers a batch of aliases in iteration order. Every entry is
    /// attempted; failures are collected into `LogError::Batch`.
    pub fn register_many<I, S, D>(&self, defs: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<LoggerDef>,
    {
        let mut failures = Vec::new();
        for (alias, def) in defs {
            let alias = alias.into();
            if let Err(err) = self.register(&alias, def) {
                failures.push((alias, err));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(LogError::Batch(failures))
        }
    }

    /// The write entry point for `alias`, if registered.
    pub fn get(&self, alias: &str) -> Option<LoggerHandle> {
        let loggers = self.inner.loggers.read().unwrap();
        loggers.get(alias).map(|info| LoggerHandle {
            alias: Arc::from(alias),
            info: Arc::clone(info),
        })
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.loggers.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    fn default_handle(&self) -> LoggerHandle {
        self.get(DEFAULT_LOGGER_NAME)
            .expect("the default logger always exists")
    }

    /// Writes through the default alias.
    pub fn write(&self, message: &str) -> Result<()> {
        self.default_handle().write(message)
    }

    pub fn write_args(&self, message: &str, args: &[Value]) -> Result<()> {
        self.default_handle().write_args(message, args)
    }

    pub fn write_ctx(&self, context: &Context, message: &str, args: &[Value]) -> Result<()> {
        self.default_handle().write_ctx(context, message, args)
    }

    pub fn write_record(&self, record: Record<'_>) -> Result<()> {
        self.default_handle().write_record(record)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// A permanently attached write entry point for one alias. Configuration
/// updates through re-registration are visible to existing handles.
#[derive(Clone)]
pub struct LoggerHandle {
    alias: Arc<str>,
    info: Arc<RwLock<LoggerInfo>>,
}

impl LoggerHandle {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn write(&self, message: &str) -> Result<()> {
        self.write_record(Record::Plain {
            message: Some(message),
            args: &[],
        })
    }

    pub fn write_args(&self, message: &str, args: &[Value]) -> Result<()> {
        self.write_record(Record::Plain {
            message: Some(message),
            args,
        })
    }

    pub fn write_ctx(&self, context: &Context, message: &str, args: &[Value]) -> Result<()> {
        self.write_record(Record::Templated {
            context,
            message: Some(message),
            args,
        })
    }

    pub fn write_record(&self, record: Record<'_>) -> Result<()> {
        self.info.read().unwrap().write_record(record)
    }
}

static GLOBAL_LOGGER: LazyLock<Logger> = LazyLock::new(Logger::new);

/// The process-wide logger instance, created on first use with the default
/// `log` alias bound to stdout.
pub fn global() -> &'static Logger {
    &GLOBAL_LOGGER
}
