//! Sinks and the writer registry: one shared writable resource per
//! physical destination for the lifetime of the process.

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Component, Path, PathBuf},
    sync::{Arc, Mutex, RwLock},
};

use crate::error::{LogError, Result};

/// A writable line sink. Writes are synchronous; buffering beyond what the
/// operating system provides is left to the sink itself.
pub trait LogSink: Send {
    fn write_text(&mut self, text: &str) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Shared ownership handle for a sink: every logger bound to the same
/// destination holds a clone of the same handle.
pub type SharedSink = Arc<Mutex<dyn LogSink>>;

pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

pub struct StderrSink;

impl LogSink for StderrSink {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stderr().lock();
        out.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().lock().flush()
    }
}

pub struct FileSink {
    file: File,
}

impl FileSink {
    pub fn open<P: AsRef<Path>>(path: P, flags: Flags) -> io::Result<Self> {
        Ok(Self {
            file: flags.open_options().open(path)?,
        })
    }
}

impl LogSink for FileSink {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// File-open disposition, spelled the way stream flags are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flags {
    /// `w`: create, truncate existing content.
    #[default]
    Truncate,
    /// `a`: create, append to existing content.
    Append,
    /// `wx`: create a new file, fail if it exists.
    TruncateNew,
    /// `ax`: like `a` but fail if the file exists.
    AppendNew,
}

impl Flags {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "w" => Ok(Self::Truncate),
            "a" => Ok(Self::Append),
            "wx" | "xw" => Ok(Self::TruncateNew),
            "ax" | "xa" => Ok(Self::AppendNew),
            other => Err(LogError::Misuse(format!("unknown flags `{other}`"))),
        }
    }

    fn open_options(self) -> OpenOptions {
        let mut opts = File::options();
        match self {
            Self::Truncate => opts.create(true).write(true).truncate(true),
            Self::Append => opts.create(true).append(true),
            Self::TruncateNew => opts.create_new(true).write(true),
            Self::AppendNew => opts.create_new(true).append(true),
        };
        opts
    }
}

/// Text encoding of a destination. Sinks receive UTF-8; anything that is
/// not a UTF-8 superset spelling is rejected at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
}

impl Encoding {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" | "ascii" => Ok(Self::Utf8),
            other => Err(LogError::Misuse(format!("unsupported encoding `{other}`"))),
        }
    }
}

/// Identity key of a physical destination: a reserved standard stream or a
/// normalized absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DestinationId {
    Stdout,
    Stderr,
    Path(PathBuf),
}

impl DestinationId {
    /// Reserved names are never path-resolved; everything else becomes an
    /// absolute, lexically normalized path under `base_dir`.
    pub fn parse(raw: &str, base_dir: &Path) -> Self {
        match raw {
            "stdout" => Self::Stdout,
            "stderr" => Self::Stderr,
            _ => {
                let path = Path::new(raw);
                let absolute = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    base_dir.join(path)
                };
                Self::Path(normalize(&absolute))
            }
        }
    }

    pub fn is_std(&self) -> bool {
        matches!(self, Self::Stdout | Self::Stderr)
    }
}

/// Lexical normalization so equivalent spellings share one registry key.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Maps destination identities to their single shared sink. Standard
/// streams are pre-seeded; files open lazily on first use and are reused
/// afterwards (later flags are ignored for an already open destination).
pub struct WriterRegistry {
    base_dir: PathBuf,
    sinks: RwLock<HashMap<DestinationId, SharedSink>>,
}

impl WriterRegistry {
    /// Registry rooted at the working directory captured right now.
    pub fn new() -> Self {
        Self::with_base_dir(
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        )
    }

    pub fn with_base_dir<P: Into<PathBuf>>(base_dir: P) -> Self {
        let mut sinks: HashMap<DestinationId, SharedSink> = HashMap::new();
        sinks.insert(DestinationId::Stdout, Arc::new(Mutex::new(StdoutSink)));
        sinks.insert(DestinationId::Stderr, Arc::new(Mutex::new(StderrSink)));
        Self {
            base_dir: base_dir.into(),
            sinks: RwLock::new(sinks),
        }
    }

    /// Returns the one handle for `destination`, opening it first if needed.
    /// Open failure propagates to the registration caller; nothing is
    /// stored on failure.
    pub fn resolve(&self, destination: &str, flags: Flags) -> Result<(DestinationId, SharedSink)> {
        let id = DestinationId::parse(destination, &self.base_dir);
        if let Some(sink) = self.sinks.read().unwrap().get(&id) {
            return Ok((id, sink.clone()));
        }
        let DestinationId::Path(path) = &id else {
            unreachable!("standard streams are pre-seeded");
        };
        let sink: SharedSink = Arc::new(Mutex::new(FileSink::open(path, flags)?));
        let mut sinks = self.sinks.write().unwrap();
        let sink = sinks.entry(id.clone()).or_insert(sink).clone();
        Ok((id, sink))
    }
}

impl Default for WriterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/ctxlog_test_writer_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_std_streams_are_reserved() {
        let registry = WriterRegistry::with_base_dir(test_dir("std"));
        let (id_out, a) = registry.resolve("stdout", Flags::default()).unwrap();
        let (_, b) = registry.resolve("stdout", Flags::default()).unwrap();
        assert_eq!(id_out, DestinationId::Stdout);
        assert!(id_out.is_std());
        assert!(Arc::ptr_eq(&a, &b));
        // never resolved as paths, no file shows up on disk
        registry.resolve("stderr", Flags::default()).unwrap();
        assert!(!Path::new("stdout").exists());
        assert!(!Path::new("stderr").exists());
    }

    #[test]
    fn test_equivalent_paths_share_one_handle() {
        let dir = test_dir("dedup");
        let registry = WriterRegistry::with_base_dir(&dir);
        let (id1, a) = registry.resolve("app.log", Flags::default()).unwrap();
        let (id2, b) = registry
            .resolve("./sub/../app.log", Flags::default())
            .unwrap();
        let (id3, c) = registry
            .resolve(dir.join("app.log").to_str().unwrap(), Flags::default())
            .unwrap();
        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_later_flags_ignored_for_open_destination() {
        let dir = test_dir("flags_ignored");
        let registry = WriterRegistry::with_base_dir(&dir);
        let (_, sink) = registry.resolve("app.log", Flags::default()).unwrap();
        sink.lock().unwrap().write_text("first\n").unwrap();
        // a second resolve with truncate flags must not reopen the file
        let (_, again) = registry.resolve("app.log", Flags::Truncate).unwrap();
        again.lock().unwrap().write_text("second\n").unwrap();
        again.lock().unwrap().flush().unwrap();
        assert_eq!(
            fs::read_to_string(dir.join("app.log")).unwrap(),
            "first\nsecond\n"
        );
    }

    #[test]
    fn test_append_flags_keep_existing_content() {
        let dir = test_dir("append");
        fs::write(dir.join("app.log"), "kept\n").unwrap();
        let registry = WriterRegistry::with_base_dir(&dir);
        let (_, sink) = registry.resolve("app.log", Flags::Append).unwrap();
        sink.lock().unwrap().write_text("added\n").unwrap();
        assert_eq!(
            fs::read_to_string(dir.join("app.log")).unwrap(),
            "kept\nadded\n"
        );
    }

    #[test]
    fn test_truncate_is_the_default() {
        let dir = test_dir("truncate");
        fs::write(dir.join("app.log"), "old content\n").unwrap();
        let registry = WriterRegistry::with_base_dir(&dir);
        let (_, sink) = registry.resolve("app.log", Flags::default()).unwrap();
        sink.lock().unwrap().write_text("new\n").unwrap();
        assert_eq!(fs::read_to_string(dir.join("app.log")).unwrap(), "new\n");
    }

    #[test]
    fn test_open_failure_propagates_and_stores_nothing() {
        let dir = test_dir("open_failure");
        let registry = WriterRegistry::with_base_dir(&dir);
        let missing = "no_such_dir/app.log";
        assert!(registry.resolve(missing, Flags::default()).is_err());
        // the failed destination was not committed; creating the directory
        // afterwards lets the same spelling open cleanly
        fs::create_dir_all(dir.join("no_such_dir")).unwrap();
        assert!(registry.resolve(missing, Flags::default()).is_ok());
    }

    #[test]
    fn test_exclusive_flags_fail_on_existing_file() {
        let dir = test_dir("exclusive");
        fs::write(dir.join("app.log"), "already here").unwrap();
        let registry = WriterRegistry::with_base_dir(&dir);
        assert!(registry.resolve("app.log", Flags::TruncateNew).is_err());
    }

    #[test]
    fn test_flags_parse() {
        assert_eq!(Flags::parse("w").unwrap(), Flags::Truncate);
        assert_eq!(Flags::parse("a").unwrap(), Flags::Append);
        assert_eq!(Flags::parse("wx").unwrap(), Flags::TruncateNew);
        assert!(matches!(
            Flags::parse("rw"),
            Err(LogError::Misuse(_))
        ));
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!(Encoding::parse("utf8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::parse("UTF-8").unwrap(), Encoding::Utf8);
        assert!(Encoding::parse("latin1").is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d.log")),
            PathBuf::from("/a/c/d.log")
        );
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
    }
}
