use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};

use slog::{Drain, KV, Key, Logger, Never, OwnedKVList, Record};
use slog_async::Async;
use slog_term::{CompactFormat, PlainDecorator};

/// Loggers for tests.
pub struct TestLogger;

impl TestLogger {
    fn from_writer<W: io::Write + Send + 'static>(writer: W) -> Logger {
        let decorator = PlainDecorator::new(writer);
        let drain = CompactFormat::new(decorator).build().fuse();
        let drain = Async::new(drain).build().fuse();
        Logger::root(Arc::new(drain), slog::o!())
    }

    /// Logger that writes to the test output, captured by the test harness.
    pub fn stdout() -> Logger {
        Self::from_writer(slog_term::TestStdoutWriter)
    }

    /// Logger that keeps its records in memory, alongside an inspector to read them back.
    ///
    /// Each record is kept as one line: `LEVEL message key=value key=value`.
    pub fn memory() -> (Logger, MemoryLogsInspector) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let drain = MemoryDrain {
            records: records.clone(),
        };

        (
            Logger::root(drain, slog::o!()),
            MemoryLogsInspector { records },
        )
    }
}

/// Read access to the records of a [TestLogger::memory] logger.
pub struct MemoryLogsInspector {
    records: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogsInspector {
    /// Check if any record contains the given text.
    pub fn contains_log(&self, text: &str) -> bool {
        self.records().iter().any(|line| line.contains(text))
    }

    /// All the records, oldest first.
    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

struct MemoryDrain {
    records: Arc<Mutex<Vec<String>>>,
}

impl Drain for MemoryDrain {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record, values: &OwnedKVList) -> Result<(), Never> {
        let mut line = format!("{} {}", record.level().as_short_str(), record.msg());
        {
            let mut serializer = LineSerializer { line: &mut line };
            let _ = record.kv().serialize(record, &mut serializer);
            let _ = values.serialize(record, &mut serializer);
        }

        if let Ok(mut records) = self.records.lock() {
            records.push(line);
        }
        Ok(())
    }
}

struct LineSerializer<'a> {
    line: &'a mut String,
}

impl slog::Serializer for LineSerializer<'_> {
    fn emit_arguments(&mut self, key: Key, value: &fmt::Arguments) -> slog::Result {
        self.line.push_str(&format!(" {key}={value}"));
        Ok(())
    }
}
