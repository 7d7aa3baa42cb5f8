//! Swappable destination for push-cycle log lines.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Full date-time format used for push-cycle lines and their timestamps.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type Dest = Box<dyn Write + Send>;

/// Shared handle; clones write to the same destination. Defaults to stdout.
#[derive(Clone)]
pub struct LogSink {
    dest: Arc<Mutex<Dest>>,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl LogSink {
    pub fn new<W: Write + Send + 'static>(w: W) -> Self {
        let dest: Dest = Box::new(w);
        Self {
            dest: Arc::new(Mutex::new(dest)),
        }
    }

    /// Redirect every clone of this sink to `w`.
    pub fn set<W: Write + Send + 'static>(&self, w: W) {
        let dest: Dest = Box::new(w);
        *self.lock() = dest;
    }

    /// Write one line prefixed with the local date-time. Write errors are dropped.
    pub fn line(&self, msg: &str) {
        let now = chrono::Local::now().format(DATE_TIME_FORMAT);
        let mut dest = self.lock();
        let _ = writeln!(dest, "{now} {msg}");
        let _ = dest.flush();
    }

    // A panic while holding the lock leaves the writer usable.
    fn lock(&self) -> MutexGuard<'_, Dest> {
        self.dest.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Buf(Arc<Mutex<Vec<u8>>>);

    impl Write for Buf {
        fn write(&mut self, b: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(b);
            Ok(b.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn lines_are_timestamped() {
        let buf = Buf::default();
        let sink = LogSink::new(buf.clone());
        sink.line("hello");
        let text = buf.text();
        assert!(text.ends_with(" hello\n"));
        let stamp = text.trim_end().trim_end_matches(" hello");
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, DATE_TIME_FORMAT).is_ok());
    }

    #[test]
    fn set_redirects_all_clones() {
        let first = Buf::default();
        let second = Buf::default();
        let sink = LogSink::new(first.clone());
        let clone = sink.clone();
        sink.set(second.clone());
        clone.line("after");
        assert!(first.text().is_empty());
        assert!(second.text().contains("after"));
    }
}
