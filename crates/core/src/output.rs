use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

enum Target {
    Stdout,
    Buffer(Vec<u8>),
    Discard,
}

/// Shared line-oriented writer that an operation streams its output into.
#[derive(Clone)]
pub struct OutputSink {
    target: Arc<Mutex<Target>>,
}

impl OutputSink {
    fn from_target(target: Target) -> Self {
        Self {
            target: Arc::new(Mutex::new(target)),
        }
    }

    /// A sink bound to the process's standard output.
    pub fn stdout() -> Self {
        Self::from_target(Target::Stdout)
    }

    /// An in-memory sink whose contents can be read back.
    pub fn buffer() -> Self {
        Self::from_target(Target::Buffer(Vec::new()))
    }

    pub fn discard() -> Self {
        Self::from_target(Target::Discard)
    }

    pub fn is_stdout(&self) -> bool {
        matches!(*self.target.lock().unwrap(), Target::Stdout)
    }

    pub fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut target = self.target.lock().unwrap();
        match &mut *target {
            Target::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", line)?;
                out.flush()
            }
            Target::Buffer(buf) => writeln!(buf, "{}", line),
            Target::Discard => Ok(()),
        }
    }

    /// Buffered text, or `None` for stdout and discard sinks.
    pub fn contents(&self) -> Option<String> {
        match &*self.target.lock().unwrap() {
            Target::Buffer(buf) => Some(String::from_utf8_lossy(buf).into_owned()),
            _ => None,
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &*self.target.lock().unwrap() {
            Target::Stdout => "stdout",
            Target::Buffer(_) => "buffer",
            Target::Discard => "discard",
        };
        f.debug_struct("OutputSink").field("target", &target).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_collects_lines() {
        let sink = OutputSink::buffer();
        let clone = sink.clone();

        sink.write_line("web_1 | listening").unwrap();
        clone.write_line("db_1  | ready").unwrap();

        assert_eq!(
            sink.contents().unwrap(),
            "web_1 | listening\ndb_1  | ready\n"
        );
        assert!(!sink.is_stdout());
    }

    #[test]
    fn test_stdout_and_discard_have_no_contents() {
        assert!(OutputSink::stdout().is_stdout());
        assert!(OutputSink::stdout().contents().is_none());

        let sink = OutputSink::discard();
        sink.write_line("dropped").unwrap();
        assert!(sink.contents().is_none());
    }
}
