//! Background draining of the server's stderr
//!
//! The server's diagnostic stream is read line by line on its own task for the
//! whole life of the client, so a chatty server can never block on a full
//! stderr pipe. The most recent lines are kept for error messages.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

/// Default number of stderr lines kept for error context
pub const DEFAULT_STDERR_LINES: usize = 10;

/// Bounded, shareable buffer of the most recent stderr lines
#[derive(Debug, Clone)]
pub struct StderrTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for StderrTail {
    fn default() -> Self {
        Self::new(DEFAULT_STDERR_LINES)
    }
}

impl StderrTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append a line, evicting the oldest one when full
    pub fn push(&self, line: String) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.lock();
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Copy of the retained lines, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Retained lines joined with newlines
    pub fn render(&self) -> String {
        self.snapshot().join("\n")
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        // A panic while holding the lock cannot leave the deque inconsistent
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Spawn a task that copies every line of `stream` into `tail` until EOF.
///
/// Invalid UTF-8 is replaced rather than ending the drain, and read errors
/// end it quietly.
pub fn spawn_drain<R>(stream: R, tail: StderrTail) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw).trim_end().to_string();
                    tracing::debug!(target: "memsync_mcp::server", "{}", line);
                    tail.push(line);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "stderr drain stopped");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tail_keeps_most_recent_lines() {
        let tail = StderrTail::new(3);
        for i in 1..=5 {
            tail.push(format!("line {i}"));
        }
        assert_eq!(tail.snapshot(), vec!["line 3", "line 4", "line 5"]);
        assert_eq!(tail.render(), "line 3\nline 4\nline 5");
    }

    #[test]
    fn zero_capacity_tail_stays_empty() {
        let tail = StderrTail::new(0);
        tail.push("ignored".to_string());
        assert!(tail.snapshot().is_empty());
    }

    #[tokio::test]
    async fn drain_reads_until_eof() {
        let tail = StderrTail::new(10);
        let input: &[u8] = b"starting\nwarn: slow disk\r\nlast line without newline";
        spawn_drain(input, tail.clone()).await.unwrap();
        assert_eq!(
            tail.snapshot(),
            vec!["starting", "warn: slow disk", "last line without newline"]
        );
    }

    #[tokio::test]
    async fn drain_survives_invalid_utf8() {
        let tail = StderrTail::new(10);
        let input: &[u8] = b"bad \xff byte\nok\n";
        spawn_drain(input, tail.clone()).await.unwrap();
        let lines = tail.snapshot();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("bad "));
        assert_eq!(lines[1], "ok");
    }
}
