//! Background reader for interpreter output
//!
//! The interpreter blocks once its stdout pipe fills up, so the pipe has to be
//! emptied whether or not anyone is waiting for a response. One worker thread
//! per process moves every line into a channel; the
//! [`OutputAggregator`](super::aggregator::OutputAggregator) consumes it.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

/// Reader worker handle
pub struct OutputDrain {
    /// Cleared by the worker when it exits
    running: Arc<AtomicBool>,
    /// Worker thread handle
    handle: Option<JoinHandle<()>>,
}

impl OutputDrain {
    /// Spawn a worker that forwards each line of `source` to `tx`.
    ///
    /// The worker stops at end-of-input, on a read error, or when the
    /// receiving side of the channel has been dropped.
    pub fn spawn<R>(source: R, tx: Sender<String>) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::Builder::new()
            .name("textplayer-drain".to_string())
            .spawn(move || {
                pump_lines(source, &tx);
                flag.store(false, Ordering::SeqCst);
            })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Whether the worker is still reading
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Poll until the worker has exited or `timeout` elapses.
    ///
    /// Returns `true` if the worker is gone.
    pub fn wait_finished(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_running() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        true
    }

    /// Join the worker if it has already exited.
    ///
    /// Never blocks on a live worker.
    pub fn reap(&mut self) {
        if self.is_running() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                debug!("Output drain thread panicked");
            }
        }
    }
}

fn pump_lines<R: Read>(source: R, tx: &Sender<String>) {
    let mut reader = BufReader::new(source);
    let mut buffer = Vec::with_capacity(256);

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => {
                // End of stream: the process closed stdout
                debug!("Interpreter output closed");
                break;
            }
            Ok(_) => {
                if tx.send(decode_line(&buffer)).is_err() {
                    debug!("Output receiver dropped, stopping drain");
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Interpreter output read failed: {}", e);
                break;
            }
        }
    }
}

/// Decode one raw line, substituting U+FFFD for invalid UTF-8.
fn decode_line(raw: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(raw).into_owned();
    if line.ends_with("\r\n") {
        line.truncate(line.len() - 2);
        line.push('\n');
    }
    line
}
