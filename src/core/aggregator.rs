//! Response assembly
//!
//! The interpreter never marks the end of a response. A response is taken
//! to be complete once the queue stays empty for one quiet window. Under
//! heavy load this can cut a response short, so callers must accept
//! partial captures.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Consumer side of the output queue
pub struct OutputAggregator {
    rx: Receiver<String>,
    /// Gap after which no more output is expected
    quiet_window: Duration,
    /// How long [`await_response`](Self::await_response) waits for the first line
    first_output_timeout: Duration,
}

impl OutputAggregator {
    pub fn new(rx: Receiver<String>, quiet_window: Duration, first_output_timeout: Duration) -> Self {
        Self {
            rx,
            quiet_window,
            first_output_timeout,
        }
    }

    /// Collect everything queued until one quiet window passes with no output.
    pub fn snapshot(&self) -> String {
        let mut output = String::new();
        self.collect_into(&mut output);
        output
    }

    /// Like [`snapshot`](Self::snapshot), but first waits up to the
    /// first-output timeout for the interpreter to start replying.
    pub fn await_response(&self) -> String {
        let mut output = String::new();
        match self.rx.recv_timeout(self.first_output_timeout) {
            Ok(line) => {
                output.push_str(&line);
                self.collect_into(&mut output);
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        output
    }

    fn collect_into(&self, output: &mut String) {
        loop {
            match self.rx.recv_timeout(self.quiet_window) {
                Ok(line) => output.push_str(&line),
                // Disconnected: the drain is gone, whatever was queued has been read
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn aggregator(rx: Receiver<String>) -> OutputAggregator {
        OutputAggregator::new(rx, Duration::from_millis(20), Duration::from_millis(200))
    }

    #[test]
    fn test_snapshot_concatenates_queued_lines() {
        let (tx, rx) = mpsc::channel();
        tx.send("You are in a maze\n".to_string()).unwrap();
        tx.send("of twisty little passages.\n".to_string()).unwrap();

        let agg = aggregator(rx);
        assert_eq!(agg.snapshot(), "You are in a maze\nof twisty little passages.\n");
    }

    #[test]
    fn test_second_snapshot_is_empty() {
        let (tx, rx) = mpsc::channel();
        tx.send("Taken.\n".to_string()).unwrap();

        let agg = aggregator(rx);
        assert_eq!(agg.snapshot(), "Taken.\n");
        assert_eq!(agg.snapshot(), "");
        drop(tx);
    }

    #[test]
    fn test_snapshot_returns_on_disconnect() {
        let (tx, rx) = mpsc::channel();
        tx.send("Goodbye.\n".to_string()).unwrap();
        drop(tx);

        let agg = OutputAggregator::new(rx, Duration::from_secs(30), Duration::from_secs(30));
        assert_eq!(agg.snapshot(), "Goodbye.\n");
        assert_eq!(agg.await_response(), "");
    }

    #[test]
    fn test_await_response_waits_for_late_output() {
        let (tx, rx) = mpsc::channel();
        let agg = aggregator(rx);

        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tx.send("Opening the mailbox reveals a leaflet.\n".to_string()).unwrap();
        });

        assert_eq!(agg.snapshot(), "");
        assert_eq!(agg.await_response(), "Opening the mailbox reveals a leaflet.\n");
        writer.join().unwrap();
    }

    #[test]
    fn test_await_response_times_out_empty() {
        let (_tx, rx) = mpsc::channel::<String>();
        let agg = OutputAggregator::new(rx, Duration::from_millis(5), Duration::from_millis(30));
        assert_eq!(agg.await_response(), "");
    }
}
