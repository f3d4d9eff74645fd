//! Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pscan::{Job, NameService, PortProbe, ProbeOutcome};
use std::collections::HashSet;
use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory sink that records every write call separately
#[derive(Clone, Default)]
pub struct SharedBuf {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    delay: Option<Duration>,
}

impl SharedBuf {
    pub fn slow(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    pub fn contents(&self) -> String {
        let writes = self.writes.lock().unwrap();
        String::from_utf8(writes.concat()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(delay) = self.delay else {
            self.writes.lock().unwrap().push(buf.to_vec());
            return Ok(buf.len());
        };

        // Pause after every line so a writer holding only a line-level lock
        // would let another block land between two lines of its own.
        for line in buf.split_inclusive(|&b| b == b'\n') {
            self.writes.lock().unwrap().push(line.to_vec());
            if line.ends_with(b"\n") {
                std::thread::sleep(delay);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Probe that reports a fixed set of ports as open and records every call
pub struct FakeProbe {
    open: HashSet<u16>,
    delay: Duration,
    pub calls: Mutex<Vec<Job>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeProbe {
    pub fn new(open: impl IntoIterator<Item = u16>) -> Self {
        Self {
            open: open.into_iter().collect(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn all_closed() -> Self {
        Self::new(Vec::<u16>::new())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PortProbe for FakeProbe {
    async fn probe(&self, job: Job) -> ProbeOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            // Vary the delay per port so completion order differs from port order.
            let jitter = Duration::from_millis(u64::from(job.port % 7));
            tokio::time::sleep(self.delay + jitter).await;
        }

        self.calls.lock().unwrap().push(job);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.open.contains(&job.port) {
            ProbeOutcome::open(job.port, Some(format!("banner-{}", job.port)))
        } else {
            ProbeOutcome::closed(job.port)
        }
    }
}

/// Name service with canned answers that counts lookups
#[derive(Default)]
pub struct FakeNames {
    pub forward_answer: Option<Ipv4Addr>,
    pub reverse_answer: Option<String>,
    pub forward_calls: AtomicUsize,
    pub reverse_calls: AtomicUsize,
}

#[async_trait]
impl NameService for FakeNames {
    async fn forward(&self, host: &str) -> io::Result<Ipv4Addr> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        self.forward_answer.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} does not resolve", host))
        })
    }

    async fn reverse(&self, address: Ipv4Addr) -> io::Result<String> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        self.reverse_answer.clone().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no PTR record for {}", address))
        })
    }
}
