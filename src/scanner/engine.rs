//! Scan coordinator: a fixed-size worker pool draining one shared job queue
//!
//! Every job is queued before the first worker starts, so a worker that finds
//! the queue empty is done. Workers send outcomes over a channel to a single
//! aggregator task which owns the [`Reporter`] and the open-port count; no
//! other cross-worker state exists. `scan` returns only after every worker
//! has exited and the aggregator has drained the channel, which means every
//! dequeued job has also finished.

use crate::config::ScanConfig;
use crate::network::{PortProbe, ProbeOutcome};
use crate::output::Reporter;
use crate::scanner::{Job, ScanSummary};
use crate::utils::target_parser::TargetAddress;
use crate::ScanError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};

type JobQueue = Arc<Mutex<VecDeque<Job>>>;

/// Main scanning engine
pub struct ScanEngine {
    config: ScanConfig,
    probe: Arc<dyn PortProbe>,
}

impl ScanEngine {
    /// Create a new scan engine with the given configuration
    pub fn new(config: ScanConfig, probe: Arc<dyn PortProbe>) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self { config, probe })
    }

    /// Probe every port once and fold the outcomes into a [`ScanSummary`].
    ///
    /// The reporter is handed back so the caller can write the summary.
    pub async fn scan(
        &self,
        address: impl Into<TargetAddress>,
        ports: &[u16],
        reporter: Reporter,
    ) -> crate::Result<(Reporter, ScanSummary)> {
        let start_time = Instant::now();
        let total_ports = ports.len();
        let address = address.into();

        let ip = address.ipv4();
        if ip.is_none() {
            log::warn!("{} is not a usable IPv4 address; every port will report closed", address);
        }

        let queue: JobQueue = Arc::new(Mutex::new(
            ports.iter().map(|&port| Job { address: ip, port }).collect(),
        ));

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel::<ProbeOutcome>();
        let aggregator = tokio::spawn(aggregate(outcome_rx, reporter));

        let worker_count = self.config.concurrency.min(total_ports);
        log::debug!(
            "Starting {} workers for {} jobs against {}",
            worker_count,
            total_ports,
            address
        );

        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let queue = queue.clone();
            let probe = self.probe.clone();
            let outcome_tx = outcome_tx.clone();
            handles.push(tokio::spawn(worker(id, queue, probe, outcome_tx)));
        }

        // Workers hold their own senders; the aggregator stops once they all exit.
        drop(outcome_tx);

        let mut processed = 0;
        for result in futures::future::join_all(handles).await {
            match result {
                Ok(count) => processed += count,
                Err(e) => log::error!("Scan worker failed: {}", e),
            }
        }

        let (reporter, open_count) = aggregator
            .await
            .map_err(|e| ScanError::OutputError(format!("Result aggregator failed: {}", e)))??;

        log::debug!(
            "Processed {}/{} jobs in {:?}",
            processed,
            total_ports,
            start_time.elapsed()
        );

        Ok((reporter, ScanSummary { total_ports, open_count }))
    }
}

/// Take jobs until the queue is empty; returns the number processed
async fn worker(
    id: usize,
    queue: JobQueue,
    probe: Arc<dyn PortProbe>,
    outcome_tx: mpsc::UnboundedSender<ProbeOutcome>,
) -> usize {
    let mut processed = 0;

    loop {
        let next = queue.lock().await.pop_front();
        let Some(job) = next else { break };

        let outcome = probe.probe(job).await;
        processed += 1;

        if outcome_tx.send(outcome).is_err() {
            log::warn!("Worker {} stopping: result aggregator is gone", id);
            break;
        }
    }

    log::trace!("Worker {} finished after {} jobs", id, processed);
    processed
}

/// Sole consumer of outcomes: writes each report and counts open ports
async fn aggregate(
    mut outcome_rx: mpsc::UnboundedReceiver<ProbeOutcome>,
    mut reporter: Reporter,
) -> crate::Result<(Reporter, usize)> {
    let mut open_count = 0;

    while let Some(outcome) = outcome_rx.recv().await {
        if outcome.open {
            open_count += 1;
        }
        reporter.outcome(&outcome)?;
    }

    Ok((reporter, open_count))
}
