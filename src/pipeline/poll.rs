// src/pipeline/poll.rs

//! Periodic polling task.
//!
//! Each cycle runs fetch → extract → diff → replace → persist → notify to
//! completion before the idle sleep starts, so cycles never overlap. The
//! pause flag and the stop signal are checked at the top of every cycle;
//! the stop signal also cuts idle sleeps short.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{ChangeEvent, Config, Snapshot};
use crate::pipeline::diff::ChangeDetector;
use crate::pipeline::notify::ChangeNotifier;
use crate::pipeline::state::{CycleAction, PauseFlag, SnapshotCell, SnapshotReader, SnapshotWriter};
use crate::services::{DocumentSource, Fetcher, StandingsExtractor};
use crate::storage::{self, LocalStorage, NullStorage, SnapshotStorage};

/// Outcome of one completed poll cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub record_count: usize,
    pub fingerprint: String,
    pub events: Vec<ChangeEvent>,
    pub saved: bool,
}

/// The single writer of the shared snapshot.
pub struct Poller {
    source: Arc<dyn DocumentSource>,
    extractor: StandingsExtractor,
    detector: ChangeDetector,
    storage: Arc<dyn SnapshotStorage>,
    notifier: Arc<dyn ChangeNotifier>,
    writer: SnapshotWriter,
    poll_interval: Duration,
    paused_idle: Duration,
}

impl Poller {
    /// Assemble a poller starting from `initial`.
    pub fn new(
        config: &Config,
        source: Arc<dyn DocumentSource>,
        storage: Arc<dyn SnapshotStorage>,
        notifier: Arc<dyn ChangeNotifier>,
        initial: Snapshot,
    ) -> Result<Self> {
        let extractor = StandingsExtractor::new(&config.extraction, &config.source.name)?;
        let (writer, _reader) = SnapshotCell::new(initial);

        Ok(Self {
            source,
            extractor,
            detector: ChangeDetector::new(),
            storage,
            notifier,
            writer,
            poll_interval: config.source.poll_interval(),
            paused_idle: config.source.paused_idle(),
        })
    }

    /// Build the HTTP fetcher and storage from configuration and load the
    /// last stored snapshot (empty if there is none or it is unreadable).
    pub async fn from_config(config: &Config, notifier: Arc<dyn ChangeNotifier>) -> Result<Self> {
        let source: Arc<dyn DocumentSource> = Arc::new(Fetcher::new(&config.source)?);
        let storage: Arc<dyn SnapshotStorage> = if config.storage.enabled {
            Arc::new(LocalStorage::new(&config.storage.dir, &config.source.name))
        } else {
            Arc::new(NullStorage)
        };

        let initial = storage::load_or_empty(storage.as_ref(), &config.source.name).await;
        Self::new(config, source, storage, notifier, initial)
    }

    /// Override the idle durations.
    pub fn with_intervals(mut self, poll_interval: Duration, paused_idle: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.paused_idle = paused_idle;
        self
    }

    /// Read handle on the current snapshot.
    pub fn reader(&self) -> SnapshotReader {
        self.writer.reader()
    }

    /// Run one full cycle.
    ///
    /// A fetch failure is returned before anything changes. Persistence and
    /// notification failures are logged and do not fail the cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let previous = self.writer.current();
        log::debug!("Starting cycle against {} records", previous.len());

        let html = self.source.fetch().await?;
        let current = Arc::new(self.extractor.extract(&html));
        let events = self.detector.diff(&previous, &current);

        self.writer.replace(Arc::clone(&current));
        let saved = storage::save_best_effort(self.storage.as_ref(), &current).await;

        if !events.is_empty() {
            if let Err(e) = self.notifier.notify(&current, &events).await {
                log::warn!("Failed to deliver {} change events: {}", events.len(), e);
            }
        }

        Ok(CycleReport {
            record_count: current.len(),
            fingerprint: current.fingerprint().to_string(),
            events,
            saved,
        })
    }

    /// Loop until `stop` turns true or its sender is dropped.
    pub async fn run(mut self, pause: PauseFlag, mut stop: watch::Receiver<bool>) {
        log::info!(
            "Polling {} every {:?}",
            self.source.endpoint(),
            self.poll_interval
        );

        loop {
            if *stop.borrow() {
                break;
            }

            let idle = match pause.state().action(self.poll_interval, self.paused_idle) {
                CycleAction::Poll { then_idle } => {
                    match self.run_cycle().await {
                        Ok(report) => log::info!(
                            "Cycle done: {} records, {} changes, fingerprint {}",
                            report.record_count,
                            report.events.len(),
                            &report.fingerprint[..report.fingerprint.len().min(12)]
                        ),
                        Err(e) => log::error!("Poll cycle failed: {}", e),
                    }
                    then_idle
                }
                CycleAction::Idle(idle) => {
                    log::debug!("Paused; idling {:?}", idle);
                    idle
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(idle) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        log::info!("Poller stopped");
    }

    /// Start the polling loop on the runtime.
    pub fn spawn(self, paused: bool) -> PollerHandle {
        let reader = self.reader();
        let pause = PauseFlag::new(paused);
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(pause.clone(), stop_rx));

        PollerHandle {
            pause,
            stop_tx,
            task,
            reader,
        }
    }
}

/// Control handle for a spawned poller.
pub struct PollerHandle {
    pause: PauseFlag,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    reader: SnapshotReader,
}

impl PollerHandle {
    pub fn pause(&self) {
        log::info!("Pausing poller");
        self.pause.pause();
    }

    pub fn resume(&self) {
        log::info!("Resuming poller");
        self.pause.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.pause.state() == crate::pipeline::state::PollState::Paused
    }

    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.reader.current()
    }

    /// Signal the loop to stop and wait up to `timeout` for it.
    ///
    /// Returns `false` if the task had to be aborted.
    pub async fn stop(self, timeout: Duration) -> bool {
        let _ = self.stop_tx.send(true);
        let mut task = self.task;

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::error!("Poller task failed: {}", e);
                true
            }
            Err(_) => {
                log::warn!("Poller did not stop within {:?}; aborting", timeout);
                task.abort();
                false
            }
        }
    }
}
