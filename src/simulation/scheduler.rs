//! Fixed-interval driver for the animator
//!
//! A driver thread owns the tick timeline. World writes never happen on it:
//! they are queued on a channel and executed by whichever thread owns the
//! world when it calls [`SignalService::pump_world`]. Outcomes of those
//! writes travel back on a second channel and reach the animator at the start
//! of the next run.

use crossbeam_channel::{select, tick, unbounded, Receiver, Sender};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use super::animator::{Animator, TickReport, WorldSink, WorldWrite, WriteFeedback, WriteReceipt};
use super::config::SignalConfig;
use super::cycle::{Clock, PhaseCycle};
use super::element::ApplyOutcome;
use super::error::{ConfigError, RegistrationError};
use super::intersection::Intersection;
use super::registry::IntersectionRegistry;
use super::types::IntersectionId;
use super::world::World;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Forwards writes to the world thread
struct ChannelSink<'a> {
    tx: &'a Sender<WorldWrite>,
}

impl WorldSink for ChannelSink<'_> {
    fn submit(&mut self, write: WorldWrite) -> WriteReceipt {
        match self.tx.send(write) {
            Ok(()) => WriteReceipt::Queued,
            Err(_) => WriteReceipt::Dropped,
        }
    }
}

struct Shared {
    animator: Mutex<Animator>,
    registry: Mutex<IntersectionRegistry>,
    write_tx: Sender<WorldWrite>,
    feedback_rx: Receiver<WriteFeedback>,
}

impl Shared {
    fn run_once(&self) -> TickReport {
        let mut animator = lock(&self.animator);
        for feedback in self.feedback_rx.try_iter() {
            animator.record_feedback(feedback);
        }
        let mut sink = ChannelSink { tx: &self.write_tx };
        let report = animator.tick(&mut sink);
        if report.transitions > 0 {
            debug!(
                "Animator run: {} transitions, {} writes queued, {} unchanged",
                report.transitions, report.writes, report.unchanged
            );
        }
        report
    }
}

struct Driver {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Animator plus the thread that drives it
pub struct SignalService {
    shared: Arc<Shared>,
    config_path: Option<PathBuf>,
    write_rx: Receiver<WorldWrite>,
    feedback_tx: Sender<WriteFeedback>,
    driver: Option<Driver>,
}

impl SignalService {
    pub fn new(config: SignalConfig, clock: Arc<dyn Clock>, registry: IntersectionRegistry) -> Self {
        let (write_tx, write_rx) = unbounded::<WorldWrite>();
        let (feedback_tx, feedback_rx) = unbounded::<WriteFeedback>();

        Self {
            shared: Arc::new(Shared {
                animator: Mutex::new(Animator::new(config, clock)),
                registry: Mutex::new(registry),
                write_tx,
                feedback_rx,
            }),
            config_path: None,
            write_rx,
            feedback_tx,
            driver: None,
        }
    }

    /// Build a service whose configuration is read from (and reloaded from) a file
    pub fn from_config_file(
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        registry: IntersectionRegistry,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = SignalConfig::from_file(&path)?;
        let mut service = Self::new(config, clock, registry);
        service.config_path = Some(path);
        Ok(service)
    }

    pub fn config(&self) -> SignalConfig {
        lock(&self.shared.animator).config().clone()
    }

    /// Start the animator on every complete intersection and spawn the driver
    pub fn start(&mut self) {
        if self.driver.is_some() {
            warn!("Signal service is already running");
            return;
        }

        let period = {
            let intersections = lock(&self.shared.registry).complete();
            let mut animator = lock(&self.shared.animator);
            animator.start(intersections);
            animator.config().tick_period()
        };

        let (stop_tx, stop_rx) = unbounded::<()>();
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::spawn(move || {
            let ticker = tick(period);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        shared.run_once();
                    }
                }
            }
        });

        info!("Signal service started ({} ms period)", period.as_millis());
        self.driver = Some(Driver { stop_tx, handle });
    }

    /// Stop the driver, the animator, and discard any writes not yet pumped
    pub fn stop(&mut self) {
        if let Some(driver) = self.driver.take() {
            let _ = driver.stop_tx.send(());
            if driver.handle.join().is_err() {
                warn!("Signal driver thread panicked");
            }
        }
        lock(&self.shared.animator).stop();
        let discarded = self.write_rx.try_iter().count();
        let _ = self.shared.feedback_rx.try_iter().count();
        if discarded > 0 {
            debug!("Discarded {} pending light writes", discarded);
        }
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_some()
    }

    /// Run the animator once on the calling thread
    pub fn run_once(&self) -> TickReport {
        self.shared.run_once()
    }

    /// Execute every queued write against the world and report each outcome.
    ///
    /// Call this from the thread that owns the world. Returns how many writes
    /// were executed.
    pub fn pump_world(&self, world: &mut dyn World) -> usize {
        let mut executed = 0;
        for write in self.write_rx.try_iter() {
            let target = write.target();
            let applied = match write.execute(world) {
                Ok(ApplyOutcome::Applied) => true,
                Ok(ApplyOutcome::Skipped) => false,
                Err(e) => {
                    warn!("Failed to update light at {}: {}", target, e);
                    false
                }
            };
            let _ = self.feedback_tx.send(WriteFeedback { target, applied });
            executed += 1;
        }
        executed
    }

    /// Writes waiting for [`pump_world`](Self::pump_world)
    pub fn pending_writes(&self) -> usize {
        self.write_rx.len()
    }

    /// Catalogue an intersection and, while running, start animating it.
    ///
    /// An incomplete intersection is still catalogued but not animated,
    /// unless it would replace one that is currently animated.
    pub fn register_intersection(&self, intersection: Intersection) -> Result<(), RegistrationError> {
        let mut registry = lock(&self.shared.registry);
        let mut animator = lock(&self.shared.animator);
        if let Err(err) = intersection.validate() {
            if animator.cycle(&intersection.id).is_some() {
                warn!(
                    "Keeping the animated record of '{}', the replacement is incomplete",
                    intersection.name
                );
            } else {
                registry.register(intersection);
            }
            return Err(err);
        }
        let shared = registry.register(intersection);
        if animator.is_running() {
            animator.register_intersection(shared)
        } else {
            Ok(())
        }
    }

    pub fn unregister_intersection(&self, id: &IntersectionId) -> Option<Arc<Intersection>> {
        let removed = lock(&self.shared.registry).remove(id);
        lock(&self.shared.animator).unregister_intersection(id);
        removed
    }

    pub fn intersection(&self, id: &IntersectionId) -> Option<Arc<Intersection>> {
        lock(&self.shared.registry).get(id).cloned()
    }

    pub fn cycle(&self, id: &IntersectionId) -> Option<PhaseCycle> {
        lock(&self.shared.animator).cycle(id).cloned()
    }

    pub fn active_cycle_count(&self) -> usize {
        lock(&self.shared.animator).active_cycle_count()
    }

    /// Re-read the configuration file, if there is one, and restart if running
    pub fn reload_config(&mut self) -> Result<(), ConfigError> {
        let config = match &self.config_path {
            Some(path) => SignalConfig::from_file(path)?,
            None => self.config(),
        };
        self.apply_config(config);
        Ok(())
    }

    /// Replace the configuration, restarting if running
    pub fn apply_config(&mut self, config: SignalConfig) {
        let was_running = self.is_running();
        if was_running {
            self.stop();
        }
        lock(&self.shared.animator).reload_config(config);
        if was_running {
            self.start();
        }
        info!("Signal configuration reloaded");
    }
}

impl Drop for SignalService {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}
