//! Simulated media engine
//!
//! Stands in for a platform player. Loads resolve after a configurable
//! delay, URLs starting with `fail:` fail to load, and a playing asset ticks
//! its position until it reports completion.
//!
//! The [`MediaEngine`] side only sends control messages; a tokio worker owns
//! the playback clock and reports back through the session's
//! [`EngineEventSender`].

use crate::config::SimulatedEngineSettings;
use encore_playback::{EngineEventSender, LoadTicket, MediaEngine, Track};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// URL prefix that makes a load fail
pub const FAIL_PREFIX: &str = "fail:";

#[derive(Debug)]
enum Control {
    Load { ticket: LoadTicket, url: String },
    Play,
    Pause,
    Seek(f64),
    Stop,
}

/// Media engine backed by a simulated clock
pub struct SimulatedEngine {
    controls: mpsc::UnboundedSender<Control>,
}

impl SimulatedEngine {
    /// Start the engine worker on the current tokio runtime
    ///
    /// Reported durations come from the catalog entry with a matching URL;
    /// entries without one use the configured fallback.
    pub fn spawn(
        settings: &SimulatedEngineSettings,
        catalog: &[Track],
        events: EngineEventSender,
    ) -> Self {
        let durations = catalog
            .iter()
            .filter(|t| t.duration > 0.0)
            .map(|t| (t.url.clone(), t.duration))
            .collect();

        let (controls, control_rx) = mpsc::unbounded_channel();
        let worker = EngineWorker {
            controls: control_rx,
            events,
            durations,
            fallback_duration: settings.fallback_duration_secs,
            load_delay: Duration::from_millis(settings.load_delay_ms),
            tick_interval: Duration::from_millis(settings.tick_interval_ms),
            pending: None,
            asset: None,
        };
        tokio::spawn(worker.run());

        Self { controls }
    }

    fn send(&self, control: Control) {
        if self.controls.send(control).is_err() {
            debug!("Simulated engine worker has stopped");
        }
    }
}

impl MediaEngine for SimulatedEngine {
    fn load(&mut self, ticket: LoadTicket, url: &str) {
        self.send(Control::Load {
            ticket,
            url: url.to_string(),
        });
    }

    fn play(&mut self) {
        self.send(Control::Play);
    }

    fn pause(&mut self) {
        self.send(Control::Pause);
    }

    fn seek(&mut self, time: f64) {
        self.send(Control::Seek(time));
    }

    fn stop(&mut self) {
        self.send(Control::Stop);
    }
}

struct PendingLoad {
    ready_at: Instant,
    ticket: LoadTicket,
    outcome: std::result::Result<f64, String>,
}

struct Asset {
    duration: f64,
    position: f64,
    playing: bool,
}

struct EngineWorker {
    controls: mpsc::UnboundedReceiver<Control>,
    events: EngineEventSender,
    durations: HashMap<String, f64>,
    fallback_duration: f64,
    load_delay: Duration,
    tick_interval: Duration,
    pending: Option<PendingLoad>,
    asset: Option<Asset>,
}

impl EngineWorker {
    async fn run(mut self) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let ready_at = self.pending.as_ref().map(|p| p.ready_at);

            tokio::select! {
                control = self.controls.recv() => match control {
                    Some(control) => self.apply(control),
                    None => break,
                },
                () = sleep_until(ready_at.unwrap_or_else(Instant::now)), if ready_at.is_some() => {
                    self.finish_load();
                }
                _ = ticker.tick() => self.advance_clock(),
            }

            if self.events.is_closed() {
                break;
            }
        }
        debug!("Simulated engine stopped");
    }

    fn apply(&mut self, control: Control) {
        trace!("Engine control {:?}", control);
        match control {
            Control::Load { ticket, url } => {
                // A new load replaces whatever was loaded or loading
                self.asset = None;
                let outcome = match url.strip_prefix(FAIL_PREFIX) {
                    Some(reason) if !reason.is_empty() => Err(reason.to_string()),
                    Some(_) => Err("asset unavailable".to_string()),
                    None => Ok(self
                        .durations
                        .get(&url)
                        .copied()
                        .unwrap_or(self.fallback_duration)),
                };
                self.pending = Some(PendingLoad {
                    ready_at: Instant::now() + self.load_delay,
                    ticket,
                    outcome,
                });
            }
            Control::Play => {
                if let Some(asset) = self.asset.as_mut() {
                    asset.playing = true;
                }
            }
            Control::Pause => {
                if let Some(asset) = self.asset.as_mut() {
                    asset.playing = false;
                }
            }
            Control::Seek(time) => {
                if let Some(asset) = self.asset.as_mut() {
                    asset.position = time.clamp(0.0, asset.duration);
                }
            }
            Control::Stop => {
                self.pending = None;
                self.asset = None;
            }
        }
    }

    fn finish_load(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match pending.outcome {
            Ok(duration) => {
                debug!("Asset {} ready ({:.1}s)", pending.ticket.track_id, duration);
                self.asset = Some(Asset {
                    duration,
                    position: 0.0,
                    playing: false,
                });
                self.events.ready(pending.ticket, duration);
            }
            Err(reason) => {
                debug!("Asset {} failed: {}", pending.ticket.track_id, reason);
                self.events.failed(pending.ticket, reason);
            }
        }
    }

    fn advance_clock(&mut self) {
        let step = self.tick_interval.as_secs_f64();
        let Some(asset) = self.asset.as_mut().filter(|a| a.playing) else {
            return;
        };

        asset.position = (asset.position + step).min(asset.duration);
        self.events.tick(asset.position);

        if asset.position >= asset.duration {
            asset.playing = false;
            self.events.completed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_playback::{engine_channel, EngineEvent, EngineEventReceiver};

    fn settings() -> SimulatedEngineSettings {
        SimulatedEngineSettings {
            load_delay_ms: 100,
            tick_interval_ms: 500,
            fallback_duration_secs: 2.0,
        }
    }

    fn ticket(id: &str, generation: u64) -> LoadTicket {
        LoadTicket {
            track_id: id.to_string(),
            generation,
        }
    }

    async fn next_event(rx: &mut EngineEventReceiver) -> EngineEvent {
        tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("engine went quiet")
            .expect("engine channel closed")
    }

    #[tokio::test(start_paused = true)]
    async fn load_reports_catalog_duration() {
        let (tx, mut rx) = engine_channel();
        let catalog = [Track::new("a", "A", "X", "https://cdn/a.m4a").with_duration(42.0)];
        let mut engine = SimulatedEngine::spawn(&settings(), &catalog, tx);

        engine.load(ticket("a", 1), "https://cdn/a.m4a");

        assert_eq!(
            next_event(&mut rx).await,
            EngineEvent::Ready {
                ticket: ticket("a", 1),
                duration: 42.0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fail_prefix_fails_the_load() {
        let (tx, mut rx) = engine_channel();
        let mut engine = SimulatedEngine::spawn(&settings(), &[], tx);

        engine.load(ticket("bad", 1), "fail:404 not found");

        assert_eq!(
            next_event(&mut rx).await,
            EngineEvent::Failed {
                ticket: ticket("bad", 1),
                reason: "404 not found".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn playing_asset_ticks_then_completes() {
        let (tx, mut rx) = engine_channel();
        let mut engine = SimulatedEngine::spawn(&settings(), &[], tx);

        engine.load(ticket("a", 1), "https://cdn/a.m4a");
        assert!(matches!(
            next_event(&mut rx).await,
            EngineEvent::Ready { duration, .. } if duration == 2.0
        ));
        engine.play();

        let mut ticks = Vec::new();
        loop {
            match next_event(&mut rx).await {
                EngineEvent::Tick { time } => ticks.push(time),
                EngineEvent::Completed => break,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(ticks, vec![0.5, 1.0, 1.5, 2.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_load_replaces_pending_one() {
        let (tx, mut rx) = engine_channel();
        let mut engine = SimulatedEngine::spawn(&settings(), &[], tx);

        engine.load(ticket("a", 1), "https://cdn/a.m4a");
        engine.load(ticket("b", 2), "https://cdn/b.m4a");

        assert!(matches!(
            next_event(&mut rx).await,
            EngineEvent::Ready { ticket, .. } if ticket.track_id == "b"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_load() {
        let (tx, mut rx) = engine_channel();
        let mut engine = SimulatedEngine::spawn(&settings(), &[], tx);

        engine.load(ticket("a", 1), "https://cdn/a.m4a");
        engine.stop();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn paused_asset_does_not_tick() {
        let (tx, mut rx) = engine_channel();
        let mut engine = SimulatedEngine::spawn(&settings(), &[], tx);

        engine.load(ticket("a", 1), "https://cdn/a.m4a");
        next_event(&mut rx).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_none());

        engine.seek(1.8);
        engine.play();
        assert_eq!(next_event(&mut rx).await, EngineEvent::Tick { time: 2.0 });
        assert_eq!(next_event(&mut rx).await, EngineEvent::Completed);
    }
}
