//! Real-time driver for the engine.
//!
//! One thread owns the PetEngine. Commands, queries, and both periodic
//! ticks arrive on crossbeam channels merged in a single `select!`, so
//! every mutation is serialized and tick order is fixed per message.
//! Events go out to subscribers from that same thread, after the
//! mutation that produced them.
//!
//! Timers are plain `crossbeam_channel::tick` receivers. Cancelling them
//! means dropping the receivers, which is a no-op when already dropped.

use crate::{
    command::PlayerCommand,
    engine::PetEngine,
    error::{PetError, PetResult},
    event::PetEvent,
    snapshot::{BestTime, GameSnapshot},
};
use crossbeam_channel::{bounded, never, select, tick, unbounded, Receiver, Sender};
use std::{
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

enum Envelope {
    Command(PlayerCommand),
    Subscribe(Sender<PetEvent>),
    Snapshot(Sender<Option<GameSnapshot>>),
    BestTimes(Sender<PetResult<Vec<BestTime>>>),
    Save(Sender<PetResult<()>>),
    Shutdown(Sender<PetResult<()>>),
}

/// Handle to a running engine thread.
pub struct PetRuntime {
    inbox: Sender<Envelope>,
    worker: Option<JoinHandle<()>>,
}

impl PetRuntime {
    /// Load the game and start the engine thread with both timers armed.
    pub fn spawn(mut engine: PetEngine, is_new_game: bool) -> PetResult<Self> {
        let loaded = engine.load_game(is_new_game)?;
        for event in &loaded {
            log::debug!("startup event: {}", event.type_name());
        }

        let period = Duration::from_millis(engine.config().tick_period_ms);
        let (inbox, rx) = unbounded();
        let worker = thread::Builder::new()
            .name("pet-engine".to_string())
            .spawn(move || Actor::new(engine, period).run(rx))?;

        Ok(Self {
            inbox,
            worker: Some(worker),
        })
    }

    /// Fire-and-forget. Results arrive on subscriber streams.
    pub fn send(&self, command: PlayerCommand) -> PetResult<()> {
        self.inbox
            .send(Envelope::Command(command))
            .map_err(|_| PetError::EngineStopped)
    }

    /// A new event stream. Its first event is a `StateUpdated` snapshot.
    pub fn subscribe(&self) -> PetResult<Receiver<PetEvent>> {
        let (tx, rx) = unbounded();
        self.inbox
            .send(Envelope::Subscribe(tx))
            .map_err(|_| PetError::EngineStopped)?;
        Ok(rx)
    }

    pub fn snapshot(&self) -> PetResult<GameSnapshot> {
        self.request(Envelope::Snapshot)?
            .ok_or(PetError::NoGameLoaded)
    }

    pub fn best_times(&self) -> PetResult<Vec<BestTime>> {
        self.request(Envelope::BestTimes)?
    }

    /// Blocks until the game is written to the store.
    pub fn save_game(&self) -> PetResult<()> {
        self.request(Envelope::Save)?
    }

    /// Save, stop the timers, and join the engine thread.
    pub fn shutdown(mut self) -> PetResult<()> {
        self.stop()
    }

    fn request<T>(&self, wrap: fn(Sender<T>) -> Envelope) -> PetResult<T> {
        let (tx, rx) = bounded(1);
        self.inbox.send(wrap(tx)).map_err(|_| PetError::EngineStopped)?;
        rx.recv().map_err(|_| PetError::EngineStopped)
    }

    fn stop(&mut self) -> PetResult<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let result = self.request(Envelope::Shutdown).and_then(|result| result);
        worker.join().map_err(|_| PetError::EngineStopped)?;
        result
    }
}

impl Drop for PetRuntime {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("engine shutdown failed: {e}");
        }
    }
}

struct Actor {
    engine: PetEngine,
    period: Duration,
    subscribers: Vec<Sender<PetEvent>>,
    clock_ticker: Option<Receiver<Instant>>,
    decay_ticker: Option<Receiver<Instant>>,
}

impl Actor {
    fn new(engine: PetEngine, period: Duration) -> Self {
        Self {
            engine,
            period,
            subscribers: Vec::new(),
            clock_ticker: None,
            decay_ticker: None,
        }
    }

    fn run(mut self, inbox: Receiver<Envelope>) {
        self.sync_timers();
        loop {
            let clock_rx = self.clock_ticker.clone().unwrap_or_else(never);
            let decay_rx = self.decay_ticker.clone().unwrap_or_else(never);

            select! {
                recv(inbox) -> msg => match msg {
                    Ok(envelope) => {
                        if !self.handle(envelope) {
                            break;
                        }
                    }
                    Err(_) => {
                        // Every handle is gone; flush and exit.
                        if let Err(e) = self.engine.shutdown() {
                            log::error!("final save failed: {e}");
                        }
                        break;
                    }
                },
                recv(clock_rx) -> _ => {
                    let events = self.engine.clock_tick();
                    self.publish(events);
                }
                recv(decay_rx) -> _ => {
                    let events = self.engine.decay_tick();
                    self.publish(events);
                }
            }
            self.sync_timers();
        }
        log::debug!("engine thread exiting");
    }

    /// Returns false once the actor should stop.
    fn handle(&mut self, envelope: Envelope) -> bool {
        match envelope {
            Envelope::Command(command) => {
                let restarts = matches!(command, PlayerCommand::Reset);
                let events = self.engine.apply(command);
                self.publish(events);
                if restarts {
                    self.disarm();
                }
            }
            Envelope::Subscribe(tx) => {
                if let Some(snapshot) = self.engine.snapshot() {
                    let _ = tx.send(PetEvent::StateUpdated { snapshot });
                }
                self.subscribers.push(tx);
            }
            Envelope::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
            }
            Envelope::BestTimes(reply) => {
                let _ = reply.send(self.engine.best_times());
            }
            Envelope::Save(reply) => {
                let result = self.engine.save_game();
                match &result {
                    Ok(()) => self.publish(vec![PetEvent::GameSaved]),
                    Err(e) => self.publish(vec![PetEvent::persistence_failed("save_game", e)]),
                }
                let _ = reply.send(result);
            }
            Envelope::Shutdown(reply) => {
                let result = self.engine.shutdown();
                self.disarm();
                let _ = reply.send(result);
                return false;
            }
        }
        true
    }

    /// Arm or cancel the tickers to match the engine.
    fn sync_timers(&mut self) {
        let armed = self.clock_ticker.is_some();
        if self.engine.timers_active() == armed {
            return;
        }
        if armed {
            self.disarm();
            return;
        }

        self.clock_ticker = Some(tick(self.period));
        self.decay_ticker = Some(tick(self.period));
        log::debug!("timers armed at {:?}", self.period);

        // The clock tick fires once right away, the decay tick only after
        // a full period.
        let events = self.engine.clock_tick();
        self.publish(events);
        if !self.engine.timers_active() {
            self.disarm();
        }
    }

    fn disarm(&mut self) {
        if self.clock_ticker.take().is_some() | self.decay_ticker.take().is_some() {
            log::debug!("timers cancelled");
        }
    }

    fn publish(&mut self, events: Vec<PetEvent>) {
        if events.is_empty() {
            return;
        }
        for event in &events {
            log::trace!("publish {}", event.type_name());
        }
        self.subscribers
            .retain(|tx| events.iter().all(|e| tx.send(e.clone()).is_ok()));
    }
}
