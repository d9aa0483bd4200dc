//! Repeated polling of a [`DriverSource`].
//!
//! [`state::PollState`] decides what happens; this module runs its decisions
//! on async-std tasks and hands every accepted result to the consumer.

use std::cell::Cell;
use std::sync::{ Arc, Mutex };
use std::time::Duration;

use async_std::task;

use crate::error::PollError;
use crate::iracing::PollResult;
use crate::iracing::driver_api::{ DriverSource, HttpDriverSource };
use crate::timer::{ TimerCommand, lock, spawn_timer };

pub mod state;

use state::{ PollAction, PollState };

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

type Handler = Box<dyn FnMut(PollResult) + Send>;

thread_local! {
    // Controller whose handler is running on this thread, 0 if none.
    static DELIVERING: Cell<usize> = Cell::new(0);
}

struct Shared {
    state: Mutex<PollState>,
    handler: Mutex<Handler>,
    source: Arc<dyn DriverSource>,
}

impl Shared {
    fn id(self: &Arc<Self>) -> usize {
        Arc::as_ptr(self) as usize
    }
}

pub struct PollingController {
    source: Arc<dyn DriverSource>,
    interval: Duration,
}

impl PollingController {
    pub fn new<S: DriverSource>(source: S) -> PollingController {
        PollingController {
            source: Arc::new(source),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> PollingController {
        self.interval = interval;
        self
    }

    /// Starts polling: one fetch right away, then one per interval. Each
    /// completed fetch hands its result to `handler`.
    pub fn start<F>(self, handler: F) -> Result<ControlHandle, PollError>
    where
        F: FnMut(PollResult) + Send + 'static,
    {
        let state = PollState::new(self.interval)?;
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            handler: Mutex::new(Box::new(handler)),
            source: self.source,
        });

        info!("Polling {} every {:?}", shared.source.describe(), self.interval);
        let actions = lock(&shared.state).start();
        execute(&shared, actions);

        Ok(ControlHandle { shared })
    }
}

/// Control over a running poller. Clones control the same poller.
#[derive(Clone)]
pub struct ControlHandle {
    shared: Arc<Shared>,
}

impl ControlHandle {
    /// Stops polling. Once this returns no result reaches the handler again,
    /// not even one from a fetch that is still in flight.
    pub fn stop(&self) {
        let actions = lock(&self.shared.state).stop();
        if actions.is_empty() {
            return;
        }

        info!("Stopped polling {}", self.shared.source.describe());
        execute(&self.shared, actions);

        // Wait for a handler call already underway on another thread. From
        // inside our own handler that would deadlock, and is not needed.
        if DELIVERING.with(|current| current.get()) != self.shared.id() {
            drop(lock(&self.shared.handler));
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.state).is_running()
    }

    pub fn interval(&self) -> Duration {
        lock(&self.shared.state).interval()
    }

    /// Switches to a new cadence, with the next fetch `interval` from now.
    ///
    /// Only a running poller can be retuned. On a stopped poller (or with a
    /// zero interval) the request is dropped and `false` is returned.
    pub fn set_interval(&self, interval: Duration) -> bool {
        let actions = lock(&self.shared.state).set_interval(interval);
        match actions {
            Some(actions) => {
                info!("Polling {} every {:?}", self.shared.source.describe(), interval);
                execute(&self.shared, actions);
                true
            },
            None => {
                warn!("Ignoring poll interval change to {:?}: poller is stopped or interval is zero", interval);
                false
            },
        }
    }
}

/// Polls `http://{host}:{port}/api/driver`.
pub fn start_driver_polling<F>(host: &str, port: u16, interval: Duration, handler: F) -> Result<ControlHandle, PollError>
where
    F: FnMut(PollResult) + Send + 'static,
{
    PollingController::new(HttpDriverSource::new(host, port))
        .with_interval(interval)
        .start(handler)
}

/// One fetch, no timer.
pub async fn get_driver_data(host: &str, port: u16) -> PollResult {
    let source = HttpDriverSource::new(host, port);
    let result = source.fetch().await;
    if let Err(err) = &result {
        debug!("Single fetch from {} failed: {}", source.url(), err);
    }
    result
}

fn execute(shared: &Arc<Shared>, actions: Vec<PollAction>) {
    for action in actions {
        match action {
            PollAction::Timer(TimerCommand::Set { token, after }) => {
                let shared = Arc::clone(shared);
                spawn_timer(after, move || {
                    let actions = lock(&shared.state).on_timer(token);
                    execute(&shared, actions);
                });
            },
            PollAction::Timer(TimerCommand::Cancel { token }) => {
                trace!("Cancelled poll timer {}", token.id());
            },
            PollAction::Fetch { session } => {
                trace!("Fetching {} (session {})", shared.source.describe(), session);
                let shared = Arc::clone(shared);
                task::spawn(async move {
                    let result = shared.source.fetch().await;
                    let actions = lock(&shared.state).on_fetch_complete(session, result);
                    execute(&shared, actions);
                });
            },
            PollAction::Deliver { session, result } => deliver(shared, session, result),
        }
    }
}

fn deliver(shared: &Arc<Shared>, session: u64, result: PollResult) {
    let mut handler = lock(&shared.handler);

    // stop() may have slipped in since the completion was accepted
    if !lock(&shared.state).accepts(session) {
        debug!("Dropping result for stopped session {}", session);
        return;
    }

    let _marker = DeliveringMarker::enter(shared.id());
    (&mut *handler)(result);
}

struct DeliveringMarker {
    previous: usize,
}

impl DeliveringMarker {
    fn enter(id: usize) -> DeliveringMarker {
        DeliveringMarker { previous: DELIVERING.with(|current| current.replace(id)) }
    }
}

impl Drop for DeliveringMarker {
    fn drop(&mut self) {
        let previous = self.previous;
        DELIVERING.with(|current| current.set(previous));
    }
}
