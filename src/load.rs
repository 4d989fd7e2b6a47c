//! The load cycle: provision, open one transaction, run the query, hold the
//! result for the reveal delay, then publish. State changes travel to the view
//! as [`LoadEvent`]s and every publish checks the cycle's cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::db::fetch_rows;
use crate::error::{surface_error, LoadError, ProvisionError};
use crate::models::RowRecord;
use crate::provision::{FsTransfer, Provisioner, Transfer};

/// What the view should be showing. Rows and errors never coexist.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Error(String),
    Loaded(Vec<RowRecord>),
}

impl LoadState {
    /// Whether moving from `self` to `next` is a legal step of one cycle.
    pub fn can_transition_to(&self, next: &LoadState) -> bool {
        matches!(
            (self, next),
            (LoadState::Idle, LoadState::Loading)
                | (LoadState::Loading, LoadState::Error(_))
                | (LoadState::Loading, LoadState::Loaded(_))
        )
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, LoadState::Error(_) | LoadState::Loaded(_))
    }
}

/// A state change tagged with the cycle that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent {
    pub cycle: u64,
    pub state: LoadState,
}

/// Shared flag tying a load cycle to the lifetime of the view that mounted it.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends state changes for one cycle unless that cycle has been cancelled.
#[derive(Debug, Clone)]
pub struct Publisher {
    cycle: u64,
    token: CancellationToken,
    events: UnboundedSender<LoadEvent>,
}

impl Publisher {
    pub fn new(cycle: u64, token: CancellationToken, events: UnboundedSender<LoadEvent>) -> Self {
        Self {
            cycle,
            token,
            events,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns `false` when the state was dropped because the cycle was
    /// cancelled or the view went away.
    pub fn publish(&self, state: LoadState) -> bool {
        if self.token.is_cancelled() {
            debug!(cycle = self.cycle, "cycle cancelled; dropping state update");
            return false;
        }
        self.events
            .send(LoadEvent {
                cycle: self.cycle,
                state,
            })
            .is_ok()
    }
}

/// Provisioner plus the query and timings of one load cycle.
pub struct Loader<T = FsTransfer> {
    provisioner: Provisioner<T>,
    query: String,
    reveal_delay: Duration,
    io_timeout: Duration,
}

impl Loader<FsTransfer> {
    pub fn from_config(config: &AppConfig) -> Result<Self, ProvisionError> {
        Ok(Self::new(
            Provisioner::from_config(config)?,
            config.query.clone(),
            config.reveal_delay(),
            config.io_timeout(),
        ))
    }
}

impl<T: Transfer + 'static> Loader<T> {
    pub fn new(
        provisioner: Provisioner<T>,
        query: String,
        reveal_delay: Duration,
        io_timeout: Duration,
    ) -> Self {
        Self {
            provisioner,
            query,
            reveal_delay,
            io_timeout,
        }
    }

    pub fn provisioner(&self) -> &Provisioner<T> {
        &self.provisioner
    }

    /// Provision the database and run the query once. No delay, no events.
    pub async fn fetch(&self) -> Result<Vec<RowRecord>, LoadError> {
        let provisioned = self.provisioner.provision().await?;
        let mut conn = provisioned.connection;
        let sql = self.query.clone();

        let task = tokio::task::spawn_blocking(move || fetch_rows(&mut conn, &sql));
        match timeout(self.io_timeout, task).await {
            Err(_) => Err(LoadError::Timeout { stage: "query" }),
            Ok(Err(join)) => Err(LoadError::Worker(join)),
            Ok(Ok(result)) => result,
        }
    }

    /// Drive one full cycle, publishing `Loading` and then exactly one of
    /// `Loaded` or `Error`.
    pub async fn run(&self, publisher: &Publisher) {
        if !publisher.publish(LoadState::Loading) {
            return;
        }

        match self.fetch().await {
            Ok(rows) => {
                info!(rows = rows.len(), delay = ?self.reveal_delay, "query finished");
                sleep(self.reveal_delay).await;
                publisher.publish(LoadState::Loaded(rows));
            }
            Err(err) => {
                error!(stage = err.stage_label(), error = %err, "load cycle failed");
                publisher.publish(LoadState::Error(surface_error(&err)));
            }
        }
    }
}

/// Start a cycle on `runtime` and hand back the token that cancels it.
pub fn mount<T: Transfer + 'static>(
    runtime: &Handle,
    loader: Arc<Loader<T>>,
    cycle: u64,
    events: UnboundedSender<LoadEvent>,
) -> CancellationToken {
    let token = CancellationToken::new();
    let publisher = Publisher::new(cycle, token.clone(), events);
    runtime.spawn(async move {
        loader.run(&publisher).await;
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<RowRecord> {
        vec![RowRecord::default()]
    }

    #[test]
    fn transitions_are_one_way() {
        assert!(LoadState::Idle.can_transition_to(&LoadState::Loading));
        assert!(LoadState::Loading.can_transition_to(&LoadState::Loaded(rows())));
        assert!(LoadState::Loading.can_transition_to(&LoadState::Error("x".into())));
        assert!(!LoadState::Loaded(rows()).can_transition_to(&LoadState::Loading));
        assert!(!LoadState::Error("x".into()).can_transition_to(&LoadState::Loaded(rows())));
        assert!(!LoadState::Idle.can_transition_to(&LoadState::Loaded(rows())));
    }

    #[test]
    fn cancelled_publisher_sends_nothing() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let publisher = Publisher::new(4, CancellationToken::new(), tx);

        assert!(publisher.publish(LoadState::Loading));
        publisher.token().cancel();
        assert!(!publisher.publish(LoadState::Error("late".into())));

        assert_eq!(
            rx.try_recv().unwrap(),
            LoadEvent {
                cycle: 4,
                state: LoadState::Loading
            }
        );
        assert!(rx.try_recv().is_err());
    }
}
