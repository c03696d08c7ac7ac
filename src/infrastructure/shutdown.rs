use std::time::Duration;

use tokio::{
    sync::watch,
    task::{JoinHandle, JoinSet},
    time::timeout,
};

pub const DRAIN_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (Self, ShutdownListener) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, ShutdownListener { receiver })
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn trigger(&self) {
        let first = self.sender.send_if_modified(|stopped| !std::mem::replace(stopped, true));
        if first {
            tracing::info!(target: "agent", "shutdown requested");
        }
    }
}

impl ShutdownListener {
    pub async fn notified(&mut self) {
        // A closed channel means nobody can stop us anymore; treat it as stopped.
        let _ = self.receiver.wait_for(|stopped| *stopped).await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Waits for every task in `tasks`. Once shutdown fires the stragglers get
    /// `grace` to finish and are aborted after that. Returns how many were
    /// aborted.
    pub async fn drain<T: 'static>(&mut self, tasks: &mut JoinSet<T>, grace: Duration) -> usize {
        if !self.is_triggered() {
            tokio::select! {
                _ = join_all(tasks) => return 0,
                _ = self.notified() => {}
            }
        }
        if timeout(grace, join_all(tasks)).await.is_ok() {
            return 0;
        }

        let stranded = tasks.len();
        tracing::warn!(target: "agent", stranded, ?grace, "aborting tasks still running at shutdown");
        tasks.abort_all();
        join_all(tasks).await;
        stranded
    }
}

async fn join_all<T: 'static>(tasks: &mut JoinSet<T>) {
    while tasks.join_next().await.is_some() {}
}

/// Joins a background task that was told to stop, aborting it if it takes
/// longer than `grace`.
pub async fn join_or_abort(mut handle: JoinHandle<()>, grace: Duration, task: &'static str) {
    match timeout(grace, &mut handle).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) if err.is_panic() => {
            tracing::error!(target: "agent", task, "background task panicked");
        }
        Ok(Err(_)) => {}
        Err(_) => {
            tracing::warn!(target: "agent", task, ?grace, "background task did not stop in time; aborting");
            handle.abort();
        }
    }
}

pub fn install_signal_handlers(shutdown: Shutdown) {
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        tracing::info!(target: "agent", signal, "stop signal received");
        shutdown.trigger();
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(err) => {
            tracing::warn!(target: "agent", error = %err, "SIGTERM handler unavailable");
            let _ = tokio::signal::ctrl_c().await;
            return "ctrl-c";
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "ctrl-c",
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}
