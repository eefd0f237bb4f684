//! Running the harness on its own thread.
//!
//! A [`Worker`] owns a dedicated OS thread with a private tokio runtime and
//! feeds it commands through a queue. Commands are handled one at a time in
//! the order they were sent, and results flow back as [`RunEvent`] messages,
//! so nothing the interpreter does can block the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use playground_package::StatusReporter;
use tokio::sync::{mpsc, oneshot};

use crate::{ExecutionRequest, Harness, HarnessConfig, HarnessError, RunOutcome};

/// Messages produced by a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Decoded output, in the order the program wrote it.
    Output(String),
    /// The run completed. Always the last event.
    Finished(RunOutcome),
    /// The run never started or the sandbox broke. Always the last event.
    Failed { message: String },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEvent::Output(_))
    }
}

/// The receiving end of a run's events.
#[derive(Debug)]
pub struct RunEvents {
    receiver: mpsc::UnboundedReceiver<RunEvent>,
}

impl RunEvents {
    /// The next event, or `None` once the terminal event has been received.
    pub async fn next(&mut self) -> Option<RunEvent> {
        self.receiver.recv().await
    }

    /// Like [`RunEvents::next`], for callers outside an async context.
    pub fn blocking_next(&mut self) -> Option<RunEvent> {
        self.receiver.blocking_recv()
    }

    /// Wait for the run to end, handing output to `on_output` as it arrives.
    ///
    /// The error is the message of a [`RunEvent::Failed`].
    pub async fn wait(mut self, mut on_output: impl FnMut(&str)) -> Result<RunOutcome, String> {
        while let Some(event) = self.next().await {
            match event {
                RunEvent::Output(text) => on_output(&text),
                RunEvent::Finished(outcome) => return Ok(outcome),
                RunEvent::Failed { message } => return Err(message),
            }
        }

        Err(HarnessError::WorkerGone.status_line())
    }
}

enum Command {
    Prepare {
        archive: Bytes,
        reporter: StatusReporter,
        done: oneshot::Sender<Result<(), HarnessError>>,
    },
    Run {
        request: ExecutionRequest,
        events: mpsc::UnboundedSender<RunEvent>,
    },
}

/// A handle to the worker thread.
///
/// Dropping the handle has the same effect as [`Worker::terminate`].
#[derive(Debug)]
pub struct Worker {
    commands: mpsc::UnboundedSender<Command>,
    terminated: Arc<AtomicBool>,
}

impl Worker {
    pub fn spawn(config: HarnessConfig) -> Result<Self, HarnessError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("playground-sandbox")
            .build()
            .map_err(HarnessError::Worker)?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let terminated = Arc::new(AtomicBool::new(false));

        std::thread::Builder::new()
            .name("playground-worker".to_string())
            .spawn({
                let terminated = Arc::clone(&terminated);
                move || runtime.block_on(process(config, receiver, terminated))
            })
            .map_err(HarnessError::Worker)?;

        Ok(Worker {
            commands,
            terminated,
        })
    }

    /// Install `archive` and compile the interpreter inside the worker.
    ///
    /// Preparing again replaces the previous harness.
    pub async fn prepare(
        &self,
        archive: Bytes,
        reporter: StatusReporter,
    ) -> Result<(), HarnessError> {
        let (done, result) = oneshot::channel();

        self.commands
            .send(Command::Prepare {
                archive,
                reporter,
                done,
            })
            .map_err(|_| HarnessError::WorkerGone)?;

        result.await.map_err(|_| HarnessError::WorkerGone)?
    }

    /// Queue a run. The returned events always end with exactly one
    /// terminal event.
    pub fn run(&self, request: ExecutionRequest) -> RunEvents {
        let (events, receiver) = mpsc::unbounded_channel();

        if let Err(mpsc::error::SendError(Command::Run { events, .. })) =
            self.commands.send(Command::Run { request, events })
        {
            let _ = events.send(gone());
        }

        RunEvents { receiver }
    }

    /// Stop accepting commands.
    ///
    /// A run that is already executing finishes normally. Runs still waiting
    /// in the queue are dropped without being started and report
    /// [`HarnessError::WorkerGone`].
    pub fn terminate(self) {
        drop(self);
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

fn gone() -> RunEvent {
    RunEvent::Failed {
        message: HarnessError::WorkerGone.status_line(),
    }
}

async fn process(
    config: HarnessConfig,
    mut commands: mpsc::UnboundedReceiver<Command>,
    terminated: Arc<AtomicBool>,
) {
    let mut harness: Option<Harness> = None;

    while let Some(command) = commands.recv().await {
        let cancelled = terminated.load(Ordering::SeqCst);

        match command {
            Command::Prepare { done, .. } if cancelled => {
                let _ = done.send(Err(HarnessError::WorkerGone));
            }
            Command::Run { events, .. } if cancelled => {
                let _ = events.send(gone());
            }
            Command::Prepare {
                archive,
                reporter,
                done,
            } => {
                let result = Harness::prepare(config.clone(), archive, reporter).await;
                let reply = match result {
                    Ok(prepared) => {
                        harness = Some(prepared);
                        Ok(())
                    }
                    Err(e) => {
                        tracing::error!(error = %e.status_line(), "Preparation failed");
                        Err(e)
                    }
                };
                let _ = done.send(reply);
            }
            Command::Run { request, events } => {
                let terminal = match &harness {
                    Some(harness) => {
                        let result = harness
                            .run(request, |text| {
                                let _ = events.send(RunEvent::Output(text.to_string()));
                            })
                            .await;

                        match result {
                            Ok(outcome) => RunEvent::Finished(outcome),
                            Err(e) => RunEvent::Failed {
                                message: e.status_line(),
                            },
                        }
                    }
                    None => RunEvent::Failed {
                        message: HarnessError::NotReady.status_line(),
                    },
                };
                let _ = events.send(terminal);
            }
        }
    }

    tracing::debug!("Worker shutting down");
}
