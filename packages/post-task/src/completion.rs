use crate::error::Error;
use futures::channel::oneshot;
use futures::future::FusedFuture;
use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::task::{Context, Poll};

type Outcome = Result<(), Error>;

/// Creates a linked completer/handle pair.
///
/// The completer travels with the task into whatever mechanism was chosen;
/// the handle goes back to the caller.
pub fn completion() -> (Completer, CompletionHandle) {
    let (tx, rx) = oneshot::channel();
    (
        Completer { tx },
        CompletionHandle {
            state: State::Waiting(rx),
        },
    )
}

/// Write side of a [`CompletionHandle`]. Consumed on use, so a handle can
/// only ever be resolved once.
#[derive(Debug)]
pub struct Completer {
    tx: oneshot::Sender<Outcome>,
}

impl Completer {
    /// Runs `task` and resolves the handle once it has returned.
    ///
    /// A panic inside the task is caught here and reported through the
    /// handle as [`Error::TaskPanicked`]; it never unwinds into the host loop.
    pub fn run(self, task: impl FnOnce()) {
        let outcome = catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(%message, "deferred task panicked");
            Error::TaskPanicked { message }
        });
        self.finish(outcome);
    }

    /// Resolves the handle without running anything (yield continuations).
    pub fn complete(self) {
        self.finish(Ok(()));
    }

    pub fn fail(self, error: Error) {
        self.finish(Err(error));
    }

    fn finish(self, outcome: Outcome) {
        // The caller may have dropped the handle; that is not our concern.
        let _ = self.tx.send(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Resolves exactly once, after the associated task has run.
///
/// The output carries no task result, only whether the task returned
/// normally. Dropping the handle does not cancel the task.
#[must_use = "dropping the handle does not cancel the task, but the completion signal is lost"]
#[derive(Debug)]
pub struct CompletionHandle {
    state: State,
}

#[derive(Debug)]
enum State {
    Ready(Outcome),
    Waiting(oneshot::Receiver<Outcome>),
    Done,
}

impl CompletionHandle {
    /// A handle that is already resolved, used when the task ran inline.
    pub fn resolved() -> Self {
        Self {
            state: State::Ready(Ok(())),
        }
    }

    /// Returns the outcome if the handle has resolved, without blocking.
    /// Yields `Some` at most once.
    pub fn try_resolved(&mut self) -> Option<Outcome> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => None,
            State::Ready(outcome) => Some(outcome),
            State::Waiting(mut rx) => match rx.try_recv() {
                Ok(Some(outcome)) => Some(outcome),
                Ok(None) => {
                    self.state = State::Waiting(rx);
                    None
                }
                Err(oneshot::Canceled) => Some(abandoned()),
            },
        }
    }
}

fn abandoned() -> Outcome {
    tracing::warn!("completion dropped before the task ran");
    Err(Error::Abandoned)
}

impl Future for CompletionHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => Poll::Pending,
            State::Ready(outcome) => Poll::Ready(outcome),
            State::Waiting(mut rx) => match Pin::new(&mut rx).poll(cx) {
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(abandoned()),
                Poll::Pending => {
                    self.state = State::Waiting(rx);
                    Poll::Pending
                }
            },
        }
    }
}

impl FusedFuture for CompletionHandle {
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}
