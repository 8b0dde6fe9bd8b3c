use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    thread,
};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

struct CallRequest<State> {
    function: Box<dyn FnOnce(&mut State) + Send>,
}

/// Errors returned when a call could not be completed by a [`SerialRunner`].
#[derive(Debug, Error)]
pub enum CallError {
    /// The call was dropped before it produced a value, usually because it panicked.
    #[error("The call failed before it could return a value (thread probably panicked): {0}")]
    CallFailed(String),

    /// The worker thread has exited and no longer accepts calls.
    #[error("The runner thread is no longer accepting calls")]
    RunnerStopped,

    /// The worker thread could not be started.
    #[error("Failed to spawn the runner thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A runner that owns a piece of state on a dedicated thread and serializes every access to it.
///
/// `SerialRunner` moves `State` onto a worker thread and exposes a `Send + Sync` handle that
/// other threads and tasks use to queue closures against it. Requests are executed strictly one
/// at a time, in the order they were queued, and each one completes before the next begins.
///
/// Cloning a runner clones the handle, not the state: all clones feed the same queue. The worker
/// thread exits once every handle has been dropped and the queue has drained.
///
/// A caller that stops waiting for its result does not cancel the request; it still runs.
///
/// # Example
/// ```
/// use defaults_threading::SerialRunner;
///
/// # async fn example() -> Result<(), defaults_threading::CallError> {
/// let runner = SerialRunner::new("names", Vec::<String>::new())?;
///
/// runner.submit(|names| names.push("first".to_owned()))?;
/// let count = runner.run(|names| names.len()).await?;
/// assert_eq!(count, 1);
/// # Ok(())
/// # }
/// ```
pub struct SerialRunner<State> {
    call_channel_tx: mpsc::UnboundedSender<CallRequest<State>>,
}

impl<State> Clone for SerialRunner<State> {
    fn clone(&self) -> Self {
        Self {
            call_channel_tx: self.call_channel_tx.clone(),
        }
    }
}

impl<State> std::fmt::Debug for SerialRunner<State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialRunner")
            .field("closed", &self.call_channel_tx.is_closed())
            .finish()
    }
}

impl<State> SerialRunner<State>
where
    State: Send + 'static,
{
    /// Spawn the worker thread and move `state` onto it.
    ///
    /// `name` is used as the worker thread name and must not contain NUL bytes.
    pub fn new(name: impl Into<String>, state: State) -> Result<Self, CallError> {
        let (call_channel_tx, mut call_channel_rx) = mpsc::unbounded_channel::<CallRequest<State>>();
        let name = name.into();

        thread::Builder::new().name(name.clone()).spawn(move || {
            let mut state = state;
            while let Some(request) = call_channel_rx.blocking_recv() {
                let outcome = catch_unwind(AssertUnwindSafe(|| (request.function)(&mut state)));
                if outcome.is_err() {
                    log::warn!("A call on runner '{name}' panicked, continuing with the next one");
                }
            }
            log::debug!("Runner '{name}' stopped");
        })?;

        Ok(SerialRunner { call_channel_tx })
    }

    /// Queue `function` and wait for its result.
    pub async fn run<F, Output>(&self, function: F) -> Result<Output, CallError>
    where
        F: FnOnce(&mut State) -> Output + Send + 'static,
        Output: Send + 'static,
    {
        let return_channel_rx = self.enqueue(function)?;
        return_channel_rx
            .await
            .map_err(|e| CallError::CallFailed(e.to_string()))
    }

    /// Queue `function` and block the current thread until it has run.
    ///
    /// This must not be called from within an async runtime; use [`SerialRunner::run`] there.
    pub fn run_blocking<F, Output>(&self, function: F) -> Result<Output, CallError>
    where
        F: FnOnce(&mut State) -> Output + Send + 'static,
        Output: Send + 'static,
    {
        let return_channel_rx = self.enqueue(function)?;
        return_channel_rx
            .blocking_recv()
            .map_err(|e| CallError::CallFailed(e.to_string()))
    }

    /// Queue `function` without waiting for it to run.
    pub fn submit<F>(&self, function: F) -> Result<(), CallError>
    where
        F: FnOnce(&mut State) + Send + 'static,
    {
        self.call_channel_tx
            .send(CallRequest {
                function: Box::new(function),
            })
            .map_err(|_| CallError::RunnerStopped)
    }

    fn enqueue<F, Output>(&self, function: F) -> Result<oneshot::Receiver<Output>, CallError>
    where
        F: FnOnce(&mut State) -> Output + Send + 'static,
        Output: Send + 'static,
    {
        let (return_channel_tx, return_channel_rx) = oneshot::channel();
        self.submit(move |state| {
            if return_channel_tx.send(function(state)).is_err() {
                log::warn!("SerialRunner failed to send result back to the caller");
            }
        })?;
        Ok(return_channel_rx)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    struct State {
        values: Vec<i32>,
        /// This is a marker to ensure that the struct is not Sync
        _un_sync_marker: std::marker::PhantomData<std::cell::Cell<()>>,
    }

    impl State {
        pub fn add(&self, input: (i32, i32)) -> i32 {
            input.0 + input.1
        }
    }

    #[tokio::test]
    async fn calls_function_and_returns_value() {
        let runner = SerialRunner::new("test", State::default()).expect("runner should start");

        let result = runner
            .run(|state| state.add((1, 2)))
            .await
            .expect("Calling function failed");

        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn can_continue_running_if_a_call_panics() {
        let runner = SerialRunner::new("test", State::default()).expect("runner should start");

        runner
            .run::<_, ()>(|_state| panic!("This is a test panic"))
            .await
            .expect_err("Calling function should have panicked");

        let result = runner
            .run(|state| state.add((1, 2)))
            .await
            .expect("Calling function failed");

        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn executes_requests_in_queue_order() {
        let runner = SerialRunner::new("test", State::default()).expect("runner should start");

        for i in 0..100 {
            runner
                .submit(move |state| state.values.push(i))
                .expect("submit should succeed");
        }
        let values = runner
            .run(|state| state.values.clone())
            .await
            .expect("Calling function failed");

        assert_eq!(values, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn clones_share_one_queue() {
        let runner = SerialRunner::new("test", State::default()).expect("runner should start");

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let runner = runner.clone();
                tokio::spawn(async move {
                    runner
                        .run(move |state| {
                            std::thread::sleep(Duration::from_millis(1));
                            state.values.push(i);
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await
                .expect("task should not panic")
                .expect("Calling function failed");
        }

        let mut values = runner
            .run(|state| state.values.clone())
            .await
            .expect("Calling function failed");
        values.sort_unstable();
        assert_eq!(values, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn run_blocking_returns_value_outside_a_runtime() {
        let runner = SerialRunner::new("test", State::default()).expect("runner should start");

        runner
            .submit(|state| state.values.push(7))
            .expect("submit should succeed");
        let values = runner
            .run_blocking(|state| state.values.clone())
            .expect("Calling function failed");

        assert_eq!(values, vec![7]);
    }
}
