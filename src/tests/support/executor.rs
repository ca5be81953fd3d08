// Scripted probe executor fake.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::probe::{CommandExecutor, ExecError};

/// Returns queued results in order, then repeats the fallback output forever.
pub struct ScriptedExecutor {
    queue: Mutex<VecDeque<Result<Bytes, ExecError>>>,
    fallback: Bytes,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(fallback: &str) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Bytes::copy_from_slice(fallback.as_bytes()),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        })
    }

    pub fn push_output(&self, output: &str) {
        self.queue
            .lock()
            .push_back(Ok(Bytes::copy_from_slice(output.as_bytes())));
    }

    pub fn push_error(&self, err: ExecError) {
        self.queue.lock().push_back(Err(err));
    }

    /// Makes every run take at least `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &str) -> Result<Bytes, ExecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.commands.lock().push(command.to_string());
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let next = self.queue.lock().pop_front();
        match next {
            Some(result) => result,
            None => Ok(self.fallback.clone()),
        }
    }
}
