//! Drives one exchange through the thread/run protocol of an assistants service
//!
//! An exchange creates a thread, appends the user message, starts a run and
//! polls it until it reaches a terminal status, then reads the assistant's reply
//! from the thread. Every step is a suspension point that observes the caller's
//! cancellation token, and the poll phase is bounded both by a deadline and by
//! a maximum number of polls.
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{ExchangeError, ExchangeResult};
use crate::models::message::ThreadMessage;
use crate::models::role::Role;
use crate::models::run::RunPhase;
use crate::providers::base::AssistantsApi;
use crate::providers::errors::ApiResult;

/// Returned in place of a reply when a completed run left no assistant text
pub const NO_REPLY: &str = "No reply found.";

/// Timing and retry bounds for waiting on a run
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the first poll
    pub interval: Duration,
    /// Upper bound for any delay between polls, including retry delays
    pub max_interval: Duration,
    /// Growth of the delay after each non-terminal poll, 1.0 keeps it fixed
    pub backoff_factor: f64,
    /// Deadline for the whole poll phase
    pub timeout: Duration,
    /// Poll budget, at least one poll is always made
    pub max_polls: u32,
    /// Consecutive transient failures tolerated on idempotent reads
    pub max_transient_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_interval: Duration::from_secs(5),
            backoff_factor: 1.0,
            timeout: Duration::from_secs(60),
            max_polls: 60,
            max_transient_retries: 3,
        }
    }
}

impl PollPolicy {
    fn cap(&self) -> Duration {
        self.max_interval.max(self.interval)
    }

    /// Delay before the poll that follows a non-terminal one
    pub fn next_interval(&self, current: Duration) -> Duration {
        let cap = self.cap();
        let grown = current.as_secs_f64() * self.backoff_factor.max(1.0);
        Duration::try_from_secs_f64(grown)
            .unwrap_or(cap)
            .min(cap)
    }

    /// Delay before retrying after the given number of consecutive failures
    pub fn retry_delay(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.interval.saturating_mul(factor).min(self.cap())
    }
}

pub struct RunCompletionCoordinator {
    api: Arc<dyn AssistantsApi>,
    assistant_id: String,
    policy: PollPolicy,
}

impl RunCompletionCoordinator {
    pub fn new<S: Into<String>>(
        api: Arc<dyn AssistantsApi>,
        assistant_id: S,
        policy: PollPolicy,
    ) -> Self {
        Self {
            api,
            assistant_id: assistant_id.into(),
            policy,
        }
    }

    /// Send one user message to the assistant and wait for its reply
    ///
    /// Each call creates its own thread and run. Once `cancel` fires no further
    /// remote calls are made and `ExchangeError::Cancelled` is returned.
    pub async fn complete_exchange(
        &self,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> ExchangeResult<String> {
        if user_message.trim().is_empty() {
            return Err(ExchangeError::InvalidInput);
        }

        let thread_id = until_cancelled(cancel, self.api.create_thread())
            .await?
            .map_err(ExchangeError::remote("create thread"))?;
        debug!(thread_id = %thread_id, "created thread");

        until_cancelled(
            cancel,
            self.api.append_message(&thread_id, Role::User, user_message),
        )
        .await?
        .map_err(ExchangeError::remote("append message"))?;

        let run_id = until_cancelled(cancel, self.api.start_run(&thread_id, &self.assistant_id))
            .await?
            .map_err(ExchangeError::remote("start run"))?;
        debug!(thread_id = %thread_id, run_id = %run_id, "started run");

        let started = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExchangeError::Cancelled),
            _ = sleep(self.policy.timeout) => {
                warn!(run_id = %run_id, "run did not finish within {:?}", self.policy.timeout);
                return Err(ExchangeError::Timeout(started.elapsed()));
            }
            finished = self.wait_for_run(&thread_id, &run_id, started) => finished?,
        }

        let messages = until_cancelled(
            cancel,
            self.retrying("list messages", || self.api.list_messages(&thread_id)),
        )
        .await??;

        match reply_from_messages(&messages) {
            Some(reply) => {
                info!(thread_id = %thread_id, run_id = %run_id, "exchange completed");
                Ok(reply.to_string())
            }
            None => {
                warn!(
                    thread_id = %thread_id,
                    run_id = %run_id,
                    "run completed without an assistant reply"
                );
                Ok(NO_REPLY.to_string())
            }
        }
    }

    /// Poll until the run is terminal, `Ok` only when it completed
    async fn wait_for_run(
        &self,
        thread_id: &str,
        run_id: &str,
        started: Instant,
    ) -> ExchangeResult<()> {
        let mut interval = self.policy.interval.min(self.policy.cap());
        let mut delay = interval;
        let mut failures = 0;

        let max_polls = self.policy.max_polls.max(1);
        for poll in 1..=max_polls {
            sleep(delay).await;

            match self.api.get_run(thread_id, run_id).await {
                Ok(run) => {
                    failures = 0;
                    match run.status.phase() {
                        RunPhase::Succeeded => {
                            debug!(run_id, poll, "run completed");
                            return Ok(());
                        }
                        RunPhase::Failed => {
                            let reason = run
                                .failure_reason
                                .unwrap_or_else(|| run.status.to_string());
                            warn!(run_id, status = %run.status, reason = %reason, "run failed");
                            return Err(ExchangeError::RunFailed(reason));
                        }
                        RunPhase::Pending => {
                            debug!(run_id, poll, status = %run.status, "run still pending");
                            interval = self.policy.next_interval(interval);
                            delay = interval;
                        }
                    }
                }
                Err(err) if err.is_transient() && failures < self.policy.max_transient_retries => {
                    failures += 1;
                    delay = self.policy.retry_delay(failures);
                    warn!(run_id, attempt = failures, error = %err, "polling run failed, retrying");
                }
                Err(err) => return Err(ExchangeError::remote("poll run")(err)),
            }
        }

        warn!(run_id, max_polls, "poll budget exhausted");
        Err(ExchangeError::Timeout(started.elapsed()))
    }

    /// Repeat an idempotent read while it fails transiently
    async fn retrying<T, F, Fut>(&self, operation: &'static str, mut call: F) -> ExchangeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut failures = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && failures < self.policy.max_transient_retries => {
                    failures += 1;
                    warn!(operation, attempt = failures, error = %err, "transient error, retrying");
                    sleep(self.policy.retry_delay(failures)).await;
                }
                Err(err) => return Err(ExchangeError::remote(operation)(err)),
            }
        }
    }
}

/// Run a future unless the token fires first
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> ExchangeResult<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExchangeError::Cancelled),
        output = future => Ok(output),
    }
}

/// The text of the first assistant message, if it has any
pub fn reply_from_messages(messages: &[ThreadMessage]) -> Option<&str> {
    messages
        .iter()
        .find(|message| message.role == Role::Assistant)
        .and_then(ThreadMessage::first_text)
        .filter(|text| !text.is_empty())
}
