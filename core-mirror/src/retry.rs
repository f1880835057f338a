//! Bounded retry of remote calls.

use bridge_traits::error::BridgeError;
use bridge_traits::http::RetryPolicy;
use core_async::time::{sleep, Duration};
use std::future::Future;

/// Last error of a call that did not succeed, with the attempts spent on it.
#[derive(Debug)]
pub struct RetryFailure {
    pub attempts: u32,
    pub error: BridgeError,
}

/// Run `call` until it succeeds, fails with a non-transient error, or the
/// policy's attempt budget is spent.
///
/// `on_retry` is told about every failed attempt that will be followed by
/// another one: the 1-based number of the failed attempt, the delay before
/// the next one, and the error.
pub async fn with_retry<T, F, Fut, R>(
    policy: &RetryPolicy,
    mut on_retry: R,
    mut call: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bridge_traits::error::Result<T>>,
    R: FnMut(u32, Duration, &BridgeError),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                on_retry(attempt, delay, &error);
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            Err(error) => {
                return Err(RetryFailure {
                    attempts: attempt,
                    error,
                })
            }
        }
    }
}
