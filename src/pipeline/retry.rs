//! Bounded retry, independent of the service being called.
//!
//! Attempts are sequential and immediate: a chat completion either comes back
//! or it does not, and the request handler is already holding a client
//! connection open. The first success short-circuits the remaining attempts.

use std::future::Future;

/// All attempts failed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    /// Attempts made (equals the bound).
    pub attempts: u32,
    /// Error from the final attempt.
    pub last_error: E,
}

/// Run `operation` up to `max_attempts` times.
///
/// `operation` receives the 1-based attempt ordinal. `on_failure` is called
/// with the ordinal and the error after every failed attempt, including the
/// last one. On success returns the value together with the number of
/// attempts it took.
///
/// A `max_attempts` of zero is treated as one.
pub async fn retry_bounded<T, E, F, Fut, L>(
    max_attempts: u32,
    mut operation: F,
    mut on_failure: L,
) -> Result<(T, u32), RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    L: FnMut(u32, &E),
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(e) => {
                on_failure(attempt, &e);
                if attempt >= max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
            }
        }
        attempt += 1;
    }
}
