//! Timeout-bounded retry loop with exponential backoff.
//!
//! [`fetch_with_retry`] is the entry point for `reqwest` requests.
//! [`run_attempts`] is the same loop over any attempt future, which lets
//! callers plug in their own transport.

use std::{future::Future, time::Duration};

use reqwest::StatusCode;

use crate::{PdfServiceError, Result, RetryConfig};

/// Anything the retry loop can classify by HTTP status.
pub trait HttpStatus {
    fn status(&self) -> StatusCode;
}

impl HttpStatus for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }
}

/// Result of a single attempt.
#[derive(Debug)]
pub enum AttemptOutcome<R> {
    /// A response the caller must inspect. Includes 4xx statuses.
    Success(R),
    /// Worth another attempt if any remain.
    RetryableFailure(RetryReason<R>),
    /// Never retried.
    TerminalFailure(PdfServiceError),
}

/// Why an attempt is retryable.
#[derive(Debug)]
pub enum RetryReason<R> {
    /// 5xx response. Kept so it can be handed back after the last attempt.
    ServerError(R),
    /// Timeout or network failure.
    Error(PdfServiceError),
}

impl<R: HttpStatus> AttemptOutcome<R> {
    pub fn classify(result: Result<R>) -> Self {
        match result {
            Ok(response) if response.status().is_server_error() => {
                Self::RetryableFailure(RetryReason::ServerError(response))
            }
            Ok(response) => Self::Success(response),
            Err(err) if err.is_retryable() => Self::RetryableFailure(RetryReason::Error(err)),
            Err(err) => Self::TerminalFailure(err),
        }
    }
}

/// Geometric delay sequence: `initial`, `initial * m`, `initial * m^2`, ...
///
/// No jitter and no cap. Saturates instead of overflowing.
#[derive(Clone, Debug)]
pub struct Backoff {
    next: Duration,
    multiplier: f64,
}

impl Backoff {
    pub fn new(initial: Duration, multiplier: f64) -> Self {
        Self {
            next: initial,
            multiplier,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = scale(current, self.multiplier);
        Some(current)
    }
}

fn scale(delay: Duration, multiplier: f64) -> Duration {
    let nanos = delay.as_nanos() as f64 * multiplier;
    let scaled = if nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        Duration::try_from_secs_f64(delay.as_secs_f64() * multiplier).unwrap_or(Duration::MAX)
    };
    // multiplier >= 1, so the sequence never shrinks
    scaled.max(delay)
}

/// Sends `request` up to `config.max_attempts` times.
///
/// Each attempt is raced against `config.timeout_ms`; a losing attempt is
/// dropped, which cancels the in-flight request. Timeouts, network failures
/// and 5xx responses are retried after the next backoff delay. Any other
/// response is returned as-is, as is a 5xx on the last attempt.
///
/// Fails with [`PdfServiceError::ExhaustedRetries`] when the last attempt
/// ends in an error, and with [`PdfServiceError::InvalidConfig`] when the
/// config is out of range or the request body cannot be replayed. A request
/// that fails to build (malformed URL, invalid header value) is returned as
/// [`PdfServiceError::Network`] without being sent.
pub async fn fetch_with_retry(
    request: reqwest::RequestBuilder,
    config: &RetryConfig,
) -> Result<reqwest::Response> {
    // A builder error (bad URL, invalid header) is terminal and never sent.
    let (client, request) = request.build_split();
    let request = request.map_err(PdfServiceError::Network)?;

    let timeout_ms = config.timeout_ms;
    run_attempts(config, |_attempt| {
        let attempt = request.try_clone();
        let client = &client;
        async move {
            let attempt = attempt.ok_or_else(|| {
                PdfServiceError::InvalidConfig(
                    "request body cannot be cloned for retries".to_owned(),
                )
            })?;
            client
                .execute(attempt)
                .await
                .map_err(|err| PdfServiceError::from_transport(err, timeout_ms))
        }
    })
    .await
}

/// Retry loop behind [`fetch_with_retry`].
///
/// `send` receives the 1-based attempt number.
pub async fn run_attempts<R, F, Fut>(config: &RetryConfig, mut send: F) -> Result<R>
where
    R: HttpStatus,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    config.validate()?;

    let timeout = config.timeout();
    let mut delays = config.delays();
    let mut attempt = 1u32;

    loop {
        let result = match tokio::time::timeout(timeout, send(attempt)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(PdfServiceError::Timeout {
                timeout_ms: config.timeout_ms,
            }),
        };

        let reason = match AttemptOutcome::classify(result) {
            AttemptOutcome::Success(response) => return Ok(response),
            AttemptOutcome::TerminalFailure(err) => return Err(err),
            AttemptOutcome::RetryableFailure(reason) => reason,
        };

        if attempt >= config.max_attempts {
            return match reason {
                RetryReason::ServerError(response) => Ok(response),
                RetryReason::Error(last) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(attempts = attempt, error = %last, "giving up on request");

                    Err(PdfServiceError::ExhaustedRetries {
                        attempts: attempt,
                        last: Box::new(last),
                    })
                }
            };
        }

        // Backoff never ends, so the fallback is unreachable.
        let delay = delays.next().unwrap_or_default();

        #[cfg(feature = "tracing")]
        match &reason {
            RetryReason::ServerError(response) => tracing::debug!(
                attempt,
                status = response.status().as_u16(),
                delay_ms = delay.as_millis() as u64,
                "retrying after server error"
            ),
            RetryReason::Error(err) => tracing::debug!(
                attempt,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "retrying after request failure"
            ),
        }

        drop(reason);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;
    use tokio::time::Instant;

    use super::{run_attempts, AttemptOutcome, Backoff, HttpStatus, RetryReason};
    use crate::{PdfServiceError, Result, RetryConfig};

    #[derive(Debug)]
    struct FakeResponse(u16);

    impl HttpStatus for FakeResponse {
        fn status(&self) -> StatusCode {
            StatusCode::from_u16(self.0).expect("fake status must be valid")
        }
    }

    fn config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            timeout_ms: 1_000,
            initial_delay_ms: 100,
            backoff_multiplier: 2.0,
        }
    }

    fn gaps(starts: &[Instant]) -> Vec<Duration> {
        starts.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_use_every_attempt_with_geometric_waits() {
        let mut starts = Vec::new();
        let response = run_attempts(&config(4), |_| {
            starts.push(Instant::now());
            async { Ok(FakeResponse(500)) }
        })
        .await
        .expect("final 5xx is returned, not raised");

        assert_eq!(response.0, 500);
        assert_eq!(starts.len(), 4);
        let waits = gaps(&starts);
        assert_close(waits[0], Duration::from_millis(100));
        assert_close(waits[1], Duration::from_millis(200));
        assert_close(waits[2], Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_is_returned_without_retry() {
        let mut calls = 0;
        let response = run_attempts(&config(5), |_| {
            calls += 1;
            async { Ok(FakeResponse(404)) }
        })
        .await
        .expect("4xx is handed back to the caller");

        assert_eq!(response.0, 404);
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_attempts_time_out_until_exhausted() {
        let mut calls = 0;
        let err = run_attempts(&config(3), |_| {
            calls += 1;
            std::future::pending::<Result<FakeResponse>>()
        })
        .await
        .expect_err("every attempt hangs");

        assert_eq!(calls, 3);
        assert!(err.is_timeout());
        match err {
            PdfServiceError::ExhaustedRetries { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, PdfServiceError::Timeout { timeout_ms: 1_000 }));
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_failures() {
        let mut calls = 0;
        let response = run_attempts(&config(5), |attempt| {
            calls += 1;
            async move {
                match attempt {
                    1 => Ok(FakeResponse(503)),
                    2 => Err(PdfServiceError::Timeout { timeout_ms: 1_000 }),
                    _ => Ok(FakeResponse(200)),
                }
            }
        })
        .await
        .expect("third attempt succeeds");

        assert_eq!(response.0, 200);
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_never_waits() {
        let started = Instant::now();
        let mut calls = 0;
        let response = run_attempts(&config(1), |_| {
            calls += 1;
            async { Ok(FakeResponse(502)) }
        })
        .await
        .expect("5xx on the only attempt is returned");
        assert_eq!(response.0, 502);

        let err = run_attempts(&config(1), |_| {
            calls += 1;
            async { Err::<FakeResponse, _>(PdfServiceError::Timeout { timeout_ms: 1_000 }) }
        })
        .await
        .expect_err("error on the only attempt propagates");

        assert!(matches!(
            err,
            PdfServiceError::ExhaustedRetries { attempts: 1, .. }
        ));
        assert_eq!(calls, 2);
        assert_eq!(Instant::now(), started);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_is_not_retried() {
        let mut calls = 0;
        let err = run_attempts(&config(3), |_| {
            calls += 1;
            async { Err::<FakeResponse, _>(PdfServiceError::Decode("bad".to_owned())) }
        })
        .await
        .expect_err("decode errors are terminal");

        assert!(matches!(err, PdfServiceError::Decode(_)));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn invalid_config_sends_nothing() {
        let mut calls = 0;
        let err = run_attempts(&config(0), |_| {
            calls += 1;
            async { Ok(FakeResponse(200)) }
        })
        .await
        .expect_err("zero attempts is invalid");

        assert!(matches!(err, PdfServiceError::InvalidConfig(_)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn classify_splits_statuses_and_errors() {
        assert!(matches!(
            AttemptOutcome::classify(Ok(FakeResponse(201))),
            AttemptOutcome::Success(_)
        ));
        assert!(matches!(
            AttemptOutcome::classify(Ok(FakeResponse(429))),
            AttemptOutcome::Success(_)
        ));
        assert!(matches!(
            AttemptOutcome::classify(Ok(FakeResponse(504))),
            AttemptOutcome::RetryableFailure(RetryReason::ServerError(_))
        ));
        assert!(matches!(
            AttemptOutcome::<FakeResponse>::classify(Err(PdfServiceError::Timeout {
                timeout_ms: 1
            })),
            AttemptOutcome::RetryableFailure(RetryReason::Error(_))
        ));
    }

    #[test]
    fn backoff_grows_by_multiplier() {
        let delays: Vec<_> = Backoff::new(Duration::from_millis(100), 1.5)
            .take(4)
            .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(150),
                Duration::from_millis(225),
                Duration::from_micros(337_500),
            ]
        );
    }

    #[test]
    fn backoff_saturates_instead_of_panicking() {
        let last = Backoff::new(Duration::from_secs(u64::MAX / 2), 10.0)
            .take(5)
            .last()
            .expect("iterator is unbounded");
        assert_eq!(last, Duration::MAX);
    }

    #[test]
    fn backoff_never_shrinks_past_nanosecond_range() {
        let delays: Vec<_> = Backoff::new(Duration::from_millis(u64::MAX / 1000), 2.0)
            .take(4)
            .collect();

        assert!(delays[0] > Duration::from_nanos(u64::MAX));
        assert!(delays[1] > delays[0]);
        assert!(delays.windows(2).all(|pair| pair[1] >= pair[0]), "{delays:?}");
    }
}
