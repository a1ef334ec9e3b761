//! Parallel transfers over one multiplexing controller.
//!
//! [`multi_execute`] runs every request of a batch concurrently in the calling
//! thread: each request gets its own handle, all handles are registered with a
//! single `curl::multi::Multi`, and the controller is driven until no transfer
//! is left in flight. Results are written back onto the request that owns the
//! handle, whatever order the transfers complete in.
use std::time::{Duration, Instant};

use curl::multi::{Easy2Handle, Multi};

use crate::collector::Collector;
use crate::errors::{CurlError, TransferError, CURLE_OPERATION_TIMEDOUT};
use crate::request::CurlRequest;

/// Tuning of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Upper bound for the whole batch. Transfers still running when it passes
    /// are stopped and recorded as timed out. `None` leaves only the per-request
    /// timeouts in charge.
    pub deadline: Option<Duration>,
    /// Longest single wait for activity. The wait returns earlier as soon as a
    /// transfer has something to do.
    pub poll_interval: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            deadline: None,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl BatchOptions {
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }
}

/// A registered handle and the position of the request owning it.
struct Node {
    index: usize,
    handle: Easy2Handle<Collector>,
}

/// Executes all `requests` in parallel with the default [`BatchOptions`].
///
/// See [`multi_execute_with`].
pub fn multi_execute<'a, R, I>(requests: I) -> Result<(), CurlError>
where
    R: CurlRequest + ?Sized + 'a,
    I: IntoIterator<Item = &'a mut R>,
{
    multi_execute_with(requests, &BatchOptions::default())
}

/// Executes all `requests` in parallel.
///
/// When this returns, every request has its content, error code and info set,
/// whether its own transfer succeeded or not. An `Err` is returned only when
/// the controller itself fails; the transfers it was driving are then recorded
/// with the controller's error.
pub fn multi_execute_with<'a, R, I>(requests: I, options: &BatchOptions) -> Result<(), CurlError>
where
    R: CurlRequest + ?Sized + 'a,
    I: IntoIterator<Item = &'a mut R>,
{
    let mut requests: Vec<&'a mut R> = requests.into_iter().collect();
    if requests.is_empty() {
        return Ok(());
    }

    let started = Instant::now();
    log::debug!("Starting batch of {} transfers", requests.len());

    let multi = Multi::new();
    let mut nodes: Vec<Node> = Vec::with_capacity(requests.len());

    for (index, request) in requests.iter_mut().enumerate() {
        let state = request.curl_mut();
        let (mut easy, applied) = state.prepare();
        if let Err(e) = applied {
            state.record(&mut easy, Err(e));
            continue;
        }

        match multi.add2(easy) {
            Ok(handle) => nodes.push(Node { index, handle }),
            Err(e) => state.record_failure(e.into()),
        }
    }

    let mut outcomes: Vec<Option<Result<(), TransferError>>> = nodes.iter().map(|_| None).collect();
    let mut unfinished: Option<TransferError> = None;
    let mut failure: Option<curl::MultiError> = None;

    loop {
        let running = match multi.perform() {
            Ok(running) => running,
            Err(e) => {
                unfinished = Some(TransferError::new(e.code() as i32, e.description()));
                failure = Some(e);
                break;
            }
        };

        multi.messages(|msg| {
            for (pos, node) in nodes.iter().enumerate() {
                if let Some(result) = msg.result_for2(&node.handle) {
                    outcomes[pos] = Some(result.map_err(TransferError::from));
                    break;
                }
            }
        });

        if running == 0 {
            break;
        }

        let mut wait = options.poll_interval;
        if let Some(deadline) = options.deadline {
            let elapsed = started.elapsed();
            if elapsed >= deadline {
                log::warn!("Batch deadline of {:?} exceeded with {} transfers running", deadline, running);
                unfinished = Some(TransferError::new(
                    CURLE_OPERATION_TIMEDOUT,
                    format!("Batch deadline of {} ms exceeded", deadline.as_millis()),
                ));
                break;
            }
            wait = wait.min(deadline - elapsed);
        }

        if let Err(e) = multi.wait(&mut [], wait) {
            unfinished = Some(TransferError::new(e.code() as i32, e.description()));
            failure = Some(e);
            break;
        }
    }

    for (node, outcome) in nodes.into_iter().zip(outcomes) {
        let outcome = match (outcome, &unfinished) {
            (Some(outcome), _) => outcome,
            (None, Some(err)) => Err(err.clone()),
            (None, None) => Ok(()),
        };

        let state = requests[node.index].curl_mut();
        match multi.remove2(node.handle) {
            Ok(mut easy) => state.record(&mut easy, outcome),
            Err(e) => state.record_failure(e.into()),
        }
    }

    log::debug!("Batch finished in {:?}", started.elapsed());

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
