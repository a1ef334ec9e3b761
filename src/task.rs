//! Running transfers from async code.
//!
//! Transfers block the calling thread, so async hosts hand them to tokio's
//! blocking pool. The request is moved into the task and handed back with its
//! results once the transfer is done.
use crate::errors::CurlError;
use crate::multi::{multi_execute_with, BatchOptions};
use crate::request::CurlRequest;

/// Executes `request` on the blocking pool and returns it with its results.
pub async fn execute_async<R>(mut request: R) -> Result<R, CurlError>
where
    R: CurlRequest + Send + 'static,
{
    let request = tokio::task::spawn_blocking(move || {
        request.execute();
        request
    })
    .await?;
    Ok(request)
}

/// Executes a batch on the blocking pool and returns the requests in their original order.
pub async fn multi_execute_async<R>(mut requests: Vec<R>, options: BatchOptions) -> Result<Vec<R>, CurlError>
where
    R: CurlRequest + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<Vec<R>, CurlError> {
        multi_execute_with(requests.iter_mut(), &options)?;
        Ok(requests)
    })
    .await?
}
