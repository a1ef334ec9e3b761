//! The [`CurlRequest`] capability.
//!
//! A host type gains HTTP transfer support by embedding a [`CurlState`] and
//! implementing the two accessors of [`CurlRequest`]. Every other operation is
//! provided:
//!
//! ```no_run
//! use curl_request::{CurlRequest, CurlState};
//!
//! struct Feed {
//!     name: String,
//!     curl: CurlState,
//! }
//!
//! impl CurlRequest for Feed {
//!     fn curl(&self) -> &CurlState { &self.curl }
//!     fn curl_mut(&mut self) -> &mut CurlState { &mut self.curl }
//! }
//!
//! let mut feed = Feed { name: "news".into(), curl: CurlState::new() };
//! feed.set_url("https://example.com/feed.xml");
//! feed.execute();
//! if feed.is_http_ok() {
//!     println!("{}: {} bytes", feed.name, feed.get_content_bytes().unwrap_or_default().len());
//! }
//! ```
//!
//! Transfers never report failure through a return value. After each
//! execution, check [`get_error_code`](CurlRequest::get_error_code) (transport
//! failures) and [`is_http_ok`](CurlRequest::is_http_ok) (non-2xx answers).
use std::borrow::Cow;

use curl::easy::Easy2;
use http::HeaderMap;

use crate::collector::Collector;
use crate::config::CurlDefaults;
use crate::cookies::{self, Cookie};
use crate::errors::{CurlError, TransferError};
use crate::headers;
use crate::info::TransferInfo;
use crate::options::{CurlOpt, CurlOptions, OptionValue};
use crate::response::Response;

/// Configuration and last result of one logical request.
#[derive(Debug, Clone, Default)]
pub struct CurlState {
    /// Options set by the caller
    options: CurlOptions,
    /// Values for options the caller did not set
    defaults: CurlDefaults,
    /// Header text of the last execution
    header: String,
    content: Option<Vec<u8>>,
    info: Option<TransferInfo>,
    error_code: Option<i32>,
    error_message: Option<String>,
}

impl CurlState {
    /// Creates a request with the stock defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a request that fills unset options from `defaults`.
    pub fn with_defaults(defaults: CurlDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn defaults(&self) -> &CurlDefaults {
        &self.defaults
    }

    pub fn set_defaults(&mut self, defaults: CurlDefaults) {
        self.defaults = defaults;
    }

    /// Caller options overlaid on the defaults, with header capture forced.
    pub(crate) fn merged_options(&self) -> CurlOptions {
        let mut options = self.options.clone();
        options.fill_from(&self.defaults.to_options());
        options.force_header_capture();
        options
    }

    /// Opens a handle for the next execution and applies the merged options.
    ///
    /// Header text of the previous execution is dropped here. The handle is
    /// returned on failure too, so its (empty) results can still be recorded.
    pub(crate) fn prepare(&mut self) -> (Easy2<Collector>, Result<(), TransferError>) {
        self.header.clear();
        let mut easy = Easy2::new(Collector::default());
        let applied = self.merged_options().apply(&mut easy);
        if let Err(e) = &applied {
            log::warn!("Cannot apply options for {}: {}", self.url_for_log(), e);
        }
        (easy, applied)
    }

    /// Copies the results held by `easy` onto this request.
    pub(crate) fn record(&mut self, easy: &mut Easy2<Collector>, outcome: Result<(), TransferError>) {
        let info = TransferInfo::from_easy(easy);
        let (body, header) = easy.get_mut().take();

        self.content = Some(body);
        self.header = header;

        match outcome {
            Ok(()) => {
                log::debug!(
                    "Transfer of {} finished: status {} in {:.3}s",
                    self.url_for_log(),
                    info.http_code,
                    info.total_time
                );
                self.error_code = Some(0);
                self.error_message = None;
            }
            Err(e) => {
                log::warn!("Transfer of {} failed: {}", self.url_for_log(), e);
                self.error_code = Some(e.code);
                self.error_message = Some(e.message);
            }
        }

        self.info = Some(info);
    }

    /// Records a failure for which no transfer handle is left to read from.
    pub(crate) fn record_failure(&mut self, error: TransferError) {
        log::warn!("Transfer of {} failed: {}", self.url_for_log(), error);
        self.content = Some(Vec::new());
        self.header.clear();
        self.info = Some(TransferInfo::default());
        self.error_code = Some(error.code);
        self.error_message = Some(error.message);
    }

    fn url(&self) -> Option<&str> {
        match self.options.get(CurlOpt::Url) {
            Some(OptionValue::Text(url)) => Some(url),
            _ => None,
        }
    }

    fn url_for_log(&self) -> &str {
        self.url().unwrap_or("<no url>")
    }

    fn perform(&mut self) {
        log::debug!("Executing {}", self.url_for_log());
        let (mut easy, applied) = self.prepare();
        let outcome = applied.and_then(|()| easy.perform().map_err(TransferError::from));
        self.record(&mut easy, outcome);
    }
}

/// Anything that can be configured and executed as an HTTP transfer.
pub trait CurlRequest {
    /// The embedded request state.
    fn curl(&self) -> &CurlState;

    /// The embedded request state, mutably.
    fn curl_mut(&mut self) -> &mut CurlState;

    /// Options used for the next transfer.
    ///
    /// Caller options win over the defaults. The header capture hook is always
    /// installed and inline headers are always off, whatever the caller set.
    fn get_options(&self) -> CurlOptions {
        self.curl().merged_options()
    }

    /// Merges `options` into the stored configuration.
    fn set_options(&mut self, options: CurlOptions) {
        self.curl_mut().options.merge(options);
    }

    /// Sets a single option.
    fn set_option(&mut self, key: CurlOpt, value: OptionValue) {
        self.curl_mut().options.set(key, value);
    }

    /// Turns the request into a POST of `data`, or back into a plain request
    /// when `data` is `None` or empty.
    fn set_post_data(&mut self, data: Option<&[u8]>) {
        let options = &mut self.curl_mut().options;
        match data {
            Some(data) if !data.is_empty() => {
                options.set(CurlOpt::Post, true);
                options.set(CurlOpt::PostFields, data);
            }
            _ => {
                options.remove(CurlOpt::Post);
                options.remove(CurlOpt::PostFields);
            }
        }
    }

    fn get_url(&self) -> Option<&str> {
        self.curl().url()
    }

    fn set_url(&mut self, url: &str) {
        self.curl_mut().options.set(CurlOpt::Url, url);
    }

    /// Performs the transfer, blocking until it completes.
    ///
    /// Results of a previous execution are replaced.
    fn execute(&mut self) {
        self.curl_mut().perform();
    }

    /// Body of the last transfer as text.
    fn get_content(&self) -> Option<Cow<'_, str>> {
        self.curl().content.as_deref().map(String::from_utf8_lossy)
    }

    fn get_content_bytes(&self) -> Option<&[u8]> {
        self.curl().content.as_deref()
    }

    /// `Some(0)` after a successful transfer, the engine code after a failed one.
    fn get_error_code(&self) -> Option<i32> {
        self.curl().error_code
    }

    /// Engine message of the last failed transfer.
    fn get_error_message(&self) -> Option<&str> {
        self.curl().error_message.as_deref()
    }

    fn get_info(&self) -> Option<&TransferInfo> {
        self.curl().info.as_ref()
    }

    /// Raw header text of the last execution, every response included.
    fn get_header(&self) -> &str {
        &self.curl().header
    }

    /// Headers of the final response.
    fn get_header_map(&self) -> HeaderMap {
        headers::parse_header_map(self.get_header())
    }

    /// `name=value` of every received cookie, joined with `"; "`.
    fn get_cookies(&self) -> Option<String> {
        cookies::scan_cookies(self.get_header())
    }

    /// Every received cookie with its attributes.
    fn get_cookie_list(&self) -> Vec<Cookie> {
        let url = self
            .get_info()
            .and_then(|i| i.url.as_deref())
            .or_else(|| self.get_url())
            .and_then(|u| url::Url::parse(u).ok());
        cookies::parse_set_cookies(self.get_header(), url.as_ref())
    }

    /// Whether the last status code starts with `2`. False before any execution.
    fn is_http_ok(&self) -> bool {
        self.get_info().is_some_and(TransferInfo::is_http_ok)
    }

    /// Snapshot of the last response.
    fn to_response(&self) -> Result<Response, CurlError> {
        let info = self.get_info().ok_or(CurlError::NotExecuted)?;
        let url = info
            .url
            .as_deref()
            .or_else(|| self.get_url())
            .ok_or(CurlError::NotExecuted)?;
        let url = url::Url::parse(url)?;

        let status = u16::try_from(info.http_code)
            .ok()
            .filter(|s| *s != 0)
            .or_else(|| headers::final_status(self.get_header()))
            .unwrap_or_default();

        Ok(Response {
            url,
            status,
            status_text: Response::reason_for(status),
            headers: self.get_header_map(),
            body: self.get_content_bytes().unwrap_or_default().to_vec(),
        })
    }
}

impl CurlRequest for CurlState {
    fn curl(&self) -> &CurlState {
        self
    }

    fn curl_mut(&mut self) -> &mut CurlState {
        self
    }
}
