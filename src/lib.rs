//! HTTP transfers on top of libcurl.
//!
//! Embed a [`CurlState`] in a type and implement [`CurlRequest`] to configure
//! and execute a transfer from it. Run many of them at once with
//! [`multi_execute`].

pub mod collector;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod headers;
pub mod info;
pub mod multi;
pub mod options;
pub mod request;
pub mod response;
pub mod task;

pub use config::CurlDefaults;
pub use cookies::Cookie;
pub use errors::{CurlError, TransferError};
pub use info::TransferInfo;
pub use multi::{multi_execute, multi_execute_with, BatchOptions};
pub use options::{CurlOpt, CurlOptions, OptionValue};
pub use request::{CurlRequest, CurlState};
pub use response::Response;
pub use task::{execute_async, multi_execute_async};
