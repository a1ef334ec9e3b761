//! Transfer option store.
//!
//! A [`CurlOptions`] map pairs a [`CurlOpt`] key with an [`OptionValue`]. It is
//! a plain value: requests keep one as their configuration, merge it with the
//! defaults when a transfer starts, and finally apply it to a fresh transfer
//! handle with [`CurlOptions::apply`].
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::time::Duration;

use curl::easy::{Easy2, Handler, List};

use crate::errors::TransferError;

/// Transfer option identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CurlOpt {
    /// Target URL (text)
    Url,
    /// Follow redirects (bool)
    FollowLocation,
    /// Set `Referer:` when following redirects (bool)
    AutoReferer,
    /// Maximum redirects to follow (int)
    MaxRedirs,
    /// Connect phase timeout in seconds (int)
    ConnectTimeout,
    /// Whole transfer timeout in seconds (int)
    Timeout,
    /// Verify the peer certificate (bool)
    SslVerifyPeer,
    /// Verify the certificate host name (bool)
    SslVerifyHost,
    /// Include headers inline in the body (bool). Always forced off.
    Header,
    /// Header capture hook. Always forced to the request's own collector.
    HeaderFunction,
    /// Send a POST (bool)
    Post,
    /// POST body (text or bytes)
    PostFields,
    /// `User-Agent:` value (text)
    UserAgent,
    /// `Referer:` value (text)
    Referer,
    /// `Cookie:` value sent with the request (text)
    Cookie,
    /// Extra request headers, one `Name: value` per entry (list)
    HttpHeader,
    /// `Accept-Encoding:` value, empty for every supported encoding (text)
    Encoding,
    /// Let the engine print transfer details on stderr (bool)
    Verbose,
}

/// Value stored for a [`CurlOpt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<String>),
    /// Marker for the header capture hook
    HeaderCapture,
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        OptionValue::Int(v.into())
    }
}

impl From<u32> for OptionValue {
    fn from(v: u32) -> Self {
        OptionValue::Int(v.into())
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Text(v)
    }
}

impl From<Vec<u8>> for OptionValue {
    fn from(v: Vec<u8>) -> Self {
        OptionValue::Bytes(v)
    }
}

impl From<&[u8]> for OptionValue {
    fn from(v: &[u8]) -> Self {
        OptionValue::Bytes(v.to_vec())
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(v: Vec<String>) -> Self {
        OptionValue::List(v)
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(v: Vec<&str>) -> Self {
        OptionValue::List(v.into_iter().map(str::to_string).collect())
    }
}

impl OptionValue {
    fn as_bool(&self, key: CurlOpt) -> Result<bool, TransferError> {
        match self {
            OptionValue::Bool(b) => Ok(*b),
            // Integer flags behave like the engine's own 0 / non-zero switches
            OptionValue::Int(i) => Ok(*i != 0),
            other => Err(mismatch(key, "a boolean", other)),
        }
    }

    fn as_int(&self, key: CurlOpt) -> Result<i64, TransferError> {
        match self {
            OptionValue::Int(i) => Ok(*i),
            other => Err(mismatch(key, "an integer", other)),
        }
    }

    fn as_text(&self, key: CurlOpt) -> Result<&str, TransferError> {
        match self {
            OptionValue::Text(s) => Ok(s),
            other => Err(mismatch(key, "text", other)),
        }
    }

    fn as_bytes(&self, key: CurlOpt) -> Result<&[u8], TransferError> {
        match self {
            OptionValue::Text(s) => Ok(s.as_bytes()),
            OptionValue::Bytes(b) => Ok(b),
            other => Err(mismatch(key, "text or bytes", other)),
        }
    }

    fn as_list(&self, key: CurlOpt) -> Result<&[String], TransferError> {
        match self {
            OptionValue::List(l) => Ok(l),
            other => Err(mismatch(key, "a list", other)),
        }
    }

    fn as_duration(&self, key: CurlOpt) -> Result<Duration, TransferError> {
        let secs = self.as_int(key)?;
        let secs = u64::try_from(secs)
            .map_err(|_| TransferError::bad_argument(format!("{key:?} must not be negative, got {secs}")))?;
        Ok(Duration::from_secs(secs))
    }
}

fn mismatch(key: CurlOpt, expected: &str, got: &OptionValue) -> TransferError {
    TransferError::bad_argument(format!("{key:?} expects {expected}, got {got:?}"))
}

/// Ordered option map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurlOptions {
    entries: BTreeMap<CurlOpt, OptionValue>,
}

impl CurlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any earlier value.
    pub fn set(&mut self, key: CurlOpt, value: impl Into<OptionValue>) -> &mut Self {
        self.entries.insert(key, value.into());
        self
    }

    pub fn get(&self, key: CurlOpt) -> Option<&OptionValue> {
        self.entries.get(&key)
    }

    pub fn remove(&mut self, key: CurlOpt) -> Option<OptionValue> {
        self.entries.remove(&key)
    }

    pub fn contains(&self, key: CurlOpt) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, CurlOpt, OptionValue> {
        self.entries.iter()
    }

    /// Copies every entry of `other` into this map, overwriting equal keys.
    pub fn merge(&mut self, other: CurlOptions) {
        self.entries.extend(other.entries);
    }

    /// Fills keys not set here from `defaults`. Keys already present are left untouched.
    pub fn fill_from(&mut self, defaults: &CurlOptions) {
        for (key, value) in defaults.iter() {
            self.entries.entry(*key).or_insert_with(|| value.clone());
        }
    }

    /// Routes headers through the capture hook and never inline into the body.
    pub fn force_header_capture(&mut self) {
        self.entries.insert(CurlOpt::HeaderFunction, OptionValue::HeaderCapture);
        self.entries.insert(CurlOpt::Header, OptionValue::Bool(false));
    }

    /// Applies every option to a transfer handle.
    ///
    /// Stops at the first value the handle rejects or whose kind does not
    /// match its key.
    pub fn apply<H: Handler>(&self, easy: &mut Easy2<H>) -> Result<(), TransferError> {
        for (key, value) in self.iter() {
            let key = *key;
            match key {
                CurlOpt::Url => easy.url(value.as_text(key)?)?,
                CurlOpt::FollowLocation => easy.follow_location(value.as_bool(key)?)?,
                CurlOpt::AutoReferer => easy.autoreferer(value.as_bool(key)?)?,
                CurlOpt::MaxRedirs => {
                    let max = value.as_int(key)?;
                    let max = u32::try_from(max).map_err(|_| {
                        TransferError::bad_argument(format!("MaxRedirs out of range: {max}"))
                    })?;
                    easy.max_redirections(max)?
                }
                CurlOpt::ConnectTimeout => easy.connect_timeout(value.as_duration(key)?)?,
                CurlOpt::Timeout => easy.timeout(value.as_duration(key)?)?,
                CurlOpt::SslVerifyPeer => easy.ssl_verify_peer(value.as_bool(key)?)?,
                CurlOpt::SslVerifyHost => easy.ssl_verify_host(value.as_bool(key)?)?,
                CurlOpt::Header => easy.show_header(value.as_bool(key)?)?,
                // The handler's header callback is always installed
                CurlOpt::HeaderFunction => {}
                CurlOpt::Post => easy.post(value.as_bool(key)?)?,
                CurlOpt::PostFields => easy.post_fields_copy(value.as_bytes(key)?)?,
                CurlOpt::UserAgent => easy.useragent(value.as_text(key)?)?,
                CurlOpt::Referer => easy.referer(value.as_text(key)?)?,
                CurlOpt::Cookie => easy.cookie(value.as_text(key)?)?,
                CurlOpt::HttpHeader => {
                    let mut list = List::new();
                    for header in value.as_list(key)? {
                        list.append(header)?;
                    }
                    easy.http_headers(list)?
                }
                CurlOpt::Encoding => easy.accept_encoding(value.as_text(key)?)?,
                CurlOpt::Verbose => easy.verbose(value.as_bool(key)?)?,
            }
        }
        Ok(())
    }
}

impl FromIterator<(CurlOpt, OptionValue)> for CurlOptions {
    fn from_iter<T: IntoIterator<Item = (CurlOpt, OptionValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CurlOptions {
    type Item = (&'a CurlOpt, &'a OptionValue);
    type IntoIter = btree_map::Iter<'a, CurlOpt, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
