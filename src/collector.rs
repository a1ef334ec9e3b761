//! Per-transfer capture context.
use curl::easy::{Handler, WriteError};

/// Accumulates the body and the raw header lines of one transfer.
///
/// A fresh collector is owned by every transfer handle, so nothing captured
/// during one execution can reach another request or a later execution.
#[derive(Debug, Default)]
pub struct Collector {
    body: Vec<u8>,
    header: Vec<u8>,
}

impl Collector {
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn header_bytes(&self) -> &[u8] {
        &self.header
    }

    /// Moves the captured body and header text out, leaving the collector empty.
    pub fn take(&mut self) -> (Vec<u8>, String) {
        let body = std::mem::take(&mut self.body);
        let header = std::mem::take(&mut self.header);
        let header = match String::from_utf8(header) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        (body, header)
    }
}

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    // One call per header line, terminator included. Returning false aborts the transfer.
    fn header(&mut self, data: &[u8]) -> bool {
        self.header.extend_from_slice(data);
        true
    }
}
