//! The byte sink a response is emitted to.
//!
//! A [`Transport`] accepts header lines and body bytes. Once the first body
//! byte has been written the headers are considered sent, and any further
//! header is rejected with [`TransportError::HeadersSent`].
//!
//! Two implementations are provided:
//!
//! - [`StreamTransport`]: writes a CGI-style response (header lines, a blank
//!   line, then the body) to any [`std::io::Write`].
//! - [`MemoryTransport`]: records every call in order. Clones share the
//!   recording, so a test can keep a handle after giving one away.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use thiserror::Error;

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A header was sent after the body started.
    #[error("headers already sent, cannot send '{0}'")]
    HeadersSent(String),

    /// The underlying writer failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination of header lines and body bytes.
pub trait Transport {
    /// Sends one full header line, e.g. `"Content-Type: text/html"`.
    fn send_header(&mut self, line: &str) -> Result<(), TransportError>;

    /// Writes body bytes.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Whether headers have already gone out.
    fn headers_sent(&self) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_header(&mut self, line: &str) -> Result<(), TransportError> {
        (**self).send_header(line)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn headers_sent(&self) -> bool {
        (**self).headers_sent()
    }
}

/// Writes a CGI-style response to a writer.
///
/// Header lines are held back until the first body write (or
/// [`finish`](Self::finish)), then written as `line\r\n` followed by an empty
/// line.
#[derive(Debug)]
pub struct StreamTransport<W: Write> {
    writer: W,
    pending: Vec<String>,
    started: bool,
}

impl<W: Write> StreamTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pending: Vec::new(),
            started: false,
        }
    }

    /// Sends any held headers, flushes, and returns the writer.
    pub fn finish(mut self) -> Result<W, TransportError> {
        if !self.started {
            self.start_body()?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn start_body(&mut self) -> Result<(), TransportError> {
        for line in self.pending.drain(..) {
            write!(self.writer, "{}\r\n", line)?;
        }
        self.writer.write_all(b"\r\n")?;
        self.started = true;
        Ok(())
    }
}

impl<W: Write> Transport for StreamTransport<W> {
    fn send_header(&mut self, line: &str) -> Result<(), TransportError> {
        if self.started {
            return Err(TransportError::HeadersSent(line.to_string()));
        }
        self.pending.push(line.to_string());
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.started {
            self.start_body()?;
        }
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn headers_sent(&self) -> bool {
        self.started
    }
}

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Header(String),
    Body(Vec<u8>),
}

#[derive(Debug, Default)]
struct Recording {
    events: Vec<TransportEvent>,
    headers_sent: bool,
}

/// In-memory transport that records every call.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    recording: Rc<RefCell<Recording>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn events(&self) -> Vec<TransportEvent> {
        self.recording.borrow().events.clone()
    }

    /// Header lines sent so far, in order.
    pub fn headers(&self) -> Vec<String> {
        self.recording
            .borrow()
            .events
            .iter()
            .filter_map(|event| match event {
                TransportEvent::Header(line) => Some(line.clone()),
                TransportEvent::Body(_) => None,
            })
            .collect()
    }

    /// All body bytes so far, concatenated and decoded lossily.
    pub fn body(&self) -> String {
        let recording = self.recording.borrow();
        let bytes: Vec<u8> = recording
            .events
            .iter()
            .filter_map(|event| match event {
                TransportEvent::Body(bytes) => Some(bytes.as_slice()),
                TransportEvent::Header(_) => None,
            })
            .flatten()
            .copied()
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Marks headers as sent without writing anything, as if another
    /// component had already started the response.
    pub fn mark_headers_sent(&self) {
        self.recording.borrow_mut().headers_sent = true;
    }
}

impl Transport for MemoryTransport {
    fn send_header(&mut self, line: &str) -> Result<(), TransportError> {
        let mut recording = self.recording.borrow_mut();
        if recording.headers_sent {
            return Err(TransportError::HeadersSent(line.to_string()));
        }
        recording.events.push(TransportEvent::Header(line.to_string()));
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut recording = self.recording.borrow_mut();
        recording.headers_sent = true;
        recording.events.push(TransportEvent::Body(bytes.to_vec()));
        Ok(())
    }

    fn headers_sent(&self) -> bool {
        self.recording.borrow().headers_sent
    }
}
