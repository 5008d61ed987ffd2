//! Deferred vs immediate output policy.
//!
//! In deferred mode header lines and body text are held in a [`Pending`]
//! buffer until [`OutputBuffer::flush`]. In immediate mode every call goes
//! straight to the transport and nothing is retained.

use std::mem;

use tracing::trace;

use crate::transport::{Transport, TransportError};

/// Output held back until emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pending {
    /// Header lines in insertion order.
    pub headers: Vec<String>,
    /// Body text, concatenated in write order.
    pub body: String,
}

impl Pending {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.body.is_empty()
    }
}

/// Routes headers and body text either to a buffer or to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputBuffer {
    /// Everything is sent as soon as it is produced.
    Immediate,
    /// Everything is held until [`flush`](OutputBuffer::flush).
    Deferred(Pending),
}

impl OutputBuffer {
    pub fn new(deferred: bool) -> Self {
        if deferred {
            OutputBuffer::Deferred(Pending::default())
        } else {
            OutputBuffer::Immediate
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, OutputBuffer::Deferred(_))
    }

    /// Held output, if deferred.
    pub fn pending(&self) -> Option<&Pending> {
        match self {
            OutputBuffer::Deferred(pending) => Some(pending),
            OutputBuffer::Immediate => None,
        }
    }

    /// Mutable held output, if deferred.
    pub fn pending_mut(&mut self) -> Option<&mut Pending> {
        match self {
            OutputBuffer::Deferred(pending) => Some(pending),
            OutputBuffer::Immediate => None,
        }
    }

    /// Buffers or sends one header line.
    pub fn header(
        &mut self,
        line: String,
        transport: &mut dyn Transport,
    ) -> Result<(), TransportError> {
        match self {
            OutputBuffer::Deferred(pending) => {
                trace!(header = %line, "buffering header");
                pending.headers.push(line);
                Ok(())
            }
            OutputBuffer::Immediate => transport.send_header(&line),
        }
    }

    /// Buffers or sends body text.
    pub fn write(&mut self, text: &str, transport: &mut dyn Transport) -> Result<(), TransportError> {
        match self {
            OutputBuffer::Deferred(pending) => {
                pending.body.push_str(text);
                Ok(())
            }
            OutputBuffer::Immediate => transport.write(text.as_bytes()),
        }
    }

    /// Sends held headers in insertion order, then the held body.
    ///
    /// The buffer is empty afterwards. Does nothing in immediate mode.
    pub fn flush(&mut self, transport: &mut dyn Transport) -> Result<(), TransportError> {
        let Some(pending) = self.pending_mut() else {
            return Ok(());
        };
        let Pending { headers, body } = mem::take(pending);

        for line in &headers {
            transport.send_header(line)?;
        }
        if !body.is_empty() {
            transport.write(body.as_bytes())?;
        }
        Ok(())
    }
}
