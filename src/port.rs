// ABOUTME: Byte-oriented ports with one-byte pushback for reader and stream primitives

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};

#[derive(Debug)]
enum PortKind {
    Stdin,
    Stdout,
    Stderr,
    File(File),
    /// In-memory source, used by the batch driver and tests.
    Bytes(io::Cursor<Vec<u8>>),
    /// In-memory sink, used by tests to capture printed output.
    Sink(Vec<u8>),
    Closed,
}

/// A byte stream the reader and stream primitives operate on. `ungetc`
/// pushes bytes back ahead of the underlying source.
#[derive(Debug)]
pub struct Port {
    kind: PortKind,
    pushback: Vec<u8>,
}

impl Port {
    fn new(kind: PortKind) -> Self {
        Port {
            kind,
            pushback: Vec::new(),
        }
    }

    pub fn stdin() -> Self {
        Port::new(PortKind::Stdin)
    }

    pub fn stdout() -> Self {
        Port::new(PortKind::Stdout)
    }

    pub fn stderr() -> Self {
        Port::new(PortKind::Stderr)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Port::new(PortKind::Bytes(io::Cursor::new(bytes)))
    }

    pub fn from_str(source: &str) -> Self {
        Port::from_bytes(source.as_bytes().to_vec())
    }

    pub fn sink() -> Self {
        Port::new(PortKind::Sink(Vec::new()))
    }

    /// Open a file port. Read-only by default; `writable` enables writing
    /// (creating the file), `append` positions writes at the end. `binary`
    /// is accepted for interface compatibility and has no effect here.
    pub fn open(path: &str, writable: bool, append: bool, _binary: bool) -> io::Result<Self> {
        let mut opts = OpenOptions::new();
        if writable {
            opts.write(true).create(true);
            if append {
                opts.append(true);
            } else {
                opts.truncate(true);
            }
        } else {
            opts.read(true);
        }
        Ok(Port::new(PortKind::File(opts.open(path)?)))
    }

    /// Read one byte; `None` at end of input.
    pub fn getc(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pushback.pop() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        let n = match &mut self.kind {
            PortKind::Stdin => io::stdin().read(&mut buf)?,
            PortKind::File(f) => f.read(&mut buf)?,
            PortKind::Bytes(c) => c.read(&mut buf)?,
            PortKind::Stdout | PortKind::Stderr | PortKind::Sink(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "port is not readable",
                ));
            }
            PortKind::Closed => {
                return Err(io::Error::other("port is closed"));
            }
        };
        Ok(if n == 0 { None } else { Some(buf[0]) })
    }

    /// Push one byte back; the next `getc` returns it.
    pub fn ungetc(&mut self, byte: u8) {
        self.pushback.push(byte);
    }

    pub fn putc(&mut self, byte: u8) -> io::Result<()> {
        self.write_all(&[byte])
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match &mut self.kind {
            PortKind::Stdout => {
                let mut out = io::stdout();
                out.write_all(bytes)?;
                out.flush()
            }
            PortKind::Stderr => {
                let mut err = io::stderr();
                err.write_all(bytes)?;
                err.flush()
            }
            PortKind::File(f) => f.write_all(bytes),
            PortKind::Sink(buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
            PortKind::Stdin | PortKind::Bytes(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "port is not writable",
            )),
            PortKind::Closed => Err(io::Error::other("port is closed")),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.kind {
            PortKind::File(f) => f.flush(),
            _ => Ok(()),
        }
    }

    /// Release the underlying resource; further operations fail.
    pub fn close(&mut self) -> io::Result<()> {
        if let PortKind::File(f) = &mut self.kind {
            f.flush()?;
        }
        self.kind = PortKind::Closed;
        Ok(())
    }

    /// Contents accumulated in a sink port, draining it.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        match &mut self.kind {
            PortKind::Sink(buf) => std::mem::take(buf),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_port_getc_and_eof() {
        let mut port = Port::from_str("ab");
        assert_eq!(port.getc().unwrap(), Some(b'a'));
        assert_eq!(port.getc().unwrap(), Some(b'b'));
        assert_eq!(port.getc().unwrap(), None);
    }

    #[test]
    fn test_ungetc_round_trip() {
        let mut port = Port::from_str("x");
        assert_eq!(port.getc().unwrap(), Some(b'x'));
        port.ungetc(b'x');
        assert_eq!(port.getc().unwrap(), Some(b'x'));
        assert_eq!(port.getc().unwrap(), None);
    }

    #[test]
    fn test_sink_collects_writes() {
        let mut port = Port::sink();
        port.write_all(b"hello ").unwrap();
        port.putc(b'!').unwrap();
        assert_eq!(port.take_buffer(), b"hello !");
        assert!(port.take_buffer().is_empty());
    }

    #[test]
    fn test_direction_enforced() {
        let mut source = Port::from_str("a");
        assert!(source.putc(b'x').is_err());
        let mut sink = Port::sink();
        assert!(sink.getc().is_err());
    }

    #[test]
    fn test_closed_port_rejects_io() {
        let mut port = Port::from_str("a");
        port.close().unwrap();
        assert!(port.getc().is_err());
    }
}
