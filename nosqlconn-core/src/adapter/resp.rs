//! Minimal RESP codec for the Redis-compatible probe.

use std::io::{self, BufRead, Read};

/// Largest bulk string accepted, Redis's default `proto-max-bulk-len`
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Longest header line accepted (type byte, length or simple string)
const MAX_LINE_LEN: usize = 64 * 1024;

/// Deepest array nesting accepted
const MAX_DEPTH: usize = 32;

/// RESP value types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Simple string (`+OK`)
    SimpleString(String),
    /// Error (`-ERR message`)
    Error(String),
    /// Integer (`:1000`)
    Integer(i64),
    /// Bulk string (`$6\r\nfoobar`)
    BulkString(Vec<u8>),
    /// Null bulk string or array
    Null,
    /// Array (`*2`)
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Simple or bulk string contents
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::SimpleString(s) => Some(s),
            Self::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Array elements
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up `key` in a flat `[k1, v1, k2, v2, ...]` array as returned by
    /// `SENTINEL MASTERS`
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.as_array()?
            .chunks_exact(2)
            .find(|pair| pair[0].as_str() == Some(key))
            .and_then(|pair| pair[1].as_str())
    }
}

/// Encodes a command as a RESP array of bulk strings
#[must_use]
pub fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + args.iter().map(|a| a.len() + 16).sum::<usize>());
    buf.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        buf.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.extend_from_slice(arg.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

/// Streaming RESP decoder
pub(crate) struct RespReader<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> RespReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::with_capacity(128),
        }
    }

    /// Mutable access to the wrapped reader
    pub(crate) fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Reads the next value from the stream
    pub(crate) fn read_value(&mut self) -> io::Result<RespValue> {
        self.read_nested(0)
    }

    fn read_nested(&mut self, depth: usize) -> io::Result<RespValue> {
        self.read_header()?;

        let line = self.line.trim_end_matches(['\r', '\n']);
        let Some(type_byte) = line.bytes().next() else {
            return Err(invalid_data("Empty RESP line"));
        };
        let content = line.get(1..).unwrap_or_default();

        match type_byte {
            b'+' => Ok(RespValue::SimpleString(content.to_string())),
            b'-' => Ok(RespValue::Error(content.to_string())),
            b':' => content
                .parse()
                .map(RespValue::Integer)
                .map_err(|_| invalid_data("Invalid integer")),
            b'$' => {
                let len: i64 = content
                    .parse()
                    .map_err(|_| invalid_data("Invalid bulk string length"))?;
                let Ok(len) = usize::try_from(len) else {
                    return Ok(RespValue::Null);
                };
                if len > MAX_BULK_LEN {
                    return Err(invalid_data("Bulk string too large"));
                }
                self.read_bulk(len).map(RespValue::BulkString)
            }
            b'*' => {
                let count: i64 = content
                    .parse()
                    .map_err(|_| invalid_data("Invalid array length"))?;
                let Ok(count) = usize::try_from(count) else {
                    return Ok(RespValue::Null);
                };
                if depth >= MAX_DEPTH {
                    return Err(invalid_data("Array nesting too deep"));
                }
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.read_nested(depth + 1)?);
                }
                Ok(RespValue::Array(items))
            }
            other => Err(invalid_data(&format!(
                "Invalid RESP type byte: {}",
                char::from(other)
            ))),
        }
    }

    /// Reads one `\n`-terminated header line into `self.line`
    fn read_header(&mut self) -> io::Result<()> {
        self.line.clear();
        let limit = MAX_LINE_LEN as u64 + 1;
        let read = (&mut self.reader).take(limit).read_line(&mut self.line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Connection closed",
            ));
        }
        if !self.line.ends_with('\n') {
            return Err(if read > MAX_LINE_LEN {
                invalid_data("RESP line too long")
            } else {
                io::Error::new(io::ErrorKind::UnexpectedEof, "Connection closed")
            });
        }
        Ok(())
    }

    /// Reads `len` payload bytes and the trailing CRLF
    fn read_bulk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(len.min(64 * 1024));
        let expected = len as u64 + 2;
        let read = (&mut self.reader).take(expected).read_to_end(&mut data)?;
        if read as u64 != expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Truncated bulk string",
            ));
        }
        data.truncate(len);
        Ok(data)
    }
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}
