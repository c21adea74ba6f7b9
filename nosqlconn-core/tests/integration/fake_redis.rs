//! Minimal RESP server for adapter tests
//!
//! Accepts connections on an ephemeral localhost port, records every command
//! it receives and answers with a caller-supplied handler.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use nosqlconn_core::HostAndPort;

/// Handler mapping a command (upper-cased name first) to a raw RESP reply
pub type Handler = dyn Fn(&[String]) -> Vec<u8> + Send + Sync;

pub struct FakeRedis {
    port: u16,
    commands: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeRedis {
    /// Starts the server; it serves until the test process exits
    pub fn start(handler: impl Fn(&[String]) -> Vec<u8> + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
        let port = listener.local_addr().expect("local addr").port();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let log = Arc::clone(&commands);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let log = Arc::clone(&log);
                let handler = Arc::clone(&handler);
                thread::spawn(move || serve(stream, &log, handler.as_ref()));
            }
        });

        Self { port, commands }
    }

    pub fn host(&self) -> HostAndPort {
        HostAndPort::localhost(self.port)
    }

    /// Commands received so far, across all connections
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.commands.lock().expect("command log").clone()
    }
}

fn serve(stream: TcpStream, log: &Mutex<Vec<Vec<String>>>, handler: &Handler) {
    let mut writer = stream.try_clone().expect("clone stream");
    let mut reader = BufReader::new(stream);

    while let Some(mut command) = read_command(&mut reader) {
        if let Some(name) = command.first_mut() {
            *name = name.to_uppercase();
        }
        log.lock().expect("command log").push(command.clone());
        if writer.write_all(&handler(&command)).is_err() {
            return;
        }
    }
}

fn read_line(reader: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches("\r\n").to_string()),
    }
}

fn read_command(reader: &mut impl BufRead) -> Option<Vec<String>> {
    let header = read_line(reader)?;
    let count: usize = header.strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let len: usize = read_line(reader)?.strip_prefix('$')?.parse().ok()?;
        let mut data = vec![0u8; len + 2];
        reader.read_exact(&mut data).ok()?;
        data.truncate(len);
        args.push(String::from_utf8(data).ok()?);
    }
    Some(args)
}

// ============================================================================
// Reply builders
// ============================================================================

pub fn simple(text: &str) -> Vec<u8> {
    format!("+{text}\r\n").into_bytes()
}

pub fn error(text: &str) -> Vec<u8> {
    format!("-{text}\r\n").into_bytes()
}

pub fn bulk(text: &str) -> Vec<u8> {
    format!("${}\r\n{text}\r\n", text.len()).into_bytes()
}

pub fn array(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Flat key/value array, the shape of `SENTINEL MASTERS` entries
pub fn fields(pairs: &[(&str, &str)]) -> Vec<u8> {
    let items: Vec<Vec<u8>> = pairs
        .iter()
        .flat_map(|(key, value)| [bulk(key), bulk(value)])
        .collect();
    array(&items)
}
