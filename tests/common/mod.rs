//! Purpose: Loopback stand-in for a bulletin board gateway speaking the v0 JSON protocol.
//! Exports: `FakeBoard`, `Recorded`, `TestResult`.
//! Role: Shared by integration tests that drive `GatewayTransport` or the CLI.
//! Invariants: Answers exactly the scripted responses, in order, one per connection.
//! Invariants: Stops accepting after a bounded wait so failing tests do not hang.
#![allow(dead_code)]

use serde_json::Value;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{JoinHandle, sleep};
use std::time::{Duration, Instant};

pub type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

const ACCEPT_WINDOW: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub struct FakeBoard {
    addr: SocketAddr,
    recorded: Arc<Mutex<Vec<Recorded>>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeBoard {
    /// Serves `(status, body)` pairs to successive requests.
    pub fn start(responses: Vec<(u16, Value)>) -> TestResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&recorded);
        let handle = std::thread::spawn(move || serve(listener, responses, sink));
        Ok(Self {
            addr,
            recorded,
            handle: Some(handle),
        })
    }

    /// `host:port`, as a user would pass to `--addr` or `BB_GATEWAY_ADDR`.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Waits for the scripted exchange to finish and returns what was received.
    pub fn finish(mut self) -> Vec<Recorded> {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.recorded
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

fn serve(listener: TcpListener, responses: Vec<(u16, Value)>, sink: Arc<Mutex<Vec<Recorded>>>) {
    let deadline = Instant::now() + ACCEPT_WINDOW;
    for (status, body) in responses {
        let stream = loop {
            match listener.accept() {
                Ok((stream, _)) => break stream,
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() > deadline {
                        return;
                    }
                    sleep(Duration::from_millis(10));
                }
                Err(_) => return,
            }
        };
        let Ok(request) = exchange(stream, status, &body) else {
            return;
        };
        sink.lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(request);
    }
}

fn exchange(stream: TcpStream, status: u16, body: &Value) -> std::io::Result<Recorded> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(ACCEPT_WINDOW))?;
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((key, value)) = header.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }
    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload)?;

    let text = body.to_string();
    let reason = if status < 400 { "OK" } else { "Error" };
    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{text}",
        text.len()
    )?;
    stream.flush()?;

    Ok(Recorded {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&payload).into_owned(),
    })
}
