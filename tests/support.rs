use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

/// How the test server answers requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerBehavior {
    /// Route /health to 200 and /order to 201; anything else gets 404.
    Responsive,
    /// Respond 500 to everything.
    AlwaysError,
    /// Accept, read, and hold the connection without ever responding.
    Unresponsive,
}

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    requests: Arc<AtomicUsize>,
}

impl ServerHandle {
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a lightweight HTTP server for tests.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_target_server(behavior: ServerBehavior) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let requests = Arc::new(AtomicUsize::new(0));
    let requests_for_thread = Arc::clone(&requests);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let requests = Arc::clone(&requests_for_thread);
                    thread::spawn(move || handle_client(stream, behavior, &requests));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
            requests,
        },
    ))
}

fn handle_client(mut stream: TcpStream, behavior: ServerBehavior, requests: &Arc<AtomicUsize>) {
    drop(stream.set_read_timeout(Some(Duration::from_millis(500))));
    let request = match read_request(&mut stream) {
        Some(request) => request,
        None => return,
    };
    requests.fetch_add(1, Ordering::SeqCst);

    let response = match behavior {
        ServerBehavior::Responsive => route_response(&request),
        ServerBehavior::AlwaysError => {
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 2\r\nConnection: close\r\n\r\nno"
        }
        ServerBehavior::Unresponsive => {
            // Hold the socket past the client's 5s timeout, then drop it.
            thread::sleep(Duration::from_secs(8));
            return;
        }
    };

    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn route_response(request: &str) -> &'static str {
    if request.starts_with("GET /health") {
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 15\r\nConnection: close\r\n\r\n{\"status\":\"ok\"}"
    } else if request.starts_with("POST /order") {
        "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 16\r\nConnection: close\r\n\r\n{\"order_id\":\"t1\"}"
    } else {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    }
}

fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut collected: Vec<u8> = Vec::new();
    let mut buffer = [0u8; 1024];

    // Read at least through the header terminator; the body is irrelevant to
    // routing, so a read timeout simply ends collection.
    loop {
        match stream.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => {
                collected.extend_from_slice(buffer.get(..read)?);
                if collected.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    if collected.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(&collected).into_owned())
}

/// Spawn the server, or skip the test when the sandbox forbids binding.
///
/// # Errors
///
/// Returns an error if the listener binds but cannot be configured.
pub fn spawn_target_server_or_skip(
    behavior: ServerBehavior,
) -> Result<Option<(String, ServerHandle)>, String> {
    match spawn_target_server(behavior) {
        Ok(spawned) => Ok(Some(spawned)),
        Err(err) if err.starts_with("bind test server failed") => {
            eprintln!("skipping test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Run the `stampede` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_stampede<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = stampede_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .map_err(|err| format!("run stampede failed: {}", err))
}

fn stampede_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_stampede").map_or_else(
        || Err("CARGO_BIN_EXE_stampede missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

/// Extract the numeric value following `label` in the report output.
///
/// # Errors
///
/// Returns an error if the label is missing or the value does not parse.
pub fn report_value(stdout: &str, label: &str) -> Result<u64, String> {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .ok_or_else(|| format!("report line '{}' missing in: {}", label, stdout))?;
    let value = line
        .trim_start()
        .trim_start_matches(label)
        .trim()
        .split_whitespace()
        .next()
        .ok_or_else(|| format!("no value after '{}'", label))?;
    value
        .parse::<u64>()
        .map_err(|err| format!("value after '{}' not numeric: {}", label, err))
}
