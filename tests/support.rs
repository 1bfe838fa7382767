use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const HEALTH_PATH: &str = "/status/200";

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a lightweight HTTP server for tests. The health path answers
/// `health_status`; every other path answers `load_status` with body `ok`.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server(
    health_status: u16,
    load_status: u16,
) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || handle_client(stream, health_status, load_status));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
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
        },
    ))
}

fn handle_client(mut stream: TcpStream, health_status: u16, load_status: u16) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let mut buffer = [0u8; 2048];
    let Ok(read) = stream.read(&mut buffer) else {
        return;
    };
    let request = String::from_utf8_lossy(buffer.get(..read).unwrap_or_default());
    let path = request.split_whitespace().nth(1).unwrap_or("/");
    let status = if path == HEALTH_PATH {
        health_status
    } else {
        load_status
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        status,
        reason(status)
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

const fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Run the `rampload` binary inside `dir` and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_rampload<I, S>(dir: &Path, args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = rampload_bin()?;
    Command::new(bin)
        .args(args)
        .current_dir(dir)
        .env_remove("BASE_URL")
        .env("RAMPLOAD_LOG", "error")
        .output()
        .map_err(|err| format!("run rampload failed: {}", err))
}

fn rampload_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_rampload").map_or_else(
        || Err("CARGO_BIN_EXE_rampload missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

/// Short ramp used by the CLI tests: about two seconds of load.
#[must_use]
pub fn short_run_args(url: String) -> Vec<String> {
    [
        "-u", "", "-e", "/get", "-e", "/headers", "-s", "1s:2", "-s", "1s:0", "--think-min",
        "50ms", "--think-max", "100ms", "--tick", "50ms", "--grace", "2s", "--seed", "7",
        "--no-color",
    ]
    .iter()
    .enumerate()
    .map(|(idx, arg)| if idx == 1 { url.clone() } else { (*arg).to_owned() })
    .collect()
}
