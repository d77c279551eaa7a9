//! Unix-socket [`EventSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Event`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"SnapHotkey":"Down"}
//! {"WidthHotkey":"right"}
//! {"MoveWindow":"Left"}
//! {"WindowCreated":"0x55d0c1a4e2b0"}
//! {"DisplayChanged":"WorkAreaChange"}
//! "ToggleEditor"
//! {"EditorExit":"Exit"}
//! ```

use crate::event::Event;
use crate::traits::EventSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// An [`EventSource`] that listens on a Unix stream socket for
/// JSON-encoded events.
///
/// Each accepted connection can send multiple newline-delimited events.
/// When the connection closes, the listener waits for the next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UnixSocketListener {
    /// Create a listener for `path`.  The socket is bound by
    /// [`run`](EventSource::run).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse one line off the socket.  Blank lines yield `None` silently.
fn parse_line(text: &str) -> Option<Event> {
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Event>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            error!("bad event {:?}: {}", text, e);
            None
        }
    }
}

impl EventSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the sink is dropped.  Run it on a
    /// dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        // Stale socket from a previous run.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            for line in BufReader::new(stream).lines() {
                let text = match line {
                    Ok(text) => text,
                    Err(e) => {
                        error!("read error: {}", e);
                        break;
                    }
                };
                let Some(event) = parse_line(&text) else {
                    continue;
                };
                debug!("received {:?}", event);
                if sink.send(event).is_err() {
                    info!("sink closed, shutting down");
                    let _ = std::fs::remove_file(&self.path);
                    return Ok(());
                }
            }
            debug!("client disconnected");
        }
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Direction, EditorExitKind, WindowId};
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("hyprzones-test-{}-{}.sock", std::process::id(), id))
    }

    fn spawn_listener(path: &Path) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&path);
            let _ = listener.run(tx);
        });
        std::thread::sleep(Duration::from_millis(150));
        rx
    }

    #[test]
    fn events_arrive_over_socket() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#"{{"SnapHotkey":"Down"}}"#).unwrap();
            writeln!(stream, r#"{{"WindowCreated":"0x2a"}}"#).unwrap();
            writeln!(stream).unwrap();
            writeln!(stream, r#""ToggleEditor""#).unwrap();
            writeln!(stream, r#"{{"EditorExit":"Exit"}}"#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                Event::SnapHotkey(Direction::Down),
                Event::WindowCreated(WindowId(42)),
                Event::ToggleEditor,
                Event::EditorExit(EditorExitKind::Exit),
            ]
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_json_does_not_crash() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, "not json at all").unwrap();
            writeln!(stream, r#"{{"MoveWindow":"sideways"}}"#).unwrap();
            writeln!(stream, r#"{{"MoveWindow":"right"}}"#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(events, vec![Event::MoveWindow(Direction::Right)]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(
            parse_line(r#""VirtualDesktopsUpdated""#),
            Some(Event::VirtualDesktopsUpdated)
        );
    }
}
