//! Unix domain socket request/response channel
//!
//! Lets another process call into a running command without spawning a new
//! binary. Each connection carries exactly one exchange: the client writes
//! one newline-terminated JSON request, the server answers with one JSON
//! reply line and closes the connection.

use crate::error::{MulticallError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Largest accepted request or reply line
const MAX_MESSAGE_LEN: u64 = 1024 * 1024;

/// Serves one request type
pub trait Handler {
    type Arg: DeserializeOwned;
    type Reply: Serialize;

    fn handle(&self, arg: Self::Arg) -> Self::Reply;
}

/// Listener dispatching each connection to a [`Handler`]
pub struct UnixRpcServer<H> {
    listener: UnixListener,
    path: PathBuf,
    handler: H,
}

impl<H: Handler> UnixRpcServer<H> {
    /// Bind `path`, replacing a stale socket left by an earlier server
    pub fn bind(path: impl Into<PathBuf>, handler: H) -> Result<Self> {
        let path = path.into();

        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Removed stale socket: {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(MulticallError::file_system("remove", &path, e)),
        }

        let listener = UnixListener::bind(&path)
            .map_err(|e| MulticallError::rpc("listen", &path, e))?;
        info!(path = %path.display(), "RPC server listening");

        Ok(Self {
            listener,
            path,
            handler,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept and answer a single connection
    pub fn serve_one(&self) -> Result<()> {
        let (stream, _addr) = self
            .listener
            .accept()
            .map_err(|e| MulticallError::rpc("accept", &self.path, e))?;
        self.handle_conn(&stream)
    }

    /// Answer connections forever; failed exchanges are logged and skipped
    pub fn run(&self) -> ! {
        loop {
            if let Err(e) = self.serve_one() {
                warn!("RPC exchange failed: {}", e);
            }
        }
    }

    fn handle_conn(&self, stream: &UnixStream) -> Result<()> {
        let arg: H::Arg = read_message(stream, &self.path, "read arg")?;
        let reply = self.handler.handle(arg);
        write_message(stream, &reply, &self.path, "write result")
    }
}

impl<H> Drop for UnixRpcServer<H> {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Send one request to the server at `path` and wait for its reply
pub fn call<A, R>(path: impl AsRef<Path>, arg: &A) -> Result<R>
where
    A: Serialize,
    R: DeserializeOwned,
{
    let path = path.as_ref();
    let stream =
        UnixStream::connect(path).map_err(|e| MulticallError::rpc("dial unix", path, e))?;

    write_message(&stream, arg, path, "write arg")?;
    read_message(&stream, path, "read result")
}

fn write_message<T: Serialize>(
    mut stream: &UnixStream,
    message: &T,
    path: &Path,
    what: &str,
) -> Result<()> {
    let mut json = serde_json::to_string(message).map_err(|e| MulticallError::rpc(what, path, e))?;
    json.push('\n');
    stream
        .write_all(json.as_bytes())
        .and_then(|()| stream.flush())
        .map_err(|e| MulticallError::rpc(what, path, e))
}

fn read_message<T: DeserializeOwned>(stream: &UnixStream, path: &Path, what: &str) -> Result<T> {
    let mut line = String::new();
    BufReader::new(stream.take(MAX_MESSAGE_LEN))
        .read_line(&mut line)
        .map_err(|e| MulticallError::rpc(what, path, e))?;

    if line.trim().is_empty() {
        return Err(MulticallError::Rpc {
            message: format!("{what}: connection closed without a message"),
            path: path.to_path_buf(),
            source: None,
        });
    }
    serde_json::from_str(&line).map_err(|e| MulticallError::rpc(what, path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::thread;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize)]
    struct Arg {
        name: String,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Reply {
        len: usize,
    }

    struct LengthHandler;

    impl Handler for LengthHandler {
        type Arg = Arg;
        type Reply = Reply;

        fn handle(&self, arg: Arg) -> Reply {
            Reply {
                len: arg.name.len(),
            }
        }
    }

    #[test]
    fn test_call_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let socket = temp_dir.path().join("rpc.sock");

        let server = UnixRpcServer::bind(&socket, LengthHandler).unwrap();
        let handle = thread::spawn(move || {
            server.serve_one().unwrap();
            server.serve_one().unwrap();
        });

        let reply: Reply = call(&socket, &Arg { name: "hello".into() }).unwrap();
        assert_eq!(reply, Reply { len: 5 });
        let reply: Reply = call(&socket, &Arg { name: String::new() }).unwrap();
        assert_eq!(reply, Reply { len: 0 });

        handle.join().unwrap();
        assert!(!socket.exists());
    }

    #[test]
    fn test_bind_replaces_stale_socket() {
        let temp_dir = TempDir::new().unwrap();
        let socket = temp_dir.path().join("stale.sock");
        std::fs::write(&socket, "").unwrap();

        let server = UnixRpcServer::bind(&socket, LengthHandler).unwrap();
        assert_eq!(server.path(), socket.as_path());
    }

    #[test]
    fn test_malformed_request() {
        let temp_dir = TempDir::new().unwrap();
        let socket = temp_dir.path().join("bad.sock");

        let server = UnixRpcServer::bind(&socket, LengthHandler).unwrap();
        let handle = thread::spawn(move || server.serve_one());

        let mut stream = UnixStream::connect(&socket).unwrap();
        stream.write_all(b"not json\n").unwrap();

        let result = handle.join().unwrap();
        assert!(matches!(result, Err(MulticallError::Rpc { .. })));

        let mut rest = String::new();
        stream.read_to_string(&mut rest).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn test_call_without_server() {
        let temp_dir = TempDir::new().unwrap();
        let result: Result<Reply> = call(temp_dir.path().join("missing.sock"), &Arg {
            name: "x".into(),
        });
        assert!(matches!(result, Err(MulticallError::Rpc { .. })));
    }
}
