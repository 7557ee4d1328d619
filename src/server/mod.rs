//! Line-framed transport for the dispatcher.
//!
//! Each request is one line of s-expression text and each response is one
//! line back. Lines are framed from raw bytes by [`LineFramer`], so neither an
//! oversize nor a non-UTF-8 line costs more than one `malformed` reply.
//! [`Session`] runs the loop over any blocking reader/writer pair (stdio,
//! tests); [`serve`] accepts TCP connections with tokio and runs one session
//! per connection, each with its own [`Context`].

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::protocol::marshal;
use crate::protocol::{Context, Dispatcher, ErrorCode};
use crate::sexp;

/// Byte-level request framing.
pub mod frame;

pub use frame::{Frame, LineFramer};

/// Tracing target for transport events.
pub(crate) const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// One connection's request loop.
pub struct Session<'a> {
    dispatcher: &'a Dispatcher,
    context: Context,
    max_message_len: usize,
}

impl<'a> Session<'a> {
    /// Start a session with a fresh [`Context`].
    pub fn new(dispatcher: &'a Dispatcher, max_message_len: usize) -> Self {
        Self {
            dispatcher,
            context: Context::new(),
            max_message_len,
        }
    }

    /// The connection's current context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Answer one request line. Returns `None` for blank lines, which get no
    /// reply.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        if line.trim().is_empty() {
            return None;
        }
        if line.len() > self.max_message_len {
            return Some(self.oversize(line.len()));
        }
        Some(self.dispatcher.handle_text(&mut self.context, line))
    }

    /// Answer one framed request.
    pub fn handle_frame(&mut self, frame: Frame) -> Option<String> {
        match frame {
            Frame::Line(line) => self.handle_line(&line),
            Frame::Oversize(size) => Some(self.oversize(size)),
            Frame::NotUtf8 => {
                debug!(target: SERVER_TARGET, "request is not valid UTF-8");
                Some(malformed())
            }
        }
    }

    /// A framer sized for this session's message limit.
    pub fn framer(&self) -> LineFramer {
        LineFramer::new(self.max_message_len)
    }

    fn oversize(&self, size: usize) -> String {
        warn!(
            target: SERVER_TARGET,
            size,
            limit = self.max_message_len,
            "message too large"
        );
        malformed()
    }

    /// Consume requests from `reader` until EOF, writing one response line per
    /// request.
    pub fn run<R: BufRead, W: Write>(&mut self, mut reader: R, mut writer: W) -> io::Result<()> {
        let mut framer = self.framer();
        loop {
            let chunk = reader.fill_buf()?;
            let frame = if chunk.is_empty() {
                match framer.finish() {
                    Some(frame) => frame,
                    None => return Ok(()),
                }
            } else {
                let (used, frame) = framer.feed(chunk);
                reader.consume(used);
                match frame {
                    Some(frame) => frame,
                    None => continue,
                }
            };
            if let Some(response) = self.handle_frame(frame) {
                writer.write_all(response.as_bytes())?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
        }
    }
}

fn malformed() -> String {
    sexp::dump(&marshal::error(ErrorCode::Malformed))
}

/// Accept connections on `listener` until `shutdown` resolves.
///
/// Every connection gets its own task and [`Context`]; requests on one
/// connection are answered in order.
pub async fn serve<F>(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    max_message_len: usize,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()>,
{
    let local = listener.local_addr()?;
    info!(target: SERVER_TARGET, addr = %local, "listening");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(target: SERVER_TARGET, "shutting down listener");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(target: SERVER_TARGET, error = %err, "failed to accept connection");
                        continue;
                    }
                };
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, peer, &dispatcher, max_message_len).await {
                        warn!(target: SERVER_TARGET, peer = %peer, error = %err, "connection error");
                    }
                });
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: &Dispatcher,
    max_message_len: usize,
) -> io::Result<()> {
    use tokio::io::AsyncBufReadExt;

    info!(target: SERVER_TARGET, peer = %peer, "connection opened");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut session = Session::new(dispatcher, max_message_len);
    let mut framer = session.framer();

    loop {
        let chunk = reader.fill_buf().await?;
        let frame = if chunk.is_empty() {
            match framer.finish() {
                Some(frame) => frame,
                None => break,
            }
        } else {
            let (used, frame) = framer.feed(chunk);
            reader.consume(used);
            match frame {
                Some(frame) => frame,
                None => continue,
            }
        };
        if let Some(response) = session.handle_frame(frame) {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    info!(
        target: SERVER_TARGET,
        peer = %peer,
        permission = ?session.context().permission(),
        "connection closed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialTable, UserEntry};
    use crate::protocol::Permission;
    use crate::store::MemoryStore;
    use std::io::Cursor;

    fn dispatcher() -> Dispatcher {
        let store = Arc::new(MemoryStore::new());
        let credentials =
            CredentialTable::new([UserEntry::with_password("bob", "right", Permission::Write)]);
        Dispatcher::new(store.clone(), store, Arc::new(credentials))
    }

    #[test]
    fn session_answers_each_line_in_order() {
        let dispatcher = dispatcher();
        let mut session = Session::new(&dispatcher, 1024);
        let input = "(\"version?\")\n\n(\"auth\" \"bob\" \"right\")\r\n(\"get\" \"client\" \"x\")\n";
        let mut output = Vec::new();

        session.run(Cursor::new(input), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["1", "(2)", r#"("error" "nomatch")"#]);
        assert_eq!(session.context().permission(), Permission::Write);
    }

    #[test]
    fn oversized_lines_are_malformed() {
        let dispatcher = dispatcher();
        let mut session = Session::new(&dispatcher, 8);
        assert_eq!(
            session.handle_line(r#"("version?")"#).as_deref(),
            Some(r#"("error" "malformed")"#)
        );
        assert_eq!(session.handle_line("   "), None);
    }

    #[test]
    fn bad_lines_do_not_end_the_session() {
        let dispatcher = dispatcher();
        let mut session = Session::new(&dispatcher, 16);
        let mut input = b"(\"version?\")\n(\"x\xff\")\n".to_vec();
        input.extend(std::iter::repeat_n(b'(', 100_000));
        input.extend_from_slice(b"\n(\"version?\")\n(((((((((((((((((((((");
        let mut output = Vec::new();

        session.run(Cursor::new(input), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let malformed = r#"("error" "malformed")"#;
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["1", malformed, malformed, "1", malformed]
        );
    }
}
