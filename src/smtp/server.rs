//! Accept loop and per-connection session driver

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::Config;
use crate::smtp::commands::CommandHandler;
use crate::smtp::error::SmtpError;
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::SmtpSession;
use crate::smtp::store::MailboxStore;

/// SMTP server: accepts connections and runs one session per connection
/// on its own thread.
#[derive(Debug, Clone)]
pub struct SmtpServer {
    config: Arc<Config>,
    store: Arc<MailboxStore>,
}

/// Decrements the active-session count when a session thread finishes,
/// however it finishes.
struct ConnectionPermit(Arc<AtomicUsize>);

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SmtpServer {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(MailboxStore::new(config.mailbox_root.clone()));
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Bind the configured address and serve until the process exits.
    /// A bind failure is fatal and returned to the caller.
    pub fn start(&self) -> Result<(), SmtpError> {
        let listener = TcpListener::bind(&self.config.listen).map_err(|source| SmtpError::Bind {
            addr: self.config.listen.clone(),
            source,
        })?;
        self.start_with_listener(listener)
    }

    /// Serve on an existing listener (blocking). Used directly by tests
    /// that bind port 0 themselves.
    pub fn start_with_listener(&self, listener: TcpListener) -> Result<(), SmtpError> {
        info!("SMTP server listening on {}", listener.local_addr()?);

        let active = Arc::new(AtomicUsize::new(0));
        for stream in listener.incoming() {
            match stream {
                Ok(mut stream) => {
                    let cap = self.config.max_connections;
                    if cap > 0 && active.load(Ordering::SeqCst) >= cap {
                        warn!("rejecting connection: {cap} sessions already active");
                        let _ = stream.write_all(
                            SmtpResponse::too_many_connections().format().as_bytes(),
                        );
                        continue;
                    }

                    active.fetch_add(1, Ordering::SeqCst);
                    let permit = ConnectionPermit(Arc::clone(&active));
                    let config = Arc::clone(&self.config);
                    let store = Arc::clone(&self.store);
                    thread::spawn(move || {
                        let _permit = permit;
                        let peer = stream
                            .peer_addr()
                            .map(|a| a.to_string())
                            .unwrap_or_else(|_| "<unknown>".to_owned());
                        if let Err(e) = handle_client(stream, &config, &store) {
                            error!("session with {peer} ended with error: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {e}");
                }
            }
        }

        Ok(())
    }
}

/// Run one session: greeting, then the command/data line loop until QUIT,
/// peer disconnect, idle timeout or an I/O error.
fn handle_client(
    mut stream: TcpStream,
    config: &Config,
    store: &MailboxStore,
) -> Result<(), SmtpError> {
    if config.idle_timeout > 0 {
        stream.set_read_timeout(Some(Duration::from_secs(config.idle_timeout)))?;
    }

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut session = SmtpSession::new();
    let handler = CommandHandler::new(&config.accepted_domain);

    send_response(&mut stream, SmtpResponse::greeting())?;

    let mut line_buffer = Vec::new();
    loop {
        line_buffer.clear();
        match reader.read_until(b'\n', &mut line_buffer) {
            Ok(0) => break, // peer closed the connection, no reply owed
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                info!("dropping idle connection");
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let raw = String::from_utf8_lossy(&line_buffer);
        let line = trim_line_ending(&raw);

        if session.in_data_mode() {
            if line == "." {
                let response = finish_message(&mut session, store);
                send_response(&mut stream, response)?;
            } else {
                session.push_body_line(line);
            }
            continue;
        }

        let response = handler.handle(line, &mut session);
        send_response(&mut stream, response)?;
        if response.code == 221 {
            break;
        }
    }

    Ok(())
}

/// Persist the buffered message and map the outcome to a reply. The
/// envelope is cleared afterwards either way, so the next message on this
/// connection starts empty.
fn finish_message(session: &mut SmtpSession, store: &MailboxStore) -> SmtpResponse {
    let response = match session.recipient.as_deref() {
        None => SmtpResponse::no_recipient(),
        Some(recipient) => {
            match store.persist(session.sender.as_deref(), recipient, &session.body_text()) {
                Ok(_) => SmtpResponse::ok(),
                Err(e) => {
                    error!("failed to persist message for {recipient}: {e}");
                    SmtpResponse::storage_failed()
                }
            }
        }
    };
    session.reset();
    response
}

/// Strip one trailing LF and at most one CR before it. Leading whitespace
/// is significant: it makes a command unrecognized and a data line body
/// content rather than the sentinel.
fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Write one reply and flush, so the peer observes it before the next
/// line is read.
fn send_response(stream: &mut TcpStream, response: SmtpResponse) -> Result<(), SmtpError> {
    stream.write_all(response.format().as_bytes())?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn start_test_server(tweak: impl FnOnce(&mut Config)) -> (String, TempDir) {
        let mailbox = TempDir::new().unwrap();
        let mut config = Config {
            mailbox_root: mailbox.path().to_path_buf(),
            accepted_domain: "@hk.com".to_owned(),
            ..Config::default()
        };
        tweak(&mut config);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = SmtpServer::new(config);
        thread::spawn(move || {
            if let Err(e) = server.start_with_listener(listener) {
                eprintln!("Error running server: {e}");
            }
        });

        (addr, mailbox)
    }

    fn connect(addr: &str) -> (TcpStream, BufReader<TcpStream>) {
        let stream = TcpStream::connect(addr).unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut greeting = String::new();
        reader.read_line(&mut greeting).unwrap();
        assert_eq!(greeting, "220 Simple SMTP Server Ready\r\n");
        (stream, reader)
    }

    fn send_command(
        stream: &mut TcpStream,
        reader: &mut BufReader<TcpStream>,
        command: &str,
    ) -> String {
        write!(stream, "{command}\r\n").unwrap();
        stream.flush().unwrap();
        let mut response = String::new();
        reader.read_line(&mut response).unwrap();
        response.trim_end().to_string()
    }

    #[test]
    fn test_complete_smtp_session() {
        let (addr, mailbox) = start_test_server(|_| {});
        let (mut stream, mut reader) = connect(&addr);

        assert_eq!(send_command(&mut stream, &mut reader, "HELO x"), "250 Hello");
        assert_eq!(
            send_command(&mut stream, &mut reader, "MAIL FROM:<me@hk.com>"),
            "250 OK"
        );
        assert_eq!(
            send_command(&mut stream, &mut reader, "RCPT TO:<you@hk.com>"),
            "250 OK"
        );
        assert_eq!(
            send_command(&mut stream, &mut reader, "DATA"),
            "354 End data with <CR><LF>.<CR><LF>"
        );

        write!(stream, "Subject: hi\r\n").unwrap();
        stream.flush().unwrap();
        assert_eq!(send_command(&mut stream, &mut reader, "."), "250 OK");
        assert_eq!(send_command(&mut stream, &mut reader, "QUIT"), "221 Bye");

        let dir = mailbox.path().join("you@hk.com");
        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let content = fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
        assert!(content.starts_with("From: me@hk.com\r\nTo: you@hk.com\r\nDate: "));
        assert!(content.ends_with("\r\n\r\nSubject: hi\r\n"));
    }

    #[test]
    fn test_connection_cap_rejects_with_421() {
        let (addr, _mailbox) = start_test_server(|c| c.max_connections = 1);

        // First connection occupies the only slot.
        let (mut first, mut first_reader) = connect(&addr);

        // Second connection is turned away before any session starts.
        let second = TcpStream::connect(&addr).unwrap();
        let mut reader = BufReader::new(second);
        let mut response = String::new();
        reader.read_line(&mut response).unwrap();
        assert_eq!(response, "421 Too many connections\r\n");

        // Releasing the slot lets a later connection in.
        assert_eq!(send_command(&mut first, &mut first_reader, "QUIT"), "221 Bye");
        for attempt in 0.. {
            let stream = TcpStream::connect(&addr).unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line.starts_with("220") {
                break;
            }
            assert!(attempt < 50, "slot was never released");
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_idle_connection_is_dropped() {
        let (addr, _mailbox) = start_test_server(|c| c.idle_timeout = 1);
        let (stream, mut reader) = connect(&addr);

        // Send nothing; the server must hang up after the deadline.
        let mut line = String::new();
        let n = reader.read_line(&mut line).unwrap();
        assert_eq!(n, 0, "expected EOF, got {line:?}");
        drop(stream);
    }
}
