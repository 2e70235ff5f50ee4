//! # hakomail
//!
//! hakomail is a small SMTP server that files each submitted message into a
//! per-recipient directory as a standalone `.eml` file.
//!
//! It speaks just enough of the protocol for a mail client to hand over one
//! message per transaction: greeting, envelope commands, a data phase ended
//! by the lone-dot sentinel, and `QUIT`. Recipients are accepted only when
//! their address ends with the configured domain suffix; everything else is
//! rejected at `RCPT TO` time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hakomail::{Config, SmtpServer};
//!
//! let config = Config::default();
//! std::fs::create_dir_all(&config.mailbox_root).unwrap();
//!
//! let server = SmtpServer::new(config);
//! server.start().unwrap(); // blocks, serving connections
//! ```
//!
//! Messages land under `<mailbox_root>/<recipient>/mail_<timestamp>_<n>.eml`
//! with `From:`, `To:` and `Date:` headers followed by the body as received.
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - greet the server (the peer name is ignored)
//! - `MAIL FROM` - declare the sender address
//! - `RCPT TO` - declare the recipient (must match the accepted domain)
//! - `DATA` - submit the message body, terminated by a lone `.` line
//! - `QUIT` - close the connection
//!
//! ## Behaviour notes
//!
//! - Command verbs are matched case-sensitively on the literal prefix of
//!   the line; `helo` or a verb preceded by whitespace is unrecognized.
//! - The sender address is never validated, and a repeated `MAIL FROM`
//!   simply overwrites it. The recipient check is a raw suffix comparison
//!   against the accepted domain.
//! - The envelope is cleared after every completed data phase; a second
//!   message on the same connection starts from scratch.
//! - A storage failure is reported to the client as `451`, never
//!   acknowledged as success.
//!
//! ## Notes
//!
//! - SMTP authentication is not supported.
//! - SSL/TLS connection is not supported.
//! - Mail relay is not supported.
//! - One recipient per message; there is no queueing or retry.

mod config;
mod smtp;

pub use config::Config;
pub use smtp::{
    CommandHandler, MailboxStore, SessionMode, SmtpError, SmtpResponse, SmtpServer, SmtpSession,
};
