//! Command-mode dispatch

use crate::smtp::response::SmtpResponse;
use crate::smtp::session::SmtpSession;

/// Dispatches command-mode lines and applies their envelope effects.
///
/// Verbs are matched on the literal prefix of the raw line, case-sensitive:
/// a lowercase verb or one preceded by whitespace is not a command. `DATA`
/// and `QUIT` must be the entire line.
#[derive(Debug)]
pub struct CommandHandler {
    accepted_domain: String,
}

impl CommandHandler {
    /// Create a handler accepting recipients whose address ends with
    /// `accepted_domain`.
    pub fn new(accepted_domain: &str) -> Self {
        Self {
            accepted_domain: accepted_domain.to_owned(),
        }
    }

    /// Process one command line and return the reply to send.
    ///
    /// Mode transitions (`DATA`) are applied to the session here; the
    /// caller closes the connection when it sees the 221 reply.
    pub fn handle(&self, line: &str, session: &mut SmtpSession) -> SmtpResponse {
        if line.starts_with("HELO") || line.starts_with("EHLO") {
            // The peer name, if any, plays no part in routing.
            SmtpResponse::hello()
        } else if let Some(rest) = line.strip_prefix("MAIL FROM:") {
            session.set_sender(extract_address(rest));
            SmtpResponse::ok()
        } else if let Some(rest) = line.strip_prefix("RCPT TO:") {
            let addr = extract_address(rest);
            if addr.ends_with(&self.accepted_domain) {
                session.set_recipient(addr);
                SmtpResponse::ok()
            } else {
                SmtpResponse::unsupported_domain()
            }
        } else if line == "DATA" {
            session.enter_data_mode();
            SmtpResponse::data_start()
        } else if line == "QUIT" {
            SmtpResponse::quit()
        } else {
            SmtpResponse::unrecognized()
        }
    }
}

/// Remove every angle bracket from the argument, then trim surrounding
/// whitespace. No further validation of the address.
fn extract_address(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c != '<' && c != '>')
        .collect::<String>()
        .trim()
        .to_owned()
}
