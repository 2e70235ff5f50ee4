//! SMTP session state management

/// Which input mode a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Reading protocol commands line by line
    Command,
    /// Buffering message body lines until the `.` sentinel
    Data,
}

/// Envelope state for a single connection.
///
/// One message submission collects a sender, a recipient and the body
/// lines. The envelope is exclusively owned by its connection and is
/// cleared as a whole after every completed data phase, so a later message
/// on the same connection starts empty.
#[derive(Debug)]
pub struct SmtpSession {
    /// Sender address from MAIL FROM, never validated
    pub sender: Option<String>,
    /// Recipient address from an accepted RCPT TO
    pub recipient: Option<String>,
    /// Body lines collected in data mode, stored without line endings
    pub body_lines: Vec<String>,
    /// Current input mode
    pub mode: SessionMode,
}

impl SmtpSession {
    /// Create an empty session in command mode.
    pub fn new() -> Self {
        Self {
            sender: None,
            recipient: None,
            body_lines: Vec::new(),
            mode: SessionMode::Command,
        }
    }

    /// Set the sender address. A repeated MAIL FROM overwrites the
    /// previous value without error.
    pub fn set_sender(&mut self, addr: String) {
        self.sender = Some(addr);
    }

    /// Set the recipient address. Only called for addresses that passed
    /// the accepted-domain check.
    pub fn set_recipient(&mut self, addr: String) {
        self.recipient = Some(addr);
    }

    /// Switch to data mode. The envelope is not required to be complete.
    pub fn enter_data_mode(&mut self) {
        self.mode = SessionMode::Data;
    }

    pub fn in_data_mode(&self) -> bool {
        self.mode == SessionMode::Data
    }

    /// Buffer one body line, stored verbatim.
    pub fn push_body_line(&mut self, line: &str) {
        self.body_lines.push(line.to_owned());
    }

    /// Body text as it will be persisted: every buffered line terminated
    /// with CRLF.
    pub fn body_text(&self) -> String {
        let mut text = String::with_capacity(self.body_lines.iter().map(|l| l.len() + 2).sum());
        for line in &self.body_lines {
            text.push_str(line);
            text.push_str("\r\n");
        }
        text
    }

    /// Clear the whole envelope and return to command mode.
    pub fn reset(&mut self) {
        self.sender = None;
        self.recipient = None;
        self.body_lines.clear();
        self.mode = SessionMode::Command;
    }
}

impl Default for SmtpSession {
    fn default() -> Self {
        Self::new()
    }
}
