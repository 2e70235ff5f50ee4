//! SMTP reply lines

/// A single SMTP reply line sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmtpResponse {
    /// The SMTP reply code (e.g., 250, 354, 500)
    pub code: u16,
    /// The human-readable message
    pub message: &'static str,
}

impl SmtpResponse {
    pub const fn new(code: u16, message: &'static str) -> Self {
        Self { code, message }
    }

    /// Unsolicited greeting sent on connect (220)
    pub const fn greeting() -> Self {
        Self::new(220, "Simple SMTP Server Ready")
    }

    /// Reply to HELO/EHLO (250)
    pub const fn hello() -> Self {
        Self::new(250, "Hello")
    }

    /// Generic success reply (250 OK)
    pub const fn ok() -> Self {
        Self::new(250, "OK")
    }

    /// Intermediate reply to DATA (354)
    pub const fn data_start() -> Self {
        Self::new(354, "End data with <CR><LF>.<CR><LF>")
    }

    /// Farewell reply to QUIT (221)
    pub const fn quit() -> Self {
        Self::new(221, "Bye")
    }

    /// Reply to anything that is not a known command (500)
    pub const fn unrecognized() -> Self {
        Self::new(500, "Unrecognized command")
    }

    /// RCPT TO rejection for addresses outside the accepted domain (550)
    pub const fn unsupported_domain() -> Self {
        Self::new(550, "Unsupported recipient domain")
    }

    /// Data sentinel reached with no recipient on the envelope (554)
    pub const fn no_recipient() -> Self {
        Self::new(554, "No valid recipient")
    }

    /// Persistence failed after the data sentinel (451)
    pub const fn storage_failed() -> Self {
        Self::new(451, "Local error in processing")
    }

    /// Connection rejected because the session cap is reached (421)
    pub const fn too_many_connections() -> Self {
        Self::new(421, "Too many connections")
    }

    /// Format the reply for the wire, CRLF-terminated.
    pub fn format(&self) -> String {
        format!("{} {}\r\n", self.code, self.message)
    }

    /// Whether this is a success or intermediate reply (2xx/3xx).
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(SmtpResponse::ok().format(), "250 OK\r\n");
        assert_eq!(SmtpResponse::greeting().format(), "220 Simple SMTP Server Ready\r\n");
        assert_eq!(
            SmtpResponse::data_start().format(),
            "354 End data with <CR><LF>.<CR><LF>\r\n"
        );
    }

    #[test]
    fn test_reply_codes() {
        assert_eq!(SmtpResponse::hello().code, 250);
        assert_eq!(SmtpResponse::quit().code, 221);
        assert_eq!(SmtpResponse::unrecognized().code, 500);
        assert_eq!(SmtpResponse::unsupported_domain().code, 550);
        assert_eq!(SmtpResponse::no_recipient().code, 554);
        assert_eq!(SmtpResponse::storage_failed().code, 451);
        assert_eq!(SmtpResponse::too_many_connections().code, 421);
    }

    #[test]
    fn test_is_success() {
        assert!(SmtpResponse::ok().is_success());
        assert!(SmtpResponse::data_start().is_success());
        assert!(!SmtpResponse::unrecognized().is_success());
        assert!(!SmtpResponse::storage_failed().is_success());
    }
}
