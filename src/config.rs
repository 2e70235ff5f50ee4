//! Runtime configuration

use std::path::PathBuf;

use clap::Parser;

/// Everything tunable about the server, resolved once at startup and passed
/// to [`SmtpServer`](crate::SmtpServer) at construction.
///
/// Parsed from the command line in the binary; tests and embedding code can
/// build it directly via [`Default`] and struct update syntax.
#[derive(Debug, Clone, Parser)]
#[command(name = "hakomail", version, about = "SMTP server that files mail into per-recipient directories")]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:2525")]
    pub listen: String,

    /// Domain suffix accepted for recipients, e.g. "@hk.com"
    #[arg(long = "domain", default_value = "@hk.com")]
    pub accepted_domain: String,

    /// Root directory messages are stored under
    #[arg(long, default_value = "mailbox")]
    pub mailbox_root: PathBuf,

    /// Maximum number of simultaneous connections, 0 for unlimited
    #[arg(long, default_value_t = 64)]
    pub max_connections: usize,

    /// Seconds a connection may sit idle before it is dropped, 0 to disable
    #[arg(long, default_value_t = 300)]
    pub idle_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:2525".to_owned(),
            accepted_domain: "@hk.com".to_owned(),
            mailbox_root: PathBuf::from("mailbox"),
            max_connections: 64,
            idle_timeout: 300,
        }
    }
}
