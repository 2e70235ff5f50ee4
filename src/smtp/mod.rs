//! SMTP server implementation

pub mod commands;
pub mod error;
pub mod response;
pub mod server;
pub mod session;
pub mod store;

pub use commands::CommandHandler;
pub use error::SmtpError;
pub use response::SmtpResponse;
pub use server::SmtpServer;
pub use session::{SessionMode, SmtpSession};
pub use store::MailboxStore;
