//! Message persistence

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use log::info;

use crate::smtp::error::SmtpError;

/// Process-wide delivery counter. Record names stay unique even when
/// several messages land within the same second.
static DELIVERY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Writes completed messages as individual `.eml` files under
/// per-recipient directories.
///
/// The directory key is the lower-cased recipient address; the `To:`
/// header keeps the address as received. Directories are created on
/// demand, and concurrent persists to the same recipient are safe: each
/// write targets its own uniquely named file.
#[derive(Debug, Clone)]
pub struct MailboxStore {
    root: PathBuf,
}

impl MailboxStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one message, returning the path of the record written.
    ///
    /// The record is written under a temporary name and renamed into
    /// place, so a failed write never leaves a visible partial record.
    pub fn persist(
        &self,
        sender: Option<&str>,
        recipient: &str,
        body: &str,
    ) -> Result<PathBuf, SmtpError> {
        let dir = self.root.join(recipient.to_lowercase());
        fs::create_dir_all(&dir)?;

        let now = Local::now();
        let seq = DELIVERY_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = format!("mail_{}_{seq}.eml", now.format("%Y%m%d%H%M%S"));
        let path = dir.join(&name);
        let tmp = dir.join(format!("{name}.tmp"));

        let mut file = File::create(&tmp)?;
        write!(file, "From: {}\r\n", sender.unwrap_or(""))?;
        write!(file, "To: {recipient}\r\n")?;
        write!(file, "Date: {}\r\n", now.to_rfc2822())?;
        write!(file, "\r\n")?;
        file.write_all(body.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &path)?;

        let shown = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        info!("saved message to {}", shown.display());

        Ok(path)
    }
}
