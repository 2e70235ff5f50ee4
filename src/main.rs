use std::fs;

use clap::Parser;
use hakomail::{Config, SmtpServer};

fn main() {
    env_logger::init();

    let config = Config::parse();

    // The mailbox root must exist before the first delivery attempt.
    if let Err(e) = fs::create_dir_all(&config.mailbox_root) {
        eprintln!(
            "Failed to create mailbox root {}: {e}",
            config.mailbox_root.display()
        );
        std::process::exit(1);
    }

    let server = SmtpServer::new(config);
    if let Err(e) = server.start() {
        eprintln!("Failed to start server: {e}");
        std::process::exit(1);
    }
}
