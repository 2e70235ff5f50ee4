//! Basic usage example for the hakomail SMTP server
//!
//! Starts a server on 127.0.0.1:2525, submits one message over a raw TCP
//! session and prints the record that was filed under the mailbox root.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use hakomail::{Config, SmtpServer};

fn main() {
    env_logger::init();

    let config = Config {
        mailbox_root: "demo-mailbox".into(),
        ..Config::default()
    };
    let mailbox_root = config.mailbox_root.clone();
    fs::create_dir_all(&mailbox_root).expect("failed to create mailbox root");

    let server = SmtpServer::new(config);
    thread::spawn(move || {
        if let Err(e) = server.start() {
            eprintln!("Server error: {e}");
        }
    });

    // Give the listener a moment to come up.
    thread::sleep(Duration::from_millis(100));
    println!("Server started on 127.0.0.1:2525");

    println!("\nSending test email...");
    if let Err(e) = send_test_email() {
        eprintln!("Failed to send email: {e}");
        return;
    }

    // Show what was filed.
    let recipient_dir = mailbox_root.join("recipient@hk.com");
    match fs::read_dir(&recipient_dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                println!("\nStored record: {}", entry.path().display());
                if let Ok(content) = fs::read_to_string(entry.path()) {
                    for line in content.lines() {
                        println!("    {line}");
                    }
                }
            }
        }
        Err(e) => eprintln!("No records under {}: {e}", recipient_dir.display()),
    }
}

fn send_test_email() -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect("127.0.0.1:2525")?;
    let mut reader = BufReader::new(stream.try_clone()?);

    // Read greeting
    let mut response = String::new();
    reader.read_line(&mut response)?;
    print!("S: {response}");

    // Send HELO
    write!(stream, "HELO client.example.com\r\n")?;
    response.clear();
    reader.read_line(&mut response)?;
    print!("S: {response}");

    // Send MAIL FROM
    write!(stream, "MAIL FROM:<sender@example.com>\r\n")?;
    response.clear();
    reader.read_line(&mut response)?;
    print!("S: {response}");

    // Send RCPT TO
    write!(stream, "RCPT TO:<recipient@hk.com>\r\n")?;
    response.clear();
    reader.read_line(&mut response)?;
    print!("S: {response}");

    // Send DATA
    write!(stream, "DATA\r\n")?;
    response.clear();
    reader.read_line(&mut response)?;
    print!("S: {response}");

    // Send email content
    write!(stream, "From: sender@example.com\r\n")?;
    write!(stream, "To: recipient@hk.com\r\n")?;
    write!(stream, "Subject: Test Email from hakomail\r\n")?;
    write!(stream, "\r\n")?;
    write!(stream, "This message was filed into a per-recipient\r\n")?;
    write!(stream, "directory by the hakomail server.\r\n")?;
    write!(stream, ".\r\n")?; // End of data marker

    // Read final response
    response.clear();
    reader.read_line(&mut response)?;
    print!("S: {response}");

    // Send QUIT
    write!(stream, "QUIT\r\n")?;
    response.clear();
    reader.read_line(&mut response)?;
    print!("S: {response}");

    Ok(())
}
