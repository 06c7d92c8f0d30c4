//! Contact-form mail delivery.
//!
//! Messages are composed as plain RFC 5322-style text and piped to a
//! sendmail-compatible command (`[mail] command`, default `sendmail -t`).
//! Delivery failures are typed and recoverable: the serve layer turns
//! them into a user-facing message, never a crash.

use crate::config::SiteConfig;
use chrono::Utc;
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Mail delivery errors.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail delivery is disabled")]
    Disabled,

    #[error("failed to spawn `{0}`")]
    Spawn(String, #[source] std::io::Error),

    #[error("failed to write message to `{0}`")]
    Write(String, #[source] std::io::Error),

    #[error("failed waiting for `{0}`")]
    Wait(String, #[source] std::io::Error),

    #[error("`{0}` exited with {1}")]
    Delivery(String, ExitStatus),
}

/// A contact form submission.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Compose and deliver a contact form submission.
pub fn send_contact_mail(config: &SiteConfig, msg: &ContactMessage) -> Result<(), MailError> {
    if !config.mail.enable {
        return Err(MailError::Disabled);
    }

    let message = compose(config, msg, &Utc::now().to_rfc2822());
    deliver(&config.mail.command, &message)
}

/// Build the message text. `sendmail -t` takes recipients from the
/// headers, so To must be present and correct.
fn compose(config: &SiteConfig, msg: &ContactMessage, date: &str) -> String {
    let body = format!(
        "Name: {}\nEmail: {}\n\n{}",
        msg.name, msg.email, msg.message
    );
    format!(
        "From: {from}\r\nTo: {to}\r\nSubject: {subject}\r\nDate: {date}\r\n\r\n{body}\r\n",
        from = config.base.email,
        to = config.mail.to,
        subject = config.mail.subject,
    )
}

/// Pipe a composed message into the delivery command's stdin.
fn deliver(command: &[String], message: &str) -> Result<(), MailError> {
    let program = command.first().ok_or_else(|| {
        MailError::Spawn(
            "<empty>".into(),
            std::io::Error::other("[mail.command] is empty"),
        )
    })?;

    let mut child = Command::new(program)
        .args(&command[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| MailError::Spawn(program.clone(), err))?;

    let mut stdin = child.stdin.take().ok_or_else(|| {
        MailError::Write(program.clone(), std::io::Error::other("stdin unavailable"))
    })?;
    stdin
        .write_all(message.as_bytes())
        .map_err(|err| MailError::Write(program.clone(), err))?;
    // Dropping stdin signals EOF to the child.
    drop(stdin);

    let status = child
        .wait()
        .map_err(|err| MailError::Wait(program.clone(), err))?;
    if !status.success() {
        return Err(MailError::Delivery(program.clone(), status));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
