/* Copyright (c) 2023 Kevin Hutto

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE. */

//! Alert delivery over an authenticated SMTP relay.
//!
//! Credentials and the recipient list live in plain text files next to the
//! process and are re-read at every send. Recipients travel in the SMTP
//! envelope only; the message header block does not disclose them.

use std::fs;
use std::io;
use std::path::Path;

use lettre::address::{Address, Envelope};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::{IoError, TransportError};

//mail relay used for all outbound alerts
const SMTP_RELAY: &str = "smtp.gmail.com";
const SMTP_PORT: u16 = 587;

/// SMTP account used to submit alerts.
pub struct SmtpLogin {
    pub user: String,
    pub password: String,
}

/// Reads the SMTP username and password from the first two lines of `path`.
pub fn load_credentials(path: &Path) -> Result<SmtpLogin, IoError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::CredentialsUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_credentials(&text).ok_or_else(|| IoError::CredentialsUnreadable {
        path: path.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::InvalidData,
            "expected username and password lines",
        ),
    })
}

fn parse_credentials(text: &str) -> Option<SmtpLogin> {
    let mut lines = text.lines().map(str::trim);
    let user = lines.next().filter(|line| !line.is_empty())?;
    let password = lines.next().filter(|line| !line.is_empty())?;
    Some(SmtpLogin {
        user: user.to_string(),
        password: password.to_string(),
    })
}

/// Reads the recipient list from `path`, one address per line.
pub fn load_address_book(path: &Path) -> Result<Vec<String>, IoError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::AddressBookUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_address_book(&text))
}

fn parse_address_book(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Submits one alert to the relay.
///
/// The login is verified before the message is handed over, so
/// authentication problems and delivery problems surface as distinct
/// [`TransportError`] variants.
pub fn send_alert(
    login: &SmtpLogin,
    recipients: &[String],
    from_name: &str,
    subject: &str,
    body: &str,
) -> Result<(), TransportError> {
    let from_addr: Address = login.user.parse().map_err(|source| TransportError::Address {
        addr: login.user.clone(),
        source,
    })?;

    let mut rcpt_addrs = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        rcpt_addrs.push(
            recipient
                .parse::<Address>()
                .map_err(|source| TransportError::Address {
                    addr: recipient.clone(),
                    source,
                })?,
        );
    }

    let envelope = Envelope::new(Some(from_addr.clone()), rcpt_addrs)
        .map_err(|e| TransportError::Build(e.to_string()))?;

    //the visible To header names nobody; real recipients are envelope-only
    let message = Message::builder()
        .from(Mailbox::new(Some(from_name.to_string()), from_addr.clone()))
        .to(Mailbox::new(
            Some("Undisclosed recipients".to_string()),
            from_addr,
        ))
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| TransportError::Build(e.to_string()))?;

    let mailer = SmtpTransport::starttls_relay(SMTP_RELAY)
        .map_err(TransportError::LoginFailed)?
        .port(SMTP_PORT)
        .credentials(Credentials::new(login.user.clone(), login.password.clone()))
        .build();

    mailer
        .test_connection()
        .map_err(TransportError::LoginFailed)?;

    mailer
        .send_raw(&envelope, &message.formatted())
        .map_err(TransportError::SendFailed)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_book_trims_and_skips_blank_lines() {
        let parsed = parse_address_book("one@example.com\n\n  two@example.com\r\n\n");
        assert_eq!(parsed, vec!["one@example.com", "two@example.com"]);
    }

    #[test]
    fn credentials_require_two_lines() {
        assert!(parse_credentials("user@example.com\n").is_none());
        assert!(parse_credentials("").is_none());

        let login = parse_credentials("user@example.com\nhunter2\n").unwrap();
        assert_eq!(login.user, "user@example.com");
        assert_eq!(login.password, "hunter2");
    }

    #[test]
    fn credentials_lose_surrounding_whitespace() {
        let login = parse_credentials("  user@example.com \r\n hunter2 \r\n").unwrap();
        assert_eq!(login.user, "user@example.com");
        assert_eq!(login.password, "hunter2");
    }
}
