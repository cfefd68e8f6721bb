/* Copyright (c) 2023 Kevin Hutto

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE. */

use std::path::PathBuf;

/// Ways a sensor message can fail to yield a reading.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// Fewer bytes than a complete measurement frame from the frame start.
    #[error("message too short: {len} bytes from frame start")]
    TooShort { len: usize },

    /// A required marker ("OK.", "H:" or "T:") was not present.
    #[error("could not find {field:?} in sensor message")]
    MissingField { field: &'static str },

    /// The temperature field did not parse as a number.
    #[error("temperature text cannot be converted: {text:?}")]
    InvalidNumber { text: String },
}

/// File-level failures around the monitor's collaborator files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("unable to write output file {}: {source}", .path.display())]
    FileWriteFailed { path: PathBuf, source: csv::Error },

    #[error("unable to read file {}: {source}", .path.display())]
    CredentialsUnreadable { path: PathBuf, source: std::io::Error },

    #[error("unable to read address book file {}: {source}", .path.display())]
    AddressBookUnreadable { path: PathBuf, source: std::io::Error },
}

/// Failures while handing an alert to the mail relay.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid email address {addr:?}: {source}")]
    Address {
        addr: String,
        source: lettre::address::AddressError,
    },

    #[error("could not assemble alert email: {0}")]
    Build(String),

    #[error("smtp login failed: {0}")]
    LoginFailed(lettre::transport::smtp::Error),

    #[error("error sending alert email: {0}")]
    SendFailed(lettre::transport::smtp::Error),
}
