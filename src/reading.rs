/* Copyright (c) 2023 Kevin Hutto

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE. */

//! Sensor message parsing.
//!
//! The sensor board repeats a short ASCII frame on its serial line, e.g.
//! `OK.H:55.2T:23.1;`. [`parse_reading`] extracts the humidity and
//! temperature fields from one received buffer.

use chrono::{DateTime, Local};

use crate::error::ParseError;

/// Marker the board prints at the start of a valid measurement frame.
const FRAME_START: &str = "OK.";
/// Tag preceding the humidity field.
const HUMIDITY_TAG: &str = "H:";
/// Tag preceding the temperature field.
const TEMPERATURE_TAG: &str = "T:";
/// Terminator of the temperature field.
const FRAME_END: char = ';';
/// A complete frame is at least this many bytes from the frame start.
const MIN_FRAME_LEN: usize = 16;

/// One measurement taken from the sensor.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    /// When the frame was received.
    pub timestamp: DateTime<Local>,
    /// Humidity field exactly as the board printed it.
    pub humidity_text: String,
    /// Temperature in degrees Celsius.
    pub temperature_c: f64,
}

/// Extracts a [`Reading`] from one raw serial buffer.
///
/// Non-ASCII bytes (line noise from the UART) are dropped before parsing.
/// The caller supplies the timestamp, so the same bytes always produce the
/// same reading.
pub fn parse_reading(raw: &[u8], at: DateTime<Local>) -> Result<Reading, ParseError> {
    let text: String = raw
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect();

    let start = text.find(FRAME_START).ok_or(ParseError::MissingField {
        field: FRAME_START,
    })?;
    let frame = &text[start..];
    if frame.len() < MIN_FRAME_LEN {
        return Err(ParseError::TooShort { len: frame.len() });
    }

    let humid_pos = frame.find(HUMIDITY_TAG).ok_or(ParseError::MissingField {
        field: HUMIDITY_TAG,
    })?;
    let humid_end = humid_pos + HUMIDITY_TAG.len();

    // the temperature tag is only valid after the humidity field
    let tempr_pos = frame[humid_end..]
        .find(TEMPERATURE_TAG)
        .map(|p| humid_end + p)
        .ok_or(ParseError::MissingField {
            field: TEMPERATURE_TAG,
        })?;
    let tempr_end = tempr_pos + TEMPERATURE_TAG.len();

    let humidity_text = frame[humid_end..tempr_pos].to_string();

    // an unterminated frame is read to the end of the buffer
    let end_pos = frame[tempr_end..]
        .find(FRAME_END)
        .map(|p| tempr_end + p)
        .unwrap_or(frame.len());
    let tempr_text = frame[tempr_end..end_pos].trim();

    let temperature_c = tempr_text
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            text: tempr_text.to_string(),
        })?;

    Ok(Reading {
        timestamp: at,
        humidity_text,
        temperature_c,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn parses_complete_frame() {
        let reading = parse_reading(b"boot junk OK.H:55.2T:23.1;\r\n", at()).unwrap();
        assert_eq!(reading.humidity_text, "55.2");
        assert_eq!(reading.temperature_c, 23.1);
        assert_eq!(reading.timestamp, at());
    }

    #[test]
    fn drops_non_ascii_bytes_before_parsing() {
        let reading = parse_reading(b"\xff\xfeOK.H:40.0T:20.5;\x80", at()).unwrap();
        assert_eq!(reading.humidity_text, "40.0");
        assert_eq!(reading.temperature_c, 20.5);
    }

    #[test]
    fn rejects_message_without_frame_start() {
        let err = parse_reading(b"H:55.2T:23.1;aaaa", at()).unwrap_err();
        assert_eq!(err, ParseError::MissingField { field: "OK." });
    }

    #[test]
    fn rejects_truncated_frame() {
        let err = parse_reading(b"xxOK.H:1T:2;", at()).unwrap_err();
        assert_eq!(err, ParseError::TooShort { len: 10 });
    }

    #[test]
    fn rejects_frame_without_humidity_tag() {
        let err = parse_reading(b"OK.T:23.1;padpadpad", at()).unwrap_err();
        assert_eq!(err, ParseError::MissingField { field: "H:" });
    }

    #[test]
    fn rejects_frame_without_temperature_tag() {
        let err = parse_reading(b"OK.H:55.2;padpadpad", at()).unwrap_err();
        assert_eq!(err, ParseError::MissingField { field: "T:" });
    }

    #[test]
    fn rejects_unparseable_temperature() {
        let err = parse_reading(b"OK.H:55.2T:2x.y;ppp", at()).unwrap_err();
        assert_matches!(err, ParseError::InvalidNumber { .. });
    }

    #[test]
    fn unterminated_frame_reads_to_line_end() {
        let reading = parse_reading(b"OK.H:60.1T:22.5\r\n", at()).unwrap();
        assert_eq!(reading.humidity_text, "60.1");
        assert_eq!(reading.temperature_c, 22.5);
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw: &[u8] = b"OK.H:55.2T:23.1; trailing";
        let first = parse_reading(raw, at()).unwrap();
        let second = parse_reading(raw, at()).unwrap();
        assert_eq!(first, second);
    }
}
