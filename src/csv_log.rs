/* Copyright (c) 2023 Kevin Hutto

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE. */

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::IoError;
use crate::reading::Reading;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

//one output row: timestamp, humidity as received, filtered temperature
#[derive(Serialize)]
struct LogRow<'a> {
    timestamp: String,
    humidity: &'a str,
    temperature: String,
}

//Appends one reading to the output file. The file is opened and closed each
//cycle.
pub fn append_reading(path: &Path, reading: &Reading, filtered_c: f64) -> Result<(), IoError> {
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| IoError::FileWriteFailed {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;
    write_row(file, reading, filtered_c).map_err(|source| IoError::FileWriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_row<W: Write>(out: W, reading: &Reading, filtered_c: f64) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.serialize(LogRow {
        timestamp: reading.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        humidity: &reading.humidity_text,
        temperature: filtered_c.to_string(),
    })?;
    writer.flush()?;
    Ok(())
}
