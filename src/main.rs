/* Copyright (c) 2023 Kevin Hutto

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE. */

mod csv_log;
mod error;
mod mailer;
mod monitor;
mod reading;
mod temp_sensor;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use serialport::SerialPort;
use tracing::{debug, error, info};

use crate::error::TransportError;
use crate::monitor::MonitorState;
use crate::reading::Reading;

//rolling log of monitor activity, next to the CSV output
const MONITOR_LOG_FILE: &str = "DhtMonLog.txt";

#[derive(Parser, Debug)]
#[command(
    name = "dhtmon",
    about = "Log data from DHT11 temperature and humidity sensor."
)]
struct Args {
    /// Text file with one email address in each line. Emails will be sent to all.
    #[arg(short = 'a', long = "AddressBook", default_value = "AddressBook.txt")]
    address_book: PathBuf,

    /// File where the output will be written (CSV format).
    #[arg(short = 'o', long = "OutputFile", default_value = "DHT11Log.csv")]
    output_file: PathBuf,

    /// File that stores email smtp username and password in the first and second line.
    #[arg(short = 'p', long = "PasswordFile", default_value = "password.txt")]
    password_file: PathBuf,

    /// Period in minutes between two consecutive measurements.
    #[arg(short = 's', long = "SamplingIntervalMin", default_value_t = 0.05)]
    sampling_interval_min: f64,

    /// Trigger threshold temperature that activates warning.
    #[arg(short = 't', long = "ThresholdCelsius", default_value_t = 24.0)]
    threshold_celsius: f64,

    /// Set this for debug mode logging.
    #[arg(short = 'd', long = "DebugMode")]
    debug_mode: bool,

    /// What should appear as sender in the emails.
    #[arg(short = 'f', long = "From", default_value = "DHT Monitor")]
    from: String,

    /// Serial port to use instead of scanning for the sensor board.
    #[arg(long = "Port")]
    port: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.debug_mode)?;

    //print parameters, so user can check if they are right
    println!("Using email addresses from: {}", args.address_book.display());
    println!("Email sender:               {}", args.from);
    println!("Output will be logged in:   {}", args.output_file.display());
    println!("Email smtp password file:   {}", args.password_file.display());
    println!("Temperature threshold:      {}", args.threshold_celsius);
    println!(
        "Data will be recorded in every {} minutes",
        args.sampling_interval_min
    );

    let port_name = match &args.port {
        Some(name) => name.clone(),
        None => {
            println!("Searching for the sensor board on serial ports...");
            match temp_sensor::find_sensor_port().context("serial port scan failed")? {
                Some(name) => name,
                None => {
                    eprintln!("Sensor board was not found");
                    std::process::exit(1);
                }
            }
        }
    };

    let mut port = temp_sensor::open_sensor_port(&port_name)
        .with_context(|| format!("could not open serial port {port_name}"))?;
    println!("Sensor board was found on port {port_name}");
    info!(
        "monitoring {port_name}, threshold {}C, interval {} min",
        args.threshold_celsius, args.sampling_interval_min
    );

    let sampling_delay = Duration::from_secs_f64(args.sampling_interval_min * 60.0);
    let mut state = MonitorState::default();

    loop {
        debug!("loop cycle started -----------------------------------");
        run_cycle(&mut port, &args, &mut state);
        thread::sleep(sampling_delay);
    }
}

//One poll cycle: read, parse, decide, log, maybe alert. Every failure is
//logged and ends the cycle with the previous state retained, the loop itself
//never stops.
fn run_cycle(port: &mut Box<dyn SerialPort>, args: &Args, state: &mut MonitorState) {
    let raw = match temp_sensor::read_serial_ext(port) {
        Ok(raw) => raw,
        Err(e) => {
            error!("serial read failed: {e}");
            return;
        }
    };
    debug!("received {} bytes", raw.len());

    let reading = match reading::parse_reading(&raw, Local::now()) {
        Ok(reading) => reading,
        Err(e) => {
            error!(
                "error parsing sensor message {:?}: {e}",
                String::from_utf8_lossy(&raw)
            );
            return;
        }
    };
    debug!("current temp = {}", reading.temperature_c);

    let (verdict, next) = monitor::decide(state, &reading, args.threshold_celsius);
    *state = next;
    debug!("filtered temp = {}", verdict.filtered_c);

    if let Err(e) = csv_log::append_reading(&args.output_file, &reading, verdict.filtered_c) {
        println!("Warning: Unable to write output file. Data dropped.");
        error!("{e}");
        //a reading that was not logged is not alerted on either
        return;
    }

    if verdict.should_alert {
        send_alert_email(args, &reading, verdict.filtered_c);
    }
}

//Loads the collaborator files and hands the alert to the relay. Login and
//send failures are logged separately and never stop the loop.
fn send_alert_email(args: &Args, reading: &Reading, filtered_c: f64) {
    let login = match mailer::load_credentials(&args.password_file) {
        Ok(login) => login,
        Err(e) => {
            error!("{e} - Email will not be sent.");
            return;
        }
    };

    let recipients = match mailer::load_address_book(&args.address_book) {
        Ok(recipients) => recipients,
        Err(e) => {
            error!("{e} - Email will not be sent.");
            return;
        }
    };

    let subject = format!(
        "Humidity = {}%, temperature = {}C [end]",
        reading.humidity_text, filtered_c
    );
    let body = format!(
        "Filtered temperature is {filtered_c}C at humidity {}%.",
        reading.humidity_text
    );

    match mailer::send_alert(&login, &recipients, &args.from, &subject, &body) {
        Ok(()) => debug!("alert email sent"),
        Err(e @ TransportError::LoginFailed(_)) => {
            println!("Email login error");
            error!("{e}");
        }
        Err(e) => {
            println!("Error sending email");
            error!("{e}");
        }
    }
}

fn init_logging(debug_mode: bool) -> anyhow::Result<()> {
    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(MONITOR_LOG_FILE)
        .with_context(|| format!("unable to open {MONITOR_LOG_FILE}"))?;

    let default_filter = if debug_mode {
        "dhtmon=debug"
    } else {
        "dhtmon=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    Ok(())
}
