/* Copyright (c) 2023 Kevin Hutto

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE. */

//! Smoothing filter and alert decision.
//!
//! [`decide`] is pure: it reads one [`Reading`] plus the previous
//! [`MonitorState`] and returns the verdict together with the next state.
//! The polling loop owns the state and performs all I/O.

use crate::reading::Reading;

const HOUR_FORMAT: &str = "%H";
const DAY_FORMAT: &str = "%Y-%m-%d";

/// Hour of day at which the daily check-in email goes out.
const GREETING_HOUR: &str = "08";

/// Loop state carried between poll cycles. Reset at process start.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonitorState {
    /// Smoothed temperature after the most recent reading, if any.
    pub last_filtered_c: Option<f64>,
    /// Hour ("%H") of the last threshold warning, to send at most one per hour.
    pub last_warning_hour: Option<String>,
    /// Day ("%Y-%m-%d") of the last daily check-in.
    pub last_greeting_day: Option<String>,
}

/// Outcome of one poll cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Verdict {
    /// Whether an alert email is due this cycle.
    pub should_alert: bool,
    /// Smoothed temperature to log and report.
    pub filtered_c: f64,
}

/// Applies the two-point smoothing filter and decides whether to alert.
///
/// The filtered temperature is the raw reading on the first cycle and the
/// mean of the new reading and the previous filtered value afterwards. A
/// warning fires when the filtered value is strictly above `threshold_c`,
/// the filter was already seeded, and no warning went out in the current
/// clock hour. Independently, a check-in fires once per calendar day during
/// the 08:00 hour regardless of temperature.
pub fn decide(state: &MonitorState, reading: &Reading, threshold_c: f64) -> (Verdict, MonitorState) {
    let filtered_c = match state.last_filtered_c {
        None => reading.temperature_c,
        Some(last) => (reading.temperature_c + last) / 2.0,
    };

    let hour = reading.timestamp.format(HOUR_FORMAT).to_string();
    let day = reading.timestamp.format(DAY_FORMAT).to_string();

    let mut next = state.clone();
    next.last_filtered_c = Some(filtered_c);

    let mut should_alert = false;

    if state.last_filtered_c.is_some()
        && filtered_c > threshold_c
        && state.last_warning_hour.as_deref() != Some(hour.as_str())
    {
        should_alert = true;
        next.last_warning_hour = Some(hour.clone());
    }

    if hour == GREETING_HOUR && state.last_greeting_day.as_deref() != Some(day.as_str()) {
        should_alert = true;
        next.last_greeting_day = Some(day);
    }

    (
        Verdict {
            should_alert,
            filtered_c,
        },
        next,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn reading(day: u32, hour: u32, temperature_c: f64) -> Reading {
        Reading {
            timestamp: Local.with_ymd_and_hms(2024, 6, day, hour, 15, 0).unwrap(),
            humidity_text: "50.0".to_string(),
            temperature_c,
        }
    }

    #[test]
    fn first_reading_seeds_filter_and_never_warns() {
        let state = MonitorState::default();
        let (verdict, next) = decide(&state, &reading(1, 12, 30.0), 24.0);
        assert_eq!(verdict.filtered_c, 30.0);
        assert!(!verdict.should_alert);
        assert_eq!(next.last_filtered_c, Some(30.0));
    }

    #[test]
    fn filtered_value_is_mean_of_new_and_previous() {
        let state = MonitorState {
            last_filtered_c: Some(20.0),
            ..Default::default()
        };
        let (verdict, _) = decide(&state, &reading(1, 12, 30.0), 40.0);
        assert_eq!(verdict.filtered_c, 25.0);
    }

    #[test]
    fn warns_at_most_once_per_hour() {
        let state = MonitorState {
            last_filtered_c: Some(30.0),
            ..Default::default()
        };
        let (first, after_first) = decide(&state, &reading(1, 12, 30.0), 24.0);
        assert!(first.should_alert);
        assert_eq!(after_first.last_warning_hour.as_deref(), Some("12"));

        let (second, _) = decide(&after_first, &reading(1, 12, 31.0), 24.0);
        assert!(!second.should_alert);
    }

    #[test]
    fn warns_again_in_the_next_hour_while_still_hot() {
        let state = MonitorState {
            last_filtered_c: Some(30.0),
            last_warning_hour: Some("12".to_string()),
            ..Default::default()
        };
        let (verdict, next) = decide(&state, &reading(1, 13, 30.0), 24.0);
        assert!(verdict.should_alert);
        assert_eq!(next.last_warning_hour.as_deref(), Some("13"));
    }

    #[test]
    fn exactly_at_threshold_does_not_warn() {
        let state = MonitorState {
            last_filtered_c: Some(24.0),
            ..Default::default()
        };
        let (verdict, _) = decide(&state, &reading(1, 12, 24.0), 24.0);
        assert_eq!(verdict.filtered_c, 24.0);
        assert!(!verdict.should_alert);
    }

    #[test]
    fn greeting_fires_once_per_day_even_when_cold() {
        let state = MonitorState::default();
        let (first, after_first) = decide(&state, &reading(1, 8, 10.0), 24.0);
        assert!(first.should_alert);
        assert_eq!(after_first.last_greeting_day.as_deref(), Some("2024-06-01"));

        let (second, after_second) = decide(&after_first, &reading(1, 8, 10.0), 24.0);
        assert!(!second.should_alert);

        let (next_day, _) = decide(&after_second, &reading(2, 8, 10.0), 24.0);
        assert!(next_day.should_alert);
    }

    #[test]
    fn greeting_and_warning_update_independently() {
        let state = MonitorState {
            last_filtered_c: Some(30.0),
            ..Default::default()
        };
        let (verdict, next) = decide(&state, &reading(1, 8, 30.0), 24.0);
        assert!(verdict.should_alert);
        assert_eq!(next.last_warning_hour.as_deref(), Some("08"));
        assert_eq!(next.last_greeting_day.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let state = MonitorState {
            last_filtered_c: Some(22.0),
            ..Default::default()
        };
        let input = reading(1, 12, 26.0);
        assert_eq!(decide(&state, &input, 24.0), decide(&state, &input, 24.0));
    }
}
