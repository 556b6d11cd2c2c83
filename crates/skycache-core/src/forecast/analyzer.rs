//! Same-day forecast analysis
//!
//! Scans the first `window` intervals of a payload (8 intervals is ~24h at
//! 3h granularity) and produces a [`ForecastSummary`]:
//!
//! 1. Intervals are visited in payload order. Running min of `temp_min` and
//!    max of `temp_max` are tracked over every visited interval.
//! 2. The first interval whose date prefix is not today stops the scan and
//!    contributes nothing, except when it is interval 0: then its
//!    description becomes the summary text, its temperatures are counted,
//!    and `is_raining` is set from its own rain volume.
//! 3. The first same-day interval with rain volume strictly above the
//!    threshold sets the description to `"<description> around <H AM|PM>"`
//!    and flags rain. Later intervals never override it.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

use super::{ForecastInterval, ForecastPayload, ForecastSummary};

/// Intervals scanned by default
pub const DEFAULT_FORECAST_WINDOW: usize = 8;

/// Rain volume (per 3h) that must be exceeded to count as rain
pub const DEFAULT_RAIN_THRESHOLD: f64 = 1.0;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pure forecast analyzer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastAnalyzer {
    window: usize,
    rain_threshold: f64,
}

impl Default for ForecastAnalyzer {
    fn default() -> Self {
        Self {
            window: DEFAULT_FORECAST_WINDOW,
            rain_threshold: DEFAULT_RAIN_THRESHOLD,
        }
    }
}

impl ForecastAnalyzer {
    pub fn new(window: usize, rain_threshold: f64) -> Self {
        Self {
            window,
            rain_threshold,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn rain_threshold(&self) -> f64 {
        self.rain_threshold
    }

    /// Summarize `payload` for the local calendar date
    pub fn analyze(&self, payload: &ForecastPayload) -> ForecastSummary {
        self.analyze_on(payload, Local::now().date_naive())
    }

    /// Summarize `payload` for `today`
    pub fn analyze_on(&self, payload: &ForecastPayload, today: NaiveDate) -> ForecastSummary {
        let today = today.format("%Y-%m-%d").to_string();

        let mut description = String::new();
        let mut is_raining = false;
        let mut range = TemperatureRange::default();

        for (index, interval) in payload.list.iter().take(self.window).enumerate() {
            let rain = interval.rain_volume_3h();

            if !interval.timestamp_text().starts_with(&today) {
                if index == 0 && !is_raining {
                    description = interval.description().to_string();
                    is_raining = rain > self.rain_threshold;
                    range.include(interval);
                }
                break;
            }

            range.include(interval);

            if rain > self.rain_threshold && !is_raining {
                description = rain_description(interval);
                is_raining = true;
            }
        }

        let (temp_min, temp_max) = range.finish();
        ForecastSummary {
            description,
            temp_min,
            temp_max,
            is_raining,
        }
    }
}

/// Label an hour of day on a 12-hour clock
///
/// Hours 13-23 map to `"<hour - 12> PM"`, hours 0-12 map to `"<hour> AM"`.
/// Midnight is `"0 AM"` and noon is `"12 AM"`.
pub fn twelve_hour_label(hour: u32) -> String {
    if hour > 12 {
        format!("{} PM", hour - 12)
    } else {
        format!("{} AM", hour)
    }
}

fn rain_description(interval: &ForecastInterval) -> String {
    match NaiveDateTime::parse_from_str(interval.timestamp_text(), TIMESTAMP_FORMAT) {
        Ok(at) => format!(
            "{} around {}",
            interval.description(),
            twelve_hour_label(at.hour())
        ),
        Err(e) => {
            tracing::debug!(
                "Unparseable interval timestamp {:?}: {}",
                interval.timestamp_text(),
                e
            );
            interval.description().to_string()
        }
    }
}

#[derive(Debug, Default)]
struct TemperatureRange {
    bounds: Option<(f64, f64)>,
}

impl TemperatureRange {
    fn include(&mut self, interval: &ForecastInterval) {
        let (lo, hi) = (interval.temp_min(), interval.temp_max());
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(lo), max.max(hi)),
            None => (lo, hi),
        });
    }

    /// Zero when no interval was visited
    fn finish(self) -> (f64, f64) {
        self.bounds.unwrap_or((0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn interval(ts: &str, lo: f64, hi: f64, desc: &str, rain: Option<f64>) -> ForecastInterval {
        ForecastInterval::new(ts, lo, hi, desc, rain)
    }

    #[test]
    fn twelve_hour_labels_follow_literal_mapping() {
        assert_eq!(twelve_hour_label(13), "1 PM");
        assert_eq!(twelve_hour_label(23), "11 PM");
        assert_eq!(twelve_hour_label(0), "0 AM");
        assert_eq!(twelve_hour_label(12), "12 AM");
        assert_eq!(twelve_hour_label(9), "9 AM");
    }

    #[test]
    fn full_day_with_rain_at_three_pm() {
        let payload = ForecastPayload::from_intervals(vec![
            interval("2024-03-10 06:00:00", 8.0, 10.0, "clear sky", None),
            interval("2024-03-10 09:00:00", 9.0, 12.0, "few clouds", Some(0.2)),
            interval("2024-03-10 12:00:00", 10.0, 14.0, "overcast", Some(1.0)),
            interval("2024-03-10 15:00:00", 11.0, 13.0, "light rain", Some(3.5)),
            interval("2024-03-10 18:00:00", 9.5, 11.0, "moderate rain", Some(6.0)),
            interval("2024-03-10 21:00:00", 7.0, 9.0, "light rain", Some(2.0)),
            interval("2024-03-10 22:00:00", 6.5, 8.0, "overcast", None),
            interval("2024-03-10 23:00:00", 5.0, 7.5, "clear sky", None),
        ]);

        let summary = ForecastAnalyzer::default().analyze_on(&payload, today());

        assert_eq!(
            summary,
            ForecastSummary {
                description: "light rain around 3 PM".to_string(),
                temp_min: 5.0,
                temp_max: 14.0,
                is_raining: true,
            }
        );
    }

    #[test]
    fn rain_threshold_is_exclusive() {
        let at_threshold = ForecastPayload::from_intervals(vec![interval(
            "2024-03-10 09:00:00",
            1.0,
            2.0,
            "drizzle",
            Some(1.0),
        )]);
        let above = ForecastPayload::from_intervals(vec![interval(
            "2024-03-10 09:00:00",
            1.0,
            2.0,
            "drizzle",
            Some(1.01),
        )]);

        let analyzer = ForecastAnalyzer::default();
        let summary = analyzer.analyze_on(&at_threshold, today());
        assert!(!summary.is_raining);
        assert_eq!(summary.description, "");

        let summary = analyzer.analyze_on(&above, today());
        assert!(summary.is_raining);
        assert_eq!(summary.description, "drizzle around 9 AM");
    }

    #[test]
    fn next_day_interval_stops_scan_without_contributing() {
        let payload = ForecastPayload::from_intervals(vec![
            interval("2024-03-10 18:00:00", 10.0, 12.0, "clear sky", None),
            interval("2024-03-10 21:00:00", 9.0, 11.0, "clear sky", None),
            interval("2024-03-11 00:00:00", -3.0, 30.0, "heavy rain", Some(20.0)),
            interval("2024-03-11 03:00:00", -5.0, 31.0, "heavy rain", Some(20.0)),
        ]);

        let summary = ForecastAnalyzer::default().analyze_on(&payload, today());

        assert!(!summary.is_raining);
        assert_eq!(summary.description, "");
        assert_eq!(summary.temp_min, 9.0);
        assert_eq!(summary.temp_max, 12.0);
    }

    #[test]
    fn first_interval_of_tomorrow_falls_back_to_its_description() {
        let payload = ForecastPayload::from_intervals(vec![
            interval("2024-03-11 00:00:00", 2.0, 4.0, "moderate rain", Some(4.0)),
            interval("2024-03-11 03:00:00", 1.0, 3.0, "light rain", Some(2.0)),
        ]);

        let summary = ForecastAnalyzer::default().analyze_on(&payload, today());

        assert_eq!(summary.description, "moderate rain");
        assert!(summary.is_raining);
        assert_eq!(summary.temp_min, 2.0);
        assert_eq!(summary.temp_max, 4.0);
    }

    #[test]
    fn fallback_without_enough_rain_is_not_raining() {
        let payload = ForecastPayload::from_intervals(vec![interval(
            "2024-03-11 00:00:00",
            2.0,
            4.0,
            "light rain",
            Some(1.0),
        )]);

        let summary = ForecastAnalyzer::default().analyze_on(&payload, today());

        assert_eq!(summary.description, "light rain");
        assert!(!summary.is_raining);
    }

    #[test]
    fn first_rain_wins_but_temperatures_keep_tracking() {
        let payload = ForecastPayload::from_intervals(vec![
            interval("2024-03-10 03:00:00", 4.0, 6.0, "light rain", Some(1.5)),
            interval("2024-03-10 15:00:00", 2.0, 15.0, "heavy rain", Some(9.0)),
        ]);

        let summary = ForecastAnalyzer::default().analyze_on(&payload, today());

        assert_eq!(summary.description, "light rain around 3 AM");
        assert_eq!(summary.temp_min, 2.0);
        assert_eq!(summary.temp_max, 15.0);
    }

    #[test]
    fn scan_is_bounded_by_window() {
        let mut list: Vec<ForecastInterval> = (0..8)
            .map(|h| interval(&format!("2024-03-10 {:02}:00:00", h), 5.0, 6.0, "clear", None))
            .collect();
        list.push(interval("2024-03-10 20:00:00", -10.0, 40.0, "storm", Some(50.0)));
        let payload = ForecastPayload::from_intervals(list);

        let summary = ForecastAnalyzer::default().analyze_on(&payload, today());

        assert!(!summary.is_raining);
        assert_eq!((summary.temp_min, summary.temp_max), (5.0, 6.0));
    }

    #[test]
    fn short_and_empty_payloads_do_not_overrun() {
        let analyzer = ForecastAnalyzer::default();

        let short = ForecastPayload::from_intervals(vec![interval(
            "2024-03-10 12:00:00",
            3.0,
            9.0,
            "clear",
            None,
        )]);
        let summary = analyzer.analyze_on(&short, today());
        assert_eq!((summary.temp_min, summary.temp_max), (3.0, 9.0));

        let empty = ForecastPayload::from_intervals(Vec::new());
        let summary = analyzer.analyze_on(&empty, today());
        assert_eq!(summary.description, "");
        assert!(!summary.is_raining);
        assert_eq!((summary.temp_min, summary.temp_max), (0.0, 0.0));
    }

    #[test]
    fn custom_threshold_and_window() {
        let payload = ForecastPayload::from_intervals(vec![
            interval("2024-03-10 00:00:00", 1.0, 2.0, "clear", None),
            interval("2024-03-10 14:00:00", 1.0, 2.0, "light rain", Some(0.5)),
        ]);

        let narrow = ForecastAnalyzer::new(1, 0.1).analyze_on(&payload, today());
        assert!(!narrow.is_raining);

        let sensitive = ForecastAnalyzer::new(8, 0.1).analyze_on(&payload, today());
        assert_eq!(sensitive.description, "light rain around 2 PM");
    }
}
