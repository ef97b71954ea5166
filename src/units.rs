use chrono::{DateTime, TimeZone};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the OpenWeatherMap `units` query parameter.
    pub fn api_param(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_suffix(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_suffix(self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

pub mod temperature {
    /// Rounded temperature, with a leading `+` above zero. Halves round up,
    /// so -2.5 becomes -2.
    pub fn signed_temperature(temp: f64) -> String {
        let rounded = (temp + 0.5).floor() as i64;
        if temp > 0.0 {
            format!("+{rounded}")
        } else {
            // i64 has no negative zero, so -0.4 renders as "0"
            format!("{rounded}")
        }
    }

    #[test]
    fn test_signed_temperature() {
        assert_eq!(signed_temperature(21.6), "+22");
        assert_eq!(signed_temperature(0.3), "+0");
        assert_eq!(signed_temperature(0.0), "0");
        assert_eq!(signed_temperature(-0.4), "0");
        assert_eq!(signed_temperature(-2.6), "-3");
        assert_eq!(signed_temperature(2.5), "+3");
    }

    #[test]
    fn test_negative_halves_round_up() {
        assert_eq!(signed_temperature(-0.5), "0");
        assert_eq!(signed_temperature(-2.5), "-2");
        assert_eq!(signed_temperature(-2.51), "-3");
    }
}

pub mod direction {
    /// Four-point compass name for a meteorological wind bearing.
    pub fn wind_direction(deg: f64) -> &'static str {
        if deg > 45.0 && deg <= 135.0 {
            "East"
        } else if deg > 135.0 && deg <= 225.0 {
            "South"
        } else if deg > 225.0 && deg <= 315.0 {
            "West"
        } else {
            "North"
        }
    }

    #[test]
    fn test_wind_direction() {
        assert_eq!(wind_direction(0.0), "North");
        assert_eq!(wind_direction(45.0), "North");
        assert_eq!(wind_direction(45.5), "East");
        assert_eq!(wind_direction(135.0), "East");
        assert_eq!(wind_direction(180.0), "South");
        assert_eq!(wind_direction(225.0), "South");
        assert_eq!(wind_direction(270.0), "West");
        assert_eq!(wind_direction(315.0), "West");
        assert_eq!(wind_direction(316.0), "North");
        assert_eq!(wind_direction(360.0), "North");
    }
}

/// English weekday name, e.g. "Monday".
pub fn day_of_week<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%A").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_day_of_week() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(day_of_week(&dt), "Monday");

        // 23:00 UTC Sunday is already Monday in UTC+2
        let dt = Utc.with_ymd_and_hms(2024, 1, 14, 23, 0, 0).unwrap();
        let local = dt.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(day_of_week(&local), "Monday");
    }

    #[test]
    fn test_units() {
        assert_eq!(Units::default(), Units::Metric);
        assert_eq!(Units::Imperial.api_param(), "imperial");
        assert_eq!(Units::Metric.temperature_suffix(), "°C");
        assert_eq!(Units::Imperial.speed_suffix(), "mph");
    }
}
