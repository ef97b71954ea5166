//! Display-ready values for the two weather panels.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

use crate::icons::{self, Icon};
use crate::owm::current::CurrentWeather;
use crate::owm::forecast::ForecastEntry;
use crate::units::direction::wind_direction;
use crate::units::temperature::signed_temperature;
use crate::units::{day_of_week, Units};

const MISSING: &str = "--";

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentView {
    /// "London, GB"
    pub city: String,
    pub day: String,
    pub humidity: String,
    pub pressure: String,
    pub wind: String,
    pub temperature: String,
    pub description: String,
    pub icon: Option<Icon>,
    pub units: Units,
}

impl CurrentView {
    /// `today` is the viewer's local time, not the city's.
    pub fn from_weather<Tz: TimeZone>(
        data: &CurrentWeather,
        today: &DateTime<Tz>,
        units: Units,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let city = match data.sys.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", data.name, country),
            _ => data.name.clone(),
        };

        let condition = data.condition();
        Self {
            city,
            day: day_of_week(today),
            humidity: format!("{}", data.main.humidity.round()),
            pressure: format!("{}", data.main.pressure.round()),
            wind: format!("{}, {}", wind_direction(data.wind.deg), data.wind.speed),
            temperature: signed_temperature(data.main.temp),
            description: condition
                .map(|c| c.description.clone())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| MISSING.to_string()),
            icon: condition.and_then(|c| Icon::from_code(c.id)),
            units,
        }
    }

    /// Unknown condition codes keep whatever icon was shown before.
    pub fn merge_icon(mut self, previous: Option<&CurrentView>) -> Self {
        if self.icon.is_none() {
            self.icon = previous.and_then(|p| p.icon);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub icon_url: String,
    pub glyph: &'static str,
    pub description: String,
    pub day: String,
    pub temperature: String,
}

impl ForecastDay {
    /// `utc_offset` is the city's shift from UTC in seconds, used to name the day.
    pub fn from_entry(entry: &ForecastEntry, utc_offset: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset).unwrap_or(Utc.fix());
        let day = DateTime::<Utc>::from_timestamp(entry.dt, 0)
            .map(|dt| day_of_week(&dt.with_timezone(&offset)))
            .unwrap_or_else(|| MISSING.to_string());

        let (icon_id, description) = entry
            .condition()
            .map(|c| (c.icon.as_str(), c.description.clone()))
            .unwrap_or(("", String::new()));

        Self {
            icon_url: icons::icon_url(icon_id),
            glyph: icons::glyph_for_icon_id(icon_id),
            description,
            day,
            temperature: signed_temperature(entry.main.temp),
        }
    }
}

pub fn forecast_days(entries: &[ForecastEntry], utc_offset: i32) -> Vec<ForecastDay> {
    entries
        .iter()
        .map(|entry| ForecastDay::from_entry(entry, utc_offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn london(code: u16, temp: f64, deg: f64) -> CurrentWeather {
        serde_json::from_value(json!({
            "id": 2643743,
            "name": "London",
            "dt": 1705320000,
            "timezone": 0,
            "sys": {"country": "GB"},
            "main": {"temp": temp, "humidity": 72, "pressure": 1012},
            "wind": {"speed": 4.1, "deg": deg},
            "weather": [{"id": code, "main": "Clouds", "description": "broken clouds", "icon": "04d"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_current_view() {
        let monday = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let view = CurrentView::from_weather(&london(803, 14.62, 250.0), &monday, Units::Metric);

        assert_eq!(view.city, "London, GB");
        assert_eq!(view.day, "Monday");
        assert_eq!(view.humidity, "72");
        assert_eq!(view.pressure, "1012");
        assert_eq!(view.wind, "West, 4.1");
        assert_eq!(view.temperature, "+15");
        assert_eq!(view.icon, Some(Icon::BrokenClouds));
    }

    #[test]
    fn test_unmapped_code_keeps_previous_icon() {
        let now = Utc::now();
        let before = CurrentView::from_weather(&london(800, 20.0, 0.0), &now, Units::Metric);
        assert_eq!(before.icon, Some(Icon::ClearSky));

        let after = CurrentView::from_weather(&london(505, -3.0, 90.0), &now, Units::Metric)
            .merge_icon(Some(&before));
        assert_eq!(after.icon, Some(Icon::ClearSky));
        assert_eq!(after.temperature, "-3");
        assert_eq!(after.wind, "East, 4.1");

        let fresh = CurrentView::from_weather(&london(505, 1.0, 0.0), &now, Units::Metric)
            .merge_icon(None);
        assert_eq!(fresh.icon, None);
    }

    #[test]
    fn test_forecast_day() {
        let entry: ForecastEntry = serde_json::from_value(json!({
            "dt": 1705320000,
            "dt_txt": "2024-01-15 12:00:00",
            "main": {"temp": -0.6},
            "weather": [{"id": 600, "main": "Snow", "description": "light snow", "icon": "13d"}]
        }))
        .unwrap();

        let day = ForecastDay::from_entry(&entry, 0);
        assert_eq!(day.day, "Monday");
        assert_eq!(day.temperature, "-1");
        assert_eq!(day.description, "light snow");
        assert_eq!(day.icon_url, "https://openweathermap.org/img/wn/13d@2x.png");
        assert_eq!(day.glyph, "❄");

        // Noon UTC is already Tuesday at UTC+14
        let kiribati = ForecastDay::from_entry(&entry, 14 * 3600);
        assert_eq!(kiribati.day, "Tuesday");
    }
}
