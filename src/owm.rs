use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::units::Units;

const SERVICE: &str = "OpenWeatherMap";
const USER_AGENT: &str = concat!("cityweather/", env!("CARGO_PKG_VERSION"));

/// Forecast slots are three hours apart; the noon slot stands in for the day.
const DAILY_HOUR: &str = "12";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Condition {
    pub id: u16,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub icon: String,
}

pub mod current {
    use super::*;

    #[derive(Deserialize, Debug, Clone)]
    pub struct CurrentWeather {
        pub id: u64,

        pub name: String,

        /// Shift from UTC in seconds
        #[serde(default)]
        pub timezone: i32,

        #[serde(default)]
        pub sys: Sys,

        pub main: Main,

        #[serde(default)]
        pub wind: Wind,

        #[serde(default)]
        pub weather: Vec<Condition>,
    }

    impl CurrentWeather {
        pub fn condition(&self) -> Option<&Condition> {
            self.weather.first()
        }
    }

    #[derive(Deserialize, Debug, Clone, Default)]
    pub struct Sys {
        pub country: Option<String>,
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Main {
        pub temp: f64,
        pub humidity: f64,
        pub pressure: f64,
    }

    #[derive(Deserialize, Debug, Clone, Default)]
    pub struct Wind {
        #[serde(default)]
        pub speed: f64,

        #[serde(default)]
        pub deg: f64,
    }
}

pub mod forecast {
    use super::*;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Forecast {
        pub list: Vec<ForecastEntry>,
    }

    impl Forecast {
        /// One entry per day: the slots whose `dt_txt` falls at noon.
        pub fn daily(self) -> Vec<ForecastEntry> {
            self.list
                .into_iter()
                .filter(ForecastEntry::is_midday)
                .collect()
        }
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct ForecastEntry {
        pub dt: i64,

        /// "YYYY-MM-DD HH:MM:SS", UTC
        pub dt_txt: String,

        pub main: Main,

        #[serde(default)]
        pub weather: Vec<Condition>,
    }

    impl ForecastEntry {
        pub fn condition(&self) -> Option<&Condition> {
            self.weather.first()
        }

        fn is_midday(&self) -> bool {
            self.dt_txt
                .split(' ')
                .nth(1)
                .and_then(|time| time.split(':').next())
                .is_some_and(|hour| hour == DAILY_HOUR)
        }
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Main {
        pub temp: f64,
    }
}

use current::CurrentWeather;
use forecast::{Forecast, ForecastEntry};

#[derive(Debug, Clone)]
pub struct OwmClient {
    client: Client,
    base_url: String,
    api_key: String,
    units: Units,
}

impl OwmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.weather_base_url.trim_end_matches('/').to_string(),
            api_key: config.weather_api_key.clone(),
            units: config.units,
        })
    }

    pub fn current_by_name(&self, city: &str) -> Result<CurrentWeather> {
        let url = format!("{}/weather", self.base_url);
        tracing::debug!(%url, city, "fetching current weather");
        get_json(self.request(&url).query(&[("q", city)]), SERVICE)
    }

    /// Full five-day forecast, every three hours.
    pub fn forecast_by_id(&self, id: u64) -> Result<Forecast> {
        let url = format!("{}/forecast", self.base_url);
        tracing::debug!(%url, id, "fetching forecast");
        get_json(self.request(&url).query(&[("id", id)]), SERVICE)
    }

    pub fn daily_forecast_by_id(&self, id: u64) -> Result<Vec<ForecastEntry>> {
        let daily = self.forecast_by_id(id)?.daily();
        tracing::debug!(id, days = daily.len(), "forecast reduced to daily entries");
        Ok(daily)
    }

    fn request(&self, url: &str) -> RequestBuilder {
        self.client.get(url).query(&[
            ("units", self.units.api_param()),
            ("appid", self.api_key.as_str()),
        ])
    }
}

/// Send, reject non-2xx, decode the body.
pub(crate) fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    service: &'static str,
) -> Result<T> {
    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(service, %status, "request rejected");
        return Err(Error::Status { service, status });
    }
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|source| Error::Decode { service, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_current() -> serde_json::Value {
        json!({
            "coord": {"lon": -0.1257, "lat": 51.5085},
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
            "main": {"temp": 14.62, "feels_like": 14.0, "pressure": 1012, "humidity": 72},
            "wind": {"speed": 4.12, "deg": 250},
            "dt": 1705320000,
            "sys": {"country": "GB", "sunrise": 1705305000, "sunset": 1705335000},
            "timezone": 0,
            "id": 2643743,
            "name": "London",
            "cod": 200
        })
    }

    fn slot(dt: i64, dt_txt: &str, temp: f64) -> serde_json::Value {
        json!({
            "dt": dt,
            "dt_txt": dt_txt,
            "main": {"temp": temp, "humidity": 80},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]
        })
    }

    fn sample_forecast() -> serde_json::Value {
        json!({
            "cod": "200",
            "cnt": 4,
            "list": [
                slot(1705309200, "2024-01-15 09:00:00", 8.0),
                slot(1705320000, "2024-01-15 12:00:00", 10.4),
                slot(1705330800, "2024-01-15 15:00:00", 9.1),
                slot(1705406400, "2024-01-16 12:00:00", -1.2),
            ],
            "city": {"id": 2643743, "name": "London", "country": "GB", "timezone": 0}
        })
    }

    fn test_config(server: &MockServer) -> Config {
        Config {
            weather_base_url: server.uri(),
            weather_api_key: "test-key".to_string(),
            timeout_secs: 5,
            ..Config::default()
        }
    }

    /// The blocking client must be built, used and dropped off the async runtime.
    async fn with_client<T, F>(config: Config, f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(&OwmClient) -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(move || f(&OwmClient::new(&config).unwrap()))
            .await
            .unwrap()
    }

    #[test]
    fn test_decode_current() {
        let weather: CurrentWeather = serde_json::from_value(sample_current()).unwrap();
        assert_eq!(weather.id, 2643743);
        assert_eq!(weather.sys.country.as_deref(), Some("GB"));
        assert_eq!(weather.main.pressure, 1012.0);
        assert_eq!(weather.condition().map(|c| c.id), Some(803));
    }

    #[test]
    fn test_decode_current_sparse() {
        let weather: CurrentWeather = serde_json::from_value(json!({
            "id": 1, "name": "Nowhere", "dt": 0,
            "main": {"temp": 1.0, "humidity": 2, "pressure": 3},
            "sys": {}
        }))
        .unwrap();
        assert_eq!(weather.sys.country, None);
        assert_eq!(weather.wind.deg, 0.0);
        assert!(weather.condition().is_none());
    }

    #[test]
    fn test_daily_keeps_midday_slots() {
        let forecast: Forecast = serde_json::from_value(sample_forecast()).unwrap();
        let daily = forecast.daily();
        let stamps: Vec<_> = daily.iter().map(|e| e.dt_txt.as_str()).collect();
        assert_eq!(stamps, ["2024-01-15 12:00:00", "2024-01-16 12:00:00"]);
    }

    #[tokio::test]
    async fn test_current_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "New York"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_current()))
            .expect(1)
            .mount(&server)
            .await;

        let weather = with_client(test_config(&server), |c| c.current_by_name("New York"))
            .await
            .unwrap();
        assert_eq!(weather.name, "London");
    }

    #[tokio::test]
    async fn test_daily_forecast_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("id", "2643743"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
            .mount(&server)
            .await;

        let daily = with_client(test_config(&server), |c| c.daily_forecast_by_id(2643743))
            .await
            .unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[1].main.temp, -1.2);
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&server)
            .await;

        let result = with_client(test_config(&server), |c| c.current_by_name("Atlantis")).await;
        match result {
            Err(Error::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = with_client(test_config(&server), |c| c.current_by_name("London")).await;
        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
