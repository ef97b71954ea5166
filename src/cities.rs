use std::fmt;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::Result;
use crate::owm::get_json;

const SERVICE: &str = "city search";
const MIN_QUERY_LEN: usize = 3;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct City {
    pub name: String,

    #[serde(default)]
    pub state_code: Option<String>,

    #[serde(default)]
    pub country_code: Option<String>,
}

impl fmt::Display for City {
    /// "Springfield, IL, US"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for part in [&self.state_code, &self.country_code].into_iter().flatten() {
            if !part.is_empty() {
                write!(f, ", {part}")?;
            }
        }
        Ok(())
    }
}

/// Queries shorter than three characters are not worth a request.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LEN
}

#[derive(Debug, Clone)]
pub struct CityClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_host: String,
}

impl CityClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.cities_base_url.trim_end_matches('/').to_string(),
            api_key: config.cities_api_key.clone(),
            api_host: config.cities_api_host.clone(),
        })
    }

    pub fn search(&self, query: &str) -> Result<Vec<City>> {
        let url = format!("{}/cities/search", self.base_url);
        tracing::debug!(%url, query, "searching cities");
        let request = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host);
        get_json(request, SERVICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn city(name: &str, state: Option<&str>, country: Option<&str>) -> City {
        City {
            name: name.to_string(),
            state_code: state.map(str::to_string),
            country_code: country.map(str::to_string),
        }
    }

    #[test]
    fn test_label() {
        assert_eq!(
            city("Springfield", Some("IL"), Some("US")).to_string(),
            "Springfield, IL, US"
        );
        assert_eq!(city("Lyon", None, Some("FR")).to_string(), "Lyon, FR");
        assert_eq!(city("Lyon", Some(""), None).to_string(), "Lyon");
    }

    #[test]
    fn test_is_searchable() {
        assert!(!is_searchable(""));
        assert!(!is_searchable("  ab  "));
        assert!(is_searchable(" abc"));
        assert!(is_searchable("Łód"));
    }

    async fn search(config: Config, query: &'static str) -> Result<Vec<City>> {
        tokio::task::spawn_blocking(move || CityClient::new(&config)?.search(query))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cities/search"))
            .and(query_param("q", "san fr"))
            .and(header("X-RapidAPI-Key", "secret"))
            .and(header("X-RapidAPI-Host", "city-and-state-search-api.p.rapidapi.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "San Francisco", "state_code": "CA", "country_code": "US"},
                {"id": 2, "name": "San Fernando", "state_code": null, "country_code": "PH"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config {
            cities_base_url: server.uri(),
            cities_api_key: "secret".to_string(),
            ..Config::default()
        };
        let cities = search(config, "san fr").await.unwrap();
        assert_eq!(
            cities,
            vec![
                city("San Francisco", Some("CA"), Some("US")),
                city("San Fernando", None, Some("PH")),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cities/search"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let config = Config {
            cities_base_url: server.uri(),
            ..Config::default()
        };
        let result = search(config, "berlin").await;
        assert!(matches!(result, Err(Error::Status { .. })));
    }
}
