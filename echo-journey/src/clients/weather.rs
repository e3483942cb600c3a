//! Current weather by coordinates

use echo_common::models::Payload;
use serde::{Deserialize, Serialize};

use super::{check_status, http_client, ClientError};

pub const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Shown in the weather modal when the lookup fails
pub const WEATHER_ERROR: &str = "Failed to fetch weather data.";

/// What the weather modal displays before the user confirms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    /// Main condition, e.g. `Clear`
    pub weather: String,
}

impl WeatherReport {
    /// Confirming the report submits it as a search payload
    pub fn into_payload(self) -> Payload {
        Payload::Weather {
            weather: self.weather,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    weather: Vec<OpenWeatherCondition>,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherCondition {
    main: String,
}

impl TryFrom<OpenWeatherResponse> for WeatherReport {
    type Error = ClientError;

    fn try_from(response: OpenWeatherResponse) -> Result<Self, Self::Error> {
        let condition = response
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::ParseError("response has no weather entry".to_string()))?;
        Ok(WeatherReport {
            city: response.name,
            weather: condition.main,
        })
    }
}

pub struct WeatherClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    url: String,
}

impl WeatherClient {
    pub fn new(api_key: Option<String>) -> Result<Self, ClientError> {
        Self::with_url(api_key, OPENWEATHER_URL)
    }

    pub fn with_url(api_key: Option<String>, url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: http_client(10)?,
            api_key,
            url: url.to_string(),
        })
    }

    pub async fn current(&self, lat: f64, lon: f64) -> Result<WeatherReport, ClientError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ClientError::MissingCredential("Weather API key"))?;

        let response = self
            .http_client
            .get(&self.url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let body: OpenWeatherResponse = check_status(response).await?.json().await?;
        let report = WeatherReport::try_from(body)?;
        tracing::info!(city = %report.city, weather = %report.weather, "Weather detected");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_condition_is_used() {
        let body: OpenWeatherResponse = serde_json::from_str(
            r#"{"name":"Taipei","weather":[{"main":"Clear"},{"main":"Haze"}],"main":{"temp":28.1}}"#,
        )
        .unwrap();
        let report = WeatherReport::try_from(body).unwrap();
        assert_eq!(report.city, "Taipei");
        assert_eq!(report.weather, "Clear");
        assert_eq!(
            report.into_payload(),
            Payload::Weather {
                weather: "Clear".to_string()
            }
        );
    }

    #[test]
    fn test_missing_condition_is_parse_error() {
        let body: OpenWeatherResponse = serde_json::from_str(r#"{"name":"Nowhere"}"#).unwrap();
        assert!(matches!(
            WeatherReport::try_from(body),
            Err(ClientError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let client = WeatherClient::new(None).unwrap();
        assert!(matches!(
            client.current(25.0, 121.5).await,
            Err(ClientError::MissingCredential(_))
        ));
    }
}
