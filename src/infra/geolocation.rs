use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::auth::GeoLocator;
use crate::infra::http_client::try_build_client_with_timeout;

const IPDATA_BASE_URL: &str = "https://api.ipdata.co";

#[derive(Debug, Deserialize)]
struct IpDataResponse {
    city: Option<String>,
    country_name: Option<String>,
}

/// ipdata.co lookup, bounded by the request-path timeout.
pub struct IpDataLocator {
    client: Client,
    api_key: SecretString,
}

impl IpDataLocator {
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: try_build_client_with_timeout(timeout)?,
            api_key,
        })
    }
}

#[async_trait]
impl GeoLocator for IpDataLocator {
    async fn locate(&self, ip: IpAddr) -> AppResult<Option<String>> {
        if is_private_ip(&ip) {
            debug!(%ip, "Skipping geolocation for non-public address");
            return Ok(None);
        }

        let response = self
            .client
            .get(format!("{IPDATA_BASE_URL}/{ip}"))
            .query(&[
                ("api-key", self.api_key.expose_secret()),
                ("fields", "city,country_name"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("ipdata request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "ipdata returned {}",
                response.status()
            )));
        }

        let body: IpDataResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("ipdata response invalid: {e}")))?;

        Ok(format_location(body.city.as_deref(), body.country_name.as_deref()))
    }
}

/// Used when no ipdata key is configured.
pub struct DisabledGeoLocator;

#[async_trait]
impl GeoLocator for DisabledGeoLocator {
    async fn locate(&self, _ip: IpAddr) -> AppResult<Option<String>> {
        Ok(None)
    }
}

fn format_location(city: Option<&str>, country: Option<&str>) -> Option<String> {
    let city = city.map(str::trim).filter(|c| !c.is_empty());
    let country = country.map(str::trim).filter(|c| !c.is_empty());
    match (city, country) {
        (Some(city), Some(country)) => Some(format!("{city}, {country}")),
        (None, Some(country)) => Some(country.to_string()),
        (Some(city), None) => Some(city.to_string()),
        (None, None) => None,
    }
}

/// Addresses ipdata cannot place: loopback, private ranges, CGNAT, link-local,
/// documentation and unique-local v6.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            let shared = a == 100 && (64..128).contains(&b);
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.is_documentation()
                || shared
        }
        IpAddr::V6(v6) => {
            let head = v6.segments()[0];
            let unique_local = head & 0xfe00 == 0xfc00;
            let link_local = head & 0xffc0 == 0xfe80;
            v6.is_loopback() || v6.is_unspecified() || unique_local || link_local
        }
    }
}
