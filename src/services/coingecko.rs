use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::models::{PriceQuote, PriceSource};
use crate::services::interface::{PriceClient, QueryError};
use crate::utils::math::MathUtils;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// `{ <asset_id>: { <fiat_currency>: <price> } }`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// Price client for the CoinGecko `simple/price` endpoint
pub struct CoinGeckoPriceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoPriceClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    async fn make_request(&self, asset_id: &str, fiat_currency: &str) -> Result<String, QueryError> {
        let url = format!("{}/simple/price", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("ids", asset_id), ("vs_currencies", fiat_currency)]);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(QueryError::RateLimited(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(QueryError::UnreachableEndpoint(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PriceClient for CoinGeckoPriceClient {
    async fn get_quote(&self, asset_id: &str, fiat_currency: &str) -> Result<PriceQuote, QueryError> {
        debug!("Fetching {} price in {}", asset_id, fiat_currency);

        let body = self.make_request(asset_id, fiat_currency).await?;
        let price = parse_simple_price(&body, asset_id, fiat_currency)?;

        Ok(PriceQuote::new(
            asset_id.to_string(),
            fiat_currency.to_string(),
            price,
            PriceSource::CoinGecko,
        ))
    }
}

/// Extract one price from a `simple/price` body
pub fn parse_simple_price(body: &str, asset_id: &str, fiat_currency: &str) -> Result<Decimal, QueryError> {
    let response: SimplePriceResponse = serde_json::from_str(body)?;

    let price = response
        .get(asset_id)
        .ok_or_else(|| QueryError::MalformedResponse(format!("asset {} missing from response", asset_id)))?
        .get(fiat_currency)
        .copied()
        .ok_or_else(|| {
            QueryError::MalformedResponse(format!("currency {} missing for {}", fiat_currency, asset_id))
        })?;

    if price < 0.0 {
        return Err(QueryError::MalformedResponse(format!("negative price {}", price)));
    }

    MathUtils::decimal_from_f64(price)
        .ok_or_else(|| QueryError::MalformedResponse(format!("unrepresentable price {}", price)))
}
