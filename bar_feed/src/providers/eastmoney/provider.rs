use async_trait::async_trait;
use chrono_tz::Asia::Shanghai;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, header};
use shared_utils::env::get_env_var_or;

use crate::models::request::BarsRequest;
use crate::normalize::{FieldMap, RawTable};
use crate::providers::eastmoney::params::{construct_params, validate_symbol};
use crate::providers::eastmoney::response::{COLUMNS, KlineResponse, to_raw_table};
use crate::providers::{DataProvider, ProviderError, ProviderInitError};

const BASE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";

/// Override the endpoint, e.g. to point tests at a local stub.
const BASE_URL_ENV: &str = "EASTMONEY_BASE_URL";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Kline REST provider for Shanghai/Shenzhen index and equity bars.
///
/// The endpoint is unauthenticated but throttles aggressive clients, so
/// requests pass through a local rate limiter before going out.
pub struct EastmoneyProvider {
    client: Client,
    limiter: DefaultDirectRateLimiter,
    base_url: String,
}

impl EastmoneyProvider {
    /// Creates a new kline provider.
    ///
    /// Honors the `EASTMONEY_BASE_URL` environment variable as an endpoint
    /// override; otherwise the public endpoint is used.
    pub fn new() -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_static("https://quote.eastmoney.com/"),
        );

        let client = Client::builder().default_headers(headers).build()?;
        let base_url = get_env_var_or(BASE_URL_ENV, BASE_URL);

        Ok(Self {
            client,
            limiter: RateLimiter::direct(Quota::per_second(nonzero!(4u32))),
            base_url,
        })
    }
}

#[async_trait]
impl DataProvider for EastmoneyProvider {
    fn field_map(&self) -> FieldMap {
        FieldMap {
            timestamp: COLUMNS[0],
            open: COLUMNS[1],
            close: COLUMNS[2],
            high: COLUMNS[3],
            low: COLUMNS[4],
            volume: COLUMNS[5],
            tz: Shanghai,
        }
    }

    async fn fetch_raw(&self, request: &BarsRequest) -> Result<RawTable, ProviderError> {
        validate_symbol(&request.symbol)?;

        self.limiter.until_ready().await;

        let query_params = construct_params(request);
        tracing::debug!(symbol = %request.symbol, period = %request.period, "requesting klines");

        let response = self
            .client
            .get(&self.base_url)
            .query(&query_params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(ProviderError::Api(format!("HTTP {status}: {body}")));
        }

        // Parse from text rather than `.json()` so a non-JSON body (throttle
        // pages, login redirects) surfaces in the error.
        let body = response.text().await?;
        let parsed: KlineResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Api(format!("unexpected response body: {e}")))?;

        Ok(to_raw_table(parsed.data))
    }
}
