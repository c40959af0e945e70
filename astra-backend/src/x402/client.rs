//! x402 probe client
//!
//! Issues a single request against a payment-gated endpoint and classifies
//! the answer: a 402 yields a priced quote fragment, any other status yields
//! a free fragment, and transport or schema failures yield an error that
//! adapters map to "provider unavailable for this request".

use reqwest::{Client, header};
use serde_json::{Map, Value, json};
use std::time::Duration;

use super::types::{
    PaymentRequired, QuoteFragment, STABLECOIN_DECIMALS, X402Instructions,
};

/// HTTP method used for a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Get,
    Post,
}

/// Probe client shared by the x402-gated adapters
#[derive(Clone)]
pub struct X402Probe {
    client: Client,
}

impl X402Probe {
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client })
    }

    /// Issue one probe and extract the payment requirement, if any.
    ///
    /// For POST the payload is sent as a JSON body; for GET it is sent as
    /// query parameters.
    pub async fn probe(
        &self,
        url: &str,
        method: ProbeMethod,
        payload: Option<&Value>,
    ) -> Result<QuoteFragment, String> {
        log::debug!("[X402] Probing {} ({:?})", url, method);

        let request = match method {
            ProbeMethod::Post => {
                let req = self
                    .client
                    .post(url)
                    .header(header::CONTENT_TYPE, "application/json");
                match payload {
                    Some(body) => req.json(body),
                    None => req,
                }
            }
            ProbeMethod::Get => {
                let req = self.client.get(url);
                match payload {
                    Some(params) => req.query(params),
                    None => req,
                }
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| format!("x402 probe to {} failed: {}", url, e))?;

        let status = response.status().as_u16();
        if status != 402 {
            log::info!("[X402] No payment required by {} (status {})", url, status);
            let mut metadata = Map::new();
            metadata.insert("status_code".to_string(), json!(status));
            metadata.insert("note".to_string(), json!("No payment required"));
            return Ok(QuoteFragment {
                price_usd: Some(0.0),
                currency: None,
                network: None,
                recipient: None,
                x402_instructions: None,
                free: true,
                metadata,
            });
        }

        // Pricing headers take precedence over the accepts entry when both
        // are present. Read them before the body consumes the response.
        let header_value = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let asset_header = header_value("asset");
        let network_header = header_value("network");
        let pay_to_header = header_value("payTo");

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("402 response from {} was not JSON: {}", url, e))?;
        let challenge: PaymentRequired = serde_json::from_value(body.clone())
            .map_err(|e| format!("Failed to parse 402 challenge from {}: {}", url, e))?;

        let option = challenge
            .accepts
            .first()
            .ok_or_else(|| format!("402 challenge from {} carried no payment options", url))?;
        let amount = option.amount().ok_or_else(|| {
            format!("402 challenge from {} has no usable maxAmountRequired", url)
        })?;

        // Smallest-unit amount of a USD-pegged asset, 6 decimals assumed
        let price_usd = amount / 10f64.powi(STABLECOIN_DECIMALS as i32);

        log::info!(
            "[X402] {} quoted {} {} (${:.6})",
            url,
            amount,
            asset_header
                .as_deref()
                .or(option.asset.as_deref())
                .unwrap_or("?"),
            price_usd
        );

        let mut metadata = Map::new();
        metadata.insert("status_code".to_string(), json!(402));
        metadata.insert("response".to_string(), body);

        Ok(QuoteFragment {
            price_usd: Some(price_usd),
            currency: asset_header.or_else(|| option.asset.clone()),
            network: network_header.or_else(|| option.network.clone()),
            recipient: pay_to_header.or_else(|| option.pay_to.clone()),
            x402_instructions: Some(X402Instructions {
                scheme: option.scheme.clone(),
                network: option.network.clone(),
                pay_to: option.pay_to.clone(),
                asset: option.asset.clone(),
                max_amount_required: option.max_amount_required.clone(),
                description: option.description.clone(),
            }),
            free: false,
            metadata,
        })
    }
}
