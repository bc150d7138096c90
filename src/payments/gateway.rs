use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::Duration;
use uuid::Uuid;

use crate::payments::error::PaymentError;
use crate::payments::models::PaymentStatus;

type HmacSha256 = Hmac<Sha256>;

/// Gateway configuration, read from the environment at startup
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: String,
    pub webhook_secret: Option<String>,
    pub redirect_url: String,
    pub webhook_url: String,
    pub currency: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("GATEWAY_API_KEY")
            .map_err(|_| "GATEWAY_API_KEY must be set".to_string())?;
        let base_url = std::env::var("GATEWAY_BASE_URL")
            .unwrap_or_else(|_| "https://api.tap.company/v2".to_string());
        let webhook_secret = std::env::var("GATEWAY_WEBHOOK_SECRET").ok();
        let redirect_url = std::env::var("GATEWAY_REDIRECT_URL")
            .map_err(|_| "GATEWAY_REDIRECT_URL must be set".to_string())?;
        let webhook_url = std::env::var("GATEWAY_WEBHOOK_URL")
            .map_err(|_| "GATEWAY_WEBHOOK_URL must be set".to_string())?;
        let currency = std::env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "BHD".to_string());

        Ok(Self {
            api_key,
            base_url,
            webhook_secret,
            redirect_url,
            webhook_url,
            currency,
        })
    }
}

/// Outcome of creating a charge with the provider
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub charge_id: String,
    pub status: String,
    pub payment_url: Option<String>,
    pub raw: Value,
}

/// REST client for the external payment gateway (no SDK dependency)
#[derive(Clone)]
pub struct PaymentGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl PaymentGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self { config, client })
    }

    /// Create a charge for a gateway payment. The provider calls back on the
    /// webhook URL and redirects the customer to `redirect_url` afterwards.
    ///
    /// Amounts are rounded to 3 decimals at this boundary only; everything
    /// upstream keeps full Decimal precision.
    pub async fn create_charge(
        &self,
        payment_id: Uuid,
        order_id: Uuid,
        amount: Decimal,
        customer_name: Option<&str>,
        customer_phone: Option<&str>,
    ) -> Result<ChargeOutcome, PaymentError> {
        let amount = amount
            .round_dp(3)
            .to_f64()
            .ok_or_else(|| PaymentError::Internal("Amount out of range".to_string()))?;

        let mut body = json!({
            "amount": amount,
            "currency": self.config.currency,
            "source": { "id": "src_all" },
            "redirect": { "url": self.config.redirect_url },
            "post": { "url": self.config.webhook_url },
            "reference": {
                "transaction": payment_id.to_string(),
                "order": order_id.to_string(),
            },
        });

        let mut customer = json!({
            "first_name": customer_name.unwrap_or("Walk-in Customer"),
        });
        if let Some(phone) = customer_phone.map(normalize_phone) {
            customer["phone"] = json!({
                "country_code": "973",
                "number": phone,
            });
        }
        body["customer"] = customer;

        let response: Value = self
            .client
            .post(format!("{}/charges", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        let charge_id = response["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| PaymentError::Gateway(format!("Charge creation failed: {response}")))?;
        let status = response["status"].as_str().unwrap_or("").to_string();
        let payment_url = response["transaction"]["url"].as_str().map(String::from);

        Ok(ChargeOutcome {
            charge_id,
            status,
            payment_url,
            raw: response,
        })
    }

    /// Refund a captured charge in full
    pub async fn create_refund(
        &self,
        charge_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<Value, PaymentError> {
        let amount = amount
            .abs()
            .round_dp(3)
            .to_f64()
            .ok_or_else(|| PaymentError::Internal("Amount out of range".to_string()))?;

        let body = json!({
            "charge_id": charge_id,
            "amount": amount,
            "currency": self.config.currency,
            "reason": reason,
        });

        let response: Value = self
            .client
            .post(format!("{}/refunds", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if response["id"].as_str().is_none() {
            return Err(PaymentError::Gateway(format!(
                "Refund creation failed: {response}"
            )));
        }

        Ok(response)
    }

    /// Verify the webhook signature (HMAC-SHA256 over the raw body, hex
    /// encoded in the signature header).
    ///
    /// When no webhook secret is configured verification is skipped with a
    /// warning, so local development works against providers that do not
    /// sign their callbacks.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<(), PaymentError> {
        let Some(secret) = self.config.webhook_secret.as_deref() else {
            tracing::warn!("Webhook signature verification skipped: no secret configured");
            return Ok(());
        };

        let signature = signature.ok_or_else(|| {
            PaymentError::ValidationFailed("Missing webhook signature header".to_string())
        })?;
        let expected = hex::decode(signature.trim()).map_err(|_| {
            PaymentError::ValidationFailed("Malformed webhook signature".to_string())
        })?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| PaymentError::Internal(e.to_string()))?;
        mac.update(payload);
        mac.verify_slice(&expected).map_err(|_| {
            PaymentError::ValidationFailed("Webhook signature mismatch".to_string())
        })
    }
}

/// Map a provider charge status onto the internal payment status.
///
/// Fail-closed: any status this table does not recognize counts as Failed,
/// so an unknown provider state can never settle an order.
pub fn map_provider_status(provider_status: &str) -> PaymentStatus {
    match provider_status.to_ascii_uppercase().as_str() {
        "CAPTURED" | "AUTHORIZED" => PaymentStatus::Success,
        "INITIATED" | "IN_PROGRESS" => PaymentStatus::Initiated,
        _ => PaymentStatus::Failed,
    }
}

/// Strip everything but digits and the leading country code; the gateway
/// wants the national number and the country code separately.
fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .strip_prefix("973")
        .map(String::from)
        .unwrap_or(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_captured_is_success() {
        assert_eq!(map_provider_status("CAPTURED"), PaymentStatus::Success);
        assert_eq!(map_provider_status("captured"), PaymentStatus::Success);
        assert_eq!(map_provider_status("AUTHORIZED"), PaymentStatus::Success);
    }

    #[test]
    fn test_map_initiated_stays_initiated() {
        assert_eq!(map_provider_status("INITIATED"), PaymentStatus::Initiated);
        assert_eq!(map_provider_status("IN_PROGRESS"), PaymentStatus::Initiated);
    }

    #[test]
    fn test_map_declined_is_failed() {
        assert_eq!(map_provider_status("DECLINED"), PaymentStatus::Failed);
        assert_eq!(map_provider_status("CANCELLED"), PaymentStatus::Failed);
        assert_eq!(map_provider_status("TIMEDOUT"), PaymentStatus::Failed);
    }

    #[test]
    fn test_map_unknown_status_fails_closed() {
        assert_eq!(map_provider_status("SHINY_NEW_STATE"), PaymentStatus::Failed);
        assert_eq!(map_provider_status(""), PaymentStatus::Failed);
    }

    #[test]
    fn test_normalize_phone_strips_formatting() {
        assert_eq!(normalize_phone("+973 3312-3456"), "33123456");
        assert_eq!(normalize_phone("33123456"), "33123456");
    }
}
