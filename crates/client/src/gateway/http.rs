//! HTTP implementation of the cart and order gateways.
//!
//! Uses `reqwest` against the Quickbite REST backend. Tokens are attached
//! explicitly per request from the passed [`Identity`]; there is no ambient
//! default header, so request construction is fully determined by its
//! arguments.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::instrument;

use quickbite_core::{
    CartLine, CartLineId, FoodId, Identity, Order, OrderId, OrderStatus, PaymentCard, Price,
};

use super::{CartGateway, OrderGateway, wire};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};

/// Gateway to the Quickbite backend over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: url::Url,
    timeout: Duration,
}

impl HttpGateway {
    /// Create a gateway for the configured backend.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            timeout: config.http_timeout,
        }
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        // Paths are static and the base URL is validated at config time, so
        // this only fails on a misconfigured build.
        self.base_url
            .join(path)
            .map_err(|e| ApiError::ValidationRejected(format!("invalid request URL: {e}")))
    }

    /// The bearer token, or an immediate `Unauthenticated` with no I/O.
    fn bearer(identity: &Identity) -> Result<&str> {
        identity.token().ok_or(ApiError::Unauthenticated)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, String)> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;

        let status = response.status();

        // Read the body as text first for better error diagnostics
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;

        Ok((status, body))
    }

    fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ApiError::Unauthenticated);
            }
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound(snippet(body))),
            _ => {}
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %snippet(body),
                "Backend returned non-success status"
            );
            return Err(ApiError::ServerRejected {
                status: Some(status.as_u16()),
                message: snippet(body),
            });
        }

        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %snippet(body),
                "Failed to parse backend response"
            );
            ApiError::ServerRejected {
                status: Some(status.as_u16()),
                message: format!("undecodable response: {e}"),
            }
        })
    }

    fn ensure(success: bool, message: Option<String>, what: &str) -> Result<()> {
        if success {
            Ok(())
        } else {
            Err(ApiError::rejected(
                message.unwrap_or_else(|| format!("{what} rejected")),
            ))
        }
    }
}

impl CartGateway for HttpGateway {
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    async fn fetch_cart(&self, identity: &Identity) -> Result<Vec<CartLine>> {
        let token = Self::bearer(identity)?;
        let mut url = self.endpoint("api/cart/fetch")?;
        url.query_pairs_mut()
            .append_pair("userId", &identity.user_id.to_string());

        let (status, body) = self.send(self.client.get(url).bearer_auth(token)).await?;
        let response: wire::CartFetchResponse = Self::decode(status, &body)?;
        Self::ensure(response.success, response.response_message, "cart fetch")?;

        Ok(wire::convert_cart(response.carts))
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, food_id = %food_id))]
    async fn add_cart_line(
        &self,
        identity: &Identity,
        food_id: FoodId,
        quantity: u32,
    ) -> Result<CartLineId> {
        let token = Self::bearer(identity)?;
        let url = self.endpoint("api/cart/add")?;
        let request = wire::AddCartRequest {
            user_id: identity.user_id,
            food_id,
            quantity,
        };

        let (status, body) = self
            .send(self.client.post(url).bearer_auth(token).json(&request))
            .await?;
        let response: wire::AddCartResponse = Self::decode(status, &body)?;
        Self::ensure(response.success, response.response_message, "cart add")?;

        response
            .cart_id
            .ok_or_else(|| ApiError::rejected("cart id missing from response"))
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, cart_id = %cart_id))]
    async fn update_cart_line(
        &self,
        identity: &Identity,
        cart_id: CartLineId,
        quantity: u32,
    ) -> Result<()> {
        let token = Self::bearer(identity)?;
        let url = self.endpoint("api/cart/update")?;
        let request = wire::UpdateCartRequest {
            id: cart_id,
            user_id: identity.user_id,
            quantity,
        };

        let (status, body) = self
            .send(self.client.put(url).bearer_auth(token).json(&request))
            .await?;
        let ack: wire::Ack = Self::decode(status, &body)?;
        Self::ensure(ack.success, ack.response_message, "cart update")
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.user_id, cart_id = %cart_id))]
    async fn delete_cart_line(&self, identity: &Identity, cart_id: CartLineId) -> Result<()> {
        let token = Self::bearer(identity)?;
        let url = self.endpoint("api/cart/delete")?;
        let request = wire::DeleteCartRequest {
            id: cart_id,
            user_id: identity.user_id,
        };

        let (status, body) = self
            .send(self.client.delete(url).bearer_auth(token).json(&request))
            .await?;
        let ack: wire::Ack = Self::decode(status, &body)?;
        Self::ensure(ack.success, ack.response_message, "cart delete")
    }
}

impl OrderGateway for HttpGateway {
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    async fn fetch_orders_for_user(&self, identity: &Identity) -> Result<Vec<Order>> {
        let token = Self::bearer(identity)?;
        let mut url = self.endpoint("api/order/fetch/user-wise")?;
        url.query_pairs_mut()
            .append_pair("userId", &identity.user_id.to_string());

        let (status, body) = self.send(self.client.get(url).bearer_auth(token)).await?;
        let response: wire::OrderFetchResponse = Self::decode(status, &body)?;
        Self::ensure(response.success, response.response_message, "order fetch")?;

        Ok(wire::convert_orders(response.orders))
    }

    #[instrument(skip(self, identity), fields(delivery_person_id = %identity.user_id))]
    async fn fetch_orders_for_delivery_agent(&self, identity: &Identity) -> Result<Vec<Order>> {
        let token = Self::bearer(identity)?;
        let mut url = self.endpoint("api/order/fetch/delivery-wise")?;
        url.query_pairs_mut()
            .append_pair("deliveryPersonId", &identity.user_id.to_string());

        let (status, body) = self.send(self.client.get(url).bearer_auth(token)).await?;
        let response: wire::OrderFetchResponse = Self::decode(status, &body)?;
        Self::ensure(response.success, response.response_message, "order fetch")?;

        Ok(wire::convert_orders(response.orders))
    }

    #[instrument(skip(self, identity, payment, lines), fields(user_id = %identity.user_id, amount = %amount))]
    async fn create_order(
        &self,
        identity: &Identity,
        payment: &PaymentCard,
        amount: Price,
        lines: &[CartLine],
    ) -> Result<OrderId> {
        let token = Self::bearer(identity)?;
        let mut url = self.endpoint("api/order/add")?;
        url.query_pairs_mut()
            .append_pair("userId", &identity.user_id.to_string());

        let request = wire::CreateOrderRequest {
            card_details: wire::CardDetails {
                card_name: payment.card_name.clone(),
                card_number: payment.card_number().to_string(),
                valid_through: payment.valid_through.clone(),
                cvv: payment.cvv().to_string(),
            },
            amount,
            cart_lines: lines.iter().map(wire::OrderLineItem::from).collect(),
        };

        let (status, body) = self
            .send(self.client.post(url).bearer_auth(token).json(&request))
            .await?;
        let response: wire::CreateOrderResponse = Self::decode(status, &body)?;
        Self::ensure(response.success, response.response_message, "order create")?;

        response
            .order_id
            .ok_or_else(|| ApiError::rejected("order id missing from response"))
    }

    #[instrument(skip(self, identity), fields(delivery_person_id = %identity.user_id, order_id = %order_id))]
    async fn update_delivery_status(
        &self,
        identity: &Identity,
        order_id: OrderId,
        status: OrderStatus,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let token = Self::bearer(identity)?;
        let url = self.endpoint("api/order/update/delivery-status")?;
        let request = wire::UpdateDeliveryStatusRequest {
            order_id,
            delivery_person_id: identity.user_id,
            status,
            delivery_date: timestamp.format("%Y-%m-%d").to_string(),
            delivery_time: timestamp.format("%H:%M").to_string(),
        };

        let (http_status, body) = self
            .send(self.client.put(url).bearer_auth(token).json(&request))
            .await?;
        let ack: wire::Ack = Self::decode(http_status, &body)?;
        Self::ensure(ack.success, ack.response_message, "delivery status update")
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quickbite_core::{Role, UserId};

    fn gateway() -> HttpGateway {
        HttpGateway::new(&ClientConfig::new("http://10.0.2.2:8080").unwrap())
    }

    #[test]
    fn test_endpoint_joins_under_base() {
        let url = gateway().endpoint("api/cart/fetch").unwrap();
        assert_eq!(url.as_str(), "http://10.0.2.2:8080/api/cart/fetch");
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_network() {
        // Port 9 (discard) would hang or refuse; Unauthenticated must win
        // without ever getting there.
        let gateway =
            HttpGateway::new(&ClientConfig::new("http://127.0.0.1:9").unwrap());
        let identity = Identity::without_token(UserId::new(1), Role::Customer);

        let err = gateway.fetch_cart(&identity).await.unwrap_err();
        assert!(err.is_unauthenticated());
    }

    #[test]
    fn test_decode_classifies_statuses() {
        let err =
            HttpGateway::decode::<wire::Ack>(StatusCode::UNAUTHORIZED, "expired").unwrap_err();
        assert!(err.is_unauthenticated());

        let err = HttpGateway::decode::<wire::Ack>(StatusCode::NOT_FOUND, "no such line")
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(message) if message == "no such line"));

        let err = HttpGateway::decode::<wire::Ack>(StatusCode::INTERNAL_SERVER_ERROR, "boom")
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::ServerRejected {
                status: Some(500),
                ..
            }
        ));
    }

    #[test]
    fn test_decode_rejects_undecodable_success_body() {
        let err = HttpGateway::decode::<wire::Ack>(StatusCode::OK, "<html>proxy</html>")
            .unwrap_err();
        assert!(matches!(err, ApiError::ServerRejected { .. }));
    }

    #[test]
    fn test_ensure_uses_response_message() {
        let err =
            HttpGateway::ensure(false, Some("out of stock".to_string()), "cart add").unwrap_err();
        assert_eq!(err.to_string(), "Server rejected request: out of stock");

        let err = HttpGateway::ensure(false, None, "cart add").unwrap_err();
        assert_eq!(err.to_string(), "Server rejected request: cart add rejected");
    }
}
