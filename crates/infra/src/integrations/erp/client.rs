//! REST client for the remote ERP API
//!
//! Implements the `ErpGateway` port over the rate-limited `HttpClient`.
//! Endpoints are scoped to one organisation; every call carries the
//! caller-supplied bearer credential. The HTTP handle is initialized
//! lazily - the first caller builds it, concurrent callers await the same
//! initialization.

use std::time::Duration;

use async_trait::async_trait;
use orderbridge_core::erp_ports::{
    ContactCard, CreateOrderReply, CustomerDraft, CustomerRecord, ErpGateway, ItemRecord,
    OrderDocument, OrderRecord,
};
use orderbridge_domain::constants::DEFAULT_RATE_LIMIT_DELAY_SECS;
use orderbridge_domain::{ErpConfig, OrderBridgeError, RemoteCredential, Result};
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::errors::ErpError;
use super::types::{
    opaque_id_value, ContactRequest, CreateCustomerRequest, CreateOrderRequest,
    CustomerPayload, ItemListingPayload, ItemPayload, OrderListingPayload,
};
use crate::http::HttpClient;

/// REST client for the remote ERP system.
pub struct ErpClient {
    config: ErpConfig,
    rate_limit_delay: Duration,
    http: OnceCell<HttpClient>,
}

impl ErpClient {
    /// Create a client for the configured organisation.
    ///
    /// The underlying HTTP handle is built on first use.
    pub fn new(config: ErpConfig) -> Self {
        Self {
            config,
            rate_limit_delay: Duration::from_secs(DEFAULT_RATE_LIMIT_DELAY_SECS),
            http: OnceCell::new(),
        }
    }

    /// Override the fixed rate-limit retry delay (primarily for tests).
    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    /// Lazily initialized HTTP handle; first caller performs the setup,
    /// concurrent callers await the same initialization.
    async fn http(&self) -> Result<&HttpClient> {
        self.http
            .get_or_try_init(|| async {
                debug!(base_url = %self.config.base_url, "initializing ERP HTTP client");
                HttpClient::builder()
                    .timeout(Duration::from_secs(self.config.timeout_seconds))
                    .max_attempts(self.config.max_attempts)
                    .rate_limit_delay(self.rate_limit_delay)
                    .build()
            })
            .await
    }

    fn org_url(&self, path: &str) -> String {
        format!(
            "{}/orgs/{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.organisation_id,
            path
        )
    }

    async fn send(
        &self,
        credential: &RemoteCredential,
        build: impl FnOnce(&HttpClient) -> RequestBuilder,
    ) -> Result<Response> {
        let http = self.http().await?;
        let request = build(http)
            .header(header::AUTHORIZATION, format!("Bearer {}", credential.expose()));
        http.send(request).await
    }

    /// Classify a non-success response into the domain taxonomy, carrying
    /// whatever body the remote attached.
    async fn failure_from(response: Response) -> OrderBridgeError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let mut err = ErpError::from_status_code(status);
        if !body.trim().is_empty() {
            err = err.with_context(body.trim().to_string());
        }
        err.into_domain_error()
    }
}

#[async_trait]
impl ErpGateway for ErpClient {
    async fn find_item_by_code(
        &self,
        credential: &RemoteCredential,
        code: &str,
    ) -> Result<Option<ItemRecord>> {
        let url = self.org_url(&format!("/items/code({})", urlencoding::encode(code)));
        let response =
            self.send(credential, |http| http.request(Method::GET, &url)).await?;

        let status = response.status();
        if status.is_success() {
            let payload: ItemPayload = response.json().await.map_err(|err| {
                OrderBridgeError::InvalidInput(format!(
                    "failed to parse item payload for {code}: {err}"
                ))
            })?;
            Ok(Some(payload.into()))
        } else if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(Self::failure_from(response).await)
        }
    }

    async fn list_items(&self, credential: &RemoteCredential) -> Result<Vec<ItemRecord>> {
        let url = self.org_url(&format!("/items?PageSize={}", self.config.page_size));
        let response =
            self.send(credential, |http| http.request(Method::GET, &url)).await?;

        if !response.status().is_success() {
            return Err(Self::failure_from(response).await);
        }

        let listing: ItemListingPayload = response.json().await.map_err(|err| {
            OrderBridgeError::InvalidInput(format!("failed to parse catalog listing: {err}"))
        })?;
        listing
            .into_rows()
            .map(|rows| rows.into_iter().map(ItemRecord::from).collect())
            .ok_or_else(|| {
                OrderBridgeError::InvalidInput("catalog listing payload is not a list".into())
            })
    }

    async fn find_customer_by_code(
        &self,
        credential: &RemoteCredential,
        code: &str,
    ) -> Result<Option<CustomerRecord>> {
        let url = self.org_url(&format!("/customers/code({})", urlencoding::encode(code)));
        let response =
            self.send(credential, |http| http.request(Method::GET, &url)).await?;

        let status = response.status();
        if status.is_success() {
            let payload: CustomerPayload = response.json().await.map_err(|err| {
                OrderBridgeError::InvalidInput(format!(
                    "failed to parse customer payload for {code}: {err}"
                ))
            })?;
            let id = payload.customer_id.ok_or_else(|| {
                OrderBridgeError::InvalidInput(format!(
                    "customer payload for {code} is missing its identifier"
                ))
            })?;
            Ok(Some(CustomerRecord { id }))
        } else if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(Self::failure_from(response).await)
        }
    }

    async fn create_customer(
        &self,
        credential: &RemoteCredential,
        draft: &CustomerDraft,
    ) -> Result<Option<CustomerRecord>> {
        let url = self.org_url("/customers");
        let body = CreateCustomerRequest {
            name: &draft.name,
            code: &draft.code,
            address: &draft.street,
            postal_code: &draft.postal_code,
            city: &draft.city,
            country_name: draft.country_name.as_deref(),
            subject_to_vat: "No",
            email: draft.email.as_deref(),
            phone: draft.phone.as_deref(),
        };

        let response = self
            .send(credential, |http| http.request(Method::POST, &url).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure_from(response).await);
        }

        // The creation response does not reliably echo the new identifier.
        let text = response.text().await.unwrap_or_default();
        if text.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(text.trim()).map_err(|err| {
            OrderBridgeError::InvalidInput(format!(
                "failed to parse customer creation reply: {err}"
            ))
        })?;
        Ok(opaque_id_value(value.get("CustomerId")).map(|id| CustomerRecord { id }))
    }

    async fn add_customer_contact(
        &self,
        credential: &RemoteCredential,
        customer_id: &str,
        contact: &ContactCard,
    ) -> Result<()> {
        let url = self
            .org_url(&format!("/customers/{}/contacts", urlencoding::encode(customer_id)));
        let body = ContactRequest {
            full_name: &contact.full_name,
            email: contact.email.as_deref(),
            phone_number: contact.phone.as_deref(),
            is_default: "D",
        };

        let response = self
            .send(credential, |http| http.request(Method::POST, &url).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure_from(response).await);
        }
        Ok(())
    }

    async fn find_order_by_reference(
        &self,
        credential: &RemoteCredential,
        reference: &str,
    ) -> Result<Option<OrderRecord>> {
        let url =
            self.org_url(&format!("/orders?Reference={}", urlencoding::encode(reference)));
        let response =
            self.send(credential, |http| http.request(Method::GET, &url)).await?;

        let status = response.status();
        if status.is_success() {
            let listing: OrderListingPayload = response.json().await.map_err(|err| {
                OrderBridgeError::InvalidInput(format!(
                    "failed to parse order listing for {reference}: {err}"
                ))
            })?;
            // The remote filters server-side; trust rows that either
            // confirm the reference or omit the field entirely.
            let matched = listing
                .into_rows()
                .into_iter()
                .find(|order| order.reference.as_deref().map_or(true, |r| r == reference));
            Ok(matched.map(OrderRecord::from))
        } else if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(Self::failure_from(response).await)
        }
    }

    async fn create_order(
        &self,
        credential: &RemoteCredential,
        document: &OrderDocument,
        idempotency_token: &str,
    ) -> Result<CreateOrderReply> {
        let url = self.org_url("/orders");
        let body = CreateOrderRequest::from_document(document, &self.config);

        let response = self
            .send(credential, |http| {
                http.request(Method::POST, &url)
                    .header("Idempotency-Key", idempotency_token)
                    .json(&body)
            })
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure_from(response).await);
        }

        // Two known success shapes: a payload carrying the new order's ID,
        // or an empty body / empty array meaning the order materializes
        // asynchronously and must be reconciled by re-querying.
        let text = response.text().await.unwrap_or_default();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(CreateOrderReply::Accepted);
        }
        let value: Value = serde_json::from_str(trimmed).map_err(|err| {
            OrderBridgeError::InvalidInput(format!(
                "failed to parse order creation reply: {err}"
            ))
        })?;
        match opaque_id_value(value.get("ID")) {
            Some(order_id) => Ok(CreateOrderReply::Confirmed { order_id }),
            None => Ok(CreateOrderReply::Accepted),
        }
    }
}
