// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound messaging gateway trait.

use async_trait::async_trait;

use crate::error::SwitchboardError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AddressValidation, GatewayProbe, OutboundRequest, SendReceipt};

/// Adapter for the provider API that delivers messages to contacts.
#[async_trait]
pub trait MessagingGateway: PluginAdapter {
    /// The URL requests are posted to, recorded in the bulk audit trail.
    fn endpoint(&self) -> String;

    /// Sends a text or template message.
    ///
    /// Provider rejections come back as [`SwitchboardError::Gateway`] with
    /// whatever code, type and trace id the provider supplied.
    async fn send(&self, request: &OutboundRequest) -> Result<SendReceipt, SwitchboardError>;

    /// Asks the provider which of the (already normalized) addresses can
    /// receive messages.
    async fn validate_addresses(
        &self,
        addresses: &[String],
    ) -> Result<AddressValidation, SwitchboardError>;

    /// Live checks of the provider account. Never fails; problems are
    /// reported inside the probe results.
    async fn probe(&self) -> GatewayProbe;
}
