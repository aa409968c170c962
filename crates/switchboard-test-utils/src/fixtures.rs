// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for test inputs.

use serde_json::{Value, json};
use switchboard_core::types::{Contact, ContactStatus};

/// Pending contacts with the given addresses.
pub fn contacts(addresses: &[&str]) -> Vec<Contact> {
    addresses.iter().map(|a| Contact::new(*a)).collect()
}

/// A contact already marked as sent.
pub fn sent_contact(address: &str) -> Contact {
    let mut contact = Contact::new(address);
    contact.status = ContactStatus::Sent;
    contact.send_id = Some(format!("wamid.previous-{address}"));
    contact
}

/// Wraps a change `value` in the provider's envelope.
pub fn webhook(value: Value) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{"id": "waba-1", "changes": [{"field": "messages", "value": value}]}]
    })
}

/// A payload carrying one inbound text message.
pub fn text_message(from: &str, id: &str, body: &str, timestamp_secs: i64) -> Value {
    webhook(json!({
        "messaging_product": "whatsapp",
        "metadata": {"display_phone_number": "15550000000", "phone_number_id": "pn-1"},
        "contacts": [{"profile": {"name": "Test Contact"}, "wa_id": from}],
        "messages": [{
            "from": from,
            "id": id,
            "timestamp": timestamp_secs.to_string(),
            "type": "text",
            "text": {"body": body}
        }]
    }))
}

/// A payload carrying one delivery status.
pub fn status_update(recipient: &str, id: &str, status: &str, timestamp_secs: i64) -> Value {
    webhook(json!({
        "messaging_product": "whatsapp",
        "statuses": [{
            "id": id,
            "recipient_id": recipient,
            "status": status,
            "timestamp": timestamp_secs.to_string()
        }]
    }))
}
