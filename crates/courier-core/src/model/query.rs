//! Queries: callback, inline, shipping and pre-checkout.

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::user::User;

/// A press on an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Unique query identifier, needed to answer it.
    pub id: String,
    /// Sender.
    pub from: User,
    /// Global identifier of the chat the message was sent to.
    pub chat_instance: String,
    /// Message carrying the pressed button, if still accessible.
    #[serde(default)]
    pub message: Option<Message>,
    /// Identifier of the inline message carrying the button.
    #[serde(default)]
    pub inline_message_id: Option<String>,
    /// Data attached to the button.
    #[serde(default)]
    pub data: Option<String>,
    /// Short name of a game to be returned.
    #[serde(default)]
    pub game_short_name: Option<String>,
}

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// An incoming inline query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineQuery {
    /// Unique identifier.
    pub id: String,
    /// Sender.
    pub from: User,
    /// Query text.
    pub query: String,
    /// Pagination offset chosen by the bot.
    pub offset: String,
    /// Type of the chat the query was sent from.
    #[serde(default)]
    pub chat_type: Option<String>,
    /// Sender location, if requested.
    #[serde(default)]
    pub location: Option<Location>,
}

/// An inline result chosen by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChosenInlineResult {
    /// Identifier of the chosen result.
    pub result_id: String,
    /// User who chose it.
    pub from: User,
    /// Query used to obtain the result.
    pub query: String,
    /// Sender location, if requested.
    #[serde(default)]
    pub location: Option<Location>,
    /// Identifier of the sent inline message.
    #[serde(default)]
    pub inline_message_id: Option<String>,
}

/// A shipping address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Two-letter ISO 3166-1 country code.
    pub country_code: String,
    /// State, if applicable.
    pub state: String,
    /// City.
    pub city: String,
    /// First line.
    pub street_line1: String,
    /// Second line.
    pub street_line2: String,
    /// Post code.
    pub post_code: String,
}

/// Order information supplied by a user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderInfo {
    /// Name.
    #[serde(default)]
    pub name: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Email.
    #[serde(default)]
    pub email: Option<String>,
    /// Shipping address.
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

/// A shipping query for an invoice with flexible price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingQuery {
    /// Unique identifier.
    pub id: String,
    /// Sender.
    pub from: User,
    /// Bot-specified invoice payload.
    pub invoice_payload: String,
    /// Address to ship to.
    pub shipping_address: ShippingAddress,
}

/// A pre-checkout query, answered before a payment is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreCheckoutQuery {
    /// Unique identifier.
    pub id: String,
    /// Sender.
    pub from: User,
    /// Three-letter ISO 4217 currency code.
    pub currency: String,
    /// Total price in the smallest units of the currency.
    pub total_amount: i64,
    /// Bot-specified invoice payload.
    pub invoice_payload: String,
    /// Chosen shipping option.
    #[serde(default)]
    pub shipping_option_id: Option<String>,
    /// Order information.
    #[serde(default)]
    pub order_info: Option<OrderInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_callback_query_without_message() {
        let query: CallbackQuery = serde_json::from_value(json!({
            "id": "42",
            "from": { "id": 1, "first_name": "Ada" },
            "chat_instance": "-77",
            "data": "vote:yes"
        }))
        .unwrap();
        assert_eq!(query.data.as_deref(), Some("vote:yes"));
        assert!(query.message.is_none());
    }

    #[test]
    fn test_callback_query_requires_chat_instance() {
        let result = serde_json::from_value::<CallbackQuery>(json!({
            "id": "42",
            "from": { "id": 1, "first_name": "Ada" }
        }));
        assert!(result.is_err());
    }
}
