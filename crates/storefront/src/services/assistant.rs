//! Canned-response shopping assistant.
//!
//! Messages are matched against whole-word, case-insensitive rules in order;
//! the first rule that matches picks the reply.

use regex::Regex;
use serde::Serialize;

/// Reply when no rule matches.
pub const FALLBACK_REPLY: &str =
    "I'm here to help! Could you please provide more details about what you're looking for?";

const RULES: [(&str, &str); 4] = [
    (r"\b(hello|hi)\b", "Hello! How can I help you today?"),
    (
        r"\b(products?|prices?)\b",
        "You can find all our products and their prices on the products page. \
         Would you like me to help you find something specific?",
    ),
    (
        r"\b(delivery|shipping)\b",
        "We offer delivery services across Zambia. Delivery times vary by location. \
         Would you like to know more about delivery options?",
    ),
    (
        r"\b(payments?|pay)\b",
        "We accept various payment methods including mobile money, bank transfers, \
         and cash on delivery. How would you like to proceed with payment?",
    ),
];

/// Avatar facial expression sent with a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Neutral,
}

/// An assistant reply as sent to the client.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub message: &'static str,
    /// Spoken reply; no voice backend is configured.
    pub audio_url: Option<String>,
    pub expression: Expression,
}

/// Rule-based assistant, compiled once at startup.
#[derive(Debug, Clone)]
pub struct Assistant {
    rules: Vec<(Regex, &'static str)>,
}

impl Assistant {
    /// Compile the reply rules.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if a rule pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        let rules = RULES
            .iter()
            .map(|(pattern, reply)| Ok((Regex::new(&format!("(?i){pattern}"))?, *reply)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Pick a reply for `message`.
    #[must_use]
    pub fn reply(&self, message: &str) -> AssistantReply {
        let message = self
            .rules
            .iter()
            .find(|(pattern, _)| pattern.is_match(message))
            .map_or(FALLBACK_REPLY, |(_, reply)| *reply);
        AssistantReply {
            message,
            audio_url: None,
            expression: Expression::Neutral,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reply(message: &str) -> &'static str {
        Assistant::new().unwrap().reply(message).message
    }

    #[test]
    fn test_greeting() {
        assert_eq!(reply("Hi there"), "Hello! How can I help you today?");
        assert_eq!(reply("HELLO"), "Hello! How can I help you today?");
    }

    #[test]
    fn test_whole_words_only() {
        // "this" and "shipping" both contain "hi"; only the delivery rule fires
        assert!(reply("Is this shipping to Ndola?").starts_with("We offer delivery"));
        assert_eq!(reply("chipotle"), FALLBACK_REPLY);
    }

    #[test]
    fn test_rule_order() {
        assert!(reply("What is the price of delivery?").starts_with("You can find all our products"));
        assert!(reply("Can I pay with mobile money?").starts_with("We accept various payment methods"));
    }

    #[test]
    fn test_fallback() {
        assert_eq!(reply("Tell me a story"), FALLBACK_REPLY);
    }

    #[test]
    fn test_reply_shape() {
        let json = serde_json::to_value(Assistant::new().unwrap().reply("hi")).unwrap();
        assert_eq!(json["audio_url"], serde_json::Value::Null);
        assert_eq!(json["expression"], "neutral");
    }
}
