use serde::Deserialize;

/// Webhook envelope as the Cloud API delivers it:
/// `entry[].changes[].value.{messages[], metadata}`. Every level defaults so
/// status-only or malformed events deserialize to an empty payload instead of
/// failing extraction.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub phone_number_id: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub text: Option<TextBody>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

/// The single inbound text message processed per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    pub body: String,
}

impl WebhookPayload {
    /// First text message in the envelope, if any. Media messages and status
    /// updates carry no `text` object and are ignored.
    pub fn first_text_message(&self) -> Option<InboundMessage> {
        self.entry
            .iter()
            .flat_map(|entry| &entry.changes)
            .flat_map(|change| &change.value.messages)
            .find_map(|message| {
                let text = message.text.as_ref()?;
                Some(InboundMessage { sender: message.from.clone(), body: text.body.clone() })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::WebhookPayload;

    #[test]
    fn extracts_first_text_message_from_cloud_api_envelope() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{
                "entry": [{
                    "changes": [{
                        "value": {
                            "metadata": {"phone_number_id": "1098765"},
                            "messages": [{"from": "51987654321", "text": {"body": "Vendí 50 soles"}}]
                        }
                    }]
                }]
            }"#,
        )
        .expect("decode");

        let message = payload.first_text_message().expect("message");
        assert_eq!(message.sender, "51987654321");
        assert_eq!(message.body, "Vendí 50 soles");
    }

    #[test]
    fn status_only_event_yields_no_message() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{"entry": [{"changes": [{"value": {"statuses": [{"status": "delivered"}]}}]}]}"#,
        )
        .expect("decode");

        assert!(payload.first_text_message().is_none());
    }

    #[test]
    fn media_message_without_text_body_is_ignored() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{"entry": [{"changes": [{"value": {"messages": [{"from": "51911112222", "type": "image"}]}}]}]}"#,
        )
        .expect("decode");

        assert!(payload.first_text_message().is_none());
    }

    #[test]
    fn empty_body_deserializes_to_empty_payload() {
        let payload: WebhookPayload = serde_json::from_str("{}").expect("decode");
        assert!(payload.first_text_message().is_none());
    }
}
