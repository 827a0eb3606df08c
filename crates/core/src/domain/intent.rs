use serde::{Deserialize, Serialize};

/// Closed set of actions the classifier may emit for one inbound message.
///
/// The dispatcher matches exhaustively over this enum, so adding an intent is
/// a compile-time-checked change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    AddProduct,
    UpdateProduct,
    DeleteProduct,
    RegisterSale,
    UpdateBusiness,
    SearchProduct,
    SalesReport,
    Chat,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddProduct => "add_product",
            Self::UpdateProduct => "update_product",
            Self::DeleteProduct => "delete_product",
            Self::RegisterSale => "register_sale",
            Self::UpdateBusiness => "update_business",
            Self::SearchProduct => "search_product",
            Self::SalesReport => "sales_report",
            Self::Chat => "chat",
        }
    }
}

/// Slots the model may fill for an intent. Every field tracks its own
/// presence so required-field guards stay explicit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

impl IntentFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.new_name.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.company_name.is_none()
    }
}

/// One classification result, produced fresh per request and never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedIntent {
    pub kind: IntentKind,
    pub fields: IntentFields,
    pub reply_draft: String,
}

impl ClassifiedIntent {
    /// Fallback used whenever the model output cannot be trusted as an
    /// action: the raw text becomes a plain conversational reply.
    pub fn chat(reply_draft: impl Into<String>) -> Self {
        Self { kind: IntentKind::Chat, fields: IntentFields::default(), reply_draft: reply_draft.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassifiedIntent, IntentFields, IntentKind};

    #[test]
    fn intent_kind_round_trips_through_snake_case_tags() {
        let decoded: IntentKind = serde_json::from_str("\"register_sale\"").expect("decode");
        assert_eq!(decoded, IntentKind::RegisterSale);
        assert_eq!(serde_json::to_string(&IntentKind::SalesReport).expect("encode"), "\"sales_report\"");
    }

    #[test]
    fn chat_fallback_carries_raw_text_and_no_fields() {
        let intent = ClassifiedIntent::chat("hola");
        assert_eq!(intent.kind, IntentKind::Chat);
        assert!(intent.fields.is_empty());
        assert_eq!(intent.reply_draft, "hola");
    }

    #[test]
    fn missing_slots_decode_as_absent() {
        let fields: IntentFields = serde_json::from_str("{\"name\":\"Inca Kola\"}").expect("decode");
        assert_eq!(fields.name.as_deref(), Some("Inca Kola"));
        assert!(fields.price.is_none());
        assert!(fields.amount.is_none());
    }
}
