//! Fixed user-facing reply strings.
//!
//! Store owners chat in Spanish, so every canned reply is Spanish. Keeping
//! them in one place lets tests assert exact strings and keeps the handler
//! code free of literals.

/// Sent when the sender address does not resolve to any tenant. Terminal for
/// the request; nothing is written.
pub const ENROLLMENT_NOTICE: &str = "Hola 👋 Este número todavía no está vinculado a ninguna tienda. \
     Escríbenos desde tu cuenta registrada o solicita tu alta para empezar.";

/// Upstream classifier reported an exhausted quota.
pub const QUOTA_EXCEEDED: &str =
    "Lo siento, alcancé mi límite de consultas por ahora. Intenta de nuevo en unos minutos.";

/// Upstream classifier unavailable or returned garbage at the transport level.
pub const ASSISTANT_UNAVAILABLE: &str =
    "Lo siento, el asistente no está disponible en este momento. Intenta de nuevo más tarde.";

/// The model returned no content (for example, content-safety blocking).
pub const COULD_NOT_PROCESS: &str =
    "No pude procesar tu mensaje. ¿Puedes decirlo de otra forma?";

/// Generic fallback when neither the model nor the dispatcher produced text.
pub const PROCESSED_FALLBACK: &str = "Listo, mensaje procesado ✅";

pub fn action_failed(error: &str) -> String {
    format!("No pude completar la acción: {error}")
}

pub fn product_not_found(name: &str) -> String {
    format!("No encontré productos que coincidan con \"{name}\".")
}

pub fn sales_report_total(total: f64) -> String {
    format!("Tus ventas completadas suman S/ {total:.2}.")
}

#[cfg(test)]
mod tests {
    use super::{product_not_found, sales_report_total};

    #[test]
    fn sales_report_total_formats_two_decimals() {
        assert_eq!(sales_report_total(50.0), "Tus ventas completadas suman S/ 50.00.");
        assert_eq!(sales_report_total(1234.5), "Tus ventas completadas suman S/ 1234.50.");
    }

    #[test]
    fn not_found_reply_quotes_the_query() {
        assert_eq!(
            product_not_found("gaseosa"),
            "No encontré productos que coincidan con \"gaseosa\"."
        );
    }
}
