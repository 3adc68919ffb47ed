use serde::Serialize;

use crate::domain::types::ReceiptNumber;

pub const RECEIPT_SENT: &str = "Boleta enviada correctamente";
pub const RECEIPT_FAILED: &str = "Error al enviar la boleta";
pub const CLIENT_REGISTERED: &str = "Cliente registrado correctamente";
pub const CLIENT_LIST_FAILED: &str = "Error al leer los clientes";
pub const CLIENT_REGISTRATION_FAILED: &str = "Error al registrar el cliente";

/// Body of a successful receipt submission.
#[derive(Debug, Serialize)]
pub struct ReceiptIssued {
    pub mensaje: &'static str,
    #[serde(rename = "numeroBoleta")]
    pub numero_boleta: String,
}

impl From<ReceiptNumber> for ReceiptIssued {
    fn from(number: ReceiptNumber) -> Self {
        Self {
            mensaje: RECEIPT_SENT,
            numero_boleta: number.to_string(),
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub mensaje: String,
}

impl MessageResponse {
    pub fn new(mensaje: impl Into<String>) -> Self {
        Self {
            mensaje: mensaje.into(),
        }
    }
}

/// Failure envelope; `error` carries the cause when there is one worth
/// exposing.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub mensaje: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn new(mensaje: impl Into<String>, error: Option<String>) -> Self {
        Self {
            mensaje: mensaje.into(),
            error,
        }
    }
}
