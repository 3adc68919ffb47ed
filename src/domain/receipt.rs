//! Service report submitted from the field form.

use crate::domain::types::{NonEmptyString, non_blank};

/// Placeholder printed for missing client panel values.
pub const MISSING_VALUE: &str = "N/A";

/// Data captured by a technician for one service visit.
///
/// Every field is optional; blank input is normalized to `None` so the
/// renderer can substitute its placeholders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceReport {
    pub client_name: Option<NonEmptyString>,
    pub address: Option<NonEmptyString>,
    pub phone: Option<NonEmptyString>,
    pub client_email: Option<NonEmptyString>,
    pub date: Option<NonEmptyString>,
    pub category: Option<NonEmptyString>,
    pub work_type: Option<NonEmptyString>,
    /// Selected checklist labels in submission order.
    pub checklist: Vec<NonEmptyString>,
    pub comments: Option<NonEmptyString>,
    pub technician: Option<NonEmptyString>,
}

/// Raw, untrimmed field values as they arrive from the request.
#[derive(Clone, Debug, Default)]
pub struct ServiceReportInput {
    pub client_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub client_email: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub work_type: Option<String>,
    pub checklist: Vec<String>,
    pub comments: Option<String>,
    pub technician: Option<String>,
}

impl From<ServiceReportInput> for ServiceReport {
    fn from(input: ServiceReportInput) -> Self {
        Self {
            client_name: non_blank(input.client_name),
            address: non_blank(input.address),
            phone: non_blank(input.phone),
            client_email: non_blank(input.client_email),
            date: non_blank(input.date),
            category: non_blank(input.category),
            work_type: non_blank(input.work_type),
            checklist: input
                .checklist
                .into_iter()
                .filter_map(|item| NonEmptyString::new(item).ok())
                .collect(),
            comments: non_blank(input.comments),
            technician: non_blank(input.technician),
        }
    }
}

impl ServiceReport {
    /// Labeled lines of the client panel, with placeholders for gaps.
    pub fn client_lines(&self) -> Vec<String> {
        let field = |label: &str, value: &Option<NonEmptyString>| {
            format!(
                "{label}: {}",
                value.as_ref().map_or(MISSING_VALUE, |v| v.as_str())
            )
        };
        vec![
            field("Cliente", &self.client_name),
            field("Dirección", &self.address),
            field("Teléfono", &self.phone),
            field("Correo", &self.client_email),
            field("Fecha", &self.date),
            field("Categoría", &self.category),
            field("Tipo", &self.work_type),
        ]
    }

    /// Address the receipt is emailed to, when one was provided.
    pub fn recipient(&self) -> Option<&str> {
        self.client_email.as_ref().map(|e| e.as_str())
    }
}
