use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use tempfile::NamedTempFile;

use crate::domain::receipt::ServiceReportInput;

/// Multipart body posted by the service form.
#[derive(MultipartForm)]
pub struct ReceiptUploadForm {
    #[multipart(rename = "nombreCliente")]
    pub client_name: Option<Text<String>>,
    #[multipart(rename = "direccion")]
    pub address: Option<Text<String>>,
    #[multipart(rename = "telefono")]
    pub phone: Option<Text<String>>,
    #[multipart(rename = "correoCliente")]
    pub client_email: Option<Text<String>>,
    #[multipart(rename = "fecha")]
    pub date: Option<Text<String>>,
    #[multipart(rename = "categoria")]
    pub category: Option<Text<String>>,
    #[multipart(rename = "tipo")]
    pub work_type: Option<Text<String>>,
    pub checklist: Vec<Text<String>>,
    #[multipart(rename = "comentarios")]
    pub comments: Option<Text<String>>,
    #[multipart(rename = "encargado")]
    pub technician: Option<Text<String>>,
    #[multipart(rename = "fotos", limit = "25MB")]
    pub photos: Vec<TempFile>,
}

fn text(value: Option<Text<String>>) -> Option<String> {
    value.map(Text::into_inner)
}

impl ReceiptUploadForm {
    /// Splits the submission into report fields and uploaded files. Empty
    /// file parts (an unused file input) are dropped.
    pub fn into_parts(self) -> (ServiceReportInput, Vec<(Option<String>, NamedTempFile)>) {
        let input = ServiceReportInput {
            client_name: text(self.client_name),
            address: text(self.address),
            phone: text(self.phone),
            client_email: text(self.client_email),
            date: text(self.date),
            category: text(self.category),
            work_type: text(self.work_type),
            checklist: self.checklist.into_iter().map(Text::into_inner).collect(),
            comments: text(self.comments),
            technician: text(self.technician),
        };
        let uploads = self
            .photos
            .into_iter()
            .filter(|photo| photo.size > 0)
            .map(|photo| (photo.file_name, photo.file))
            .collect();
        (input, uploads)
    }
}
