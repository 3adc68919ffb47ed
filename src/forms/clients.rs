use serde::Deserialize;
use validator::Validate;

use crate::domain::client::NewClient;
use crate::forms::FormError;

/// Client registration body, accepted as JSON or urlencoded.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AddClientForm {
    #[serde(default, rename = "nombre")]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default, rename = "direccion")]
    #[validate(length(min = 1))]
    pub address: String,
    #[serde(default, rename = "telefono")]
    #[validate(length(min = 1))]
    pub phone: String,
    #[serde(default, rename = "correo")]
    #[validate(length(min = 1))]
    pub email: String,
}

impl AddClientForm {
    /// Validates the raw input and converts it into a domain value. Blank
    /// values are rejected after trimming.
    pub fn to_new_client(&self) -> Result<NewClient, FormError> {
        self.validate()?;
        let client = NewClient::try_new(
            self.name.as_str(),
            self.address.as_str(),
            self.phone.as_str(),
            self.email.as_str(),
        )?;
        Ok(client)
    }
}
