use serde::{Deserialize, Serialize};

use crate::domain::types::{
    ClientAddress, ClientEmail, ClientName, ClientPhone, TypeConstraintError,
};

/// Contact record kept in the client registry.
///
/// Field names on the wire match the browser form (`nombre`, `direccion`,
/// `telefono`, `correo`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    #[serde(rename = "nombre")]
    pub name: ClientName,
    #[serde(rename = "direccion")]
    pub address: ClientAddress,
    #[serde(rename = "telefono")]
    pub phone: ClientPhone,
    #[serde(rename = "correo")]
    pub email: ClientEmail,
}

/// Validated payload for registering a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewClient {
    pub name: ClientName,
    pub address: ClientAddress,
    pub phone: ClientPhone,
    pub email: ClientEmail,
}

impl NewClient {
    pub fn try_new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            name: ClientName::new(name)?,
            address: ClientAddress::new(address)?,
            phone: ClientPhone::new(phone)?,
            email: ClientEmail::new(email)?,
        })
    }
}

impl From<NewClient> for Client {
    fn from(new: NewClient) -> Self {
        Self {
            name: new.name,
            address: new.address,
            phone: new.phone,
            email: new.email,
        }
    }
}
