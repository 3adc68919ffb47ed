use crate::domain::client::Client;
use crate::forms::clients::AddClientForm;
use crate::repository::{ClientReader, ClientWriter};
use crate::services::{ServiceError, ServiceResult};

/// Message returned when any registration field is missing.
pub const MISSING_FIELDS_MESSAGE: &str = "Todos los campos son obligatorios";

/// Returns every registered client in insertion order.
pub fn list_clients<R>(repo: &R) -> ServiceResult<Vec<Client>>
where
    R: ClientReader + ?Sized,
{
    repo.list_clients().map_err(|err| {
        log::error!("Failed to list clients: {err}");
        ServiceError::from(err)
    })
}

/// Validates the form and registers the client unless the name is already
/// known. A duplicate is accepted silently.
pub fn add_client<R>(repo: &R, form: AddClientForm) -> ServiceResult<()>
where
    R: ClientWriter + ?Sized,
{
    let new_client = form.to_new_client().map_err(|err| {
        log::warn!("Rejected client registration: {err}");
        ServiceError::Form(MISSING_FIELDS_MESSAGE.to_string())
    })?;

    let created = repo.create_client_if_absent(&new_client).map_err(|err| {
        log::error!("Failed to register client: {err}");
        ServiceError::from(err)
    })?;

    if created {
        log::info!("Registered client {}", new_client.name);
    } else {
        log::info!("Client {} is already registered", new_client.name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn complete_form() -> AddClientForm {
        AddClientForm {
            name: "Ferretería Sur".to_string(),
            address: "Los Aromos 45".to_string(),
            phone: "221234567".to_string(),
            email: "compras@ferreteriasur.cl".to_string(),
        }
    }

    #[test]
    fn add_client_persists_valid_form() {
        let mut repo = MockRepository::new();
        repo.expect_create_client_if_absent()
            .withf(|client| client.name.as_str() == "Ferretería Sur")
            .times(1)
            .returning(|_| Ok(true));

        add_client(&repo, complete_form()).expect("should add client");
    }

    #[test]
    fn add_client_accepts_known_name() {
        let mut repo = MockRepository::new();
        repo.expect_create_client_if_absent()
            .times(1)
            .returning(|_| Ok(false));

        assert!(add_client(&repo, complete_form()).is_ok());
    }

    #[test]
    fn add_client_rejects_missing_field_without_touching_store() {
        let mut repo = MockRepository::new();
        repo.expect_create_client_if_absent().times(0);
        let form = AddClientForm {
            phone: " ".to_string(),
            ..complete_form()
        };

        let result = add_client(&repo, form);

        match result {
            Err(ServiceError::Form(message)) => assert_eq!(message, MISSING_FIELDS_MESSAGE),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn list_clients_surfaces_store_failures() {
        let mut repo = MockRepository::new();
        repo.expect_list_clients().returning(|| {
            Err(RepositoryError::Corrupted {
                path: "clientes.json".into(),
                reason: "expected value".to_string(),
            })
        });

        let result = list_clients(&repo);

        assert!(matches!(result, Err(ServiceError::Repository(_))));
    }
}
