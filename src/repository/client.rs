//! Client registry stored as a JSON array.

use std::fs;
use std::io::ErrorKind;

use crate::{
    domain::client::{Client, NewClient},
    repository::{
        ClientReader, ClientWriter, JsonRepository, lock,
        errors::{RepositoryError, RepositoryResult},
        replace_json,
    },
};

impl JsonRepository {
    /// Reads the registry, creating an empty one when the file is missing.
    fn load_clients(&self) -> RepositoryResult<Vec<Client>> {
        let raw = match fs::read_to_string(&self.clients_file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!(
                    "Client registry {} not found, creating it",
                    self.clients_file.display()
                );
                replace_json(&self.clients_file, &Vec::<Client>::new())?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|e| RepositoryError::Corrupted {
            path: self.clients_file.clone(),
            reason: e.to_string(),
        })
    }
}

impl ClientReader for JsonRepository {
    fn list_clients(&self) -> RepositoryResult<Vec<Client>> {
        let _guard = lock(&self.clients_gate)?;
        self.load_clients()
    }
}

impl ClientWriter for JsonRepository {
    fn create_client_if_absent(&self, new_client: &NewClient) -> RepositoryResult<bool> {
        let _guard = lock(&self.clients_gate)?;
        let mut clients = self.load_clients()?;

        if clients.iter().any(|c| c.name.same_as(&new_client.name)) {
            return Ok(false);
        }

        clients.push(Client::from(new_client.clone()));
        replace_json(&self.clients_file, &clients)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo(dir: &TempDir) -> JsonRepository {
        JsonRepository::new(
            dir.path().join("clientes.json"),
            dir.path().join("boleta-counter.json"),
            true,
        )
    }

    fn new_client(name: &str) -> NewClient {
        NewClient::try_new(name, "Av. Central 123", "555-0101", "cliente@example.com")
            .expect("valid client")
    }

    #[test]
    fn list_creates_empty_store() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);

        assert!(repo.list_clients().unwrap().is_empty());
        let raw = fs::read_to_string(dir.path().join("clientes.json")).unwrap();
        assert_eq!(raw.trim(), "[]");
    }

    #[test]
    fn create_skips_case_insensitive_duplicates() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);

        assert!(repo.create_client_if_absent(&new_client("Hotel Sol")).unwrap());
        assert!(!repo.create_client_if_absent(&new_client("HOTEL SOL")).unwrap());
        assert!(repo.create_client_if_absent(&new_client("Hotel Luna")).unwrap());

        let names: Vec<_> = repo
            .list_clients()
            .unwrap()
            .into_iter()
            .map(|c| c.name.into_inner())
            .collect();
        assert_eq!(names, vec!["Hotel Sol", "Hotel Luna"]);
    }

    #[test]
    fn reads_existing_store_written_by_hand() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("clientes.json"),
            r#"[{"nombre":"Ana","direccion":"Calle 1","telefono":"555","correo":"ana@example.com"}]"#,
        )
        .unwrap();

        let clients = repo(&dir).list_clients().unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].email.as_str(), "ana@example.com");
    }

    #[test]
    fn corrupt_store_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("clientes.json"), "{not json").unwrap();

        let result = repo(&dir).list_clients();
        assert!(matches!(result, Err(RepositoryError::Corrupted { .. })));
    }
}
