//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::client::{Client, NewClient};
use crate::domain::types::ReceiptNumber;
use crate::repository::errors::RepositoryResult;
use crate::repository::{ClientReader, ClientWriter, ReceiptCounter};

mock! {
    pub Repository {}

    impl ClientReader for Repository {
        fn list_clients(&self) -> RepositoryResult<Vec<Client>>;
    }

    impl ClientWriter for Repository {
        fn create_client_if_absent(&self, new_client: &NewClient) -> RepositoryResult<bool>;
    }

    impl ReceiptCounter for Repository {
        fn next_receipt_number(&self) -> RepositoryResult<ReceiptNumber>;
    }
}
