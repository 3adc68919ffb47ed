//! Persisted receipt sequence.
//!
//! The file holds the next number to issue as `{ "contador": n }`. A missing
//! file, a missing key or a zero value all mean 1.

use std::fs;
use std::io::ErrorKind;

use serde::{Deserialize, Serialize};

use crate::{
    domain::types::ReceiptNumber,
    repository::{
        JsonRepository, ReceiptCounter, lock,
        errors::{RepositoryError, RepositoryResult},
        replace_json,
    },
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CounterRecord {
    #[serde(default)]
    contador: Option<u64>,
}

impl JsonRepository {
    fn read_counter(&self) -> RepositoryResult<ReceiptNumber> {
        let raw = match fs::read_to_string(&self.counter_file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ReceiptNumber::default()),
            Err(e) => return Err(e.into()),
        };

        let record: CounterRecord =
            serde_json::from_str(&raw).map_err(|e| RepositoryError::Corrupted {
                path: self.counter_file.clone(),
                reason: e.to_string(),
            })?;

        Ok(record
            .contador
            .and_then(|n| ReceiptNumber::new(n).ok())
            .unwrap_or_default())
    }
}

impl ReceiptCounter for JsonRepository {
    fn next_receipt_number(&self) -> RepositoryResult<ReceiptNumber> {
        let _guard = lock(&self.counter_gate)?;

        let current = match self.read_counter() {
            Ok(number) => number,
            Err(err) if self.reset_counter_on_corrupt => {
                log::warn!(
                    "Receipt counter {} is unreadable, numbering restarts at {}: {err}",
                    self.counter_file.display(),
                    ReceiptNumber::default()
                );
                ReceiptNumber::default()
            }
            Err(err) => return Err(err),
        };

        let record = CounterRecord {
            contador: Some(current.next().get()),
        };
        replace_json(&self.counter_file, &record)?;

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo(dir: &TempDir, reset_on_corrupt: bool) -> JsonRepository {
        JsonRepository::new(
            dir.path().join("clientes.json"),
            dir.path().join("boleta-counter.json"),
            reset_on_corrupt,
        )
    }

    fn stored_value(dir: &TempDir) -> serde_json::Value {
        let raw = fs::read_to_string(dir.path().join("boleta-counter.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn starts_at_one_without_file() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir, true);

        assert_eq!(repo.next_receipt_number().unwrap().to_string(), "000001");
        assert_eq!(stored_value(&dir)["contador"], 2);
    }

    #[test]
    fn sequential_calls_differ_by_one() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir, true);

        let first = repo.next_receipt_number().unwrap();
        let second = repo.next_receipt_number().unwrap();

        assert_eq!(second.get(), first.get() + 1);
        assert_eq!(second.to_string().len(), 6);
    }

    #[test]
    fn continues_from_persisted_value() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("boleta-counter.json"),
            "{\n  \"contador\": 999999\n}",
        )
        .unwrap();
        let repo = repo(&dir, true);

        assert_eq!(repo.next_receipt_number().unwrap().to_string(), "999999");
        assert_eq!(repo.next_receipt_number().unwrap().to_string(), "1000000");
    }

    #[test]
    fn zero_is_treated_as_one() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("boleta-counter.json"), r#"{"contador":0}"#).unwrap();

        assert_eq!(repo(&dir, true).next_receipt_number().unwrap().get(), 1);
    }

    #[test]
    fn corrupt_file_resets_when_allowed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("boleta-counter.json"), "garbage").unwrap();

        assert_eq!(repo(&dir, true).next_receipt_number().unwrap().get(), 1);
        assert_eq!(stored_value(&dir)["contador"], 2);
    }

    #[test]
    fn corrupt_file_fails_when_reset_disabled() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("boleta-counter.json"), "garbage").unwrap();

        let result = repo(&dir, false).next_receipt_number();
        assert!(matches!(result, Err(RepositoryError::Corrupted { .. })));
        let raw = fs::read_to_string(dir.path().join("boleta-counter.json")).unwrap();
        assert_eq!(raw, "garbage");
    }

    #[test]
    fn concurrent_callers_never_share_a_number() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir, true);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                std::thread::spawn(move || repo.next_receipt_number().unwrap().get())
            })
            .collect();
        let mut issued: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        issued.sort_unstable();

        assert_eq!(issued, (1..=8).collect::<Vec<_>>());
    }
}
