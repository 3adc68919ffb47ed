//! The receipt pipeline: optimize photos, number, render, email, clean up.

use std::path::PathBuf;

use crate::domain::receipt::ServiceReport;
use crate::domain::types::ReceiptNumber;
use crate::forms::FormError;
use crate::models::config::ServerConfig;
use crate::render::ReceiptRenderer;
use crate::repository::ReceiptCounter;
use crate::services::notifier::ReceiptNotifier;
use crate::services::photos::{PhotoIntake, PhotoOptimizer, remove_files};
use crate::services::{ServiceError, ServiceResult};

/// Outcome of a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedReceipt {
    pub number: ReceiptNumber,
    pub document: PathBuf,
}

/// Stages shared by every submission.
pub struct ReceiptPipeline {
    intake: PhotoIntake,
    optimizer: PhotoOptimizer,
    renderer: ReceiptRenderer,
    max_photos: usize,
}

impl ReceiptPipeline {
    pub fn new(
        intake: PhotoIntake,
        optimizer: PhotoOptimizer,
        renderer: ReceiptRenderer,
        max_photos: usize,
    ) -> Self {
        Self {
            intake,
            optimizer,
            renderer,
            max_photos,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            PhotoIntake::new(config.storage.upload_dir.clone()),
            PhotoOptimizer::from_config(&config.storage, &config.photos),
            ReceiptRenderer::from_config(&config.storage),
            config.photos.max_files,
        )
    }

    pub fn intake(&self) -> &PhotoIntake {
        &self.intake
    }

    /// Rejects submissions carrying more photos than allowed.
    pub fn check_photo_count(&self, given: usize) -> ServiceResult<()> {
        if given > self.max_photos {
            let err = FormError::TooManyPhotos {
                given,
                max: self.max_photos,
            };
            log::warn!("Rejected receipt submission: {err}");
            return Err(err.into());
        }
        Ok(())
    }

    /// Runs every stage for one submission. The uploaded originals and the
    /// optimized copies are removed afterwards whatever the outcome.
    pub fn issue<C, N>(
        &self,
        counter: &C,
        notifier: &N,
        report: ServiceReport,
        originals: Vec<PathBuf>,
    ) -> ServiceResult<IssuedReceipt>
    where
        C: ReceiptCounter + ?Sized,
        N: ReceiptNotifier + ?Sized,
    {
        let mut optimized = Vec::new();
        let result = self.run_stages(counter, notifier, &report, &originals, &mut optimized);

        remove_files(&originals);
        remove_files(&optimized);

        match &result {
            Ok(issued) => log::info!(
                "Receipt {} issued with {} photo(s)",
                issued.number,
                originals.len()
            ),
            Err(err) => log::error!("Receipt submission failed: {err}"),
        }
        result
    }

    fn run_stages<C, N>(
        &self,
        counter: &C,
        notifier: &N,
        report: &ServiceReport,
        originals: &[PathBuf],
        optimized: &mut Vec<PathBuf>,
    ) -> ServiceResult<IssuedReceipt>
    where
        C: ReceiptCounter + ?Sized,
        N: ReceiptNotifier + ?Sized,
    {
        self.check_photo_count(originals.len())?;

        *optimized = self.optimizer.optimize(originals)?;

        let number = counter.next_receipt_number()?;

        let document = self.renderer.render(report, number, optimized.as_slice())?;

        match report.recipient() {
            Some(to) => notifier.send_receipt(to, &document, number)?,
            None => log::info!("Receipt {number} has no client email, skipping delivery"),
        }

        Ok(IssuedReceipt { number, document })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::receipt::ServiceReportInput;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::notifier::{MockNotifier, NotifyError};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Dirs {
        _root: TempDir,
        uploads: PathBuf,
        optimized: PathBuf,
        output: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = TempDir::new().unwrap();
        let uploads = root.path().join("fotos");
        let optimized = root.path().join("fotos-opt");
        let output = root.path().join("boletas");
        fs::create_dir_all(&uploads).unwrap();
        Dirs {
            _root: root,
            uploads,
            optimized,
            output,
        }
    }

    fn pipeline(dirs: &Dirs) -> ReceiptPipeline {
        ReceiptPipeline::new(
            PhotoIntake::new(&dirs.uploads),
            PhotoOptimizer::new(&dirs.optimized, 1024, 768, 70),
            ReceiptRenderer::new(&dirs.output, None, 5),
            8,
        )
    }

    fn photos(dirs: &Dirs, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dirs.uploads.join(format!("foto-{i}.png"));
                image::RgbImage::from_pixel(1600, 1200, image::Rgb([90, 90, 90]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    fn report_for(email: &str) -> ServiceReport {
        ServiceReport::from(ServiceReportInput {
            client_name: Some("Ana Rojas".to_string()),
            client_email: Some(email.to_string()),
            ..Default::default()
        })
    }

    fn counter_returning(n: u64) -> MockRepository {
        let mut repo = MockRepository::new();
        repo.expect_next_receipt_number()
            .times(1)
            .returning(move || Ok(ReceiptNumber::new(n).unwrap()));
        repo
    }

    #[test]
    fn full_submission_emails_one_document_and_cleans_up() {
        let dirs = dirs();
        let pipeline = pipeline(&dirs);
        let originals = photos(&dirs, 3);
        let repo = counter_returning(42);

        let optimized_dir = dirs.optimized.clone();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_receipt()
            .withf(move |to, document, number| {
                to == "ana@example.com"
                    && document.ends_with("boleta-000042.pdf")
                    && document.exists()
                    && number.get() == 42
                    && file_count(&optimized_dir) == 3
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let issued = pipeline
            .issue(&repo, &notifier, report_for("ana@example.com"), originals)
            .unwrap();

        assert_eq!(issued.number.to_string(), "000042");
        assert_eq!(file_count(&dirs.output), 1);
        assert_eq!(file_count(&dirs.uploads), 0);
        assert_eq!(file_count(&dirs.optimized), 0);
    }

    #[test]
    fn blank_email_skips_delivery() {
        let dirs = dirs();
        let repo = counter_returning(1);
        let mut notifier = MockNotifier::new();
        notifier.expect_send_receipt().times(0);

        let issued = pipeline(&dirs)
            .issue(&repo, &notifier, report_for("   "), Vec::new())
            .unwrap();

        assert!(issued.document.exists());
    }

    #[test]
    fn too_many_photos_is_a_form_error_before_any_stage() {
        let dirs = dirs();
        let originals = photos(&dirs, 9);
        let mut repo = MockRepository::new();
        repo.expect_next_receipt_number().times(0);
        let mut notifier = MockNotifier::new();
        notifier.expect_send_receipt().times(0);

        let result = pipeline(&dirs).issue(&repo, &notifier, report_for("a@b.cl"), originals);

        assert!(matches!(result, Err(ServiceError::Form(_))));
        assert_eq!(file_count(&dirs.uploads), 0);
        assert_eq!(file_count(&dirs.output), 0);
    }

    #[test]
    fn undecodable_photo_fails_before_numbering_and_cleans_up() {
        let dirs = dirs();
        let mut originals = photos(&dirs, 1);
        let broken = dirs.uploads.join("rota.jpg");
        fs::write(&broken, b"garbage").unwrap();
        originals.push(broken);
        let mut repo = MockRepository::new();
        repo.expect_next_receipt_number().times(0);
        let notifier = MockNotifier::new();

        let result = pipeline(&dirs).issue(&repo, &notifier, report_for("a@b.cl"), originals);

        assert!(matches!(result, Err(ServiceError::Photo(_))));
        assert_eq!(file_count(&dirs.uploads), 0);
        assert_eq!(file_count(&dirs.optimized), 0);
    }

    #[test]
    fn counter_failure_stops_rendering() {
        let dirs = dirs();
        let originals = photos(&dirs, 1);
        let mut repo = MockRepository::new();
        repo.expect_next_receipt_number()
            .returning(|| Err(RepositoryError::Unexpected("disk full".to_string())));
        let notifier = MockNotifier::new();

        let result = pipeline(&dirs).issue(&repo, &notifier, report_for("a@b.cl"), originals);

        assert!(matches!(result, Err(ServiceError::Repository(_))));
        assert_eq!(file_count(&dirs.output), 0);
        assert_eq!(file_count(&dirs.uploads), 0);
        assert_eq!(file_count(&dirs.optimized), 0);
    }

    #[test]
    fn delivery_failure_still_cleans_up() {
        let dirs = dirs();
        let originals = photos(&dirs, 2);
        let repo = counter_returning(5);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_receipt()
            .times(1)
            .returning(|_, _, _| Err(NotifyError::ContentType("boom".to_string())));

        let result = pipeline(&dirs).issue(&repo, &notifier, report_for("a@b.cl"), originals);

        assert!(matches!(result, Err(ServiceError::Notify(_))));
        assert_eq!(file_count(&dirs.uploads), 0);
        assert_eq!(file_count(&dirs.optimized), 0);
        assert_eq!(file_count(&dirs.output), 1);
    }
}
