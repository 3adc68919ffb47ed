//! PDF receipts: layout, serialization and retention of the output directory.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::domain::receipt::ServiceReport;
use crate::domain::types::ReceiptNumber;
use crate::models::config::StorageConfig;
use crate::render::canvas::{EmbeddedImage, PageCanvas, PdfBuilder};
use crate::render::layout::{PHOTOS_PER_PAGE, draw_front_pages, draw_gallery_page};

pub mod canvas;
pub mod fonts;
pub mod layout;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("renderer lock poisoned")]
    Poisoned,
}

impl From<tempfile::PersistError> for RenderError {
    fn from(err: tempfile::PersistError) -> Self {
        RenderError::Io(err.error)
    }
}

/// Writes receipts into the output directory and keeps only the newest ones.
pub struct ReceiptRenderer {
    output_dir: PathBuf,
    logo_path: Option<PathBuf>,
    retained: usize,
    gate: Mutex<()>,
}

impl ReceiptRenderer {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        logo_path: Option<PathBuf>,
        retained: usize,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            logo_path,
            retained: retained.max(1),
            gate: Mutex::new(()),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(
            storage.output_dir.clone(),
            storage.logo_path.clone(),
            storage.retained_receipts,
        )
    }

    /// Renders the receipt and stores it as `boleta-<number>.pdf`. Older
    /// receipts are pruned only once the new one is in place.
    pub fn render(
        &self,
        report: &ServiceReport,
        number: ReceiptNumber,
        photos: &[PathBuf],
    ) -> Result<PathBuf, RenderError> {
        let builder = self.compose(report, number, photos)?;

        fs::create_dir_all(&self.output_dir)?;
        let mut staged = NamedTempFile::new_in(&self.output_dir)?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            builder.write_to(&mut writer)?;
            writer.flush()?;
        }
        staged.as_file().sync_all()?;

        let target = self.output_dir.join(number.document_name());
        let _guard = self.gate.lock().map_err(|_| RenderError::Poisoned)?;
        staged.persist(&target)?;
        prune_documents(&self.output_dir, self.retained - 1, &target)?;

        log::info!("Rendered receipt {}", target.display());
        Ok(target)
    }

    fn compose(
        &self,
        report: &ServiceReport,
        number: ReceiptNumber,
        photos: &[PathBuf],
    ) -> Result<PdfBuilder, RenderError> {
        let mut builder = PdfBuilder::new();

        let logo = self
            .logo_path
            .as_deref()
            .and_then(EmbeddedImage::load_optional)
            .map(|image| builder.embed_image(image));

        for page in draw_front_pages(report, number, logo.as_ref()) {
            builder.add_page(page)?;
        }

        for chunk in photos.chunks(PHOTOS_PER_PAGE) {
            let slots: Vec<_> = chunk
                .iter()
                .map(|path| EmbeddedImage::load_optional(path).map(|img| builder.embed_image(img)))
                .collect();
            let mut page = PageCanvas::new();
            draw_gallery_page(&mut page, &slots);
            builder.add_page(page)?;
        }

        Ok(builder)
    }
}

/// Deletes `.pdf` files in `dir` so that at most `keep` remain, oldest
/// first. `exclude` is never counted nor removed.
pub fn prune_documents(dir: &Path, keep: usize, exclude: &Path) -> Result<usize, RenderError> {
    let mut documents: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf || path == exclude || !entry.file_type()?.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        documents.push((modified, path));
    }

    documents.sort_by(|a, b| b.0.cmp(&a.0));

    let mut removed = 0;
    for (_, path) in documents.into_iter().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Removed old receipt {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(removed)
}
