//! Transient photo handling: persisting uploads and shrinking them for the
//! gallery pages.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

use crate::models::config::{PhotoConfig, StorageConfig};

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("cannot open photo {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot decode photo {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("cannot encode photo {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Keeps ASCII alphanumerics, dots, dashes and underscores.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "foto".to_string()
    } else {
        cleaned
    }
}

/// Removes files, logging failures. Files already gone are ignored.
pub fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => log::debug!("Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove {}: {e}", path.display()),
        }
    }
}

/// Persists uploaded files into the upload directory.
#[derive(Clone, Debug)]
pub struct PhotoIntake {
    dir: PathBuf,
}

impl PhotoIntake {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Moves one upload to `<millis>-<uuid>-<sanitized name>`.
    pub fn store(
        &self,
        file_name: Option<&str>,
        upload: NamedTempFile,
    ) -> Result<PathBuf, PhotoError> {
        fs::create_dir_all(&self.dir).map_err(|source| PhotoError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let name = format!(
            "{}-{}-{}",
            unix_millis(),
            Uuid::new_v4().simple(),
            sanitize_file_name(file_name.unwrap_or_default())
        );
        let target = self.dir.join(name);

        match upload.persist(&target) {
            Ok(_) => Ok(target),
            // Temp files may live on another filesystem.
            Err(err) => {
                let upload = err.file;
                fs::copy(upload.path(), &target).map_err(|source| PhotoError::Io {
                    path: target.clone(),
                    source,
                })?;
                Ok(target)
            }
        }
    }

    /// Stores every upload or none: on failure the files stored so far are
    /// removed.
    pub fn store_all<I>(&self, uploads: I) -> Result<Vec<PathBuf>, PhotoError>
    where
        I: IntoIterator<Item = (Option<String>, NamedTempFile)>,
    {
        let mut stored = Vec::new();
        for (file_name, upload) in uploads {
            match self.store(file_name.as_deref(), upload) {
                Ok(path) => stored.push(path),
                Err(err) => {
                    remove_files(&stored);
                    return Err(err);
                }
            }
        }
        Ok(stored)
    }
}

/// Produces bounded JPEG copies of the uploaded photos.
#[derive(Clone, Debug)]
pub struct PhotoOptimizer {
    output_dir: PathBuf,
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl PhotoOptimizer {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        max_width: u32,
        max_height: u32,
        quality: u8,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_width: max_width.max(1),
            max_height: max_height.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(storage: &StorageConfig, photos: &PhotoConfig) -> Self {
        Self::new(
            storage.optimized_dir.clone(),
            photos.max_width,
            photos.max_height,
            photos.jpeg_quality,
        )
    }

    /// Optimizes every photo, preserving order. Any failure discards the
    /// outputs of this call.
    pub fn optimize(&self, originals: &[PathBuf]) -> Result<Vec<PathBuf>, PhotoError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| PhotoError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut produced = Vec::with_capacity(originals.len());
        for original in originals {
            match self.optimize_one(original) {
                Ok(path) => produced.push(path),
                Err(err) => {
                    log::error!("Photo optimization failed: {err}");
                    remove_files(&produced);
                    return Err(err);
                }
            }
        }
        Ok(produced)
    }

    fn optimize_one(&self, original: &Path) -> Result<PathBuf, PhotoError> {
        let decoded = ImageReader::open(original)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| PhotoError::Open {
                path: original.to_path_buf(),
                source,
            })?
            .decode()
            .map_err(|source| PhotoError::Decode {
                path: original.to_path_buf(),
                source,
            })?;

        let resized = if decoded.width() > self.max_width || decoded.height() > self.max_height {
            decoded.resize(self.max_width, self.max_height, FilterType::Lanczos3)
        } else {
            decoded
        };

        let stem = original
            .file_stem()
            .map(|s| sanitize_file_name(&s.to_string_lossy()))
            .unwrap_or_else(|| "foto".to_string());
        let target = self.output_dir.join(format!(
            "opt-{}-{}-{stem}.jpg",
            unix_millis(),
            Uuid::new_v4().simple()
        ));

        let io_error = |source| PhotoError::Io {
            path: target.clone(),
            source,
        };
        let file = fs::File::create(&target).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        let encoded = JpegEncoder::new_with_quality(&mut writer, self.quality)
            .encode_image(&resized.to_rgb8())
            .map_err(|source| PhotoError::Encode {
                path: target.clone(),
                source,
            });
        let flushed = encoded.and_then(|()| writer.flush().map_err(io_error));
        if let Err(err) = flushed {
            drop(writer);
            remove_files(std::slice::from_ref(&target));
            return Err(err);
        }

        Ok(target)
    }
}
