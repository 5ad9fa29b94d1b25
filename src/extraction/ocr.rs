//! OCR fallback that shells out to poppler's `pdftoppm` and `tesseract`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

/// Errors raised while rasterizing or recognizing pages.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Temporary files or subprocesses could not be created.
    #[error("OCR I/O failure: {0}")]
    Io(#[from] std::io::Error),
    /// An external tool exited unsuccessfully.
    #[error("{program} failed: {detail}")]
    Command {
        /// Executable that failed.
        program: String,
        /// Exit status and captured stderr.
        detail: String,
    },
}

/// Recognizes the text of every page of a PDF.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Return the raw recognized text of all pages, in page order.
    async fn recognize(&self, pdf: &[u8]) -> Result<String, OcrError>;
}

/// [`OcrEngine`] backed by the `pdftoppm` and `tesseract` executables.
pub struct TesseractOcr {
    pdftoppm: PathBuf,
    tesseract: PathBuf,
    languages: String,
    dpi: u32,
}

impl TesseractOcr {
    /// Locate both executables on `PATH`; `None` when either is missing.
    pub fn detect(languages: &str, dpi: u32) -> Option<Self> {
        let pdftoppm = which::which("pdftoppm").ok()?;
        let tesseract = which::which("tesseract").ok()?;
        Some(Self {
            pdftoppm,
            tesseract,
            languages: languages.to_string(),
            dpi,
        })
    }

    async fn rasterize(&self, pdf_path: &Path, prefix: &Path) -> Result<(), OcrError> {
        let output = Command::new(&self.pdftoppm)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(prefix)
            .output()
            .await?;
        ensure_success("pdftoppm", &output)
    }

    async fn recognize_image(&self, image: &Path) -> Result<String, OcrError> {
        let output = Command::new(&self.tesseract)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .await?;
        ensure_success("tesseract", &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, pdf: &[u8]) -> Result<String, OcrError> {
        let workdir = tempfile::tempdir()?;
        let pdf_path = workdir.path().join("input.pdf");
        tokio::fs::write(&pdf_path, pdf).await?;

        let prefix = workdir.path().join("page");
        self.rasterize(&pdf_path, &prefix).await?;

        let images = page_images(workdir.path())?;
        tracing::debug!(pages = images.len(), dpi = self.dpi, "Rasterized pages for OCR");

        let mut texts = Vec::with_capacity(images.len());
        for image in &images {
            texts.push(self.recognize_image(image).await?);
        }
        Ok(texts.join("\n"))
    }
}

fn ensure_success(program: &str, output: &std::process::Output) -> Result<(), OcrError> {
    if output.status.success() {
        return Ok(());
    }
    Err(OcrError::Command {
        program: program.to_string(),
        detail: format!(
            "{}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    })
}

/// List `page-N.png` files produced by `pdftoppm`, ordered by page number.
fn page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = page_number(&path) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("page-")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_images_are_sorted_numerically() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["page-10.png", "page-2.png", "page-1.png", "input.pdf", "page-x.png"] {
            std::fs::write(dir.path().join(name), b"").expect("write");
        }

        let images = page_images(dir.path()).expect("list");
        let names: Vec<_> = images
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn zero_padded_page_names_parse() {
        assert_eq!(page_number(Path::new("/tmp/page-007.png")), Some(7));
        assert_eq!(page_number(Path::new("/tmp/page-7.ppm")), None);
    }
}
