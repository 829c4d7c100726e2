use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::process::Command;

use crate::render::html::to_html;
use crate::render::layout::LayoutDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Png,
    Pdf,
}

impl ArtifactKind {
    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Png => "image/png",
            ArtifactKind::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Png => "png",
            ArtifactKind::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub bytes: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with an error: {stderr}")]
    Tool { tool: String, stderr: String },

    #[error("{0} produced no output")]
    MissingOutput(String),

    #[error("invalid file name")]
    InvalidFileName,

    #[error("artifact IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a layout tree into a downloadable artifact.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    async fn render(
        &self,
        doc: &LayoutDocument,
        kind: ArtifactKind,
    ) -> Result<Artifact, ArtifactError>;
}

/// Renders through LibreOffice (HTML to PDF) and poppler (PDF to PNG).
#[derive(Debug, Clone)]
pub struct ExternalToolRenderer {
    libreoffice_bin: String,
    pdftoppm_bin: String,
    work_root: PathBuf,
}

impl ExternalToolRenderer {
    pub fn new(libreoffice_bin: impl Into<String>, pdftoppm_bin: impl Into<String>) -> Self {
        Self {
            libreoffice_bin: libreoffice_bin.into(),
            pdftoppm_bin: pdftoppm_bin.into(),
            work_root: std::env::temp_dir(),
        }
    }

    async fn html_to_pdf(&self, dir: &Path, html: &str) -> Result<PathBuf, ArtifactError> {
        let html_path = dir.join("cv.html");
        fs::write(&html_path, html).await?;

        run_tool(
            Command::new(&self.libreoffice_bin).args(html_to_pdf_args(dir, &html_path)),
            &self.libreoffice_bin,
        )
        .await?;

        let pdf_path = dir.join("cv.pdf");
        if fs::metadata(&pdf_path).await.is_err() {
            return Err(ArtifactError::MissingOutput(self.libreoffice_bin.clone()));
        }
        Ok(pdf_path)
    }

    async fn pdf_to_png(&self, dir: &Path, pdf_path: &Path) -> Result<PathBuf, ArtifactError> {
        let prefix = dir.join("page");
        run_tool(
            Command::new(&self.pdftoppm_bin)
                .arg("-png")
                .arg("-singlefile")
                .arg("-r")
                .arg("150")
                .arg(pdf_path)
                .arg(&prefix),
            &self.pdftoppm_bin,
        )
        .await?;

        let png_path = dir.join("page.png");
        if fs::metadata(&png_path).await.is_err() {
            return Err(ArtifactError::MissingOutput(self.pdftoppm_bin.clone()));
        }
        Ok(png_path)
    }

    async fn render_in(
        &self,
        dir: &Path,
        doc: &LayoutDocument,
        kind: ArtifactKind,
    ) -> Result<Artifact, ArtifactError> {
        let pdf_path = self.html_to_pdf(dir, &to_html(doc)).await?;
        let out_path = match kind {
            ArtifactKind::Pdf => pdf_path,
            ArtifactKind::Png => self.pdf_to_png(dir, &pdf_path).await?,
        };
        let bytes = fs::read(&out_path).await?;
        Ok(Artifact {
            kind,
            bytes: Bytes::from(bytes),
        })
    }
}

#[async_trait]
impl ArtifactRenderer for ExternalToolRenderer {
    async fn render(
        &self,
        doc: &LayoutDocument,
        kind: ArtifactKind,
    ) -> Result<Artifact, ArtifactError> {
        let dir = self.work_root.join(format!("cv_render_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;

        let result = self.render_in(&dir, doc, kind).await;
        if let Err(e) = fs::remove_dir_all(&dir).await {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to clean render directory");
        }

        match &result {
            Ok(artifact) => tracing::info!(
                template = doc.template_id,
                kind = ?kind,
                bytes = artifact.bytes.len(),
                "Rendered artifact"
            ),
            Err(e) => tracing::error!(template = doc.template_id, kind = ?kind, error = %e, "Render failed"),
        }
        result
    }
}

/// HTML opens in Writer/Web, which only exports PDF through its own filter.
/// LibreOffice exits 0 without output when the filter does not match.
const HTML_PDF_FILTER: &str = "pdf:writer_web_pdf_Export";

fn html_to_pdf_args(dir: &Path, html_path: &Path) -> Vec<OsString> {
    vec![
        "--headless".into(),
        "--norestore".into(),
        "--convert-to".into(),
        HTML_PDF_FILTER.into(),
        "--outdir".into(),
        dir.into(),
        html_path.into(),
    ]
}

/// Runs an external tool and returns its stdout.
pub(crate) async fn run_tool(cmd: &mut Command, tool: &str) -> Result<Vec<u8>, ArtifactError> {
    let out = cmd.output().await.map_err(|source| ArtifactError::Spawn {
        tool: tool.to_string(),
        source,
    })?;
    if !out.status.success() {
        return Err(ArtifactError::Tool {
            tool: tool.to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }
    Ok(out.stdout)
}

/// Cleans a user-supplied export name and appends the extension.
///
/// Anything outside `[A-Za-z0-9 _.-]` is dropped. A name that is empty
/// after trimming, before or after cleaning, is rejected.
pub fn sanitize_file_name(raw: &str, kind: ArtifactKind) -> Result<String, ArtifactError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | '-'))
        .collect();
    let cleaned = cleaned.trim().trim_matches('.');
    if cleaned.is_empty() {
        return Err(ArtifactError::InvalidFileName);
    }

    let ext = kind.extension();
    let lower = cleaned.to_ascii_lowercase();
    if lower.ends_with(&format!(".{}", ext)) {
        Ok(cleaned.to_string())
    } else {
        Ok(format!("{}.{}", cleaned, ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TemplateChoice;
    use crate::models::cv::CvContent;
    use crate::render::layout::build_layout;

    #[test]
    fn file_names_are_cleaned() {
        assert_eq!(
            sanitize_file_name("  My CV ", ArtifactKind::Pdf).unwrap(),
            "My CV.pdf"
        );
        assert_eq!(
            sanitize_file_name("../../etc/passwd", ArtifactKind::Pdf).unwrap(),
            "etcpasswd.pdf"
        );
        assert_eq!(
            sanitize_file_name("resume.PDF", ArtifactKind::Pdf).unwrap(),
            "resume.PDF"
        );
        assert_eq!(
            sanitize_file_name("snap", ArtifactKind::Png).unwrap(),
            "snap.png"
        );
    }

    #[test]
    fn blank_file_names_are_rejected() {
        assert!(matches!(
            sanitize_file_name("   ", ArtifactKind::Pdf),
            Err(ArtifactError::InvalidFileName)
        ));
        assert!(matches!(
            sanitize_file_name("///", ArtifactKind::Pdf),
            Err(ArtifactError::InvalidFileName)
        ));
    }

    #[tokio::test]
    async fn missing_tool_is_a_spawn_error_and_cleans_up() {
        let root = std::env::temp_dir().join(format!("cv_render_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();
        let renderer = ExternalToolRenderer {
            libreoffice_bin: "definitely-not-a-real-office-binary".into(),
            pdftoppm_bin: "definitely-not-pdftoppm".into(),
            work_root: root.clone(),
        };
        let doc = build_layout(&CvContent::default(), TemplateChoice::WithoutPhoto, None);

        let err = renderer.render(&doc, ArtifactKind::Png).await.unwrap_err();
        assert!(matches!(err, ArtifactError::Spawn { .. }));
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn html_is_converted_with_the_writer_web_filter() {
        let dir = Path::new("/tmp/render");
        let args = html_to_pdf_args(dir, &dir.join("cv.html"));
        let pos = args.iter().position(|a| a == "--convert-to").unwrap();
        assert_eq!(args[pos + 1], "pdf:writer_web_pdf_Export");
        assert_eq!(args.last().unwrap(), &OsString::from("/tmp/render/cv.html"));
    }

    // Needs LibreOffice and poppler on PATH: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn renders_real_pdf_and_png() {
        let renderer = ExternalToolRenderer::new("libreoffice", "pdftoppm");
        let doc = build_layout(&CvContent::default(), TemplateChoice::WithoutPhoto, None);

        let pdf = renderer.render(&doc, ArtifactKind::Pdf).await.unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));
        let png = renderer.render(&doc, ArtifactKind::Png).await.unwrap();
        assert!(png.bytes.starts_with(b"\x89PNG"));
    }
}
