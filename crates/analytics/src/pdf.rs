//! Report persistence.
//!
//! Report text is split into headings, numbered points, bullet points and
//! paragraphs, rendered to HTML through an embedded tera template, and
//! converted to PDF with `wkhtmltopdf` when it is on PATH. Without a converter
//! the HTML itself is written next to the requested name.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use reviewlens_core::config::OutputConfig;
use serde::Serialize;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("report is empty")]
    EmptyReport,
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("could not write `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportBlock {
    Heading(String),
    Numbered(Vec<String>),
    Bullets(Vec<String>),
    Paragraph(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Html,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedReport {
    pub path: PathBuf,
    pub format: ReportFormat,
}

impl PersistedReport {
    pub fn confirmation(&self) -> String {
        match self.format {
            ReportFormat::Pdf => format!("Report saved as PDF to {}", self.path.display()),
            ReportFormat::Html => format!(
                "PDF converter unavailable; report saved as HTML to {}",
                self.path.display()
            ),
        }
    }
}

pub struct ReportPersister {
    tera: Tera,
    output_dir: PathBuf,
    default_name: String,
    wkhtmltopdf_path: Option<PathBuf>,
}

impl ReportPersister {
    /// Persister that converts to PDF when `wkhtmltopdf` is on PATH.
    pub fn new(output: &OutputConfig) -> Result<Self, PersistError> {
        let mut persister = Self::html_only(&output.directory)?;
        persister.default_name = output.default_report_name.clone();
        persister.wkhtmltopdf_path = which::which("wkhtmltopdf").ok();

        match &persister.wkhtmltopdf_path {
            Some(path) => info!(path = %path.display(), "wkhtmltopdf found"),
            None => warn!("wkhtmltopdf not found in PATH - reports will be saved as HTML"),
        }
        Ok(persister)
    }

    /// Persister that always writes HTML.
    pub fn html_only(output_dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            "report.html",
            include_str!("../../../templates/report/report.html.tera"),
        )
        .map_err(|error| PersistError::Template(error.to_string()))?;

        Ok(Self {
            tera,
            output_dir: output_dir.as_ref().to_path_buf(),
            default_name: "strategic_report.pdf".to_string(),
            wkhtmltopdf_path: None,
        })
    }

    /// The `wkhtmltopdf` binary in use, if any.
    pub fn pdf_converter(&self) -> Option<&Path> {
        self.wkhtmltopdf_path.as_deref()
    }

    /// Final path for a requested file name: bare name inside the output
    /// directory, always with a `.pdf` extension.
    pub fn target_path(&self, file_name: &str) -> PathBuf {
        let bare = Path::new(file_name.trim())
            .file_name()
            .map(PathBuf::from)
            .filter(|name| !name.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(&self.default_name));
        self.output_dir.join(bare).with_extension("pdf")
    }

    pub fn render_html(&self, report_text: &str) -> Result<String, PersistError> {
        let mut blocks = classify_blocks(report_text);
        let leading_title = match blocks.first() {
            Some(ReportBlock::Heading(text)) if report_text.trim_start().starts_with("# ") => {
                Some(text.clone())
            }
            _ => None,
        };
        let title = match leading_title {
            Some(title) => {
                blocks.remove(0);
                title
            }
            None => "Strategic Report".to_string(),
        };

        let mut context = Context::new();
        context.insert("title", &title);
        context.insert("blocks", &blocks.iter().map(BlockView::from).collect::<Vec<_>>());
        context.insert(
            "generated_at",
            &chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        );

        self.tera
            .render("report.html", &context)
            .map_err(|error| PersistError::Template(error.to_string()))
    }

    pub async fn persist(
        &self,
        report_text: &str,
        file_name: &str,
    ) -> Result<PersistedReport, PersistError> {
        if report_text.trim().is_empty() {
            return Err(PersistError::EmptyReport);
        }

        let target = self.target_path(file_name);
        if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| PersistError::Io { path: parent.to_path_buf(), source })?;
        }

        let html = self.render_html(report_text)?;

        if let Some(wkhtmltopdf) = &self.wkhtmltopdf_path {
            match convert_html_to_pdf(&html, wkhtmltopdf, &target).await {
                Ok(()) => {
                    info!(event_name = "report.persisted", path = %target.display(), "PDF written");
                    return Ok(PersistedReport { path: target, format: ReportFormat::Pdf });
                }
                Err(error) => warn!(error = %error, "PDF conversion failed, falling back to HTML"),
            }
        }

        let html_path = target.with_extension("html");
        tokio::fs::write(&html_path, html)
            .await
            .map_err(|source| PersistError::Io { path: html_path.clone(), source })?;
        info!(event_name = "report.persisted", path = %html_path.display(), "HTML written");
        Ok(PersistedReport { path: html_path, format: ReportFormat::Html })
    }
}

async fn convert_html_to_pdf(
    html: &str,
    wkhtmltopdf_path: &Path,
    target: &Path,
) -> Result<(), PersistError> {
    let html_path = std::env::temp_dir().join(format!("report_{}.html", uuid::Uuid::new_v4()));
    tokio::fs::write(&html_path, html)
        .await
        .map_err(|source| PersistError::Io { path: html_path.clone(), source })?;

    let output = Command::new(wkhtmltopdf_path)
        .arg("--page-size")
        .arg("A4")
        .arg("--margin-top")
        .arg("10mm")
        .arg("--margin-bottom")
        .arg("10mm")
        .arg("--encoding")
        .arg("utf-8")
        .arg("--quiet")
        .arg(&html_path)
        .arg(target)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let _ = tokio::fs::remove_file(&html_path).await;

    let output = output.map_err(|error| PersistError::Conversion(error.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PersistError::Conversion(stderr.trim().to_string()));
    }
    Ok(())
}

/// Splits report text into display blocks. Consecutive numbered or bulleted
/// lines form one list; blank lines do not break a list.
pub fn classify_blocks(report_text: &str) -> Vec<ReportBlock> {
    let mut blocks: Vec<ReportBlock> = Vec::new();

    for raw in report_text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(heading) = heading_text(line) {
            blocks.push(ReportBlock::Heading(heading));
        } else if let Some(item) = numbered_item(line) {
            match blocks.last_mut() {
                Some(ReportBlock::Numbered(items)) => items.push(item),
                _ => blocks.push(ReportBlock::Numbered(vec![item])),
            }
        } else if let Some(item) = bullet_item(line) {
            match blocks.last_mut() {
                Some(ReportBlock::Bullets(items)) => items.push(item),
                _ => blocks.push(ReportBlock::Bullets(vec![item])),
            }
        } else {
            blocks.push(ReportBlock::Paragraph(strip_emphasis(line)));
        }
    }

    blocks
}

fn heading_text(line: &str) -> Option<String> {
    if line.starts_with('#') {
        let text = strip_emphasis(line.trim_start_matches('#').trim());
        return (!text.is_empty()).then_some(text);
    }
    if line.len() > 4 && line.starts_with("**") && line.ends_with("**") {
        let inner = line[2..line.len() - 2].trim();
        if !inner.contains("**") {
            return Some(inner.trim_end_matches(':').to_string());
        }
    }
    None
}

fn numbered_item(line: &str) -> Option<String> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 3 {
        return None;
    }
    let rest = &line[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = strip_emphasis(rest.trim());
    (!text.is_empty()).then_some(text)
}

fn bullet_item(line: &str) -> Option<String> {
    let rest = ["- ", "* ", "• "].iter().find_map(|marker| line.strip_prefix(marker))?;
    let text = strip_emphasis(rest.trim());
    (!text.is_empty()).then_some(text)
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
}

#[derive(Debug, Serialize)]
struct BlockView<'a> {
    kind: &'static str,
    text: &'a str,
    items: &'a [String],
}

impl<'a> From<&'a ReportBlock> for BlockView<'a> {
    fn from(block: &'a ReportBlock) -> Self {
        match block {
            ReportBlock::Heading(text) => Self { kind: "heading", text, items: &[] },
            ReportBlock::Numbered(items) => Self { kind: "numbered", text: "", items },
            ReportBlock::Bullets(items) => Self { kind: "bullets", text: "", items },
            ReportBlock::Paragraph(text) => Self { kind: "paragraph", text, items: &[] },
        }
    }
}
