use std::path::Path;

use anyhow::{Context, Result};

use lessonkit_core::export::{ExportFormat, ExportRequest, ExportedFile, export_document};

/// Re-export a saved document under the lessonkit naming scheme.
pub fn export_file(
    input: &Path,
    format: ExportFormat,
    title: &str,
    output_dir: &Path,
    prefix: &str,
) -> Result<ExportedFile> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read document: {}", input.display()))?;
    let request = ExportRequest::new(format, title, Some(prefix));
    Ok(export_document(&text, &request, output_dir)?)
}

pub fn run_export(
    input: &Path,
    format: ExportFormat,
    title: &str,
    output_dir: &Path,
    prefix: &str,
) -> Result<()> {
    let file = export_file(input, format, title, output_dir, prefix)?;
    println!(
        "Exported {} bytes to {}",
        file.bytes_written,
        file.path.display()
    );
    Ok(())
}
