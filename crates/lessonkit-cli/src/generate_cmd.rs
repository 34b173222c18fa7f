//! `lessonkit generate`: one request, printed and optionally exported.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::info;

use lessonkit_core::app::{AppEvent, AppState};
use lessonkit_core::export::{ExportFormat, ExportedFile};
use lessonkit_core::generation::GenerationService;
use lessonkit_core::prompt::{LessonConfig, TemplateKind};
use lessonkit_core::session::GeneratedDocument;

/// Where the prompt text comes from.
#[derive(Debug, Clone)]
pub enum PromptSource {
    Template(TemplateKind),
    Text(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub config: LessonConfig,
    pub source: PromptSource,
    pub exports: Vec<ExportFormat>,
    pub output_dir: PathBuf,
    pub prefix: String,
    pub quiet: bool,
}

/// Generate and export. A failed request is an error so the process exits
/// non-zero; nothing is exported in that case.
pub async fn generate_document(
    service: &dyn GenerationService,
    options: &GenerateOptions,
) -> Result<(GeneratedDocument, Vec<ExportedFile>)> {
    let mut app = AppState::with_config(options.config.clone());

    match &options.source {
        PromptSource::Template(kind) => {
            app.apply(AppEvent::TemplateSelected(*kind));
        }
        PromptSource::Text(text) => {
            app.apply(AppEvent::PromptEdited(text.clone()));
        }
        PromptSource::File(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read prompt file {}", path.display()))?;
            app.apply(AppEvent::PromptEdited(text));
        }
    }

    if app.prompt().trim().is_empty() {
        match &options.source {
            PromptSource::Template(kind) => bail!(
                "template {kind} has no prompt text yet; pass --prompt or --prompt-file instead"
            ),
            _ => bail!("prompt is empty"),
        }
    }

    let document = app.generate(service).await?.clone();
    if document.failed {
        bail!("{}", document.text);
    }

    let mut written = Vec::with_capacity(options.exports.len());
    for format in &options.exports {
        let file = app.export(*format, &options.output_dir, Some(&options.prefix))?;
        info!(path = %file.path.display(), "exported {format}");
        written.push(file);
    }

    Ok((document, written))
}

pub async fn run_generate(service: &dyn GenerationService, options: GenerateOptions) -> Result<()> {
    let (document, written) = generate_document(service, &options).await?;

    if !options.quiet {
        println!("{}", document.text);
    }
    for file in &written {
        eprintln!("Saved {}", file.path.display());
    }
    Ok(())
}
