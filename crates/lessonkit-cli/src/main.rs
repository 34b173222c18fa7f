mod chat_cmd;
mod config;
mod config_cmd;
mod export_cmd;
mod generate_cmd;
mod prompt_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;
mod tui;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use lessonkit_core::export::ExportFormat;
use lessonkit_core::generation::GenerationService;
use lessonkit_core::prompt::{AudienceTier, Grade, LessonConfig, Subject, TemplateKind};

use config::{Overrides, ResolvedConfig};
use generate_cmd::PromptSource;

#[derive(Parser)]
#[command(
    name = "lessonkit",
    about = "Lesson-plan and teaching-material generator for Vietnamese teachers"
)]
struct Cli {
    /// Gemini API key (overrides LESSONKIT_API_KEY / GEMINI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Gemini model name (overrides LESSONKIT_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Lesson form values shared by `prompt` and `generate`.
#[derive(Args, Debug, Clone)]
pub struct LessonArgs {
    /// Subject name or slug (e.g. "Toán", "ngu-van")
    #[arg(long)]
    subject: Option<Subject>,
    /// Grade name or number (e.g. "Lớp 6", "6")
    #[arg(long)]
    grade: Option<Grade>,
    /// Lesson title
    #[arg(long)]
    title: Option<String>,
    /// Number of class periods
    #[arg(long)]
    periods: Option<String>,
    /// Target students with inclusive-education needs
    #[arg(long)]
    inclusive: bool,
}

impl LessonArgs {
    fn into_config(self) -> LessonConfig {
        LessonConfig {
            subject: self.subject.unwrap_or_default(),
            grade: self.grade.unwrap_or_default(),
            lesson_title: self.title.unwrap_or_default(),
            period_count: self.periods.unwrap_or_default(),
            audience: if self.inclusive {
                AudienceTier::InclusiveNeeds
            } else {
                AudienceTier::Standard
            },
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a lessonkit config file (stores --api-key when given)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print the prompt assembled from a template and the lesson form
    Prompt {
        #[command(flatten)]
        lesson: LessonArgs,
        /// Template: lesson-plan, slideshow, quiz, review-outline, interactive-game
        #[arg(long, default_value = "lesson-plan")]
        template: TemplateKind,
    },
    /// Generate a document and optionally export it
    Generate {
        #[command(flatten)]
        lesson: LessonArgs,
        /// Template to expand into the prompt
        #[arg(long, conflicts_with_all = ["prompt", "prompt_file"])]
        template: Option<TemplateKind>,
        /// Prompt text to send instead of a template
        #[arg(long, conflicts_with = "prompt_file")]
        prompt: Option<String>,
        /// Read the prompt from a file
        #[arg(long)]
        prompt_file: Option<PathBuf>,
        /// Export format (html, word, pdf); may be repeated
        #[arg(long = "export")]
        exports: Vec<ExportFormat>,
        /// Directory for exported files
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Do not print the document to stdout
        #[arg(long)]
        quiet: bool,
    },
    /// Export a saved document under the lessonkit naming scheme
    Export {
        /// File holding the document markup
        #[arg(long)]
        input: PathBuf,
        /// Export format (html, word, pdf)
        #[arg(long)]
        format: ExportFormat,
        /// Lesson title used in the file name
        #[arg(long, default_value = "")]
        title: String,
        /// Directory for the exported file
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Ask the chat assistant one question
    Chat {
        /// Message to send
        message: String,
    },
    /// Launch the interactive terminal studio
    Studio {
        /// Directory for exported files
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Serve the studio over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration (API key masked)
    Show,
    /// Set one key, e.g. `lessonkit config set generation.model gemini-2.5-pro`
    Set {
        /// Dotted key: section.name
        key: String,
        /// New value
        value: String,
    },
}

/// Execute the `lessonkit init` command: write config file.
fn cmd_init(key: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    cfg.generation.api_key = key.map(str::to_string);
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  generation.model = {}", cfg.generation.model);
    match key {
        Some(k) => println!("  generation.api_key = {}", config_cmd::mask_key(k)),
        None => {
            println!();
            println!("Next: set an API key with `lessonkit config set generation.api_key <KEY>`");
            println!("      or export LESSONKIT_API_KEY.");
        }
    }

    Ok(())
}

fn init_tracing(studio: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if studio {
        // The studio owns the terminal, so logs go to a file.
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lessonkit");
        std::fs::create_dir_all(&dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("studio.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(matches!(cli.command, Commands::Studio { .. }))?;

    let overrides = Overrides {
        api_key: cli.api_key,
        model: cli.model,
        output_dir: None,
    };

    match cli.command {
        Commands::Init { force } => {
            cmd_init(overrides.api_key.as_deref(), force)?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let resolved = ResolvedConfig::resolve(&overrides)?;
                config_cmd::run_show(&resolved, &config::config_path());
            }
            ConfigCommands::Set { key, value } => {
                config_cmd::run_set(&config::config_path(), &key, &value)?;
            }
        },
        Commands::Prompt { lesson, template } => {
            prompt_cmd::run_prompt(lesson.into_config(), template);
        }
        Commands::Generate {
            lesson,
            template,
            prompt,
            prompt_file,
            exports,
            output_dir,
            quiet,
        } => {
            let resolved = ResolvedConfig::resolve(&Overrides {
                output_dir,
                ..overrides
            })?;
            let client = resolved.client()?;
            let source = match (prompt, prompt_file) {
                (Some(text), _) => PromptSource::Text(text),
                (None, Some(path)) => PromptSource::File(path),
                (None, None) => PromptSource::Template(template.unwrap_or(TemplateKind::LessonPlan)),
            };
            let options = generate_cmd::GenerateOptions {
                config: lesson.into_config(),
                source,
                exports,
                output_dir: resolved.output_dir.clone(),
                prefix: resolved.export_prefix.clone(),
                quiet,
            };
            generate_cmd::run_generate(&client, options).await?;
        }
        Commands::Export {
            input,
            format,
            title,
            output_dir,
        } => {
            let resolved = ResolvedConfig::resolve(&Overrides {
                output_dir,
                ..overrides
            })?;
            export_cmd::run_export(
                &input,
                format,
                &title,
                &resolved.output_dir,
                &resolved.export_prefix,
            )?;
        }
        Commands::Chat { message } => {
            let resolved = ResolvedConfig::resolve(&overrides)?;
            let client = resolved.client()?;
            chat_cmd::run_chat(&client, &message).await?;
        }
        Commands::Studio { output_dir } => {
            let resolved = ResolvedConfig::resolve(&Overrides {
                output_dir,
                ..overrides
            })?;
            let service: Arc<dyn GenerationService> = Arc::new(resolved.client()?);
            tui::run_studio(service, resolved.output_dir, resolved.export_prefix).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = ResolvedConfig::resolve(&overrides)?;
            let service: Arc<dyn GenerationService> = Arc::new(resolved.client()?);
            let state = serve_cmd::ServerState::new(service, resolved.export_prefix);
            serve_cmd::run_serve(state, &bind, port).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "lessonkit",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn lesson_args_parse_catalog_values() {
        let cli = Cli::parse_from([
            "lessonkit",
            "prompt",
            "--subject",
            "ngu-van",
            "--grade",
            "9",
            "--title",
            "Truyện Kiều",
            "--inclusive",
        ]);
        let Commands::Prompt { lesson, template } = cli.command else {
            panic!("expected prompt command");
        };
        let config = lesson.into_config();
        assert_eq!(config.subject.name(), "Ngữ văn");
        assert_eq!(config.grade.name(), "Lớp 9");
        assert_eq!(config.lesson_title, "Truyện Kiều");
        assert_eq!(config.audience, AudienceTier::InclusiveNeeds);
        assert_eq!(template, TemplateKind::LessonPlan);
    }

    #[test]
    fn generate_accepts_repeated_exports() {
        let cli = Cli::parse_from([
            "lessonkit",
            "generate",
            "--prompt",
            "Soạn đề kiểm tra",
            "--export",
            "html",
            "--export",
            "doc",
        ]);
        let Commands::Generate {
            prompt, exports, ..
        } = cli.command
        else {
            panic!("expected generate command");
        };
        assert_eq!(prompt.as_deref(), Some("Soạn đề kiểm tra"));
        assert_eq!(exports, [ExportFormat::Html, ExportFormat::Word]);
    }

    #[test]
    fn generate_rejects_template_with_prompt() {
        let result = Cli::try_parse_from([
            "lessonkit",
            "generate",
            "--template",
            "quiz",
            "--prompt",
            "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let result = Cli::try_parse_from(["lessonkit", "prompt", "--subject", "Thiên văn"]);
        assert!(result.is_err());
    }
}
