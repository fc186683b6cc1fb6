use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chatdoc::{Config, ExportFormat, ExportOptions};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Docx,
    Pdf,
    Both,
}

impl FormatArg {
    fn formats(self) -> &'static [ExportFormat] {
        match self {
            FormatArg::Docx => &[ExportFormat::Docx],
            FormatArg::Pdf => &[ExportFormat::Pdf],
            FormatArg::Both => &[ExportFormat::Docx, ExportFormat::Pdf],
        }
    }
}

#[derive(Parser)]
#[command(name = "chatdoc")]
#[command(about = "Convert chat transcripts (JSON) to DOCX and PDF")]
struct Cli {
    /// Input transcript: a JSON array of messages or {"title", "messages"}
    input: PathBuf,

    /// Output file (defaults to input name with the format's extension).
    /// With --format both, the extension is replaced per format.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pdf")]
    format: FormatArg,

    /// Document title (overrides the transcript's own title)
    #[arg(long)]
    title: Option<String>,

    /// Document author (defaults to the organization name)
    #[arg(long)]
    author: Option<String>,

    /// Omit export and message timestamps
    #[arg(long)]
    no_timestamps: bool,

    /// Branding/layout config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the intermediate Typst markup instead of a PDF
    #[arg(long)]
    typst: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "chatdoc=debug" } else { "chatdoc=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::compiled_default(),
    };

    let json = fs::read_to_string(&cli.input)
        .map_err(|e| format!("failed to read {}: {}", cli.input.display(), e))?;
    let transcript = chatdoc::parse_transcript(&json)?;

    let mut options = ExportOptions {
        include_timestamps: !cli.no_timestamps,
        author: cli.author.clone(),
        ..Default::default()
    };
    if let Some(title) = cli.title.as_deref().or(transcript.title()) {
        options.title = title.to_string();
    }

    let messages = transcript.messages();
    for &format in cli.format.formats() {
        if cli.typst && format == ExportFormat::Pdf {
            let markup = chatdoc::transcript_to_typst(messages, &options, &config)?;
            let path = output_path(cli, "typ").with_extension("typ");
            fs::write(&path, markup)?;
            println!("Created {}", path.display());
            continue;
        }

        let export = chatdoc::export(messages, format, &options, &config)?;
        let path = output_path(cli, format.extension());
        fs::write(&path, &export.bytes)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
        debug!(mime = export.mime_type(), "wrote export");
        println!("Created {}", path.display());
    }

    Ok(())
}

fn output_path(cli: &Cli, extension: &str) -> PathBuf {
    match (&cli.output, cli.format) {
        (Some(path), FormatArg::Both) => path.with_extension(extension),
        (Some(path), _) => path.clone(),
        (None, _) => cli.input.with_extension(extension),
    }
}
