//! CLI tool for turning Markdown documents into PowerPoint decks.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mdeck_core::normalize::output_file_name;
use mdeck_core::{
    ContentSummarizer, LayoutMapping, MarkdownParser, ParserKind, RenderStyle, StyleProfile,
    SummarizerConfig, Theme,
};
use mdeck_pptx::{Deck, DeckDesigner, DeckGenerator, StyleAnalyzer};
use std::path::{Path, PathBuf};

/// Convert Markdown documents into PowerPoint decks.
#[derive(Parser, Debug)]
#[command(name = "mdeck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render Markdown file(s) to .pptx
    Convert(ConvertArgs),
    /// Extract a style profile from an existing .pptx
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input Markdown file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Built-in color theme: modern_blue, corporate, dark, minimal
    #[arg(short, long, default_value = "modern_blue")]
    theme: String,

    /// Template deck; its style profile is used, or its layouts with --legacy
    #[arg(long)]
    template: Option<PathBuf>,

    /// Style profile JSON (overrides the template's)
    #[arg(long)]
    style: Option<PathBuf>,

    /// Summarizer rules JSON
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Markdown parser: regex or ast
    #[arg(long, default_value = "regex")]
    parser: ParserKind,

    /// Fill layout placeholders directly instead of the designed deck
    #[arg(long)]
    legacy: bool,

    /// Keep every slide instead of trimming to the most important ones
    #[arg(long)]
    no_summary: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Deck to analyze
    input: PathBuf,

    /// Write the profile JSON here instead of printing it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Store the profile next to the deck as <stem>_style.json
    #[arg(long)]
    sidecar: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Command::Convert(args) => convert(&args, cli.verbose),
        Command::Analyze(args) => analyze(&args),
    }
}

/// Convert every input, reporting failures without stopping.
fn convert(args: &ConvertArgs, verbose: bool) -> Result<()> {
    let converter = Converter::from_args(args)?;
    let output_dir = args.output.clone().unwrap_or_else(|| PathBuf::from("."));

    for input_path in &args.input {
        if verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match converter.convert_file(input_path, &output_dir) {
            Ok(output_path) => println!("{}", output_path.display()),
            Err(e) => eprintln!("Error processing {}: {:#}", input_path.display(), e),
        }
    }

    Ok(())
}

/// Settings shared by every input of one `convert` run.
struct Converter {
    parser: MarkdownParser,
    summarizer: ContentSummarizer,
    style: RenderStyle,
    template: Option<PathBuf>,
    legacy: bool,
}

impl Converter {
    fn from_args(args: &ConvertArgs) -> Result<Self> {
        let mut config = match &args.rules {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read rules {}", path.display()))?;
                SummarizerConfig::from_json(&json)
                    .with_context(|| format!("Invalid rules in {}", path.display()))?
            }
            None => SummarizerConfig::default(),
        };
        if args.no_summary {
            config = config.with_max_slides(usize::MAX);
        }

        let style = match load_profile(args)? {
            Some(profile) => RenderStyle::Profile(profile),
            None => RenderStyle::Theme(Theme::from_name(&args.theme)),
        };

        Ok(Self {
            parser: MarkdownParser::new(args.parser),
            summarizer: ContentSummarizer::new().with_config(config),
            style,
            template: args.template.clone(),
            legacy: args.legacy,
        })
    }

    fn convert_file(&self, input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let bytes = std::fs::read(input_path)
            .with_context(|| format!("Failed to read {}", input_path.display()))?;
        let document = self.parser.parse_bytes(&bytes)?;
        log::debug!("Parsed {} sections", document.slides.len());

        let (title, deck) = if self.legacy {
            let mut generator = DeckGenerator::new(LayoutMapping::default());
            if let Some(dir) = input_path.parent() {
                generator = generator.with_base_dir(dir);
            }
            let deck = generator.generate(&document, self.template.as_deref())?;
            (document.title.clone().unwrap_or_default(), deck)
        } else {
            let content = self.summarizer.summarize(&document);
            let deck = DeckDesigner::new(self.style.clone()).design(&content)?;
            (content.title, deck)
        };

        write_deck(&deck, &title, output_dir)
    }
}

/// Profile from `--style`, else the template's sidecar, else the template itself.
fn load_profile(args: &ConvertArgs) -> Result<Option<StyleProfile>> {
    if let Some(path) = &args.style {
        let profile = StyleProfile::load(path)
            .with_context(|| format!("Failed to load style profile {}", path.display()))?;
        return Ok(Some(profile));
    }

    let Some(template) = args.template.as_deref().filter(|_| !args.legacy) else {
        return Ok(None);
    };
    if let Some(profile) = StyleProfile::load_sidecar(template)
        .with_context(|| format!("Failed to load sidecar for {}", template.display()))?
    {
        log::debug!("Using sidecar profile for {}", template.display());
        return Ok(Some(profile));
    }

    let profile = StyleAnalyzer::new()
        .analyze(template)
        .with_context(|| format!("Failed to analyze template {}", template.display()))?;
    Ok(Some(profile))
}

fn write_deck(deck: &Deck, title: &str, output_dir: &Path) -> Result<PathBuf> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let output_path = output_dir.join(output_file_name(title, &id[..8]));
    deck.save(&output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    Ok(output_path)
}

fn analyze(args: &AnalyzeArgs) -> Result<()> {
    let profile = StyleAnalyzer::new()
        .analyze(&args.input)
        .with_context(|| format!("Failed to analyze {}", args.input.display()))?;

    if args.sidecar {
        let path = profile.save_sidecar(&args.input)?;
        eprintln!("Written to: {}", path.display());
    }

    let json = profile.to_json()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Written to: {}", path.display());
        }
        None if !args.sidecar => println!("{}", json),
        None => {}
    }

    Ok(())
}
