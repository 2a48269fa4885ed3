use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;

use swagreq_core::RequestAssembler;
use swagreq_core::PreparedRequest;
use swagreq_core::batch::{self, BatchResult, Importer};
use swagreq_core::config::{self, CONFIG_FILE_NAME, ImportConfig, InputMode};
use swagreq_core::dispatch::{DirectorySink, dispatch_all};
use swagreq_core::extract::{Operation, extract_operations};
use swagreq_core::fetch::HttpFetcher;
use swagreq_core::headers::{parse_custom_headers, spec_fetch_headers};
use swagreq_core::load::SpecLoader;

#[derive(Parser)]
#[command(
    name = "swagreq",
    about = "Turn OpenAPI / Swagger specs into raw HTTP requests",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare one raw request per operation
    Prepare {
        #[command(flatten)]
        input: SourceArgs,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Write each request to `<METHOD>_<path>.txt` in this directory
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output format for stdout
        #[arg(long, default_value = "text")]
        format: PrepareFormat,
    },

    /// Show the operations extracted from specs
    Inspect {
        #[command(flatten)]
        input: SourceArgs,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new swagreq configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Spec URLs or inline JSON/YAML; read from --sources-file or stdin when empty
    sources: Vec<String>,

    /// File holding sources, split according to the input mode
    #[arg(long)]
    sources_file: Option<PathBuf>,
}

/// Flags layered over `.swagreq.yaml`.
#[derive(Args, Default)]
struct ConfigOverrides {
    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token
    #[arg(long)]
    token: Option<String>,

    /// Extra header, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Do not emit query strings
    #[arg(long)]
    no_query: bool,

    /// Leave `{name}` path placeholders untouched
    #[arg(long)]
    no_fill_path: bool,

    /// Ignore servers / host+basePath from the spec
    #[arg(long)]
    no_spec_servers: bool,

    /// Mark requests as plain HTTP
    #[arg(long)]
    plain_http: bool,

    /// How to split --sources-file / stdin
    #[arg(long)]
    input_mode: Option<InputModeArg>,

    /// Join relative server URLs onto the spec URL's origin
    #[arg(long)]
    anchor_relative_servers: bool,

    /// Prepare each operation against every server, enum value and scheme
    #[arg(long)]
    expand_servers: bool,

    /// Redirects followed per spec fetch
    #[arg(long)]
    max_redirects: Option<u32>,

    /// Spec fetch socket timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// User-Agent for spec fetches
    #[arg(long)]
    user_agent: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputModeArg {
    Auto,
    Urls,
    RawJson,
}

impl From<InputModeArg> for InputMode {
    fn from(arg: InputModeArg) -> Self {
        match arg {
            InputModeArg::Auto => InputMode::Auto,
            InputModeArg::Urls => InputMode::Urls,
            InputModeArg::RawJson => InputMode::RawJson,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum PrepareFormat {
    Text,
    Json,
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare {
            input,
            overrides,
            out,
            format,
        } => cmd_prepare(input, overrides, out, format),

        Commands::Inspect {
            input,
            overrides,
            format,
        } => cmd_inspect(input, overrides, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "swagreq", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<ImportConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn effective_config(overrides: ConfigOverrides) -> Result<ImportConfig> {
    let mut cfg = try_load_config()?.unwrap_or_default();
    if let Some(base_url) = overrides.base_url {
        cfg.base_url = Some(base_url);
    }
    if let Some(token) = overrides.token {
        cfg.token = Some(token);
    }
    for header in overrides.headers {
        if !cfg.headers.is_empty() && !cfg.headers.ends_with('\n') {
            cfg.headers.push('\n');
        }
        cfg.headers.push_str(&header);
        cfg.headers.push('\n');
    }
    cfg.include_query_parameters &= !overrides.no_query;
    cfg.fill_path_parameters &= !overrides.no_fill_path;
    cfg.use_spec_servers &= !overrides.no_spec_servers;
    cfg.use_https &= !overrides.plain_http;
    cfg.anchor_relative_servers |= overrides.anchor_relative_servers;
    cfg.expand_servers |= overrides.expand_servers;
    if let Some(mode) = overrides.input_mode {
        cfg.input_mode = mode.into();
    }
    if let Some(max) = overrides.max_redirects {
        cfg.fetch.max_redirects = max;
    }
    if let Some(timeout) = overrides.timeout {
        cfg.fetch.timeout_secs = timeout;
    }
    if let Some(user_agent) = overrides.user_agent {
        cfg.fetch.user_agent = user_agent;
    }
    Ok(cfg)
}

/// Sources from the command line, else the sources file, else stdin.
fn collect_sources(input: SourceArgs, mode: InputMode) -> Result<Vec<String>> {
    if !input.sources.is_empty() {
        return Ok(input.sources);
    }
    let text = match input.sources_file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read sources from stdin")?;
            text
        }
    };
    Ok(batch::split_sources(&text, mode))
}

fn report_failures(result: &BatchResult) {
    for failure in &result.failures {
        eprintln!("  skipped [{}]: {}", failure.source, failure.message);
    }
}

fn cmd_prepare(
    input: SourceArgs,
    overrides: ConfigOverrides,
    out: Option<PathBuf>,
    format: PrepareFormat,
) -> Result<()> {
    let cfg = effective_config(overrides)?;
    let sources = collect_sources(input, cfg.input_mode)?;
    if sources.is_empty() {
        anyhow::bail!("no sources given");
    }

    eprintln!("Importing {} source(s)", sources.len());
    for source in &sources {
        log::info!("Queued {}", short_source(source));
    }
    let importer = Importer::new(cfg).context("failed to set up HTTP fetcher")?;
    let result = importer
        .spawn(sources)
        .context("failed to start import worker")?
        .wait();
    report_failures(&result);

    match format {
        PrepareFormat::Text => {
            for request in &result.requests {
                println!("{}", request.label());
            }
        }
        PrepareFormat::Json => {
            let summary: Vec<RequestSummary> =
                result.requests.iter().map(RequestSummary::from).collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    if let Some(dir) = out {
        let mut sink = DirectorySink::new(dir.clone())
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        let sent = dispatch_all(&result.requests, &mut sink);
        eprintln!("Wrote {} request(s) to {}", sent, dir.display());
    }

    eprintln!(
        "Prepared {} request(s), {} skipped",
        result.requests.len(),
        result.failures.len()
    );
    Ok(())
}

#[derive(Serialize)]
struct RequestSummary {
    caption: String,
    label: String,
    host: String,
    port: u16,
    secure: bool,
    raw: String,
}

impl From<&PreparedRequest> for RequestSummary {
    fn from(r: &PreparedRequest) -> Self {
        Self {
            caption: r.caption().to_string(),
            label: r.label().to_string(),
            host: r.host().to_string(),
            port: r.port(),
            secure: r.secure(),
            raw: r.raw_text(),
        }
    }
}

#[derive(Serialize)]
struct SpecSummary {
    source: String,
    spec: String,
    title: Option<String>,
    base: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bases: Vec<String>,
    operations: Vec<OperationSummary>,
}

#[derive(Serialize)]
struct OperationSummary {
    method: &'static str,
    path: String,
    operation_id: Option<String>,
    summary: Option<String>,
    parameters: Vec<ParameterSummary>,
    body: Option<String>,
}

#[derive(Serialize)]
struct ParameterSummary {
    name: String,
    #[serde(rename = "in")]
    location: String,
}

impl From<&Operation> for OperationSummary {
    fn from(op: &Operation) -> Self {
        Self {
            method: op.method.as_str(),
            path: op.path.clone(),
            operation_id: op.operation_id.clone(),
            summary: op.summary.clone(),
            parameters: op
                .parameters
                .iter()
                .map(|p| ParameterSummary {
                    name: p.name.clone(),
                    location: p.location.as_str().to_string(),
                })
                .collect(),
            body: op.body.content_type().map(str::to_string),
        }
    }
}

fn cmd_inspect(input: SourceArgs, overrides: ConfigOverrides, format: InspectFormat) -> Result<()> {
    let cfg = effective_config(overrides)?;
    let sources = collect_sources(input, cfg.input_mode)?;
    let fetcher = HttpFetcher::new(&cfg.fetch).context("failed to set up HTTP fetcher")?;
    let loader = SpecLoader::new(&fetcher);
    let headers = spec_fetch_headers(cfg.token.as_deref(), &parse_custom_headers(&cfg.headers));

    let mut specs = Vec::new();
    let mut failed = 0usize;
    for source in &sources {
        let label = short_source(source);
        log::info!("Inspecting {label}");
        let doc = match loader.load(source, &headers) {
            Ok(doc) => doc,
            Err(err) => {
                log::warn!("Failed to load {label}: {err}");
                eprintln!("  skipped [{label}]: {err}");
                failed += 1;
                continue;
            }
        };
        let assembler = RequestAssembler::new(&cfg, &doc).anchored_at(source.trim());
        let bases = if cfg.expand_servers {
            assembler.bases().to_vec()
        } else {
            Vec::new()
        };
        specs.push(SpecSummary {
            source: label,
            spec: doc.describe(),
            title: doc.title().map(str::to_string),
            base: assembler.base().map(str::to_string),
            bases,
            operations: extract_operations(&doc)
                .iter()
                .map(OperationSummary::from)
                .collect(),
        });
    }

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&specs)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&specs)?;
            println!("{}", json);
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} source(s) failed to load", sources.len());
    }
    Ok(())
}

fn short_source(source: &str) -> String {
    let source = source.trim();
    match source.lines().next() {
        Some(first) if first.len() < source.len() || first.len() > 80 => {
            let head: String = first.chars().take(60).collect();
            format!("{head}...")
        }
        _ => source.to_string(),
    }
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
