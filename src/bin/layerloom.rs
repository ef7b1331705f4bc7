use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use layerloom::{
    BuildDirSink, CompositionPlan, CpuRenderer, Dna, ProjectConfig, WeightedSampler, generate,
    load_catalogs,
};

#[derive(Parser, Debug)]
#[command(name = "layerloom", version)]
struct Cli {
    /// Log rejected attempts and per-edition details.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the whole collection into a build directory.
    Generate(GenerateArgs),
    /// Decode a DNA string against one configuration block.
    Decode(DecodeArgs),
    /// Regenerate a collection, reusing traits recorded in a metadata file.
    Replay(ReplayArgs),
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Project configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Directory holding one sub-directory per layer.
    #[arg(long, default_value = "layers")]
    layers: PathBuf,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Build output directory (wiped first).
    #[arg(long, default_value = "build")]
    out: PathBuf,

    /// Override the configured sampler seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Image decode threads (default: all cores).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Configuration block the DNA was generated with (0-based).
    #[arg(long, default_value_t = 0)]
    block: usize,

    /// DNA string.
    dna: String,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Collection metadata (`_metadata.json`) from a previous run.
    #[arg(long)]
    metadata: PathBuf,

    /// Build output directory (wiped first).
    #[arg(long, default_value = "build")]
    out: PathBuf,

    /// Override the configured sampler seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Image decode threads (default: all cores).
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Decode(args) => cmd_decode(args),
        Command::Replay(args) => cmd_replay(args),
    }
}

fn read_project(path: &Path) -> anyhow::Result<ProjectConfig> {
    let project = ProjectConfig::from_path(path)
        .with_context(|| format!("load project '{}'", path.display()))?;
    project
        .validate()
        .with_context(|| format!("validate project '{}'", path.display()))?;
    Ok(project)
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut project = read_project(&args.project.config)?;
    if args.seed.is_some() {
        project.seed = args.seed;
    }
    let catalogs = load_catalogs(&project, &args.project.layers)
        .with_context(|| format!("scan layers '{}'", args.project.layers.display()))?;

    let renderer = CpuRenderer::new(args.threads).context("create renderer")?;
    let mut sink = BuildDirSink::new(&args.out, project.clone(), renderer);
    let mut sampler = WeightedSampler::seeded(project.seed);
    let report =
        generate(&project, catalogs, &mut sink, &mut sampler).context("generate collection")?;

    eprintln!(
        "wrote {} editions to {} ({} rejected attempts)",
        report.editions.len(),
        args.out.display(),
        report.rejected_attempts
    );
    Ok(())
}

fn cmd_decode(args: DecodeArgs) -> anyhow::Result<()> {
    let project = read_project(&args.project.config)?;
    let block = project
        .layer_configurations
        .get(args.block)
        .with_context(|| format!("no layer configuration {}", args.block))?;
    let catalog = layerloom::build_catalog(
        &args.project.layers,
        &block.layers_order,
        &project.rarity_delimiter,
    )
    .with_context(|| format!("scan layers '{}'", args.project.layers.display()))?;
    let plan = CompositionPlan::from_config(block, catalog)?;

    let dna = Dna::parse(args.dna.trim()).context("parse DNA")?;
    let (choices, order) = plan.decode(&dna).context("decode DNA")?;
    let out = serde_json::json!({
        "dna": dna,
        "digest": dna.digest(),
        "uniqueness_key": dna.uniqueness_key(),
        "draw_order": order,
        "choices": choices,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let mut project = read_project(&args.project.config)?;
    if args.seed.is_some() {
        project.seed = args.seed;
    }
    let catalogs = load_catalogs(&project, &args.project.layers)
        .with_context(|| format!("scan layers '{}'", args.project.layers.display()))?;
    let records = layerloom::pipeline::read_metadata(&args.metadata)?;
    let mut sampler = layerloom::pipeline::replay_sampler(
        &records,
        &catalogs,
        &project,
        WeightedSampler::seeded(project.seed),
    );

    let renderer = CpuRenderer::new(args.threads).context("create renderer")?;
    let mut sink = BuildDirSink::new(&args.out, project.clone(), renderer);
    let report =
        generate(&project, catalogs, &mut sink, &mut sampler).context("replay collection")?;

    eprintln!(
        "replayed {} editions ({} presets) to {}",
        report.editions.len(),
        sampler.preset_count(),
        args.out.display()
    );
    Ok(())
}
