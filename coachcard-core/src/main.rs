use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use coachcard_common::WorkoutPlan;
use coachcard_common::factory::{DEFAULT_DAYS_PER_WEEK, create_workout_plan};
use coachcard_core::config::CoreConfig;
use coachcard_core::{BatchCaptureOrchestrator, CancelFlag, CapturedImage, DocumentAssembler, RasterImage};

#[derive(Parser, Debug)]
#[command(name = "coachcard", version)]
struct Cli {
    /// Configuration file; defaults are used when it does not exist.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an empty plan with the editor defaults.
    NewPlan(NewPlanArgs),
    /// Render a single day card as a PNG.
    Day(DayArgs),
    /// Render every day of a plan and assemble the PDF.
    Generate(GenerateArgs),
}

#[derive(Parser, Debug)]
struct NewPlanArgs {
    #[arg(long, default_value_t = 1)]
    weeks: usize,

    #[arg(long, default_value_t = DEFAULT_DAYS_PER_WEEK)]
    days: usize,

    /// Output plan JSON.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct DayArgs {
    /// Input plan JSON.
    #[arg(long)]
    plan: PathBuf,

    #[arg(long)]
    week: u32,

    #[arg(long)]
    day: u32,

    /// Output directory (defaults to `[output] directory`).
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input plan JSON.
    #[arg(long)]
    plan: PathBuf,

    /// Output directory (defaults to `[output] directory`).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Skip writing one PNG per day; only the PDF is written.
    #[arg(long, default_value_t = false)]
    pdf_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CoreConfig::load_or_default(&cli.config)?;

    let _logging_guard =
        coachcard_core::logging::init_logging("logs", "coachcard", &config.log_level)?;

    match cli.cmd {
        Command::NewPlan(args) => cmd_new_plan(args),
        Command::Day(args) => cmd_day(&config, args).await,
        Command::Generate(args) => cmd_generate(&config, args).await,
    }
}

fn cmd_new_plan(args: NewPlanArgs) -> anyhow::Result<()> {
    let plan = create_workout_plan(args.weeks, args.days);
    let json = serde_json::to_string_pretty(&plan)?;
    ensure_parent(&args.out)?;
    std::fs::write(&args.out, json)
        .with_context(|| format!("write plan '{}'", args.out.display()))?;

    tracing::info!(
        "Wrote {} with {} weeks x {} days",
        args.out.display(),
        args.weeks,
        args.days
    );
    Ok(())
}

async fn cmd_day(config: &CoreConfig, args: DayArgs) -> anyhow::Result<()> {
    let plan = read_plan(&args.plan)?;
    let day = plan
        .weeks
        .iter()
        .find(|week| week.week_number == args.week)
        .and_then(|week| week.days.iter().find(|day| day.day_number == args.day))
        .with_context(|| format!("plan has no week {} day {}", args.week, args.day))?;

    let mut orchestrator = BatchCaptureOrchestrator::from_config(config)?;
    let captured = orchestrator.generate_one(day, args.week).await?;

    let out_dir = output_dir(config, args.out_dir);
    write_image(&out_dir, &captured)?;
    Ok(())
}

async fn cmd_generate(config: &CoreConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let plan = read_plan(&args.plan)?;

    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current day");
            signal_flag.cancel();
        }
    });

    let mut orchestrator = BatchCaptureOrchestrator::from_config(config)?.with_cancellation(cancel);
    let images = orchestrator.generate_all(&plan).await?;

    let out_dir = output_dir(config, args.out_dir);
    if !args.pdf_only {
        for captured in images {
            write_image(&out_dir, captured)?;
        }
    }

    let document = DocumentAssembler::from_config(config)
        .with_title(plan.title.clone())
        .assemble(images)
        .await?;

    let pdf_path = out_dir.join(&document.file_name);
    ensure_parent(&pdf_path)?;
    std::fs::write(&pdf_path, &document.bytes)
        .with_context(|| format!("write pdf '{}'", pdf_path.display()))?;

    tracing::info!("Wrote {} ({} pages)", pdf_path.display(), document.page_count());
    Ok(())
}

fn read_plan(path: &Path) -> anyhow::Result<WorkoutPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read plan '{}'", path.display()))?;
    let plan: WorkoutPlan = serde_json::from_str(&content)
        .with_context(|| format!("parse plan '{}'", path.display()))?;
    plan.validate()
        .with_context(|| format!("invalid plan '{}'", path.display()))?;
    Ok(plan)
}

fn output_dir(config: &CoreConfig, out_dir: Option<PathBuf>) -> PathBuf {
    out_dir.unwrap_or_else(|| PathBuf::from(&config.output.directory))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn write_image(out_dir: &Path, captured: &CapturedImage) -> anyhow::Result<()> {
    match &captured.image {
        RasterImage::Png(bytes) => {
            let path = out_dir.join(format!("{}.png", captured.file_stem()));
            ensure_parent(&path)?;
            std::fs::write(&path, bytes)
                .with_context(|| format!("write png '{}'", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        RasterImage::Url(url) => {
            tracing::info!("{} {} rendered at {}", captured.file_stem(), captured.day_label, url);
        }
    }
    Ok(())
}
