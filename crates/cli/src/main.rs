use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flipper::api::{
    surface_by_name, ClassifyCfg, FnProgress, NielsenThurston, Number, SplittingCfg, Surface,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

mod provenance;

#[derive(Parser)]
#[command(name = "flipper")]
#[command(about = "Classify mapping classes of punctured surfaces")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Nielsen–Thurston type of one word
    Classify {
        /// S_1_1, S_1_2 or S_0_n
        #[arg(long)]
        surface: String,
        /// Generators, rightmost first; upper case inverts
        #[arg(long)]
        word: String,
        #[command(flatten)]
        budget: Budget,
        /// Also write the report (and a provenance sidecar) here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Classify seeded random words
    Sample {
        #[arg(long)]
        surface: String,
        #[arg(long, default_value_t = 8)]
        len: usize,
        #[arg(long, default_value_t = 10)]
        count: u64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[command(flatten)]
        budget: Budget,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the bundled surfaces and their generators
    Surfaces,
    /// Print version and code revision
    Report,
}

#[derive(clap::Args, Clone, Copy)]
struct Budget {
    /// Give up on a word after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
    #[arg(long, default_value_t = SplittingCfg::default().max_flips)]
    max_flips: usize,
}

impl Budget {
    fn cfg(&self) -> ClassifyCfg {
        let mut cfg = ClassifyCfg::default();
        cfg.splitting.max_flips = self.max_flips;
        cfg
    }
}

#[derive(Serialize)]
struct Report {
    surface: String,
    word: String,
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reducing_curves: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dilatation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preperiodic_steps: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    periodic_steps: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    seconds: f64,
}

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Classify { surface, word, budget, out } => classify(&surface, &word, budget, out),
        Action::Sample { surface, len, count, seed, budget, out } => {
            sample(&surface, len, count, seed, budget, out)
        }
        Action::Surfaces => surfaces(),
        Action::Report => report(),
    }
}

fn load(name: &str) -> Result<Surface> {
    surface_by_name(name).with_context(|| format!("loading surface {name}"))
}

/// Classify one word; failures of the engine are recorded in the report.
fn run_word(surface: &Surface, word: &str, budget: Budget) -> Report {
    let started = Instant::now();
    let mut report = Report {
        surface: surface.name().to_string(),
        word: word.to_string(),
        kind: None,
        order: None,
        reducing_curves: None,
        dilatation: None,
        preperiodic_steps: None,
        periodic_steps: None,
        error: None,
        seconds: 0.0,
    };
    let deadline = budget.timeout.map(|s| started + Duration::from_secs(s));
    let mut last_logged = 0.0;
    let mut progress = FnProgress {
        report: |fraction: f64| {
            if fraction - last_logged >= 0.1 {
                last_logged = fraction;
                tracing::info!(word, fraction, "progress");
            }
        },
        abort: || deadline.is_some_and(|d| Instant::now() > d),
    };
    let result = surface
        .mapping_class(word)
        .and_then(|f| f.nielsen_thurston_type(budget.cfg(), &mut progress));
    match result {
        Ok(t) => {
            report.kind = Some(t.name());
            match t {
                NielsenThurston::Periodic { order } => report.order = Some(order),
                NielsenThurston::Reducible(curves) => {
                    report.reducing_curves = Some(curves.weights().to_vec())
                }
                NielsenThurston::PseudoAnosov { dilatation, splitting } => {
                    report.dilatation = Some(dilatation.to_f64());
                    report.preperiodic_steps = Some(splitting.preperiodic.len());
                    report.periodic_steps = Some(splitting.periodic.len());
                }
            }
        }
        Err(e) => {
            tracing::warn!(word, error = %e, "classification failed");
            report.error = Some(e.to_string());
        }
    }
    report.seconds = started.elapsed().as_secs_f64();
    report
}

fn emit(value: serde_json::Value, out: Option<PathBuf>, params: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    if let Some(out) = out {
        let sidecar = provenance::write_with_sidecar(&out, &value, params)?;
        tracing::info!(out = %out.display(), sidecar = %sidecar.display(), "written");
    }
    Ok(())
}

fn classify(name: &str, word: &str, budget: Budget, out: Option<PathBuf>) -> Result<()> {
    let surface = load(name)?;
    tracing::info!(surface = name, word, "classify");
    let report = run_word(&surface, word, budget);
    let params = serde_json::json!({
        "surface": name,
        "word": word,
        "timeout": budget.timeout,
        "max_flips": budget.max_flips,
    });
    emit(serde_json::to_value(&report)?, out, params)
}

fn sample(
    name: &str,
    len: usize,
    count: u64,
    seed: u64,
    budget: Budget,
    out: Option<PathBuf>,
) -> Result<()> {
    let surface = load(name)?;
    tracing::info!(surface = name, len, count, seed, "sample");
    let reports: Vec<Report> = (0..count)
        .map(|i| run_word(&surface, &surface.random_word(len, seed.wrapping_add(i)), budget))
        .collect();
    let params = serde_json::json!({
        "surface": name,
        "len": len,
        "count": count,
        "seed": seed,
        "timeout": budget.timeout,
        "max_flips": budget.max_flips,
    });
    emit(serde_json::to_value(&reports)?, out, params)
}

fn surfaces() -> Result<()> {
    let mut listing = Vec::new();
    for name in ["S_0_3", "S_1_1", "S_1_2", "S_0_4", "S_0_5"] {
        let surface = load(name)?;
        let generators: Vec<_> = surface
            .letters()
            .filter_map(|c| surface.generator(c).map(|(curve, kind)| (c, curve.to_vec(), kind)))
            .map(|(c, curve, kind)| {
                serde_json::json!({ "letter": c, "curve": curve, "kind": format!("{kind:?}") })
            })
            .collect();
        listing.push(serde_json::json!({
            "name": name,
            "triangles": surface.triangulation().triangles(),
            "generators": generators,
        }));
    }
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn report() -> Result<()> {
    let obj = serde_json::json!({
        "code_rev": provenance::current_git_rev(),
        "flipper_version": flipper::VERSION,
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
