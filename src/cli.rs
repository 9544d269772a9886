use crate::backend::HttpBackend;
use crate::logging::{self, LogTarget};
use crate::model::{ClientConfig, Ingredient, ViewState};
use crate::session::Session;
use crate::text_summary::{build_library_summary, build_recipe_summary};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "recipe-cli",
    version,
    about = "Compose ingredients, generate recipes and manage saved ones"
)]
pub struct Cli {
    /// Base URL of the recipe backend
    #[arg(long, env = "RECIPE_API_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Per-request timeout (generation can be slow)
    #[arg(long, default_value = "60s")]
    pub timeout: humantime::Duration,

    /// Run without the TUI and print text results
    #[arg(long)]
    pub text: bool,

    /// Run without the TUI and print JSON results
    #[arg(long)]
    pub json: bool,

    /// Ingredient to generate from, as "<quantity> of <name>" or "<name>" (repeatable)
    #[arg(long = "ingredient", short = 'i')]
    pub ingredients: Vec<String>,

    /// Save the generated recipe
    #[arg(long)]
    pub save: bool,

    /// List saved recipes
    #[arg(long)]
    pub list: bool,

    /// Delete the saved recipe with this id
    #[arg(long, value_name = "ID")]
    pub delete: Option<String>,

    /// Write logs to this file (TUI mode always logs to a file)
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Any scripted action or output flag means headless mode.
    pub fn is_headless(&self) -> bool {
        self.text
            || self.json
            || self.save
            || self.list
            || self.delete.is_some()
            || !self.ingredients.is_empty()
    }
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        request_timeout: Duration::from(args.timeout),
        user_agent: format!("recipe-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

fn log_target(args: &Cli) -> LogTarget {
    match (&args.log_file, args.is_headless()) {
        (Some(p), _) => LogTarget::File(p.clone()),
        (None, true) => LogTarget::Stderr,
        (None, false) => LogTarget::File(logging::default_log_path()),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.save && args.ingredients.is_empty() {
        return Err(anyhow::anyhow!(
            "--save needs a recipe to save. Pass at least one --ingredient."
        ));
    }

    logging::init_logging(args.verbose, &log_target(&args))?;

    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            return Err(anyhow::anyhow!(
                "built without TUI support; pass --ingredient, --list or --delete"
            ));
        }
    }

    run_text(args).await
}

/// Run the requested actions in order: delete, generate (and save), list.
async fn run_text(args: Cli) -> Result<()> {
    if args.ingredients.is_empty() && !args.list && args.delete.is_none() {
        return Err(anyhow::anyhow!(
            "nothing to do: pass --ingredient, --list or --delete"
        ));
    }

    let cfg = build_config(&args);
    let backend = HttpBackend::new(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let mut session = Session::new();
    let mut report = serde_json::Map::new();

    for text in &args.ingredients {
        let ing = Ingredient::parse(text);
        session
            .ingredients
            .add(ing.name, ing.quantity)
            .with_context(|| format!("invalid ingredient {text:?}"))?;
    }

    if let Some(id) = args.delete.as_deref() {
        session
            .delete(&backend, id)
            .await
            .with_context(|| format!("delete recipe {id}"))?;
        let _ = out_tx.send(OutputLine::Stderr(format!("Deleted: {id}")));
        report.insert("deleted".into(), serde_json::Value::String(id.to_string()));
    }

    if !session.ingredients.is_empty() {
        let _ = out_tx.send(OutputLine::Stderr(format!(
            "Generating from: {}",
            session.ingredients.display_lines().join(", ")
        )));
        let recipe = session
            .generate(&backend)
            .await
            .context("recipe generation failed")?
            .clone();
        if args.json {
            report.insert("generated".into(), serde_json::to_value(&recipe)?);
        } else {
            for line in build_recipe_summary(&recipe, None).lines {
                let _ = out_tx.send(OutputLine::Stdout(line));
            }
        }

        if args.save {
            let saved = session.save(&backend).await.context("save recipe failed")?;
            let _ = out_tx.send(OutputLine::Stderr(format!("Saved: {}", saved.id)));
            report.insert("saved".into(), serde_json::to_value(&saved)?);
        }
    }

    if args.list {
        // After a save the library is already selected and freshly loaded.
        session
            .select(&backend, ViewState::Library)
            .await
            .context("load saved recipes")?;
        if args.json {
            report.insert(
                "recipes".into(),
                serde_json::to_value(session.library.recipes())?,
            );
        } else {
            if !args.ingredients.is_empty() {
                let _ = out_tx.send(OutputLine::Stdout(String::new()));
            }
            for line in build_library_summary(session.library.status()).lines {
                let _ = out_tx.send(OutputLine::Stdout(line));
            }
        }
    }

    if args.json {
        let out = serde_json::to_string_pretty(&serde_json::Value::Object(report))?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
