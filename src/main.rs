// main.rs - Interactive entry point: prompt, run the research workflow, save the article
use anyhow::Context;
use research_digest::{report, Config, ResearchWorkflow, WorkflowError};
use std::process::ExitCode;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const DEFAULT_DOMAIN: &str = "machine learning";
const DEFAULT_DAYS: u32 = 7;
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("❌ Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    // Armed before the first prompt so Ctrl-C never hits the default handler
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    match run(&cancel).await {
        Ok(code) => code,
        Err(e) if is_cancelled(&e) => {
            println!("\n👋 Cancelled by user, nothing was written.");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn is_cancelled(e: &anyhow::Error) -> bool {
    e.downcast_ref::<WorkflowError>() == Some(&WorkflowError::Cancelled)
}

async fn run(cancel: &CancellationToken) -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("configuration error")?;
    let workflow = ResearchWorkflow::from_config(&config).context("failed to build research workflow")?;

    println!("🔬 Research digest");
    println!("{}", "=".repeat(50));

    let mut lines = stdin_lines();

    let domain = prompt(&mut lines, &format!("Research domain (default: {}): ", DEFAULT_DOMAIN), cancel)
        .await?
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());

    let days = match prompt(&mut lines, &format!("Days to look back (default: {}): ", DEFAULT_DAYS), cancel).await? {
        Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| {
            println!("⚠️  '{}' is not a number of days, using {}", raw, DEFAULT_DAYS);
            DEFAULT_DAYS
        }),
        None => DEFAULT_DAYS,
    };

    println!("\n🚀 Researching '{}' over the last {} days...", domain, days);
    println!("📚 Fetching papers and 🎥 videos in parallel, then writing the article\n");

    let state = workflow.run_with_cancellation(&domain, days, cancel).await?;

    println!("{}", report::render_summary(&state));

    if state.document.is_empty() {
        println!("⚠️  No article was generated, see the errors above.");
        return Ok(ExitCode::SUCCESS);
    }

    let path = report::write_document(&config.output_dir, &state)
        .await
        .with_context(|| format!("failed to write article to {}", config.output_dir.display()))?;
    println!("\n💾 Full article saved to {}", path.display());

    Ok(ExitCode::SUCCESS)
}

/// Forward stdin lines from a plain thread. A blocking read there cannot
/// hold up runtime shutdown after a cancellation.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Print `label` and wait for one line. Blank input and EOF both mean "use the
/// default"; a fired `cancel` ends the wait with `WorkflowError::Cancelled`.
async fn prompt(
    lines: &mut mpsc::Receiver<String>,
    label: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;

    let line = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(WorkflowError::Cancelled.into()),
        line = lines.recv() => line,
    };

    Ok(line
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty()))
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,research_digest=debug,reqwest=info,hyper=info".to_string()
        } else {
            "info,research_digest=info,reqwest=warn,hyper=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("🔬 Research digest starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
