use clap::Parser;
use kingpin::{actors, Cli, Runner};
use kingpin_core::KingpinConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.explain {
        return explain(&cli);
    }

    match run(&cli).await {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            tracing::error!(error = %err, "kingpin failed");
            std::process::ExitCode::from(1)
        }
    }
}

fn explain(cli: &kingpin::Cli) -> std::process::ExitCode {
    let Some(actor_id) = &cli.actor else {
        eprintln!("--explain requires --actor ID");
        return std::process::ExitCode::from(1);
    };
    match actors::explain(actor_id) {
        Some(doc) => {
            println!("{doc}");
            std::process::ExitCode::from(0)
        }
        None => {
            eprintln!("no documentation registered for actor {actor_id:?}");
            std::process::ExitCode::from(1)
        }
    }
}

async fn run(cli: &kingpin::Cli) -> kingpin::Result<i32> {
    let config = KingpinConfig::load()?;
    let runner = Runner::new(config);
    let tokens = cli.token_overrides()?;

    let report = if let Some(script) = &cli.script {
        runner.run_script(script, tokens, cli.dry, cli.build_only).await?
    } else {
        let node = cli.ad_hoc_document()?;
        runner.run_ad_hoc(&node, tokens, cli.dry, cli.build_only).await?
    };

    Ok(report.exit_code())
}
