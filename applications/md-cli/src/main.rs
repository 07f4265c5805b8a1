/// Disc Deck - command line front end
use clap::Parser;
use md_cli::{commands, interact::TerminalConfirm, AppContext, Cli, CliConfig, Command};
use md_editor::{Confirm, FixedAnswer};
use md_transport::MockDevice;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "md_cli=info,md_editor=info,md_upload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?;
    config.validate()?;

    if let Command::Init { blank } = cli.command {
        let device = MockDevice::create(&config.device.state_file, blank).await?;
        println!(
            "Created {} device at {}",
            if blank { "a blank" } else { "a demo" },
            config.device.state_file.display()
        );
        drop(device);
        return Ok(());
    }

    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(TerminalConfirm)
    };

    let ctx = AppContext::connect(config, confirm).await?;
    let result = commands::execute(&ctx, cli.command).await;
    ctx.close().await?;

    println!("{}", result?);
    Ok(())
}
