use anyhow::Result;
use clap::Parser;
use recipe_cli::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_headless = args.is_headless();

    cli::run(args).await?;

    // Explicitly exit with code 0 on success in headless mode
    if is_headless {
        std::process::exit(0);
    }
    Ok(())
}
