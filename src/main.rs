use blog_search::cli::{Cli, Commands, execute_query};
use clap::Parser;
use std::io::Write as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    blog_search::tracing::init(cli.verbose);

    match cli.command {
        Commands::Query(args) => {
            let output = execute_query(&args).await.inspect_err(|e| {
                tracing::error!("Query failed: {:#}", e);
            })?;
            std::io::stdout().write_all(output.as_bytes())?;
        }
    }

    Ok(())
}
