pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zoning-api")]
#[command(about = "Zoning API - property and zoning data management backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Create a user account, e.g. the first admin")]
    CreateUser(commands::create_user::CreateUserArgs),
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve(Default::default())) {
        Commands::Serve(args) => commands::serve::handle(args).await,
        Commands::Migrate => commands::migrate::handle().await,
        Commands::CreateUser(args) => commands::create_user::handle(args).await,
    }
}
