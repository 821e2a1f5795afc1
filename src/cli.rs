use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "copperbot")]
#[command(author, version, about = "Telegram bot front-end for the CopperX stablecoin banking API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Print the effective configuration and exit
    CheckConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
