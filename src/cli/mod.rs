use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};
use std::net::IpAddr;

#[derive(Debug, Parser)]
#[command(name = "streak-habits", about = "Daily habit check-ins and streaks")]
pub struct Cli {
    /// Treat this process as a serverless deployment (temp-dir storage, no landing page).
    #[arg(
        long,
        global = true,
        env = "VERCEL",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub serverless: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Serve {
        #[arg(long)]
        host: Option<IpAddr>,
        #[arg(long)]
        port: Option<u16>,
    },
    Checkin {
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = false)]
        missed: bool,
        #[arg(long)]
        note: Option<String>,
    },
    History {
        #[arg(long)]
        limit: Option<u32>,
    },
    Streak,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Doctor,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn parses_checkin_flags() {
        let cli = Cli::try_parse_from([
            "streak-habits",
            "checkin",
            "--date",
            "2024-01-05",
            "--note",
            "ran 5k",
        ])
        .expect("valid arguments");

        match cli.command {
            Commands::Checkin { date, missed, note } => {
                assert_eq!(date.as_deref(), Some("2024-01-05"));
                assert!(!missed);
                assert_eq!(note.as_deref(), Some("ran 5k"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serverless_flag_is_global() {
        let cli = Cli::try_parse_from(["streak-habits", "serve", "--port", "9000", "--serverless"])
            .expect("valid arguments");
        assert!(cli.serverless);
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), .. }));
    }
}
