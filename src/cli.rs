use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "igrelay")]
#[command(author, version, about = "Telegram bot that relays Instagram posts and reels as media", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling) and the liveness server
    Run,

    /// Resolve the media of one Instagram link through the extraction API
    Extract {
        /// Instagram post or reel URL
        url: String,

        /// Print the media list as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["igrelay"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_extract_with_json() {
        let cli = Cli::try_parse_from(["igrelay", "extract", "https://www.instagram.com/p/ABC/", "--json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Extract {
                url: "https://www.instagram.com/p/ABC/".to_string(),
                json: true
            })
        );
    }
}
