use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use estatehub::auth::password;
use estatehub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "EstateHub",
    about = "Run the EstateHub marketplace API or exercise it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print a bcrypt hash suitable for ADMIN_PASSWORD
    HashPassword(HashPasswordArgs),
    /// Walk through builder onboarding, a listing and a lead against an in-memory store
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct HashPasswordArgs {
    /// Plain-text password to hash
    pub(crate) password: String,
    /// bcrypt cost factor
    #[arg(long, default_value_t = password::DEFAULT_COST)]
    pub(crate) cost: u32,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::HashPassword(args) => {
            let hashed = password::hash(args.password, args.cost).await?;
            println!("{hashed}");
            Ok(())
        }
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["estatehub"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["estatehub", "serve", "--port", "8080"]).expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(8080)),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn hash_password_takes_plain_text_and_cost() {
        let cli = Cli::try_parse_from(["estatehub", "hash-password", "s3cret", "--cost", "4"])
            .expect("parses");
        match cli.command {
            Some(Command::HashPassword(args)) => {
                assert_eq!(args.password, "s3cret");
                assert_eq!(args.cost, 4);
            }
            other => panic!("expected hash-password, got {other:?}"),
        }
    }
}
