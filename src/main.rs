use std::{
    io::{self, IsTerminal, Read},
    path::PathBuf,
};

use clap::{Parser as ClapParser, Subcommand};
use query_spec::{
    cli::{self, CheckOptions, CliError},
    logging::init_logging,
};

#[derive(ClapParser)]
#[command(name = "qspec")]
#[command(about = "qspec - inspect and validate query filter expressions")]
#[command(version)]
struct Cli {
    /// Engine configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a filter expression and print its normalized form
    Check {
        /// The filter expression (reads from stdin if not provided)
        expression: Option<String>,

        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the token stream of a filter expression
    Tokens {
        /// The filter expression (reads from stdin if not provided)
        expression: Option<String>,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { expression, json } => run_check(expression, json, cli.config),
        Commands::Tokens { expression } => run_tokens(expression),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_expression(expression: Option<String>) -> Result<String, CliError> {
    match expression {
        Some(s) => Ok(s),
        None if !io::stdin().is_terminal() => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
        None => Err(CliError::NoInput),
    }
}

fn run_check(expression: Option<String>, json: bool, config: Option<PathBuf>) -> Result<(), CliError> {
    let config = cli::load_config(config.as_deref())?;
    let options = CheckOptions {
        expression: read_expression(expression)?,
        json,
    };

    let output = cli::execute_check(&options, &config)?;
    println!("{}", output.render(options.json)?);
    Ok(())
}

fn run_tokens(expression: Option<String>) -> Result<(), CliError> {
    let expression = read_expression(expression)?;
    for token in cli::execute_tokens(&expression)? {
        println!("{:>4}  {:<16} {}", token.position, format!("{:?}", token.kind), token);
    }
    Ok(())
}
