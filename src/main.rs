use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox as lox;

use lox::ast_printer::AstPrinter;
use lox::parser::Parser;
use lox::runner::{self, EXIT_STATIC_ERROR};
use lox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array instead of one per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a program and prints each statement's AST
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },
}

/// Reads the contents of a file as UTF-8 source text
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "{} [{}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(source: &str, json: bool) -> Result<i32> {
    info!("Running Tokenize subcommand");

    let (tokens, errors) = Scanner::new(source).scan_tokens();

    for e in &errors {
        debug!("Tokenization debug: {}", e);
        eprintln!("{}", e);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &tokens).context("Failed to serialize tokens")?;
        writeln!(out)?;
    } else {
        for token in &tokens {
            writeln!(out, "{}", token)?;
        }
    }

    if errors.is_empty() {
        info!("Tokenization completed successfully");
        Ok(0)
    } else {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        Ok(EXIT_STATIC_ERROR)
    }
}

fn parse(source: &str) -> Result<i32> {
    info!("Running Parse subcommand");

    let (tokens, mut errors) = Scanner::new(source).scan_tokens();
    let mut parser = Parser::new(&tokens);

    match parser.parse() {
        Ok(statements) if errors.is_empty() => {
            info!("Parsed {} statement(s)", statements.len());

            for stmt in &statements {
                let ast_str = AstPrinter::print_stmt(stmt);
                debug!("AST: {}", ast_str);
                println!("{}", ast_str);
            }

            Ok(0)
        }

        Ok(_) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            Ok(EXIT_STATIC_ERROR)
        }

        Err(parse_errors) => {
            errors.extend(parse_errors);
            for e in &errors {
                debug!("Parse debug: {}", e);
                eprintln!("{}", e);
            }
            Ok(EXIT_STATIC_ERROR)
        }
    }
}

fn run(source: &str) -> Result<i32> {
    info!("Running Run subcommand");
    info!("Provided input:\n {}", source);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = runner::run(source, &mut out);
    out.flush()?;

    for e in outcome.diagnostics() {
        debug!("Run debug: {}", e);
        eprintln!("{}", e);
    }

    info!("Run finished with exit code {}", outcome.exit_code());
    Ok(outcome.exit_code())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&read_file(filename)?, json)?,
        Commands::Parse { filename } => parse(&read_file(filename)?)?,
        Commands::Run { filename } => run(&read_file(filename)?)?,
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
