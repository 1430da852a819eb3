//! epubbot - turns reddit serials into EPUB books

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use epubbot::bot::{Bot, build_book};
use epubbot::command::parse_args;
use epubbot::config::BotConfig;
use epubbot::reddit::RedditClient;
use epubbot::traverse::PostSource;

#[derive(Parser)]
#[command(name = "epubbot")]
#[command(version, long_about = None)]
#[command(about = "Reddit bot that turns linked serial posts into EPUB books")]
#[command(after_help = "EXAMPLES:
    epubbot run -c config.toml                 Answer unread mentions once
    epubbot run -c s3://bucket/config.toml -w  Keep polling the inbox
    epubbot build -c config.toml URL -- -c '*' --no-outro
                                               Build one book locally")]
struct Cli {
    /// Config file path or s3://bucket/key URL
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer unread mentions
    Run {
        /// Keep polling instead of exiting after one pass
        #[arg(short, long)]
        watch: bool,
    },
    /// Build the book for one post and write it to disk
    Build {
        /// Link to any post of the series
        url: String,

        /// Output file (defaults to the book title)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Options as they would appear in a mention, after `--`
        #[arg(last = true)]
        options: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "epubbot=debug"
    } else if cli.quiet {
        "epubbot=warn"
    } else {
        "epubbot=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .init();

    let result = match cli.command {
        Command::Run { watch } => run(&cli.config, watch),
        Command::Build {
            url,
            output,
            options,
        } => build(&cli.config, &url, output, options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_location: &str, watch: bool) -> epubbot::Result<()> {
    let config = BotConfig::load(config_location)?;
    let publisher = config.storage.publisher()?;
    let client = RedditClient::new(config.reddit.clone())?;
    let bot = Bot::new(client, publisher, config.bot.invocation.clone());

    loop {
        match bot.process_inbox() {
            Ok(_) => {}
            Err(e) if watch && e.is_transient() => error!("inbox pass failed: {e}"),
            Err(e) => return Err(e),
        }
        if !watch {
            return Ok(());
        }
        info!(seconds = config.bot.poll_interval_secs, "sleeping");
        std::thread::sleep(Duration::from_secs(config.bot.poll_interval_secs));
    }
}

fn build(
    config_location: &str,
    url: &str,
    output: Option<PathBuf>,
    options: Vec<String>,
) -> epubbot::Result<()> {
    let config = BotConfig::load(config_location)?;
    let request = parse_args(std::iter::once("epubbot build".to_string()).chain(options))?;
    let client = RedditClient::new(config.reddit)?;

    let start = client.resolve(url)?;
    let built = build_book(&client, start, &request)?;
    let path = output.unwrap_or_else(|| PathBuf::from(built.file_name()));
    std::fs::write(&path, &built.bytes)?;

    println!(
        "{}: {} chapters from {} posts",
        path.display(),
        built.book.chapter_count(),
        built.posts
    );
    Ok(())
}
