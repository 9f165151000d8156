use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use chatmark::chat::ChatHistory;
use chatmark::renderer::HtmlRenderer;
use chatmark::{Config, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chatmark", version)]
#[command(about = "Render chat markdown to HTML")]
struct Cli {
    /// Input file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Treat the input as a JSON chat history and render every message
    #[arg(long)]
    history: bool,

    /// TOML config file
    #[arg(short, long, default_value = "chatmark.toml")]
    config: PathBuf,

    /// Log pipeline stages to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // --verbose enables DEBUG, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(html) => print!("{html}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let config = Config::load(&cli.config)?;
    let renderer = HtmlRenderer::with_options(config.render);

    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            input
        }
    };

    if !cli.history {
        return Ok(chatmark::render_with(Some(&input), &renderer));
    }

    let history = ChatHistory::from_json(&input)?;
    Ok(history
        .render(&renderer)
        .into_iter()
        .map(|message| {
            format!(
                "<div class=\"message {}-message\">{}</div>\n",
                message.sender.as_str(),
                message.html
            )
        })
        .collect())
}
