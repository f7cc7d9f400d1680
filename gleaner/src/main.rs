use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use gleaner_core::services;
use gleaner_webdriver::{Browser, Capabilities, WebDriver};

mod backends;
mod config;

#[derive(Debug, Parser)]
#[clap(name = "gleaner", version, about = "Scrape upcoming events and write blobs to disk.")]
struct Args {
    /// Config file to read instead of ./gleaner.{toml,json}
    #[clap(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Write the bytes of a file, or stdin, as a named blob
    Write {
        name: String,

        #[clap(long, short, value_name = "FILE")]
        input: Option<PathBuf>,

        #[clap(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,
    },
    /// Print upcoming events as JSON lines
    Events {
        url: Option<String>,

        /// WebDriver server to drive the browser through
        #[clap(long, value_name = "URL")]
        webdriver: Option<String>,

        /// edge, chrome or firefox
        #[clap(long)]
        browser: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::read(args.config.as_deref())?;

    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_err) => tracing_subscriber::EnvFilter::try_new(&config.log_level)
            .context("parsing log level")?,
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    match args.command {
        Command::Write {
            name,
            input,
            base_dir,
        } => command_write(&config, name, input, base_dir).await,
        Command::Events {
            url,
            webdriver,
            browser,
        } => command_events(&config, url, webdriver, browser).await,
    }
}

async fn command_write(
    config: &config::Config,
    name: String,
    input: Option<PathBuf>,
    base_dir: Option<PathBuf>,
) -> Result<()> {
    let contents = match input {
        Some(input) => tokio::fs::read(&input)
            .await
            .with_context(|| format!("reading {}", input.display()))?,
        None => {
            let mut contents = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut contents)
                .await
                .context("reading stdin")?;
            contents
        }
    };

    let base_dir = base_dir.or_else(|| config.storage.base_dir.clone());
    let writer = backends::LocalBlobWriter::open(base_dir);

    writer.write(&name, &contents).await
}

async fn command_events(
    config: &config::Config,
    url: Option<String>,
    webdriver: Option<String>,
    browser: Option<String>,
) -> Result<()> {
    use std::io::Write;

    let browser = match browser {
        Some(browser) => browser.parse::<Browser>()?,
        None => config.webdriver.browser,
    };

    let capabilities =
        Capabilities::new(browser).with_arguments(config.webdriver.arguments.iter().cloned());

    let webdriver = webdriver.unwrap_or_else(|| config.webdriver.url.clone());
    let url = url.unwrap_or_else(|| config.events.url.clone());

    tracing::info!("reading events from {url} using {browser} at {webdriver}");

    let http_client = reqwest::Client::builder().build()?;
    let driver = WebDriver::new(http_client, webdriver);

    let events = services::upcoming_events(driver, &capabilities, &url).await?;

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    for event in &events {
        serde_json::to_writer(&mut stdout, event)?;
        stdout.write_all(b"\n")?;
    }

    stdout.flush()?;

    Ok(())
}
