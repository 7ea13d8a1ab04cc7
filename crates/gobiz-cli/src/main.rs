//! gobiz - query GoBiz transaction journals from the command line.
//!
//! Every run logs in first (sessions are not persisted), then runs one
//! query and prints the result as JSON on stdout. Logs go to stderr.

mod keychain;

use std::io;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use gobiz_core::journals::day_bounds;
use gobiz_core::{Config, GoBizService};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use keychain::SavedPassword;

/// Key the CLI's single session is stored under.
const CLI_USER_ID: &str = "cli";

const DEFAULT_LIMIT: u32 = 20;

const USAGE: &str = "\
Usage: gobiz <command> [options]

Commands:
  login                      Log in and print the token expiry
  today                      Today's transactions
  search                     One page of transactions in a date range
  summary                    Totals by payment type and status in a date range
  forget                     Remove the saved password from the keychain

Options:
  --email <email>            Login email (or GOBIZ_EMAIL)
  --merchant <id>            Merchant id (or GOBIZ_MERCHANT_ID)
  --from <YYYY-MM-DD>        First day of the range
  --to <YYYY-MM-DD>          Last day of the range
  --page <n>                 Page number for search (default 1)
  --limit <n>                Page size for search and today (default 20)
  --remember                 Save the password in the OS keychain after login
";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[derive(Debug, Default)]
struct Args {
    command: String,
    email: Option<String>,
    merchant: Option<String>,
    from: Option<String>,
    to: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
    remember: bool,
}

impl Args {
    fn parse(raw: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut raw = raw.into_iter();
        let mut args = Args {
            command: raw.next().unwrap_or_default(),
            ..Args::default()
        };

        while let Some(flag) = raw.next() {
            let mut value = || raw.next().with_context(|| format!("{} needs a value", flag));
            match flag.as_str() {
                "--email" => args.email = Some(value()?),
                "--merchant" => args.merchant = Some(value()?),
                "--from" => args.from = Some(value()?),
                "--to" => args.to = Some(value()?),
                "--page" => args.page = Some(value()?.parse().context("--page must be a number")?),
                "--limit" => args.limit = Some(value()?.parse().context("--limit must be a number")?),
                "--remember" => args.remember = true,
                other => bail!("Unknown option: {}\n\n{}", other, USAGE),
            }
        }
        Ok(args)
    }

    fn email(&self) -> Result<String> {
        self.email
            .clone()
            .or_else(|| std::env::var("GOBIZ_EMAIL").ok())
            .context("No email given; use --email or set GOBIZ_EMAIL")
    }

    fn merchant(&self) -> Result<String> {
        self.merchant
            .clone()
            .or_else(|| std::env::var("GOBIZ_MERCHANT_ID").ok())
            .context("No merchant given; use --merchant or set GOBIZ_MERCHANT_ID")
    }

    /// Start of `--from` through end of `--to`, in local time.
    fn range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let from = parse_day(self.from.as_deref().context("--from is required")?)?;
        let to = parse_day(self.to.as_deref().context("--to is required")?)?;
        if to < from {
            bail!("--to must not be before --from");
        }
        let (start, _) = day_bounds(&Local, from).context("Invalid --from date")?;
        let (_, end) = day_bounds(&Local, to).context("Invalid --to date")?;
        Ok((start, end))
    }
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

fn password_for(saved: Option<&SavedPassword>) -> Result<String> {
    if let Some(saved) = saved.and_then(SavedPassword::load) {
        return Ok(saved);
    }
    if let Ok(password) = std::env::var("GOBIZ_PASSWORD") {
        return Ok(password);
    }
    Ok(rpassword::prompt_password("GoBiz password: ")?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn login(service: &GoBizService, args: &Args) -> Result<()> {
    let email = args.email()?;
    let saved = match SavedPassword::for_email(&email) {
        Ok(saved) => Some(saved),
        Err(e) => {
            warn!(error = %e, "Keychain unavailable");
            None
        }
    };
    let password = password_for(saved.as_ref())?;

    eprintln!("Logging in as {}...", email);
    service
        .login(CLI_USER_ID, &email, &password)
        .await
        .context("GoBiz login failed")?;

    if args.remember {
        if let Some(saved) = &saved {
            if let Err(e) = saved.save(&password) {
                warn!(error = %e, "Failed to save password");
            }
        }
    }
    if let Ok(merchant) = args.merchant() {
        service.attach_merchant(CLI_USER_ID, &merchant).await?;
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    if args.command == "forget" {
        let email = args.email()?;
        if SavedPassword::for_email(&email)?.forget()? {
            eprintln!("Removed saved password for {}", email);
        } else {
            eprintln!("No saved password for {}", email);
        }
        return Ok(());
    }
    if !matches!(args.command.as_str(), "login" | "today" | "search" | "summary") {
        bail!("{}", USAGE);
    }

    let config = Config::load()?;
    let service = GoBizService::new(&config)?;
    login(&service, &args).await?;

    let limit = args.limit.unwrap_or(DEFAULT_LIMIT);
    match args.command.as_str() {
        "login" => print_json(&service.session_status(CLI_USER_ID).await)?,
        "today" => {
            let page = service
                .search_today(CLI_USER_ID, &args.merchant()?, limit)
                .await?;
            print_json(&page)?;
        }
        "search" => {
            let (from, to) = args.range()?;
            let page = service
                .search_page(CLI_USER_ID, &args.merchant()?, &from, &to, args.page.unwrap_or(1), limit)
                .await?;
            print_json(&page)?;
        }
        "summary" => {
            let (from, to) = args.range()?;
            let summary = service
                .summarize(CLI_USER_ID, &args.merchant()?, &from, &to)
                .await?;
            print_json(&summary)?;
        }
        _ => unreachable!("command validated above"),
    }

    service.logout(CLI_USER_ID).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("gobiz starting");

    let args = Args::parse(std::env::args().skip(1))?;
    run(args).await
}
