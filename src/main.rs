//! CLI entry point for `va`.
//!
//! Fetches, aggregates and prints forecasts for the supported cities, or
//! aggregates a captured series offline.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use va::config::LoggingConfig;
use va::models::SunData;
use va::{AveragedForecast, City, ForecastReport, ForecastSeries, Source, VaConfig, VaError, WeatherService};

#[derive(Parser)]
#[command(name = "va")]
#[command(version, about = "Multi-source weather forecast aggregator", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported cities
    Cities,
    /// Print the normalized per-provider series for a city
    Weather {
        #[arg(long)]
        city: Option<String>,

        /// Only print this provider's list (tv2, dmi, yr, owm)
        #[arg(short, long)]
        source: Option<Source>,
    },
    /// Print the hourly view for a city
    Hourly {
        #[arg(long)]
        city: Option<String>,
    },
    /// Print the daily view for a city
    Daily {
        #[arg(long)]
        city: Option<String>,
    },
    /// Print the full report including provider status
    Forecast {
        #[arg(long)]
        city: Option<String>,
    },
    /// Print sunrise and sunset times
    Sun {
        #[arg(long)]
        city: Option<String>,

        /// Number of days starting today
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Fetch every city from every provider to warm the cache
    Refresh,
    /// Aggregate a captured series file without network access
    Aggregate {
        /// JSON object mapping source keys to point lists
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Reference time (RFC 3339), defaults to the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_forecasts(title: &str, forecasts: &[AveragedForecast]) {
    println!("{title}");
    if forecasts.is_empty() {
        println!("  no data available");
        return;
    }
    for f in forecasts {
        let range = match (f.low_temperature, f.high_temperature) {
            (Some(low), Some(high)) if low != high => format!(" ({low}..{high})"),
            _ => String::new(),
        };
        println!(
            "  {}  {:>3}°C{}  {:<20} {:<8} {} [{} sources, {:?} agreement]",
            f.timestamp.format("%Y-%m-%d %H:%M"),
            f.temperature,
            range,
            f.description,
            f.precipitation,
            f.icon_url,
            f.entries.len(),
            f.consensus.level,
        );
    }
}

fn print_report(report: &ForecastReport) {
    println!("{} ({})", report.city.display_name(), report.city.format_coordinates());
    for (source, status) in &report.sources {
        println!("  {source}: {status:?}");
    }
    println!("  outage: {:?}", report.outage);
    print_forecasts("Hourly", &report.hourly);
    print_forecasts("Daily", &report.daily);
}

fn print_sun(city: &City, sun: &SunData) {
    println!("{}", city.display_name());
    for day in &sun.dates {
        println!(
            "  {}  sunrise {}  sunset {}",
            day.date,
            day.sunrise.format("%H:%M UTC"),
            day.sunset.format("%H:%M UTC")
        );
    }
}

fn resolve_city(name: Option<&str>, config: &VaConfig) -> Result<City> {
    let name = name.unwrap_or(&config.forecast.default_city);
    Ok(City::find(name)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            match err.downcast_ref::<VaError>() {
                Some(va_err) => eprintln!("{}", va_err.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = VaConfig::load_from_path(cli.config.clone()).context("Failed to load configuration")?;
    init_logging(&config.logging, cli.verbose);
    debug!(forecast = ?config.forecast, "Configuration loaded");

    match cli.command {
        Commands::Cities => {
            if cli.json {
                print_json(&City::all())?;
            } else {
                for city in City::all() {
                    println!("{:<12} {}", city.display_name(), city.format_coordinates());
                }
            }
        }
        Commands::Weather { city, source } => {
            let city = resolve_city(city.as_deref(), &config)?;
            let service = WeatherService::from_config(&config)?;
            let fetched = service.fetch_series(&city).await;
            match source {
                Some(source) => print_json(&fetched.series.get(source))?,
                None => print_json(&fetched.series)?,
            }
        }
        Commands::Hourly { city } => {
            let city = resolve_city(city.as_deref(), &config)?;
            let report = WeatherService::from_config(&config)?.forecast(&city, Utc::now()).await;
            if cli.json {
                print_json(&report.hourly)?;
            } else {
                print_forecasts(&city.display_name(), &report.hourly);
            }
        }
        Commands::Daily { city } => {
            let city = resolve_city(city.as_deref(), &config)?;
            let report = WeatherService::from_config(&config)?.forecast(&city, Utc::now()).await;
            if cli.json {
                print_json(&report.daily)?;
            } else {
                print_forecasts(&city.display_name(), &report.daily);
            }
        }
        Commands::Forecast { city } => {
            let city = resolve_city(city.as_deref(), &config)?;
            let report = WeatherService::from_config(&config)?.forecast(&city, Utc::now()).await;
            if cli.json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
        }
        Commands::Sun { city, days } => {
            let city = resolve_city(city.as_deref(), &config)?;
            let days = days.unwrap_or(config.forecast.sun_days);
            let sun = WeatherService::from_config(&config)?.sun(&city, Utc::now().date_naive(), days)?;
            if cli.json {
                print_json(&sun)?;
            } else {
                print_sun(&city, &sun);
            }
        }
        Commands::Refresh => {
            let summary = WeatherService::from_config(&config)?.refresh_all().await;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!("Refreshed {}/{} provider fetches", summary.succeeded, summary.attempted);
            }
        }
        Commands::Aggregate { input, now } => {
            let series = ForecastSeries::load(&input)?;
            let now = now.unwrap_or_else(Utc::now);
            info!(sources = series.source_count(), %now, "Aggregating captured series");

            let aggregator = config.aggregator()?;
            let hourly = aggregator.hourly(&series, now);
            let daily = aggregator.daily(&series, now);
            if cli.json {
                print_json(&serde_json::json!({ "hourly": hourly, "daily": daily }))?;
            } else {
                print_forecasts("Hourly", &hourly);
                print_forecasts("Daily", &daily);
            }
        }
    }

    Ok(())
}
