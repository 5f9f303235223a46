use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, InquireError, Password, Select, Text};
use serde::Serialize;
use tracing::debug;
use weatherdash_core::{
    BackendId, Config, Coordinates, Dashboard, DashboardError, DashboardView, GeolocationError,
    HistoricalView, UnitSystem,
};

use crate::render::{self, Renderer};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose a backend, store the API key and set defaults.
    Configure,

    /// Show the dashboard for a city.
    Show {
        /// City name; the configured default city when absent.
        city: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the dashboard for device coordinates.
    ///
    /// Without coordinates the configured fallback city is shown.
    Locate {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show weather for a city on a past date.
    History {
        #[arg(long)]
        city: String,

        /// Date in YYYY-MM-DD form; must be before today.
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the dashboard as a prompt loop.
    Interactive {
        #[arg(long, value_parser = parse_units)]
        units: Option<UnitSystem>,
    },
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Unit system: "metric" or "imperial".
    #[arg(long, value_parser = parse_units)]
    units: Option<UnitSystem>,

    /// Print the view model as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn parse_units(s: &str) -> Result<UnitSystem, String> {
    UnitSystem::try_from(s).map_err(|e| e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, output } => {
                let mut dash = open_dashboard(output.units)?;
                let result = match city {
                    Some(city) => dash.search(&city).await,
                    None => dash.start().await,
                };
                emit(result, output.json, render::dashboard)
            }
            Command::Locate { lat, lon, output } => {
                let position = match (lat, lon) {
                    (Some(lat), Some(lon)) => Ok(Coordinates { lat, lon }),
                    _ => Err(GeolocationError::Unsupported),
                };
                let mut dash = open_dashboard(output.units)?;
                let result = dash.locate(position).await;
                emit(result, output.json, render::dashboard)
            }
            Command::History { city, date, output } => {
                let mut dash = open_dashboard(output.units)?;
                if let Err(e) = dash.search(&city).await {
                    return emit::<HistoricalView>(Err(e), output.json, render::historical);
                }
                let result = dash.history(Some(date), today()).await;
                emit(result, output.json, render::historical)
            }
            Command::Interactive { units } => {
                let dash = open_dashboard(units)?;
                interactive(dash).await
            }
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env();
    Ok(config)
}

fn open_dashboard(units: Option<UnitSystem>) -> anyhow::Result<Dashboard> {
    let mut config = load_config()?;
    if let Some(units) = units {
        config.units = units;
    }
    let dash = Dashboard::from_config(&config)?;
    debug!(backend = %dash.backend_id(), units = %config.units, "dashboard ready");
    Ok(dash)
}

/// Print a view, or the user-facing message for a dashboard error.
fn emit<T: Serialize>(
    result: Result<T, DashboardError>,
    json: bool,
    text: Renderer<T>,
) -> anyhow::Result<()> {
    match result {
        Ok(view) if json => {
            let out = serde_json::to_string_pretty(&view).context("Failed to serialize view")?;
            println!("{out}");
            Ok(())
        }
        Ok(view) => print_view(&view, text),
        Err(e) if !e.is_failure() => {
            println!("{}", e.user_message());
            Ok(())
        }
        Err(e) => bail!("{}", e.user_message()),
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let backends: Vec<BackendId> = BackendId::all().to_vec();
    let current = config.backend_id().unwrap_or(BackendId::Mock);
    let start = backends.iter().position(|b| *b == current).unwrap_or(0);
    let backend = Select::new("Backend:", backends).with_starting_cursor(start).prompt()?;
    config.set_backend(backend);

    match backend {
        BackendId::OpenWeather => {
            let key = Password::new("OpenWeather API key (leave empty to keep the current one):")
                .without_confirmation()
                .prompt()?;
            if !key.trim().is_empty() {
                config.api_key = Some(key.trim().to_string());
            }
        }
        BackendId::Mock => {
            config.mock.delay_ms = CustomType::<u64>::new("Mock response delay (ms):")
                .with_default(config.mock.delay_ms)
                .with_error_message("Please type a whole number of milliseconds")
                .prompt()?;
        }
    }

    let units: Vec<UnitSystem> = UnitSystem::all().to_vec();
    let start = units.iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Default units:", units).with_starting_cursor(start).prompt()?;

    config.default_city =
        Text::new("Default city:").with_default(&config.default_city).prompt()?;

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Search,
    Locate,
    SwitchUnits,
    History,
    Quit,
}

impl Action {
    const ALL: [Action; 5] =
        [Action::Search, Action::Locate, Action::SwitchUnits, Action::History, Action::Quit];
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::Search => "Search a city",
            Action::Locate => "Use my location",
            Action::SwitchUnits => "Switch units",
            Action::History => "Historical weather",
            Action::Quit => "Quit",
        })
    }
}

async fn interactive(mut dash: Dashboard) -> anyhow::Result<()> {
    show(dash.start().await)?;

    loop {
        let action = match Select::new("What next?", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match action {
            Action::Search => {
                let Some(city) = ask(Text::new("City:").prompt())? else { continue };
                show(dash.search(&city).await)?;
            }
            Action::Locate => {
                let Some(raw) = ask(
                    Text::new("Coordinates as LAT,LON (empty to deny access):").prompt(),
                )?
                else {
                    continue;
                };
                show(dash.locate(parse_position(&raw)).await)?;
            }
            Action::SwitchUnits => {
                let units = UnitSystem::all().to_vec();
                let Some(unit) = ask(Select::new("Units:", units).prompt())? else { continue };
                match dash.switch_unit(unit).await {
                    Ok(Some(view)) => print_view(&view, render::dashboard)?,
                    Ok(None) => println!("Units: {unit}"),
                    Err(e) => eprintln!("{}", e.user_message()),
                }
            }
            Action::History => {
                let Some(raw) = ask(Text::new("Date (YYYY-MM-DD):").prompt())? else { continue };
                let date = match history_date(&raw) {
                    Ok(date) => date,
                    Err(msg) => {
                        eprintln!("{msg}");
                        continue;
                    }
                };
                match dash.history(date, today()).await {
                    Ok(view) => print_view(&view, render::historical)?,
                    Err(e) => eprintln!("{}", e.user_message()),
                }
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

/// A cancelled prompt means "go back"; other prompt errors are fatal.
fn ask<T>(answer: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Empty input is left for the dashboard to reject; malformed input is
/// reported with the parse error.
fn history_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_date(raw).map(Some).map_err(|e| format!("Invalid date \"{}\": {e}", raw.trim()))
}

fn print_view<T>(view: &T, render: Renderer<T>) -> anyhow::Result<()> {
    let mut out = String::new();
    render(&mut out, view).context("Failed to render view")?;
    print!("{out}");
    Ok(())
}

fn show(result: Result<DashboardView, DashboardError>) -> anyhow::Result<()> {
    match result {
        Ok(view) => print_view(&view, render::dashboard),
        Err(e) => {
            eprintln!("{}", e.user_message());
            Ok(())
        }
    }
}

fn parse_position(raw: &str) -> Result<Coordinates, GeolocationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(GeolocationError::Denied);
    }
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| GeolocationError::Unavailable(format!("cannot read \"{raw}\"")))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| GeolocationError::Unavailable(format!("bad coordinate \"{s}\": {e}")))
    };
    Ok(Coordinates { lat: parse(lat)?, lon: parse(lon)? })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        let cli = Cli::try_parse_from(["weatherdash", "show", "Paris", "--units", "imperial"])
            .expect("valid args");
        match cli.command {
            Command::Show { city, output } => {
                assert_eq!(city.as_deref(), Some("Paris"));
                assert_eq!(output.units, Some(UnitSystem::Imperial));
                assert!(!output.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn locate_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["weatherdash", "locate", "--lat", "-33.9", "--lon", "18.4"])
            .expect("valid args");
        let Command::Locate { lat, lon, .. } = cli.command else {
            panic!("expected locate");
        };
        assert_eq!((lat, lon), (Some(-33.9), Some(18.4)));
    }

    #[test]
    fn locate_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["weatherdash", "locate", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn history_rejects_malformed_dates() {
        assert!(
            Cli::try_parse_from(["weatherdash", "history", "--city", "Oslo", "--date", "15/01/2024"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["weatherdash", "show", "--units", "kelvin"]).is_err());
    }

    #[test]
    fn interactive_history_date_reports_parse_errors() {
        assert_eq!(history_date("  "), Ok(None));
        assert_eq!(history_date("2024-01-15"), Ok(NaiveDate::from_ymd_opt(2024, 1, 15)));

        let err = history_date("15/01/2024").unwrap_err();
        assert!(err.starts_with("Invalid date \"15/01/2024\""), "{err}");
        assert!(err.contains("expected YYYY-MM-DD"), "{err}");
    }

    #[test]
    fn position_parsing() {
        assert!(matches!(parse_position("  "), Err(GeolocationError::Denied)));
        assert!(matches!(parse_position("north"), Err(GeolocationError::Unavailable(_))));
        let coords = parse_position("27.7, 85.3").expect("valid pair");
        assert_eq!((coords.lat, coords.lon), (27.7, 85.3));
    }
}
