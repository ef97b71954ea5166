use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;

use crate::units::Units;

const ABOUT: &str = "City weather TUI";

const LONG_ABOUT: &str = "
TUI for current conditions and a five day forecast from OpenWeatherMap.

Start typing a city name to get suggestions from the RapidAPI city search service, pick one with
the arrow keys and press Enter. Pressing Enter without a selection looks up the text as typed.

API keys are read from the config file or from the OWM_API_KEY and RAPIDAPI_KEY environment
variables. The last city shown is saved, so subsequent runs start with it unless another city is
given.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "City to show on startup (e.g. \"London\", \"Paris,FR\")")]
    pub city: Option<String>,

    #[arg(short, long, value_enum, help = "Units for temperature and wind speed")]
    pub units: Option<Units>,

    #[arg(short, long, help = "Config file [default: <config dir>/cityweather/config.toml]")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Log file [default: <data dir>/cityweather/cityweather.log]")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse() {
        let args = Args::parse_from(["cityweather", "New York", "--units", "imperial"]);
        assert_eq!(args.city.as_deref(), Some("New York"));
        assert_eq!(args.units, Some(Units::Imperial));
        assert!(args.config.is_none());

        let args = Args::parse_from(["cityweather"]);
        assert!(args.city.is_none());
        assert!(args.units.is_none());
    }
}
