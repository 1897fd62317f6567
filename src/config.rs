use crate::data::DataFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Animated terminal map of European city frequencies over time")]
pub struct Config {
    /// Directory the data files are resolved against
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Country geometry (TopoJSON topology or GeoJSON FeatureCollection)
    #[arg(long, default_value = "europe.topojson")]
    pub countries: PathBuf,

    /// Topology object holding the country shapes
    #[arg(long, default_value = "europe")]
    pub countries_object: String,

    /// City frequency dataset
    #[arg(long, default_value = "cities.json")]
    pub cities: PathBuf,

    /// Optional year -> fastest growing city dataset
    #[arg(long)]
    pub fastest: Option<PathBuf>,

    /// Shape of the city dataset
    #[arg(long, value_enum, default_value_t = DataFormat::Auto)]
    pub format: DataFormat,

    /// Log output file (the terminal is taken by the map)
    #[arg(long, default_value = "citymap.log")]
    pub log_file: PathBuf,

    /// Start with the animation stopped
    #[arg(long)]
    pub paused: bool,
}

impl Config {
    pub fn countries_path(&self) -> PathBuf {
        self.data_dir.join(&self.countries)
    }

    pub fn cities_path(&self) -> PathBuf {
        self.data_dir.join(&self.cities)
    }

    pub fn fastest_path(&self) -> Option<PathBuf> {
        self.fastest.as_ref().map(|f| self.data_dir.join(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["tui-citymap"]);
        assert_eq!(config.cities_path(), PathBuf::from("data/cities.json"));
        assert_eq!(config.countries_path(), PathBuf::from("data/europe.topojson"));
        assert_eq!(config.countries_object, "europe");
        assert_eq!(config.fastest_path(), None);
        assert_eq!(config.format, DataFormat::Auto);
        assert!(!config.paused);
    }

    #[test]
    fn test_overrides() {
        let config = Config::parse_from([
            "tui-citymap",
            "--data-dir",
            "/srv/maps",
            "--cities",
            "nested.json",
            "--fastest",
            "fastest.json",
            "--format",
            "year-keyed",
            "--countries-object",
            "countries",
            "--paused",
        ]);
        assert_eq!(config.countries_object, "countries");
        assert_eq!(config.cities_path(), PathBuf::from("/srv/maps/nested.json"));
        assert_eq!(config.fastest_path(), Some(PathBuf::from("/srv/maps/fastest.json")));
        assert_eq!(config.format, DataFormat::YearKeyed);
        assert!(config.paused);
    }
}
