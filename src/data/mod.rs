mod countries;
mod scale;
mod source;

pub use countries::{load_countries, parse_countries, Country, Rings};
pub use scale::RadiusScale;
pub use source::{open_source, parse_fastest, CitySource, DataFormat, FlatCities, YearKeyedCities};

use crate::config::Config;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tracing::{info, warn};

/// One city's frequency in one year
#[derive(Clone, Debug, PartialEq)]
pub struct CityRecord {
    pub city: String,
    pub year: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub frequency: u32,
}

/// Everything loaded at startup; immutable afterwards
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub countries: Vec<Country>,
    pub records: Vec<CityRecord>,
    /// Sorted, duplicate-free years present in `records`
    pub years: Vec<i32>,
    pub radius: RadiusScale,
    /// Pre-computed fastest growing city per year
    pub fastest: BTreeMap<i32, CityRecord>,
}

impl Dataset {
    pub fn new(countries: Vec<Country>, records: Vec<CityRecord>, fastest: BTreeMap<i32, CityRecord>) -> Self {
        let years: Vec<i32> = records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let max_frequency = records.iter().map(|r| r.frequency.max(1)).max().unwrap_or(1);

        Self {
            countries,
            records,
            years,
            radius: RadiusScale::new(max_frequency),
            fastest,
        }
    }

    /// Position of a year in the year list
    pub fn year_position(&self, year: i32) -> Option<usize> {
        self.years.binary_search(&year).ok()
    }

    /// Records whose year equals `year`, in load order
    pub fn records_for_year(&self, year: i32) -> impl Iterator<Item = &CityRecord> + '_ {
        self.records.iter().filter(move |r| r.year == year)
    }

    /// All records for one city, ascending by year
    pub fn city_history(&self, city: &str) -> Vec<&CityRecord> {
        let mut history: Vec<&CityRecord> = self.records.iter().filter(|r| r.city == city).collect();
        history.sort_by_key(|r| r.year);
        history
    }

    /// First country whose polygons contain the point
    pub fn country_at(&self, lon: f64, lat: f64) -> Option<usize> {
        self.countries.iter().position(|c| c.contains(lon, lat))
    }
}

/// Load map geometry and city data as configured
pub fn load(config: &Config) -> Result<Dataset> {
    let countries_path = config.countries_path();
    let countries = load_countries(&countries_path, &config.countries_object)?;

    let cities_path = config.cities_path();
    let mut bytes = fs::read(&cities_path)
        .with_context(|| format!("reading city data {}", cities_path.display()))?;
    let records = open_source(&mut bytes, config.format)
        .with_context(|| format!("parsing city data {}", cities_path.display()))?
        .records();

    // The overlay is optional: a bad file only costs the overlay
    let fastest = match config.fastest_path() {
        Some(path) => match fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|mut bytes| parse_fastest(&mut bytes))
        {
            Ok(fastest) => fastest,
            Err(e) => {
                warn!("failed to load fastest growing data {}: {e:#}", path.display());
                BTreeMap::new()
            }
        },
        None => BTreeMap::new(),
    };

    let dataset = Dataset::new(countries, records, fastest);
    info!(
        "loaded {} countries, {} city records across {} years",
        dataset.countries.len(),
        dataset.records.len(),
        dataset.years.len()
    );
    Ok(dataset)
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample;
    use super::*;
    use clap::Parser;
    use std::path::{Path, PathBuf};

    const COUNTRIES: &str = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"NAME":"France"},"geometry":{"type":"Polygon","coordinates":[[[-5,42],[6.5,42],[6.5,51],[-5,51],[-5,42]]]}}]}"#;
    const FLAT_CITIES: &str = r#"[{"City":"Paris","Year":2000,"Latitude":48.86,"Longitude":2.35,"Frequency":10}]"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tui-citymap-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config_for(dir: &Path, extra: &[&str]) -> Config {
        let mut args = vec![
            "tui-citymap".to_string(),
            "--data-dir".to_string(),
            dir.display().to_string(),
            "--countries".to_string(),
            "europe.geojson".to_string(),
        ];
        args.extend(extra.iter().map(|a| a.to_string()));
        Config::parse_from(args)
    }

    #[test]
    fn test_load_missing_cities_names_file() {
        let dir = scratch_dir("missing-cities");
        fs::write(dir.join("europe.geojson"), COUNTRIES).unwrap();

        let err = load(&config_for(&dir, &[])).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains(&dir.join("cities.json").display().to_string()), "{message}");
    }

    #[test]
    fn test_load_broken_countries_is_error() {
        let dir = scratch_dir("broken-countries");
        fs::write(dir.join("europe.geojson"), "{ not geometry").unwrap();
        fs::write(dir.join("cities.json"), FLAT_CITIES).unwrap();

        let err = load(&config_for(&dir, &[])).unwrap_err();
        assert!(format!("{err:#}").contains("europe.geojson"));
    }

    #[test]
    fn test_load_skips_corrupt_fastest() {
        let dir = scratch_dir("corrupt-fastest");
        fs::write(dir.join("europe.geojson"), COUNTRIES).unwrap();
        fs::write(dir.join("cities.json"), FLAT_CITIES).unwrap();
        fs::write(dir.join("fastest.json"), "{ truncated").unwrap();

        let dataset = load(&config_for(&dir, &["--fastest", "fastest.json"])).unwrap();
        assert!(dataset.fastest.is_empty());
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.countries[0].name, "France");
    }

    #[test]
    fn test_load_detects_year_keyed_cities() {
        let dir = scratch_dir("year-keyed");
        fs::write(dir.join("europe.geojson"), COUNTRIES).unwrap();
        let cities = r#"{
            "2001": { "Paris": { "Latitude": 48.86, "Longitude": 2.35, "Frequency": 20 } },
            "2000": { "Lyon": { "Latitude": 45.76, "Longitude": 4.84, "Frequency": 4 } }
        }"#;
        fs::write(dir.join("cities.json"), cities).unwrap();

        let dataset = load(&config_for(&dir, &["--format", "auto"])).unwrap();
        assert_eq!(dataset.years, vec![2000, 2001]);
        assert_eq!(dataset.records.len(), 2);
        assert!(dataset.fastest.is_empty());
    }

    #[test]
    fn test_years_strictly_increasing() {
        let dataset = sample();
        assert_eq!(dataset.years, vec![2000, 2001, 2002]);
        assert!(dataset.years.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_records_for_year_exact() {
        let dataset = sample();
        for &year in &dataset.years {
            assert!(dataset.records_for_year(year).all(|r| r.year == year));
        }
        assert_eq!(dataset.records_for_year(2001).count(), 2);
        assert_eq!(dataset.year_position(2001), Some(1));
        assert_eq!(dataset.year_position(1999), None);
    }

    #[test]
    fn test_city_history_sorted() {
        let dataset = sample();
        let years: Vec<i32> = dataset.city_history("Paris").iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2000, 2001, 2002]);
    }

    #[test]
    fn test_radius_domain_from_max_frequency() {
        let dataset = sample();
        assert_eq!(dataset.radius.radius(40), 15.0);
    }

    #[test]
    fn test_country_at() {
        let dataset = sample();
        assert_eq!(dataset.country_at(2.35, 48.86), Some(0));
        assert_eq!(dataset.country_at(12.5, 41.9), Some(1));
        assert_eq!(dataset.country_at(13.4, 52.52), None);
    }
}
