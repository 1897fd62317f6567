use super::CityRecord;
use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Shape of a city-frequency dataset on disk
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DataFormat {
    /// Detect from the first byte: `[` is flat, `{` is year-keyed
    #[default]
    Auto,
    /// `[{City, Year, Latitude, Longitude, Frequency}, ...]`
    Flat,
    /// `{"<year>": {"<city>": {Latitude, Longitude, Frequency}}}`
    YearKeyed,
}

impl DataFormat {
    fn detect(bytes: &[u8]) -> Result<Self> {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'[') => Ok(DataFormat::Flat),
            Some(b'{') => Ok(DataFormat::YearKeyed),
            Some(other) => bail!("unrecognised city data: starts with {:?}", *other as char),
            None => bail!("city data is empty"),
        }
    }
}

/// Anything that can be flattened into per-year city records
pub trait CitySource {
    fn records(&self) -> Vec<CityRecord>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FlatRow {
    city: String,
    year: i32,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    frequency: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CityPoint {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    frequency: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NamedCityPoint {
    city: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    frequency: Option<f64>,
}

fn to_frequency(value: Option<f64>) -> u32 {
    value.map(|v| v.max(0.0).round() as u32).unwrap_or(0)
}

fn parse_year(key: &str) -> Option<i32> {
    match key.trim().parse() {
        Ok(year) => Some(year),
        Err(_) => {
            warn!("skipping non-numeric year key {key:?}");
            None
        }
    }
}

/// Flat array, one row per city per year
pub struct FlatCities {
    rows: Vec<FlatRow>,
}

impl FlatCities {
    pub fn parse(bytes: &mut [u8]) -> Result<Self> {
        let rows: Vec<FlatRow> = simd_json::serde::from_slice(bytes)?;
        Ok(Self { rows })
    }
}

impl CitySource for FlatCities {
    fn records(&self) -> Vec<CityRecord> {
        self.rows
            .iter()
            .map(|row| CityRecord {
                city: row.city.clone(),
                year: row.year,
                latitude: row.latitude,
                longitude: row.longitude,
                frequency: to_frequency(row.frequency),
            })
            .collect()
    }
}

/// Dictionary of years, each a dictionary of city name to point
pub struct YearKeyedCities {
    years: BTreeMap<String, BTreeMap<String, CityPoint>>,
}

impl YearKeyedCities {
    pub fn parse(bytes: &mut [u8]) -> Result<Self> {
        let years = simd_json::serde::from_slice(bytes)?;
        Ok(Self { years })
    }
}

impl CitySource for YearKeyedCities {
    fn records(&self) -> Vec<CityRecord> {
        let mut records = Vec::new();
        for (key, cities) in &self.years {
            let Some(year) = parse_year(key) else {
                continue;
            };
            records.extend(cities.iter().map(|(name, point)| CityRecord {
                city: name.clone(),
                year,
                latitude: point.latitude,
                longitude: point.longitude,
                frequency: to_frequency(point.frequency),
            }));
        }
        records
    }
}

/// Open a city dataset in the given (or detected) format
pub fn open_source(bytes: &mut [u8], format: DataFormat) -> Result<Box<dyn CitySource>> {
    let format = match format {
        DataFormat::Auto => DataFormat::detect(bytes)?,
        explicit => explicit,
    };
    Ok(match format {
        DataFormat::Flat => Box::new(FlatCities::parse(bytes)?),
        _ => Box::new(YearKeyedCities::parse(bytes)?),
    })
}

/// Parse the externally computed "fastest growing city" of each year
pub fn parse_fastest(bytes: &mut [u8]) -> Result<BTreeMap<i32, CityRecord>> {
    let raw: BTreeMap<String, NamedCityPoint> = simd_json::serde::from_slice(bytes)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, point)| {
            let year = parse_year(&key)?;
            Some((
                year,
                CityRecord {
                    city: point.city,
                    year,
                    latitude: point.latitude,
                    longitude: point.longitude,
                    frequency: to_frequency(point.frequency),
                },
            ))
        })
        .collect())
}
