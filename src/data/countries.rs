use crate::map::geometry::rings_contain;
use crate::map::projection::GeoBounds;
use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use topojson::TopoJson;
use tracing::{debug, warn};

/// A polygon as a list of rings (first exterior, rest holes), lon/lat degrees
pub type Rings = Vec<Vec<(f64, f64)>>;

/// A country shape from the map geometry file
#[derive(Clone, Debug)]
pub struct Country {
    pub name: String,
    pub polygons: Vec<Rings>,
    pub bounds: GeoBounds,
}

impl Country {
    pub fn new(name: impl Into<String>, polygons: Vec<Rings>) -> Self {
        let bounds = compute_bounds(&polygons);
        Self {
            name: name.into(),
            polygons,
            bounds,
        }
    }

    /// Whether a geographic point lies inside any of this country's polygons
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let [[x0, y0], [x1, y1]] = self.bounds;
        if lon < x0 || lon > x1 || lat < y0 || lat > y1 {
            return false;
        }
        self.polygons.iter().any(|rings| rings_contain(rings, lon, lat))
    }
}

fn compute_bounds(polygons: &[Rings]) -> GeoBounds {
    let mut bounds = [[f64::INFINITY, f64::INFINITY], [f64::NEG_INFINITY, f64::NEG_INFINITY]];
    for &(lon, lat) in polygons.iter().flatten().flatten() {
        bounds[0][0] = bounds[0][0].min(lon);
        bounds[0][1] = bounds[0][1].min(lat);
        bounds[1][0] = bounds[1][0].max(lon);
        bounds[1][1] = bounds[1][1].max(lat);
    }
    bounds
}

/// Load country polygons from a TopoJSON or GeoJSON file.
/// `object` names the topology object holding the countries.
pub fn load_countries(path: &Path, object: &str) -> Result<Vec<Country>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading country geometry {}", path.display()))?;
    parse_countries(&content, object).with_context(|| format!("parsing country geometry {}", path.display()))
}

pub fn parse_countries(content: &str, object: &str) -> Result<Vec<Country>> {
    let features = match content.parse::<TopoJson>() {
        Ok(TopoJson::Topology(topology)) => {
            debug!("decoding topology object {object}");
            topojson::to_geojson(&topology, &object.to_string())
                .map_err(|e| anyhow::anyhow!("converting topology object {object}: {e}"))?
                .features
        }
        _ => geojson_features(content)?,
    };

    if features.is_empty() {
        warn!("no country features found");
    }

    let mut countries = Vec::with_capacity(features.len());
    for feature in features {
        let props = feature.properties.as_ref();

        // Try the usual Natural Earth name fields in order
        let name = props
            .and_then(|p| p.get("NAME").or_else(|| p.get("name")).or_else(|| p.get("ADMIN")))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();

        let mut polygons = Vec::new();
        if let Some(ref geometry) = feature.geometry {
            collect_polygons(geometry, &mut polygons);
        }

        if polygons.is_empty() {
            warn!("country {name} has no polygon geometry, skipping");
            continue;
        }
        countries.push(Country::new(name, polygons));
    }

    Ok(countries)
}

fn geojson_features(content: &str) -> Result<Vec<Feature>> {
    let geojson: GeoJson = content.parse()?;
    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        GeoJson::Feature(f) => Ok(vec![f]),
        GeoJson::Geometry(_) => anyhow::bail!("expected features with a name property, found a bare geometry"),
    }
}

fn to_rings(rings: &[Vec<Vec<f64>>]) -> Rings {
    rings
        .iter()
        .map(|ring| ring.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect())
        .collect()
}

fn collect_polygons(geometry: &Geometry, polygons: &mut Vec<Rings>) {
    match &geometry.value {
        Value::Polygon(rings) => polygons.push(to_rings(rings)),
        Value::MultiPolygon(parts) => {
            for rings in parts {
                polygons.push(to_rings(rings));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, polygons);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "NAME": "Squareland" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 40], [10, 40], [10, 50], [0, 50], [0, 40]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Islands" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[20, 40], [21, 40], [21, 41], [20, 41], [20, 40]]],
                        [[[30, 40], [31, 40], [31, 41], [30, 41], [30, 40]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [1, 1] }
            }
        ]
    }"#;

    #[test]
    fn test_parse_names_and_shapes() {
        let countries = parse_countries(SAMPLE, "europe").unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[0].name, "Squareland");
        assert_eq!(countries[1].name, "Islands");
        assert_eq!(countries[1].polygons.len(), 2);
        assert_eq!(countries[1].bounds, [[20.0, 40.0], [31.0, 41.0]]);
    }

    #[test]
    fn test_contains() {
        let countries = parse_countries(SAMPLE, "europe").unwrap();
        assert!(countries[0].contains(5.0, 45.0));
        assert!(!countries[0].contains(15.0, 45.0));
        assert!(countries[1].contains(30.5, 40.5));
        assert!(!countries[1].contains(25.0, 40.5));
    }

    #[test]
    fn test_missing_name_is_unknown() {
        let json = r#"{"type":"Feature","properties":null,"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}"#;
        let countries = parse_countries(json, "europe").unwrap();
        assert_eq!(countries[0].name, "Unknown");
    }

    const TOPOLOGY: &str = r#"{
        "type": "Topology",
        "objects": {
            "europe": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "arcs": [[0]], "properties": { "NAME": "Squareland" } },
                    { "type": "Polygon", "arcs": [[1]], "properties": { "NAME": "Eastland" } }
                ]
            }
        },
        "arcs": [
            [[0, 40], [10, 40], [10, 50], [0, 50], [0, 40]],
            [[20, 40], [25, 40], [25, 45], [20, 45], [20, 40]]
        ]
    }"#;

    #[test]
    fn test_topology_object_decoded() {
        let countries = parse_countries(TOPOLOGY, "europe").unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[0].name, "Squareland");
        assert_eq!(countries[0].bounds, [[0.0, 40.0], [10.0, 50.0]]);
        assert!(countries[0].contains(5.0, 45.0));
        assert!(countries[1].contains(22.0, 42.0));
        assert!(!countries[1].contains(5.0, 45.0));
    }
}
