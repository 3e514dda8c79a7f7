use crate::map::{BaseLayers, Lod};
use anyhow::Result;
use geojson::{GeoJson, Geometry, Value};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;

/// Which base layer a GeoJSON file feeds
#[derive(Clone, Copy)]
enum LayerKind {
    Coastline(Lod),
    Border(Lod),
}

/// Natural Earth files picked up from the data directory
const BASE_FILES: [(&str, LayerKind); 5] = [
    ("ne_110m_coastline.json", LayerKind::Coastline(Lod::Low)),
    ("ne_50m_coastline.json", LayerKind::Coastline(Lod::Medium)),
    ("ne_10m_coastline.json", LayerKind::Coastline(Lod::High)),
    ("ne_50m_borders.json", LayerKind::Border(Lod::Medium)),
    ("ne_10m_borders.json", LayerKind::Border(Lod::High)),
];

/// Load every available base layer file in parallel.
/// Falls back to a built-in outline of Europe when nothing usable is found.
pub fn load_base_layers(data_dir: &Path) -> BaseLayers {
    let present: Vec<(PathBuf, LayerKind)> = BASE_FILES
        .iter()
        .map(|(name, kind)| (data_dir.join(name), *kind))
        .filter(|(path, _)| path.exists())
        .collect();

    let loaded: Vec<BaseLayers> = present
        .par_iter()
        .filter_map(|(path, kind)| match load_file(path, *kind) {
            Ok(layers) => {
                tracing::debug!(path = %path.display(), "loaded base layer");
                Some(layers)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load base layer");
                None
            }
        })
        .collect();

    let mut layers = BaseLayers::new();
    for part in loaded {
        layers.extend(part);
    }

    if !layers.has_data() {
        tracing::info!(dir = %data_dir.display(), "no base map data found, using built-in outline");
        add_simple_europe(&mut layers);
    }

    layers
}

/// Load base layers on a blocking task; the receiver resolves once they are ready
pub fn spawn_base_layer_load(data_dir: PathBuf) -> oneshot::Receiver<BaseLayers> {
    let (tx, rx) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        let layers = load_base_layers(&data_dir);
        // Receiver gone means the map already gave up waiting
        let _ = tx.send(layers);
    });
    rx
}

fn load_file(path: &Path, kind: LayerKind) -> Result<BaseLayers> {
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;

    let mut layers = BaseLayers::new();
    process_geojson_lines(&geojson, |line| match kind {
        LayerKind::Coastline(lod) => layers.add_coastline(line, lod),
        LayerKind::Border(lod) => layers.add_border(line, lod),
    });
    Ok(layers)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    let to_line = |coords: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
    };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Simplified outline of Europe and its neighbours, used when no data files exist
fn add_simple_europe(layers: &mut BaseLayers) {
    // Mainland, from Gibraltar clockwise around the Atlantic and North Sea coasts
    layers.add_coastline(
        vec![
            (-9.5, 36.9), (-9.3, 38.7), (-8.9, 42.0), (-8.0, 43.7), (-1.8, 43.4),
            (-1.2, 46.2), (-4.6, 48.3), (-1.6, 49.6), (1.6, 50.9), (4.2, 51.4),
            (4.8, 53.0), (8.6, 53.9), (8.6, 55.5), (8.1, 56.9), (10.6, 57.7),
            (10.5, 54.4), (14.2, 53.9), (18.6, 54.4), (21.2, 55.2), (21.0, 56.8),
            (24.1, 57.0), (23.4, 59.3), (28.0, 59.5), (25.0, 60.3), (21.4, 60.9),
            (21.6, 63.2), (25.5, 65.0), (22.2, 65.8), (17.8, 62.5), (18.7, 60.1),
            (16.6, 57.1), (14.2, 55.4), (12.7, 56.2), (11.2, 58.9), (10.3, 59.2),
            (8.0, 58.1), (5.6, 58.9), (5.0, 61.6), (7.0, 62.9), (11.0, 64.5),
            (14.4, 67.3), (17.6, 69.3), (23.6, 70.6), (28.5, 71.1), (31.0, 70.0),
        ],
        Lod::Low,
    );

    // Mediterranean coast, Gibraltar east to the Bosporus
    layers.add_coastline(
        vec![
            (-5.6, 36.0), (-2.1, 36.7), (-0.5, 38.3), (0.2, 40.0), (3.2, 41.9),
            (4.8, 43.4), (7.5, 43.8), (8.9, 44.4), (10.2, 43.0), (12.2, 41.7),
            (14.3, 40.8), (15.7, 40.0), (16.1, 38.0), (17.1, 39.0), (16.9, 40.4),
            (18.5, 40.1), (16.2, 41.9), (13.5, 43.6), (12.3, 45.2), (13.7, 45.7),
            (15.2, 44.2), (19.4, 41.8), (19.3, 40.4), (21.1, 37.8), (22.4, 36.5),
            (23.2, 38.3), (22.9, 40.6), (26.3, 40.9), (29.0, 41.1),
        ],
        Lod::Low,
    );

    // Great Britain
    layers.add_coastline(
        vec![
            (-5.7, 50.1), (-3.5, 50.4), (1.4, 51.2), (1.7, 52.7), (0.2, 53.5),
            (-1.6, 55.6), (-2.0, 57.7), (-3.3, 58.6), (-5.0, 58.6), (-6.2, 56.6),
            (-5.1, 55.0), (-3.0, 54.2), (-3.0, 53.4), (-4.6, 52.8), (-5.3, 51.7),
            (-5.7, 50.1),
        ],
        Lod::Low,
    );

    // Ireland
    layers.add_coastline(
        vec![
            (-6.0, 52.2), (-6.1, 53.5), (-5.9, 55.2), (-7.3, 55.4), (-8.5, 54.5),
            (-10.0, 53.5), (-10.4, 51.9), (-8.3, 51.7), (-6.0, 52.2),
        ],
        Lod::Low,
    );

    // Iceland
    layers.add_coastline(
        vec![
            (-22.0, 64.0), (-24.0, 65.5), (-22.0, 66.4), (-16.0, 66.5),
            (-13.6, 65.1), (-15.0, 64.3), (-18.8, 63.4), (-22.0, 64.0),
        ],
        Lod::Low,
    );

    // Rough national borders between the catalog countries
    layers.add_border(vec![(-1.8, 43.4), (0.7, 42.8), (3.2, 42.4)], Lod::Medium);
    layers.add_border(
        vec![(4.2, 51.4), (6.1, 50.1), (8.2, 49.0), (7.6, 47.6), (6.9, 47.5), (6.0, 46.2), (7.0, 45.9), (7.5, 43.8)],
        Lod::Medium,
    );
    layers.add_border(
        vec![(7.6, 47.6), (10.2, 47.3), (13.0, 47.5), (13.8, 48.8), (12.1, 50.3), (14.8, 51.0), (14.2, 53.9)],
        Lod::Medium,
    );
    layers.add_border(vec![(7.0, 45.9), (10.5, 46.8), (13.7, 46.5), (13.7, 45.7)], Lod::Medium);
    layers.add_border(vec![(12.7, 56.2), (12.3, 61.0), (14.5, 64.0), (18.0, 68.5), (20.6, 69.1)], Lod::Medium);
    layers.add_border(vec![(20.6, 69.1), (23.6, 66.0), (24.1, 65.8)], Lod::Medium);
}
