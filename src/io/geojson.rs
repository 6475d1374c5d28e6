use geo::{LineString, Polygon};
use serde_json::{json, Map, Value};

use crate::service::OutlookSnapshot;
use crate::types::Hazard;

/// Export the categorical regions of a snapshot as a GeoJSON
/// FeatureCollection, highest tier first.
pub fn snapshot_to_geojson(snapshot: &OutlookSnapshot) -> Value {
    feature_collection(region_features(snapshot))
}

/// Like `snapshot_to_geojson`, followed by every tier-tagged hazard polygon
/// (`layer` = hazard name).
pub fn snapshot_to_geojson_with_hazards(snapshot: &OutlookSnapshot) -> Value {
    let mut features = region_features(snapshot);
    for hazard in Hazard::all() {
        for tiered in snapshot.hazard(hazard) {
            features.push(json!({
                "type": "Feature",
                "id": format!("{hazard}-{}", tiered.area),
                "geometry": polygon_to_geojson(&tiered.polygon),
                "properties": {
                    "layer": hazard.to_str(),
                    "area": tiered.area,
                    "probability": tiered.probability,
                    "tier": tiered.tier,
                    "generation": snapshot.generation(),
                },
            }));
        }
    }
    feature_collection(features)
}

fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn region_features(snapshot: &OutlookSnapshot) -> Vec<Value> {
    snapshot.regions().iter().enumerate()
        .map(|(i, region)| {
            let mut properties = Map::new();
            properties.insert("layer".to_string(), json!("categorical"));
            properties.insert("tier".to_string(), json!(region.tier));
            properties.insert("level".to_string(), json!(region.tier.level()));
            properties.insert("generation".to_string(), json!(snapshot.generation()));
            properties.insert("provenance".to_string(), json!(region.provenance));

            let geometry = match region.geometry.0.as_slice() {
                [polygon] => polygon_to_geojson(polygon),
                polygons => json!({
                    "type": "MultiPolygon",
                    "coordinates": polygons.iter().map(polygon_coordinates).collect::<Vec<_>>(),
                }),
            };

            json!({
                "type": "Feature",
                "id": i,
                "geometry": geometry,
                "properties": properties,
            })
        })
        .collect()
}

/// GeoJSON `Polygon` geometry object.
pub fn polygon_to_geojson(polygon: &Polygon<f64>) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": polygon_coordinates(polygon),
    })
}

fn polygon_coordinates(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    let ring = |ls: &LineString<f64>| ls.coords().map(|c| [c.x, c.y]).collect::<Vec<_>>();
    std::iter::once(ring(polygon.exterior()))
        .chain(polygon.interiors().iter().map(ring))
        .collect()
}
