use crate::data_models::{Coordinates, PropertyRecord, RankedCandidate};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Orders candidates by distance from `centroid`. Candidates without
/// coordinates follow all located ones in their incoming order. Without a
/// centroid the incoming order is kept and no distance is reported.
pub fn rank_by_distance(
    candidates: Vec<PropertyRecord>,
    centroid: Option<Coordinates>,
) -> Vec<RankedCandidate> {
    let Some(centroid) = centroid else {
        return candidates
            .into_iter()
            .map(|property| RankedCandidate {
                property,
                distance_km: None,
            })
            .collect();
    };

    let (mut located, unlocated): (Vec<RankedCandidate>, Vec<RankedCandidate>) = candidates
        .into_iter()
        .map(|property| RankedCandidate {
            distance_km: property.coordinates.map(|c| haversine_km(centroid, c)),
            property,
        })
        .partition(|candidate| candidate.distance_km.is_some());

    // Stable: equidistant listings keep their baseline order.
    located.sort_by(|a, b| {
        let a = a.distance_km.unwrap_or(f64::INFINITY);
        let b = b.distance_km.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    located.extend(unlocated);
    located
}
