//! Straight-line distance and transfer-time estimates. The engine never
//! calls an external routing API; haversine distance at a fixed average
//! city speed is the contract for every transfer estimate.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average door-to-door speed assumed for in-city transfers.
pub const AVERAGE_TRANSFER_SPEED_KMH: f64 = 25.0;

pub struct DistanceService;

impl DistanceService {
    /// Great-circle distance between two (lat, lng) points in kilometers.
    pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let lat1_rad = from.0.to_radians();
        let lat2_rad = to.0.to_radians();
        let delta_lat = (to.0 - from.0).to_radians();
        let delta_lon = (to.1 - from.1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Estimated transfer minutes between two points, rounded to the nearest
    /// whole minute.
    pub fn transfer_minutes(from: (f64, f64), to: (f64, f64)) -> u32 {
        let km = Self::haversine_km(from, to);
        ((km / AVERAGE_TRANSFER_SPEED_KMH) * 60.0).round() as u32
    }
}
