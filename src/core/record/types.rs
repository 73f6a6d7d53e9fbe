//! Value groups carried by a picture record.

use serde::{Deserialize, Serialize};

/// Raw pixel dimensions as stored in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// GPS position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsCoord {
    /// Latitude, positive north
    pub lat: f64,
    /// Longitude, positive east
    pub long: f64,
    /// Altitude in meters, negative below sea level
    pub alt: f64,
}

impl GpsCoord {
    pub fn is_set(&self) -> bool {
        self.lat != 0.0 || self.long != 0.0
    }
}

/// Auxiliary GPS data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsMisc {
    /// Bearing of travel
    pub dest_bearing: f64,
    /// `M` magnetic or `T` true north
    pub dest_bearing_ref: String,
    /// Direction the camera was pointing
    pub img_dir: f64,
    /// `M` magnetic or `T` true north
    pub img_dir_ref: String,
    pub speed: f64,
    /// `K` km/h, `M` mph, `N` knots
    pub speed_ref: String,
}

/// Standard exposure settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Exposure {
    /// Exposure time in seconds
    pub time: f64,
    pub f_stop: f64,
    pub iso_speed: f64,
    /// Focal length in millimeters
    pub focal_len: f64,
    /// APEX aperture value
    pub aperture: f64,
}

/// Convert degrees, minutes and seconds to decimal degrees
pub fn dec_deg_from_dms(degs: f64, mins: f64, secs: f64) -> f64 {
    degs + mins / 60.0 + secs / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dms_conversion() {
        assert!((dec_deg_from_dms(40.0, 26.0, 46.0) - 40.446_111).abs() < 1e-5);
        assert_eq!(dec_deg_from_dms(10.0, 0.0, 0.0), 10.0);
    }

    #[test]
    fn zero_size_detection() {
        assert!(PixelSize::default().is_zero());
        assert!(PixelSize::new(0, 10).is_zero());
        assert!(!PixelSize::new(640, 480).is_zero());
    }
}
