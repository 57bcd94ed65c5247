//! Hypocenter metadata subrecord (`0xE020`, §4.7). Absent for instant /
//! real-time packets that carry no located event yet.

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::scaled_number::ScaledNumber;
use crate::win32::reader::StreamReader;
use crate::win32::station::GeodeticSystem;

const COORDINATE_NIBBLES: usize = 8;
const DEPTH_NIBBLES: usize = 6;
const MAGNITUDE_NIBBLES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HypocenterType {
    Automatic,
    Reviewed,
    Unknown(u8),
}

impl HypocenterType {
    fn from_code(code: u8) -> Self {
        match code {
            0 => HypocenterType::Automatic,
            1 => HypocenterType::Reviewed,
            other => HypocenterType::Unknown(other),
        }
    }
}

/// Located-event metadata decoded from an `0xE020` info subrecord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypocenterInfo {
    pub origin_time_jst_millis: u64,
    pub latitude: Option<ScaledNumber>,
    pub longitude: Option<ScaledNumber>,
    pub depth: Option<ScaledNumber>,
    pub magnitude: Option<ScaledNumber>,
    pub geodetic_system: GeodeticSystem,
    pub hypocenter_type: HypocenterType,
}

impl HypocenterInfo {
    pub(crate) fn read(reader: &mut StreamReader) -> Result<Self, FormatError> {
        let origin_time_jst_millis = super::time::read_bcd_time_millis(reader)?;

        let lat_field = reader.read_bcd_nibbles(COORDINATE_NIBBLES)?;
        let latitude = super::bcd::decode_scaled_number(&lat_field, 3, false)?
            .map(|sn| rewrap_coordinate(sn, 90.0));

        let lon_field = reader.read_bcd_nibbles(COORDINATE_NIBBLES)?;
        let longitude = super::bcd::decode_scaled_number(&lon_field, 3, false)?
            .map(|sn| rewrap_coordinate(sn, 180.0));

        let depth_field = reader.read_bcd_nibbles(DEPTH_NIBBLES)?;
        let depth = super::bcd::decode_scaled_number(&depth_field, 3, true)?;

        let magnitude_field = reader.read_bcd_nibbles(MAGNITUDE_NIBBLES)?;
        let magnitude = super::bcd::decode_scaled_number(&magnitude_field, 1, false)?;

        let geodetic_system = GeodeticSystem::from_code(reader.read_u8()?);
        let hypocenter_type = HypocenterType::from_code(reader.read_u8()?);

        Ok(Self {
            origin_time_jst_millis,
            latitude,
            longitude,
            depth,
            magnitude,
            geodetic_system,
            hypocenter_type,
        })
    }
}

fn rewrap_coordinate(sn: ScaledNumber, wrap: f64) -> ScaledNumber {
    let adjusted = super::bcd::decode_coordinate(sn.to_f64(), wrap);
    ScaledNumber::new((adjusted * 10f64.powi(-sn.scale)).round() as i32, sn.scale)
}
