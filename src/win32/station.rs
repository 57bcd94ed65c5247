//! Station metadata subrecords (`0xE000`/`0xE001`, §4.7) and the per-channel
//! calibration records embedded inside them (§3).

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::scaled_number::ScaledNumber;
use crate::win32::bcd::decode_coordinate;
use crate::win32::component_unit::ComponentUnit;
use crate::win32::reader::StreamReader;
use crate::win32::time::read_bcd_time_millis;

/// One sensor channel's calibration record. `to_physical` is the only
/// operation external callers need; the rest documents the record the
/// decoder read it from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationComponent {
    pub organization: u8,
    pub network: u8,
    pub channel_id: u16,
    pub scale_numerator: i16,
    pub gain: u8,
    pub unit: ComponentUnit,
    pub scale_denominator: i32,
    pub offset: i32,
    pub measurement_range: i32,
}

impl StationComponent {
    /// `scaleNumerator / scaleDenominator * (d - offset) / gain`. Defined
    /// for every `i32 d`; `gain` and `scale_denominator` are guaranteed
    /// nonzero by the decoder that produced this record.
    pub fn to_physical(&self, d: i32) -> f64 {
        (self.scale_numerator as f64 / self.scale_denominator as f64) * (d - self.offset) as f64
            / self.gain as f64
    }

    fn read(reader: &mut StreamReader) -> Result<Self, FormatError> {
        let organization = reader.read_u8()?;
        let network = reader.read_u8()?;
        let channel_id = reader.read_u16()?;
        let unit = ComponentUnit::from_byte(reader.read_u8()?);
        let scale_numerator = reader.read_i16()?;
        let scale_denominator = reader.read_i32()?;
        let gain = reader.read_u8()?;
        let offset = reader.read_i32()?;
        let measurement_range = reader.read_i32()?;

        if gain == 0 {
            return Err(FormatError::InvalidCalibration { field: "gain", value: 0 });
        }
        if scale_denominator == 0 {
            return Err(FormatError::InvalidCalibration { field: "scaleDenominator", value: 0 });
        }

        Ok(Self {
            organization,
            network,
            channel_id,
            scale_numerator,
            gain,
            unit,
            scale_denominator,
            offset,
            measurement_range,
        })
    }
}

/// Geodetic datum a hypocenter or station position is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeodeticSystem {
    Tokyo,
    Wgs84,
    Unknown(u8),
}

impl GeodeticSystem {
    fn from_code(code: u8) -> Self {
        match code {
            0 => GeodeticSystem::Tokyo,
            1 => GeodeticSystem::Wgs84,
            other => GeodeticSystem::Unknown(other),
        }
    }
}

/// Station metadata decoded from an `0xE000`/`0xE001` info subrecord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    pub latitude: Option<ScaledNumber>,
    pub longitude: Option<ScaledNumber>,
    pub altitude: Option<ScaledNumber>,
    pub underground_altitude: Option<ScaledNumber>,
    pub station_code: String,
    pub data_start_time_jst_millis: u64,
    pub measurement_duration_tenths_second: u32,
    pub last_time_fixing_time_jst_millis: u64,
    pub fixing_method: u8,
    pub geodetic_system: GeodeticSystem,
    pub station_type_code: u8,
    pub sample_rate_hz: u16,
    pub component_count: u8,
    pub redeployed: bool,
    pub components: Vec<StationComponent>,
}

const STATION_CODE_LEN: usize = 12;
const COORDINATE_NIBBLES: usize = 8;
const ALTITUDE_NIBBLES: usize = 6;

fn read_coordinate(reader: &mut StreamReader, wrap: f64) -> Result<Option<ScaledNumber>, FormatError> {
    let field = reader.read_bcd_nibbles(COORDINATE_NIBBLES)?;
    let decoded = crate::win32::bcd::decode_scaled_number(&field, 3, false)?;
    Ok(decoded.map(|sn| {
        let adjusted = decode_coordinate(sn.to_f64(), wrap);
        // Re-derive mantissa/scale from the adjusted physical value at the
        // same decimal precision the field was encoded with.
        ScaledNumber::new((adjusted * 10f64.powi(-sn.scale)).round() as i32, sn.scale)
    }))
}

fn read_altitude(reader: &mut StreamReader) -> Result<Option<ScaledNumber>, FormatError> {
    let field = reader.read_bcd_nibbles(ALTITUDE_NIBBLES)?;
    crate::win32::bcd::decode_scaled_number(&field, 3, true)
}

impl StationInfo {
    pub(crate) fn read(reader: &mut StreamReader, has_underground_sensor: bool) -> Result<Self, FormatError> {
        let latitude = read_coordinate(reader, 90.0)?;
        let longitude = read_coordinate(reader, 180.0)?;
        let altitude = read_altitude(reader)?;
        let underground_altitude = if has_underground_sensor { read_altitude(reader)? } else { None };

        let code_bytes = reader.read_bytes(STATION_CODE_LEN)?;
        let station_code = String::from_utf8_lossy(code_bytes).trim_end_matches('\0').to_string();

        let data_start_time_jst_millis = read_bcd_time_millis(reader)?;
        let measurement_duration_tenths_second = reader.read_u32()?;
        let last_time_fixing_time_jst_millis = read_bcd_time_millis(reader)?;
        let fixing_method = reader.read_u8()?;
        let geodetic_system = GeodeticSystem::from_code(reader.read_u8()?);
        let station_type_code = reader.read_u8()?;
        let sample_rate_hz = reader.read_u16()?;
        let component_count = reader.read_u8()?;
        let redeployed = reader.read_u8()? != 0;

        let mut components = Vec::with_capacity(component_count as usize);
        for _ in 0..component_count {
            components.push(StationComponent::read(reader)?);
        }

        Ok(Self {
            latitude,
            longitude,
            altitude,
            underground_altitude,
            station_code,
            data_start_time_jst_millis,
            measurement_duration_tenths_second,
            last_time_fixing_time_jst_millis,
            fixing_method,
            geodetic_system,
            station_type_code,
            sample_rate_hz,
            component_count,
            redeployed,
            components,
        })
    }
}
