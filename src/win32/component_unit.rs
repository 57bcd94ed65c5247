//! Packed component-unit byte (§3).

/// The physical unit a [`crate::win32::station::StationComponent`] measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnitType {
    None,
    Meters,
    MetersPerSecond,
    MetersPerSecondSquared,
}

impl UnitType {
    fn from_code(code: u8) -> Self {
        match code {
            1 => UnitType::Meters,
            2 => UnitType::MetersPerSecond,
            3 => UnitType::MetersPerSecondSquared,
            _ => UnitType::None,
        }
    }

    fn code(self) -> u8 {
        match self {
            UnitType::None => 0,
            UnitType::Meters => 1,
            UnitType::MetersPerSecond => 2,
            UnitType::MetersPerSecondSquared => 3,
        }
    }
}

/// A single packed byte: high nibble is a decimal scale exponent (`0..15`),
/// low nibble is the [`UnitType`] code. Physical scale factor is
/// `10^(-scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ComponentUnit {
    pub scale: u8,
    pub unit_type: UnitType,
}

impl ComponentUnit {
    pub fn from_byte(byte: u8) -> Self {
        Self { scale: byte >> 4, unit_type: UnitType::from_code(byte & 0x0F) }
    }

    pub fn to_byte(self) -> u8 {
        (self.scale << 4) | self.unit_type.code()
    }

    pub fn scale_factor(self) -> f64 {
        10f64.powi(-(self.scale as i32))
    }
}
