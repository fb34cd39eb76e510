use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::flows::not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportType {
    TwoWheeler,
    AutoRickshaw,
    TaxiCab,
    Train,
    Flight,
}

/// Pricing for one transport mode.
#[derive(Debug, Clone, Copy)]
pub struct FareTable {
    pub base_fare: u32,
    pub per_km_rate: u32,
    pub long_distance: bool,
}

impl FareTable {
    /// Base fare plus the per-km charge, capped at `u32::MAX`.
    pub fn fare_for(&self, distance_km: u32) -> u32 {
        self.base_fare
            .saturating_add(distance_km.saturating_mul(self.per_km_rate))
    }
}

impl TransportType {
    pub fn fare_table(&self) -> FareTable {
        let (base_fare, per_km_rate, long_distance) = match self {
            TransportType::TwoWheeler => (15, 8, false),
            TransportType::AutoRickshaw => (25, 12, false),
            TransportType::TaxiCab => (50, 18, false),
            TransportType::Train => (100, 2, true),
            TransportType::Flight => (2000, 5, true),
        };
        FareTable {
            base_fare,
            per_km_rate,
            long_distance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FareRequest {
    pub transport_type: TransportType,
    #[validate(custom(function = "not_blank"))]
    pub start_location: String,
    #[validate(custom(function = "not_blank"))]
    pub end_location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareEstimate {
    pub transport_type: TransportType,
    pub distance_km: u32,
    pub estimated_fare: u32,
}

// Lengths and the leading unit are counted in UTF-16, the way browser input
// fields report them, so estimates match the web client for non-ASCII names.
fn utf16_len(s: &str) -> u32 {
    u32::try_from(s.encode_utf16().count()).unwrap_or(u32::MAX)
}

fn leading_unit(s: &str) -> u32 {
    s.encode_utf16().next().map_or(0, u32::from)
}

/// Mock distance from the location names alone. There is no geocoding; this
/// only has to be stable for the same inputs.
pub fn estimate_distance_km(start: &str, end: &str, long_distance: bool) -> u32 {
    distance_from_units(
        utf16_len(start),
        utf16_len(end),
        leading_unit(start),
        leading_unit(end),
        long_distance,
    )
}

// Saturates instead of wrapping so absurdly long names cannot overflow.
fn distance_from_units(
    start_len: u32,
    end_len: u32,
    start_unit: u32,
    end_unit: u32,
    long_distance: bool,
) -> u32 {
    let distance = if long_distance {
        let spread = start_len.abs_diff(end_len).saturating_mul(50);
        let initials = (start_unit % 10 + end_unit % 10) * 20;
        spread.saturating_add(200).saturating_add(initials)
    } else {
        start_len.saturating_add(end_len) % 20 + 5
    };
    distance.max(1)
}

pub fn estimate_fare(request: &FareRequest) -> Result<FareEstimate, String> {
    request.validate().map_err(|e| e.to_string())?;
    let table = request.transport_type.fare_table();
    let distance_km = estimate_distance_km(
        &request.start_location,
        &request.end_location,
        table.long_distance,
    );
    Ok(FareEstimate {
        transport_type: request.transport_type,
        distance_km,
        estimated_fare: table.fare_for(distance_km),
    })
}
