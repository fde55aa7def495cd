//! Public parcel-locker point list (`points.json`)
//!
//! The public dump uses single-letter keys to keep the file small.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of the public list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelLockerListResponse {
    /// Generation timestamp of the dump
    pub date: String,
    /// 1-based page number
    pub page: u32,
    /// Page count
    pub total_pages: u32,
    /// Points on this page
    pub items: Vec<ParcelLocker>,
}

/// Point coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LockerCoordinates {
    /// Latitude
    #[serde(rename = "a")]
    pub latitude: f64,
    /// Longitude
    #[serde(rename = "o")]
    pub longitude: f64,
}

/// One point from the public list.
///
/// Keys whose meaning is unknown keep their wire names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelLocker {
    /// Locker code, e.g. `GDA117M`
    #[serde(rename = "n")]
    pub code: String,
    /// Numeric point kind
    #[serde(rename = "t")]
    pub point_type: i64,
    /// Free-text location hint ("Przy sklepie Netto")
    #[serde(rename = "d")]
    pub description: String,
    /// Unknown
    pub m: String,
    /// Unknown; sent as a number or a string
    pub q: Value,
    /// Unknown
    pub f: String,
    /// City
    #[serde(rename = "c")]
    pub city: String,
    /// Municipality (gmina)
    #[serde(rename = "g")]
    pub municipality: String,
    /// Street
    #[serde(rename = "e")]
    pub street: String,
    /// Province, e.g. `pomorskie`
    #[serde(rename = "r")]
    pub province: String,
    /// Postal code, e.g. `80-180`
    #[serde(rename = "o")]
    pub post_code: String,
    /// Building number
    #[serde(rename = "b")]
    pub building_number: String,
    /// Unknown
    pub h: String,
    /// Unknown
    pub i: String,
    /// Coordinates
    #[serde(rename = "l")]
    pub location: LockerCoordinates,
    /// Unknown
    pub p: i64,
    /// Unknown
    pub s: i64,
}
