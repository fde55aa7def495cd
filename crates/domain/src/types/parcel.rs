//! Tracked parcels and their per-status aggregation
//!
//! Wire types mirror `/v4/parcels/tracked` (camelCase JSON). Unknown fields
//! are ignored and most fields are optional; the provider omits them freely.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{COURIER_GROUP, EN_ROUTE_STATUSES, STATUS_DELIVERED, STATUS_READY_TO_PICKUP};

/// Response of the tracked parcels endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackedParcelsResponse {
    /// More pages are available.
    pub more: bool,
    /// Server timestamp the list is current up to.
    pub updated_until: Option<String>,
    /// Parcels on this page
    pub parcels: Vec<ApiParcel>,
}

/// WGS84 coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLocation {
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
}

/// Postal address of a pickup point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiAddressDetails {
    /// Postal code
    pub post_code: Option<String>,
    /// City
    pub city: Option<String>,
    /// Province
    pub province: Option<String>,
    /// Street
    pub street: Option<String>,
    /// Building number
    pub building_number: Option<String>,
    /// Country code
    pub country: Option<String>,
}

impl ApiAddressDetails {
    /// `"{street} {building}, {post_code} {city}"`, skipping missing parts.
    #[must_use]
    pub fn formatted(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(street) = &self.street {
            match &self.building_number {
                Some(building) => parts.push(format!("{street} {building}")),
                None => parts.push(street.clone()),
            }
        }
        if let Some(city) = &self.city {
            match &self.post_code {
                Some(post_code) => parts.push(format!("{post_code} {city}")),
                None => parts.push(city.clone()),
            }
        }
        parts.join(", ")
    }
}

/// Locker or point where a parcel waits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiPickUpPoint {
    /// Point code, e.g. `GDA117M`
    pub name: String,
    /// Coordinates
    pub location: Option<ApiLocation>,
    /// Free-text location hint
    pub location_description: Option<String>,
    /// Opening hours
    pub opening_hours: Option<String>,
    /// Postal address
    pub address_details: Option<ApiAddressDetails>,
    /// Photo of the point
    pub image_url: Option<String>,
    /// Provider point type
    pub point_type: Option<String>,
    /// Low-placed compartments available
    pub easy_access_zone: bool,
    /// Point kinds, e.g. `parcel_locker`.
    #[serde(rename = "type")]
    pub types: Option<Vec<String>>,
}

impl ApiPickUpPoint {
    /// The point is an automated parcel locker.
    #[must_use]
    pub fn is_parcel_locker(&self) -> bool {
        self.types.as_ref().is_some_and(|types| types.iter().any(|t| t == "parcel_locker"))
    }
}

/// CO2 estimates in kg. The provider sends them as strings or numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiCarbonFootprint {
    /// Delivery to a parcel locker
    pub box_machine_delivery: Option<Value>,
    /// Courier delivery to an address
    pub address_delivery: Option<Value>,
    /// Saving when switching to a locker, percent
    pub change_delivery_type_percent: Option<Value>,
    /// Saving when switching to a locker, kg
    pub change_delivery_type_value: Option<Value>,
    /// Details page
    pub redirection_url: Option<String>,
}

/// Phone number split into country prefix and number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPhoneNumber {
    /// Country prefix, e.g. `+48`
    pub prefix: String,
    /// Number without prefix
    pub value: String,
}

/// Parcel receiver as reported by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiReceiver {
    /// Receiver name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Receiver phone
    pub phone_number: Option<ApiPhoneNumber>,
}

/// Parcel sender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSender {
    /// Display name of the shipper.
    pub name: Option<String>,
}

/// One tracked parcel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiParcel {
    /// Tracking number
    pub shipment_number: String,
    /// Raw provider status, e.g. `READY_TO_PICKUP`
    pub status: String,
    /// `parcel` unless stated
    #[serde(default = "default_shipment_type")]
    pub shipment_type: String,
    /// Locker open code
    #[serde(default)]
    pub open_code: Option<String>,
    /// QR payload for opening
    #[serde(default)]
    pub qr_code: Option<String>,
    /// When the parcel reached the point
    #[serde(default)]
    pub stored_date: Option<String>,
    /// When the parcel was collected
    #[serde(default)]
    pub pick_up_date: Option<String>,
    /// Destination point
    #[serde(default)]
    pub pick_up_point: Option<ApiPickUpPoint>,
    /// Provider status group
    #[serde(default)]
    pub status_group: Option<String>,
    /// Size class (A, B, C)
    #[serde(default)]
    pub parcel_size: Option<String>,
    /// Receiver
    #[serde(default)]
    pub receiver: Option<ApiReceiver>,
    /// Sender
    #[serde(default)]
    pub sender: Option<ApiSender>,
    /// `OWN` or `FRIEND`
    #[serde(default)]
    pub ownership_status: Option<String>,
    /// CO2 estimates
    #[serde(default)]
    pub carbon_footprint: Option<ApiCarbonFootprint>,
}

fn default_shipment_type() -> String {
    "parcel".to_string()
}

/// Polish description of a parcel status; unknown statuses map to themselves.
#[must_use]
pub fn status_description(status: &str) -> &str {
    match status {
        "READY_TO_PICKUP" => "Gotowa do odbioru",
        "DELIVERED" => "Doręczona",
        "OUT_FOR_DELIVERY" => "Wydana do doręczenia",
        "ADOPTED_AT_SOURCE_BRANCH" => "Przyjęta w Centrum Logistycznym",
        "SENT_FROM_SOURCE_BRANCH" => "W trasie",
        "TAKEN_BY_COURIER" => "Odebrana przez Kuriera",
        "CONFIRMED" => "Przesyłka utworzona",
        "DISPATCHED_BY_SENDER" => "Nadana",
        "PICKUP_REMINDER_SENT" => "Przypomnienie o odbiorze",
        other => other,
    }
}

impl ApiParcel {
    /// Minimal parcel, mostly for tests and fixtures.
    #[must_use]
    pub fn new(shipment_number: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            shipment_number: shipment_number.into(),
            status: status.into(),
            shipment_type: default_shipment_type(),
            open_code: None,
            qr_code: None,
            stored_date: None,
            pick_up_date: None,
            pick_up_point: None,
            status_group: None,
            parcel_size: None,
            receiver: None,
            sender: None,
            ownership_status: None,
            carbon_footprint: None,
        }
    }

    /// Pickup point name, used as the grouping key.
    #[must_use]
    pub fn locker_id(&self) -> Option<&str> {
        self.pick_up_point.as_ref().map(|p| p.name.as_str())
    }

    /// Receiver phone with prefix, e.g. `+48123456789`.
    #[must_use]
    pub fn phone(&self) -> Option<String> {
        let phone = self.receiver.as_ref()?.phone_number.as_ref()?;
        Some(format!("{}{}", phone.prefix, phone.value))
    }

    /// Polish description of `status`.
    #[must_use]
    pub fn status_description(&self) -> &str {
        status_description(&self.status)
    }

    /// CO2 in kg for the way this parcel was actually delivered.
    #[must_use]
    pub fn effective_carbon_footprint(&self) -> Option<f64> {
        let footprint = self.carbon_footprint.as_ref()?;
        let value = if self.pick_up_point.as_ref().is_some_and(ApiPickUpPoint::is_parcel_locker) {
            footprint.box_machine_delivery.as_ref()
        } else {
            footprint.address_delivery.as_ref()
        };
        value.and_then(value_as_f64)
    }

    /// Calendar day of the pick-up.
    ///
    /// Accepts RFC 3339, ISO 8601 without an offset (`T` or space
    /// separated) and bare `YYYY-MM-DD` dates.
    #[must_use]
    pub fn pick_up_day(&self) -> Option<NaiveDate> {
        let raw = self.pick_up_date.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|dt| dt.date())
            .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
    }

    /// Compact form used inside a [`Locker`] group.
    #[must_use]
    pub fn to_parcel_item(&self) -> ParcelItem {
        ParcelItem {
            id: self.shipment_number.clone(),
            phone: self.phone(),
            code: self.open_code.clone(),
            status: self.status.clone(),
            status_desc: self.status_description().to_string(),
        }
    }

    /// Flattened form with the pickup point address spelled out.
    #[must_use]
    pub fn to_parcel_list_item(&self) -> ParcelListItem {
        let point = self.pick_up_point.as_ref();
        let address = point.and_then(|p| p.address_details.as_ref());

        ParcelListItem {
            shipment_number: self.shipment_number.clone(),
            sender_name: self.sender.as_ref().and_then(|s| s.name.clone()),
            status: self.status.clone(),
            status_description: self.status_description().to_string(),
            shipment_type: self.shipment_type.clone(),
            parcel_size: self.parcel_size.clone(),
            ownership_status: self.ownership_status.clone(),
            phone_number: self.phone(),
            pickup_point_name: point.map(|p| p.name.clone()),
            pickup_point_address: address.map(ApiAddressDetails::formatted),
            pickup_point_description: point.and_then(|p| p.location_description.clone()),
            pickup_point_city: address.and_then(|a| a.city.clone()),
            pickup_point_street: address.and_then(|a| a.street.clone()),
            pickup_point_building: address.and_then(|a| a.building_number.clone()),
            pickup_point_post_code: address.and_then(|a| a.post_code.clone()),
            open_code: self.open_code.clone(),
            qr_code: self.qr_code.clone(),
            stored_date: self.stored_date.clone(),
        }
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parcel as shown inside a locker group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParcelItem {
    /// Shipment number
    pub id: String,
    /// Receiver phone with prefix
    pub phone: Option<String>,
    /// Locker open code
    pub code: Option<String>,
    /// Raw provider status
    pub status: String,
    /// Human-readable status
    pub status_desc: String,
}

/// Parcels grouped under one pickup point (or [`COURIER_GROUP`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locker {
    /// Pickup point name or [`COURIER_GROUP`]
    pub locker_id: String,
    /// Number of parcels in the group
    pub count: usize,
    /// Parcels in input order
    pub parcels: Vec<ParcelItem>,
}

/// Flat parcel entry for list displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParcelListItem {
    /// Tracking number
    pub shipment_number: String,
    /// Sender display name
    pub sender_name: Option<String>,
    /// Raw provider status
    pub status: String,
    /// Human-readable status
    pub status_description: String,
    /// Shipment type
    pub shipment_type: String,
    /// Size class
    pub parcel_size: Option<String>,
    /// `OWN` or `FRIEND`
    pub ownership_status: Option<String>,
    /// Receiver phone with prefix
    pub phone_number: Option<String>,
    /// Pickup point code
    pub pickup_point_name: Option<String>,
    /// Formatted pickup point address
    pub pickup_point_address: Option<String>,
    /// Pickup point location hint
    pub pickup_point_description: Option<String>,
    /// Pickup point city
    pub pickup_point_city: Option<String>,
    /// Pickup point street
    pub pickup_point_street: Option<String>,
    /// Pickup point building number
    pub pickup_point_building: Option<String>,
    /// Pickup point postal code
    pub pickup_point_post_code: Option<String>,
    /// Locker open code
    pub open_code: Option<String>,
    /// QR payload for opening
    pub qr_code: Option<String>,
    /// When the parcel reached the point
    pub stored_date: Option<String>,
}

/// CO2 total for one pick-up day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCarbonFootprint {
    /// `YYYY-MM-DD`
    pub date: String,
    /// kg of CO2
    pub value: f64,
    /// Parcels picked up that day
    pub parcel_count: usize,
}

/// CO2 totals over delivered parcels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonFootprintStats {
    /// Sum over all counted parcels
    pub total_co2_kg: f64,
    /// Delivered parcels carrying a footprint
    pub total_parcels: usize,
    /// Oldest day first
    pub daily_data: Vec<DailyCarbonFootprint>,
}

impl CarbonFootprintStats {
    /// Aggregate delivered parcels; `None` when none carries a footprint.
    #[must_use]
    pub fn from_parcels(parcels: &[ApiParcel]) -> Option<Self> {
        let mut total_co2_kg = 0.0;
        let mut total_parcels = 0;
        let mut per_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

        for parcel in parcels.iter().filter(|p| p.status == STATUS_DELIVERED) {
            let Some(value) = parcel.effective_carbon_footprint() else {
                continue;
            };
            total_co2_kg += value;
            total_parcels += 1;
            if let Some(day) = parcel.pick_up_day() {
                let entry = per_day.entry(day).or_default();
                entry.0 += value;
                entry.1 += 1;
            }
        }

        (total_parcels > 0).then(|| Self {
            total_co2_kg,
            total_parcels,
            daily_data: per_day
                .into_iter()
                .map(|(day, (value, parcel_count))| DailyCarbonFootprint {
                    date: day.format("%Y-%m-%d").to_string(),
                    value,
                    parcel_count,
                })
                .collect(),
        })
    }

    /// [`Self::total_co2_kg`] in grams.
    #[must_use]
    pub fn total_co2_grams(&self) -> f64 {
        self.total_co2_kg * 1000.0
    }
}

/// Parcels grouped by what the user has to do about them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelsSummary {
    /// Every parcel, whatever its status
    pub all_count: usize,
    /// Parcels waiting in a locker
    pub ready_for_pickup_count: usize,
    /// Parcels still travelling
    pub en_route_count: usize,
    /// Ready parcels keyed by pickup point
    pub ready_for_pickup: BTreeMap<String, Locker>,
    /// En-route parcels keyed by pickup point
    pub en_route: BTreeMap<String, Locker>,
    /// CO2 over delivered parcels, if any carries a footprint
    pub carbon_footprint_stats: Option<CarbonFootprintStats>,
    /// Ready parcels in input order
    pub ready_for_pickup_list: Vec<ParcelListItem>,
    /// En-route parcels in input order
    pub en_route_list: Vec<ParcelListItem>,
}

impl ParcelsSummary {
    /// Group parcels by status.
    ///
    /// `READY_TO_PICKUP` and en-route parcels are grouped by pickup point
    /// name ([`COURIER_GROUP`] when there is none). Any other status only
    /// counts toward `all_count`.
    #[must_use]
    pub fn from_parcels(parcels: &[ApiParcel]) -> Self {
        let mut ready_for_pickup = BTreeMap::new();
        let mut en_route = BTreeMap::new();
        let mut ready_for_pickup_list = Vec::new();
        let mut en_route_list = Vec::new();

        for parcel in parcels {
            let (groups, list) = if parcel.status == STATUS_READY_TO_PICKUP {
                (&mut ready_for_pickup, &mut ready_for_pickup_list)
            } else if EN_ROUTE_STATUSES.contains(&parcel.status.as_str()) {
                (&mut en_route, &mut en_route_list)
            } else {
                continue;
            };

            let locker_id = parcel.locker_id().unwrap_or(COURIER_GROUP).to_string();
            let locker = groups.entry(locker_id.clone()).or_insert_with(|| Locker {
                locker_id,
                count: 0,
                parcels: Vec::new(),
            });
            locker.count += 1;
            locker.parcels.push(parcel.to_parcel_item());
            list.push(parcel.to_parcel_list_item());
        }

        Self {
            all_count: parcels.len(),
            ready_for_pickup_count: ready_for_pickup_list.len(),
            en_route_count: en_route_list.len(),
            ready_for_pickup,
            en_route,
            carbon_footprint_stats: CarbonFootprintStats::from_parcels(parcels),
            ready_for_pickup_list,
            en_route_list,
        }
    }
}
