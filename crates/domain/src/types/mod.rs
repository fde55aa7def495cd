//! Domain types for the InPost mobile API

pub mod locker;
pub mod parcel;
pub mod profile;

pub use locker::{LockerCoordinates, ParcelLocker, ParcelLockerListResponse};
pub use parcel::{
    status_description, ApiParcel, ApiPickUpPoint, CarbonFootprintStats, DailyCarbonFootprint,
    Locker, ParcelItem, ParcelListItem, ParcelsSummary, TrackedParcelsResponse,
};
pub use profile::{ProfileDeliveryPoint, UserProfile};
