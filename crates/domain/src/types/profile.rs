//! User profile (`/izi/app/shopping/v2/profile`)

use serde::{Deserialize, Serialize};

/// Account profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// Name and contact data
    pub personal: Option<ProfilePersonal>,
    /// Saved delivery points and addresses
    pub delivery: Option<ProfileDelivery>,
    /// InPost shopping is enabled for the account
    pub shopping_active: bool,
}

impl UserProfile {
    /// Codes of active delivery points, preferred ones first.
    #[must_use]
    pub fn favorite_locker_codes(&self) -> Vec<String> {
        let Some(points) = self.delivery.as_ref().and_then(|d| d.points.as_ref()) else {
            return Vec::new();
        };

        let mut active: Vec<&ProfileDeliveryPoint> =
            points.items.iter().filter(|p| p.active).collect();
        // Stable: keeps server order within each group.
        active.sort_by_key(|p| !p.preferred);
        active.into_iter().map(|p| p.name.clone()).collect()
    }
}

/// Name and contact data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePersonal {
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Login email
    pub email: Option<String>,
    /// Email confirmed
    pub email_verified: bool,
    /// Phone without prefix
    pub phone_number: Option<String>,
    /// Country prefix
    pub phone_number_prefix: Option<String>,
}

/// Delivery preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDelivery {
    /// Saved lockers
    pub points: Option<ProfileDeliveryPoints>,
    /// Saved home addresses
    pub addresses: Option<ProfileDeliveryAddresses>,
    /// e.g. `PARCEL_LOCKER`
    pub preferred_delivery_type: Option<String>,
}

/// Saved lockers wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDeliveryPoints {
    /// Entries in server order
    pub items: Vec<ProfileDeliveryPoint>,
}

/// Saved parcel locker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDeliveryPoint {
    /// Locker code
    pub name: String,
    #[serde(default = "default_point_type", rename = "type")]
    /// `PL` (parcel locker) unless stated
    pub point_type: String,
    #[serde(default)]
    /// Address as display lines
    pub address_lines: Vec<String>,
    #[serde(default = "default_true")]
    /// Defaults to `true` when absent
    pub active: bool,
    /// Marked as favourite
    #[serde(default)]
    pub preferred: bool,
}

fn default_point_type() -> String {
    "PL".to_string()
}

const fn default_true() -> bool {
    true
}

impl ProfileDeliveryPoint {
    /// Address lines joined with `, `.
    #[must_use]
    pub fn description(&self) -> String {
        self.address_lines.join(", ")
    }
}

/// Saved home addresses wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDeliveryAddresses {
    /// Entries in server order
    pub items: Vec<ProfileDeliveryAddress>,
}

/// Saved home address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDeliveryAddress {
    /// Server-assigned id
    pub id: String,
    /// Recipient and postal details
    #[serde(default)]
    pub data: Option<ProfileDeliveryAddressData>,
}

/// Recipient of a saved address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDeliveryAddressData {
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Postal details
    pub details: Option<ProfileDeliveryAddressDetails>,
}

/// Postal part of a saved address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDeliveryAddressDetails {
    /// Postal code
    pub post_code: Option<String>,
    /// City
    pub city: Option<String>,
    /// Street
    pub street: Option<String>,
    /// Building number
    pub building: Option<String>,
    /// Flat number
    pub flat: Option<String>,
    /// Country code
    pub country_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn favorite_lockers_preferred_first_active_only() {
        let profile: UserProfile = serde_json::from_value(json!({
            "personal": {"firstName": "Mykola", "emailVerified": true},
            "delivery": {
                "points": {"items": [
                    {"name": "GDA145M", "addressLines": ["Rakoczego 13", "80-288 Gdańsk"], "active": true},
                    {"name": "GDA03B", "active": false},
                    {"name": "GDA117M", "active": true, "preferred": true}
                ]},
                "preferredDeliveryType": "BOX_MACHINE"
            },
            "shoppingActive": true
        }))
        .expect("profile");

        assert!(profile.shopping_active);
        assert_eq!(profile.personal.as_ref().and_then(|p| p.first_name.as_deref()), Some("Mykola"));
        assert_eq!(profile.favorite_locker_codes(), vec!["GDA117M", "GDA145M"]);

        let points = &profile.delivery.as_ref().and_then(|d| d.points.as_ref()).expect("points").items;
        assert_eq!(points[0].description(), "Rakoczego 13, 80-288 Gdańsk");
        assert_eq!(points[0].point_type, "PL");
    }

    #[test]
    fn empty_profile_has_no_favorites() {
        assert!(UserProfile::default().favorite_locker_codes().is_empty());
    }
}
