//! Provider constants
//!
//! Endpoints, client identity and status sets for the InPost mobile API.
//! Base URLs here are defaults; [`crate::Config`] can override them.

// OAuth / onboarding (account service)
pub const OAUTH_BASE_URL: &str = "https://account.inpost-group.com";
pub const OAUTH_CLIENT_ID: &str = "inpost-mobile";
pub const OAUTH_REDIRECT_URI: &str = "https://account.inpost-group.com/callback";
pub const OAUTH_SCOPE: &str = "openid";
pub const OAUTH_THEME: &str = "light";
pub const AUTHORIZE_PATH: &str = "/oauth2/authorize";
pub const ONBOARDING_STEPS_PATH: &str = "/api/auth/onboarding/steps";
pub const ONBOARDING_PHONE_NUMBER_PATH: &str = "/api/auth/onboarding/steps/phoneNumber";
pub const ONBOARDING_PHONE_CODE_PATH: &str = "/api/auth/onboarding/steps/phoneVerificationCode";
pub const ONBOARDING_EMAIL_PATH: &str =
    "/api/auth/onboarding/steps/sendAuthenticationCodeToExistingEmail";

// Cookies and headers used during onboarding
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

// Mobile API
pub const API_BASE_URL: &str = "https://api-inmobile-pl.easypack24.net";
pub const TOKEN_PATH: &str = "/global/oauth2/token";
pub const TRACKED_PARCELS_PATH: &str = "/v4/parcels/tracked";
pub const PROFILE_PATH: &str = "/izi/app/shopping/v2/profile";

// Public locker list (no credentials)
pub const PARCEL_LOCKERS_URL: &str = "https://inpost.pl/sites/default/files/points.json";

// User agents
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 18_7 like Mac OS X) \
                                      AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
pub const API_USER_AGENT: &str = "InPost-Mobile/4.4.2 (1)-release (iOS 26.2; iPhone15,3; pl)";

// Timeouts and refresh window
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REFRESH_BUFFER_SECS: i64 = 600;
pub const DEFAULT_EMAIL_POLL_INTERVAL_SECS: f64 = 2.0;
pub const DEFAULT_EMAIL_CONFIRMATION_TIMEOUT_SECS: f64 = 300.0;
pub const DEFAULT_LANGUAGE: &str = "pl";

// Parcel statuses
pub const STATUS_READY_TO_PICKUP: &str = "READY_TO_PICKUP";
pub const STATUS_DELIVERED: &str = "DELIVERED";

/// Statuses counted as "on the way".
pub const EN_ROUTE_STATUSES: &[&str] = &[
    "OUT_FOR_DELIVERY",
    "ADOPTED_AT_SOURCE_BRANCH",
    "SENT_FROM_SOURCE_BRANCH",
    "TAKEN_BY_COURIER",
    "CONFIRMED",
    "DISPATCHED_BY_SENDER",
];

/// Group key for parcels without a pickup point.
pub const COURIER_GROUP: &str = "COURIER";
