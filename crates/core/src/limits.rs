//! Fixed constants and field limits for the attendance engine.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

// === Token Rotation ===

/// Lifetime of a QR token and the cadence at which a new one is issued (2s).
pub const ROTATION_INTERVAL_MS: u64 = 2_000;

/// Longest configurable rotation interval (1 minute).
pub const MAX_ROTATION_INTERVAL_MS: u64 = 60_000;

/// Bytes of OS randomness in each token string (128 bits).
pub const TOKEN_RANDOM_BYTES: usize = 16;

/// Attempts to mint a token whose string is not already in the store.
pub const TOKEN_ISSUE_ATTEMPTS: usize = 3;

/// Pattern every issued token string matches.
pub const TOKEN_PATTERN: &str = r"^qr_[0-9]+_[0-9a-f]{32}$";

// === Geofence ===

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Inside/outside threshold around the campus center, in meters.
pub const GEOFENCE_RADIUS_METERS: f64 = 1_000.0;

/// Campus center latitude (decimal degrees).
pub const CAMPUS_CENTER_LATITUDE: f64 = 12.9716;

/// Campus center longitude (decimal degrees).
pub const CAMPUS_CENTER_LONGITUDE: f64 = 77.5946;

// === String Field Limits (chars) ===

/// Student and faculty identifier max length.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Identifier charset: letters, digits, and `_ . @ -`.
pub const IDENTIFIER_PATTERN: &str = r"^[A-Za-z0-9_.@-]+$";

/// Token string max length accepted from clients.
pub const MAX_TOKEN_LEN: usize = 128;

/// Subject name max length.
pub const MAX_SUBJECT_LEN: usize = 128;

/// Branch name max length.
pub const MAX_BRANCH_LEN: usize = 64;

// === Session Bounds ===

/// Highest semester number accepted.
pub const MAX_SEMESTER: u32 = 12;
