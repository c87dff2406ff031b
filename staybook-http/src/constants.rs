//! Endpoint paths of the booking API, relative to its base URL.

/// Pre-book (price re-validation) endpoint.
pub const PREBOOK_PATH: &str = "./prebook";

/// Booking initialization endpoint.
pub const INITIALIZE_PATH: &str = "./booking/initialize";

/// Booking finalization endpoint.
pub const FINISH_PATH: &str = "./booking/finish";
