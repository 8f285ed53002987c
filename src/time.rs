//! Epoch-timestamp conversion for API responses.
//!
//! Date fields arrive on the wire as numeric epoch-seconds. Each response
//! struct pairs the raw number with a derived [`DateTime<Utc>`] populated
//! after decode; the conversion here is the single definition of that
//! derivation.

use chrono::{DateTime, Utc};


/// Converts epoch seconds to a UTC instant.
///
/// Fractional seconds are narrowed to an integer (truncated toward zero),
/// never rounded. Values outside the representable range collapse to the
/// Unix epoch.
pub(crate) fn epoch_to_utc(epoch: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch as i64, 0).unwrap_or_default()
}
