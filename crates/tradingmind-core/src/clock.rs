//! Record identity and timestamp helpers.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SubsecRound, Utc};

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Milliseconds since the Unix epoch, strictly increasing within the process.
///
/// Record ids are derived from creation time; two records created within the
/// same millisecond get consecutive values instead of colliding.
pub fn next_millis() -> i64 {
  let now = Utc::now().timestamp_millis();
  let mut last = LAST_MILLIS.load(Ordering::Relaxed);
  loop {
    let next = now.max(last + 1);
    match LAST_MILLIS.compare_exchange_weak(
      last,
      next,
      Ordering::AcqRel,
      Ordering::Relaxed,
    ) {
      Ok(_) => return next,
      Err(actual) => last = actual,
    }
  }
}

/// The current time at millisecond precision, matching ISO-8601 timestamps
/// written by other clients of the same data.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(3) }

/// Serde format for stored timestamps: RFC 3339 in UTC with exactly three
/// fractional digits (`2024-06-10T06:13:20.000Z`).
///
/// Stored timestamps are compared as strings by the secondary indexes, so
/// every one must have the same width.
pub mod iso_millis {
  use chrono::{DateTime, SecondsFormat, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
  }

  pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(at))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<DateTime<Utc>, D::Error> {
    DateTime::<Utc>::deserialize(deserializer)
  }

  /// The same format for optional fields.
  pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
      at: &Option<DateTime<Utc>>,
      serializer: S,
    ) -> Result<S::Ok, S::Error> {
      match at {
        Some(at) => serializer.serialize_some(&super::format(at)),
        None => serializer.serialize_none(),
      }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
      deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
      Option::<DateTime<Utc>>::deserialize(deserializer)
    }
  }
}
