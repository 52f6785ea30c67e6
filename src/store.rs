//! Key-value store adapter with expiring records
//!
//! The shared store only needs get/set primitives; expiration is layered on
//! top by wrapping every value in an envelope that carries its deadline.
//! Expired entries are treated as absent and removed lazily on the next read.
use crate::error::StoreError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn now() -> Self {
        Self(Utc::now())
    }
    pub fn after(ttl: Duration) -> Self {
        Self(Utc::now() + ttl)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    pub fn is_past(&self) -> bool {
        self.0 <= Utc::now()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

// wrapper persisted for every value; expires_at is None for records that
// only go away when overwritten (e.g. the inventory snapshot)
#[derive(minicbor::Encode, minicbor::Decode, Debug)]
struct Envelope {
    #[n(0)]
    expires_at: Option<TimeStamp<Utc>>,
    #[cbor(n(1), with = "minicbor::bytes")]
    payload: Vec<u8>,
}

/// Opaque token identifying the exact stored bytes a read observed, used
/// for conditional writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(Vec<u8>);

/// The store seam. All cart, inventory and validation state lives behind
/// this; services hold it as an `Arc<dyn KvStore>` handed in at construction.
pub trait KvStore: Send + Sync {
    /// Plain read, no expiration refresh.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Plain write with no expiration.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Write with an expiration deadline of now + `ttl`.
    fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;

    /// Read and slide the expiration window forward to now + `ttl`.
    fn get_ex(&self, key: &str, ttl: Duration) -> Result<Option<Vec<u8>>, StoreError>;

    /// Read without refreshing, returning a version token for a later
    /// conditional write.
    fn get_versioned(&self, key: &str) -> Result<Option<(Version, Vec<u8>)>, StoreError>;

    /// Conditional write: succeeds only if the stored bytes still match
    /// `expected` (`None` meaning the key must be absent). Returns whether
    /// the swap happened.
    fn compare_and_swap_ex(
        &self,
        key: &str,
        expected: Option<&Version>,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Live (non-expired) keys under a prefix.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

pub struct SledStore {
    db: Arc<sled::Db>,
}

impl SledStore {
    pub fn new(db: Arc<sled::Db>) -> Self {
        Self { db }
    }

    // returns the raw stored bytes alongside the decoded envelope so callers
    // can use them as a version token
    fn load_live(&self, key: &str) -> Result<Option<(Vec<u8>, Envelope)>, StoreError> {
        let Some(raw) = self.db.get(key)? else {
            return Ok(None);
        };

        let envelope: Envelope = minicbor::decode(&raw)?;

        if let Some(deadline) = &envelope.expires_at {
            if deadline.is_past() {
                tracing::debug!(key, "removing expired entry");
                self.db.remove(key)?;
                return Ok(None);
            }
        }

        Ok(Some((raw.to_vec(), envelope)))
    }

    fn write(&self, key: &str, value: &[u8], expires_at: Option<TimeStamp<Utc>>) -> Result<(), StoreError> {
        let envelope = Envelope {
            expires_at,
            payload: value.to_vec(),
        };
        self.db.insert(key, encode(&envelope)?)?;
        Ok(())
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.load_live(key)?.map(|(_, envelope)| envelope.payload))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.write(key, value, None)
    }

    fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.write(key, value, Some(TimeStamp::after(ttl)))
    }

    fn get_ex(&self, key: &str, ttl: Duration) -> Result<Option<Vec<u8>>, StoreError> {
        let Some((raw, envelope)) = self.load_live(key)? else {
            return Ok(None);
        };

        // sliding expiration: every read pushes the deadline out. The
        // refresh is conditional on the bytes we observed still being
        // stored; if a writer got in between, its record already carries a
        // fresh deadline and must not be clobbered with our stale payload.
        let refreshed = Envelope {
            expires_at: Some(TimeStamp::after(ttl)),
            payload: envelope.payload,
        };
        if self
            .db
            .compare_and_swap(key, Some(raw), Some(encode(&refreshed)?))?
            .is_err()
        {
            tracing::debug!(key, "skipping expiration refresh, entry changed under read");
        }

        Ok(Some(refreshed.payload))
    }

    fn get_versioned(&self, key: &str) -> Result<Option<(Version, Vec<u8>)>, StoreError> {
        Ok(self
            .load_live(key)?
            .map(|(raw, envelope)| (Version(raw), envelope.payload)))
    }

    fn compare_and_swap_ex(
        &self,
        key: &str,
        expected: Option<&Version>,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let envelope = Envelope {
            expires_at: Some(TimeStamp::after(ttl)),
            payload: value.to_vec(),
        };

        let swapped = self
            .db
            .compare_and_swap(
                key,
                expected.map(|version| version.0.as_slice()),
                Some(encode(&envelope)?),
            )?
            .is_ok();

        Ok(swapped)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();

        for entry in self.db.scan_prefix(prefix) {
            let (key, raw) = entry?;
            let envelope: Envelope = minicbor::decode(&raw)?;

            if let Some(deadline) = &envelope.expires_at {
                if deadline.is_past() {
                    self.db.remove(&key)?;
                    continue;
                }
            }

            keys.push(String::from_utf8_lossy(&key).into_owned());
        }

        Ok(keys)
    }
}

/// Encode a record for storage.
pub fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, StoreError> {
    minicbor::to_vec(value).map_err(|err| StoreError::Encode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::now();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn envelope_roundtrip() {
        let envelope = Envelope {
            expires_at: Some(TimeStamp::after(Duration::hours(1))),
            payload: vec![1, 2, 3],
        };

        let encoded = minicbor::to_vec(&envelope).unwrap();
        let decoded: Envelope = minicbor::decode(&encoded).unwrap();

        assert_eq!(decoded.payload, vec![1, 2, 3]);
        assert!(!decoded.expires_at.unwrap().is_past());
    }
}
