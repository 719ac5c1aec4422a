//! Shared utilities: address constants and serde adapters.
//!
//! Every `BigInt`-typed value crossing a serialization boundary (entity
//! store, lookup-cache documents) is encoded as a decimal string so that
//! arbitrary-precision values survive JSON round-trips intact.

/// The Ethereum zero address (0x0000000000000000000000000000000000000000).
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Serialize/deserialize a `BigInt` as a decimal string.
pub mod serde_bigint {
    use num_bigint::BigInt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BigInt::from_str(&raw).map_err(D::Error::custom)
    }
}

/// Serialize/deserialize an `Option<BigInt>` as an optional decimal string.
pub mod serde_bigint_opt {
    use num_bigint::BigInt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(
        value: &Option<BigInt>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigInt>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| BigInt::from_str(&s).map_err(D::Error::custom))
            .transpose()
    }
}
