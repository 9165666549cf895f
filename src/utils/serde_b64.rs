// src/utils/serde_b64.rs
//! Serde adapters storing raw bytes as standard base64 strings, the way
//! Kubernetes encodes `[]byte` fields in secrets and kubeconfigs.

use base64::{engine::general_purpose, Engine as _};

pub mod bytes {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(de::Error::custom)
    }
}

pub mod byte_map {
    use super::*;
    use serde::{de, ser::SerializeMap, Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        data: &BTreeMap<String, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(data.len()))?;
        for (key, value) in data {
            map.serialize_entry(key, &general_purpose::STANDARD.encode(value))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<u8>>, D::Error> {
        BTreeMap::<String, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| {
                general_purpose::STANDARD
                    .decode(value.trim())
                    .map(|decoded| (key.clone(), decoded))
                    .map_err(|e| de::Error::custom(format!("data key {:?}: {}", key, e)))
            })
            .collect()
    }
}
