//! Tagged Map/Set containers.
//!
//! A plain JSON object stringifies its keys and a JSON array forgets set
//! semantics. These wrappers encode maps as
//! `{"dataType": "Map", "value": [[key, value], ...]}` and sets as
//! `{"dataType": "Set", "value": [item, ...]}` so both survive a trip
//! through a text medium with key types and container kind intact. They nest.

use serde::de::{DeserializeOwned, Error as DeError};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use sts_core::{CastingError, Result};

const MAP_TAG: &str = "Map";
const SET_TAG: &str = "Set";

#[derive(Deserialize)]
struct Tagged<T> {
    #[serde(rename = "dataType")]
    data_type: String,
    value: T,
}

fn check_tag<E: DeError>(found: &str, expected: &str) -> std::result::Result<(), E> {
    if found == expected {
        Ok(())
    } else {
        Err(E::custom(format!(
            "expected dataType \"{}\", found \"{}\"",
            expected, found
        )))
    }
}

fn serialize_map<S, K, V>(
    map: &HashMap<K, V>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    K: Serialize,
    V: Serialize,
{
    let entries: Vec<(&K, &V)> = map.iter().collect();
    let mut state = serializer.serialize_struct("TaggedMap", 2)?;
    state.serialize_field("dataType", MAP_TAG)?;
    state.serialize_field("value", &entries)?;
    state.end()
}

fn deserialize_map<'de, D, K, V>(
    deserializer: D,
) -> std::result::Result<HashMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    let tagged = Tagged::<Vec<(K, V)>>::deserialize(deserializer)?;
    check_tag::<D::Error>(&tagged.data_type, MAP_TAG)?;
    Ok(tagged.value.into_iter().collect())
}

fn serialize_set<S, T>(set: &HashSet<T>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let items: Vec<&T> = set.iter().collect();
    let mut state = serializer.serialize_struct("TaggedSet", 2)?;
    state.serialize_field("dataType", SET_TAG)?;
    state.serialize_field("value", &items)?;
    state.end()
}

fn deserialize_set<'de, D, T>(deserializer: D) -> std::result::Result<HashSet<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Eq + Hash,
{
    let tagged = Tagged::<Vec<T>>::deserialize(deserializer)?;
    check_tag::<D::Error>(&tagged.data_type, SET_TAG)?;
    Ok(tagged.value.into_iter().collect())
}

/// A `HashMap` that serializes as a tagged list of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedMap<K: Eq + Hash, V>(pub HashMap<K, V>);

impl<K: Eq + Hash, V> Default for TaggedMap<K, V> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<K: Eq + Hash, V> From<HashMap<K, V>> for TaggedMap<K, V> {
    fn from(map: HashMap<K, V>) -> Self {
        Self(map)
    }
}

impl<K, V> Serialize for TaggedMap<K, V>
where
    K: Serialize + Eq + Hash,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_map(&self.0, serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for TaggedMap<K, V>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_map(deserializer).map(Self)
    }
}

/// A `HashSet` that serializes as a tagged list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSet<T: Eq + Hash>(pub HashSet<T>);

impl<T: Eq + Hash> Default for TaggedSet<T> {
    fn default() -> Self {
        Self(HashSet::new())
    }
}

impl<T: Eq + Hash> From<HashSet<T>> for TaggedSet<T> {
    fn from(set: HashSet<T>) -> Self {
        Self(set)
    }
}

impl<T> Serialize for TaggedSet<T>
where
    T: Serialize + Eq + Hash,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_set(&self.0, serializer)
    }
}

impl<'de, T> Deserialize<'de> for TaggedSet<T>
where
    T: Deserialize<'de> + Eq + Hash,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_set(deserializer).map(Self)
    }
}

/// `#[serde(with = "tagged_map")]` for plain `HashMap` fields.
pub mod tagged_map {
    use super::*;

    pub fn serialize<S, K, V>(
        map: &HashMap<K, V>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        serialize_map(map, serializer)
    }

    pub fn deserialize<'de, D, K, V>(
        deserializer: D,
    ) -> std::result::Result<HashMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Eq + Hash,
        V: Deserialize<'de>,
    {
        deserialize_map(deserializer)
    }
}

/// `#[serde(with = "tagged_set")]` for plain `HashSet` fields.
pub mod tagged_set {
    use super::*;

    pub fn serialize<S, T>(set: &HashSet<T>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serialize_set(set, serializer)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> std::result::Result<HashSet<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Eq + Hash,
    {
        deserialize_set(deserializer)
    }
}

/// Encodes a value containing tagged containers to its stored text form.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(CastingError::from)
}

/// Decodes stored text. Any parse or shape error is a [`CastingError::Decode`].
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| CastingError::decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_keep_their_type() {
        let map: TaggedMap<u32, String> =
            HashMap::from([(1, "one".to_string()), (20, "twenty".to_string())]).into();

        let encoded = encode(&map).unwrap();
        assert!(encoded.contains("\"dataType\":\"Map\""));

        let decoded: TaggedMap<u32, String> = decode(&encoded).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_set_survives() {
        let set: TaggedSet<String> =
            HashSet::from(["a".to_string(), "b".to_string()]).into();
        let encoded = encode(&set).unwrap();
        assert!(encoded.contains("\"dataType\":\"Set\""));

        let decoded: TaggedSet<String> = decode(&encoded).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn test_empty_containers() {
        let map: TaggedMap<String, u8> = TaggedMap::default();
        let set: TaggedSet<u8> = TaggedSet::default();

        assert_eq!(encode(&map).unwrap(), r#"{"dataType":"Map","value":[]}"#);
        assert_eq!(encode(&set).unwrap(), r#"{"dataType":"Set","value":[]}"#);
        assert_eq!(decode::<TaggedMap<String, u8>>(&encode(&map).unwrap()).unwrap(), map);
        assert_eq!(decode::<TaggedSet<u8>>(&encode(&set).unwrap()).unwrap(), set);
    }

    #[test]
    fn test_nested_containers() {
        let inner_a: TaggedSet<i64> = HashSet::from([-1, 7]).into();
        let inner_b: TaggedSet<i64> = TaggedSet::default();
        let nested: TaggedMap<String, TaggedSet<i64>> =
            HashMap::from([("a".to_string(), inner_a), ("b".to_string(), inner_b)]).into();

        let decoded: TaggedMap<String, TaggedSet<i64>> =
            decode(&encode(&nested).unwrap()).unwrap();
        assert_eq!(decoded, nested);
    }

    #[test]
    fn test_wrong_tag_is_a_decode_failure() {
        let err = decode::<TaggedMap<String, u8>>(r#"{"dataType":"Set","value":[]}"#).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_plain_object_is_rejected() {
        let err = decode::<TaggedMap<String, u8>>(r#"{"a":1}"#).unwrap_err();
        assert!(err.is_decode());
    }
}
