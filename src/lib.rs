use std::{collections::HashMap, fmt::Display, hash::Hash, io};

use bevy_derive::{Deref, DerefMut};
use geo::{Coord, Point};
use serde::{Serialize, Serializer};
use tracing::warn;

pub mod airac;
pub mod airspace;
pub mod arc;
pub mod boundary;
pub mod config;
pub mod coordinate;
pub mod direction;
pub mod token;

use coordinate::{format_dms_component, Axis};

fn read_to_string(contents: &[u8]) -> Result<String, io::Error> {
    String::from_utf8(contents.to_vec()).or_else(|_| {
        let (string, _, errors) = encoding_rs::WINDOWS_1252.decode(contents);
        if errors {
            warn!("errors while decoding win-1252");
        }
        Ok(string.to_string())
    })
}

pub trait DmsExt {
    fn lat_dms_fmt(&self) -> String;
    fn lng_dms_fmt(&self) -> String;
    fn dms_fmt(&self) -> String {
        format!("{} {}", self.lat_dms_fmt(), self.lng_dms_fmt())
    }
}

impl DmsExt for Coord {
    fn lat_dms_fmt(&self) -> String {
        format_dms_component(self.y, Axis::Latitude)
    }

    fn lng_dms_fmt(&self) -> String {
        format_dms_component(self.x, Axis::Longitude)
    }
}

impl DmsExt for Point {
    fn lat_dms_fmt(&self) -> String {
        self.0.lat_dms_fmt()
    }

    fn lng_dms_fmt(&self) -> String {
        self.0.lng_dms_fmt()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deref, DerefMut)]
pub struct TwoKeyMap<K1: Eq + Hash, K2: Eq + Hash, V>(pub HashMap<(K1, K2), V>);

impl<K1, K2, V> Serialize for TwoKeyMap<K1, K2, V>
where
    K1: Eq + Hash + Display,
    K2: Eq + Hash + Display,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let key = |k1, k2| format!("{k1}:{k2}");
        serializer.collect_map(self.0.iter().map(|(k, v)| (key(&k.0, &k.1), v)))
    }
}

impl<K1, K2, V> Default for TwoKeyMap<K1, K2, V>
where
    K1: Eq + Hash + Display,
    K2: Eq + Hash + Display,
{
    fn default() -> Self {
        Self(HashMap::default())
    }
}
