//! SHA-1 object identities for content-addressed storage

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};

/// A Git-compatible object id (20-byte SHA-1)
///
/// The all-zero id is reserved: it never names stored content and is used by
/// renames to mean "content unchanged".
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// The reserved all-zero id
    pub const ZERO: ObjectId = ObjectId([0u8; 20]);

    /// Create a new ObjectId from bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build an id from a byte slice, e.g. one handed out by an object database
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    /// Get the id as a byte slice
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the reserved all-zero id
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form for display
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }

    /// Parse from a 40-character hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ObjectId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash raw bytes with SHA-1
pub fn hash_bytes(data: &[u8]) -> ObjectId {
    let digest = Sha1::digest(data);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest);
    ObjectId(bytes)
}

/// Hash blob content the way Git does (`blob <len>\0` header + content)
///
/// Ids produced here match `git hash-object`, so a `Store` populated from a
/// working tree agrees with the Git repository it mirrors.
pub fn hash_blob(data: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", data.len()).as_bytes());
    hasher.update(data);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hasher.finalize());
    ObjectId(bytes)
}
