// This file is part of the tuf-client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{Error, InvalidTokenSnafu};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

/// A signed envelope wrapping a metadata document plus the signatures over
/// its canonical form.
///
/// The client never inspects or verifies the signatures; it only moves the
/// envelope between the caller and the server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SignedPayload<T> {
    pub signatures: Vec<ClientSignature>,
    pub signed: T,
}

impl<T: Serialize> Display for SignedPayload<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_as_json(self, f)
    }
}

/// A single detached signature inside a [SignedPayload].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSignature {
    pub keyid: KeyId,
    pub method: SignatureMethod,
    pub sig: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignatureMethod {
    #[serde(rename = "ed25519")]
    Ed25519,
    #[serde(rename = "rsassa-pss-sha256")]
    RsassaPssSha256,
}

/// The metadata role a document or a key assignment belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Root,
    Snapshot,
    Targets,
    Timestamp,
}

/// Top-level signed metadata listing the trusted keys and the key
/// assignments for every role.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RootRole {
    #[serde(rename = "_type")]
    pub typ: RoleType,
    pub expires: DateTime<Utc>,
    pub version: u64,
    pub keys: HashMap<KeyId, TufKey>,
    pub roles: HashMap<RoleType, RoleKeys>,
}

impl Display for RootRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_as_json(self, f)
    }
}

/// Key ids authorized to sign for a role, with the signature threshold.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleKeys {
    pub keyids: Vec<KeyId>,
    pub threshold: u32,
}

/// Signed metadata listing target artifacts and their hashes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TargetsRole {
    #[serde(rename = "_type")]
    pub typ: RoleType,
    pub expires: DateTime<Utc>,
    pub version: u64,
    pub targets: HashMap<String, TargetItem>,
}

impl Display for TargetsRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_as_json(self, f)
    }
}

/// A single artifact entry in a targets role.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TargetItem {
    pub length: u64,
    pub hashes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
}

/// A fetched targets role together with the checksum the server currently
/// holds for it, when one was advertised.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetsResponse {
    pub targets: SignedPayload<TargetsRole>,
    pub checksum: Option<RoleChecksum>,
}

/// Opaque token tracking the server-side state of a targets role.
///
/// A push must echo the checksum obtained from the last successful fetch or
/// the server rejects it. The token is the hex rendering of a SHA-256
/// digest; anything else is rejected at parse time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct RoleChecksum(String);

impl RoleChecksum {
    pub fn parse(candidate: &str) -> Result<Self, Error> {
        ensure_hex_digest("role checksum", candidate)?;
        Ok(RoleChecksum(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoleChecksum {
    type Error = Error;

    fn try_from(candidate: String) -> Result<Self, Error> {
        RoleChecksum::parse(&candidate)
    }
}

impl From<RoleChecksum> for String {
    fn from(checksum: RoleChecksum) -> String {
        checksum.0
    }
}

impl Display for RoleChecksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a signing key: the hex digest of the canonical public key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct KeyId(String);

impl KeyId {
    pub fn parse(candidate: &str) -> Result<Self, Error> {
        ensure_hex_digest("key id", candidate)?;
        Ok(KeyId(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KeyId {
    type Error = Error;

    fn try_from(candidate: String) -> Result<Self, Error> {
        KeyId::parse(&candidate)
    }
}

impl From<KeyId> for String {
    fn from(key_id: KeyId) -> String {
        key_id.0
    }
}

impl Display for KeyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a delegated targets role, interpolated into the
/// `delegations/{name}.json` path on the server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct DelegatedRoleName(String);

impl DelegatedRoleName {
    /// Accepts 1 to 50 characters from `[A-Za-z0-9_-]`, the alphabet safe
    /// to embed in a URL path segment.
    pub fn parse(candidate: &str) -> Result<Self, Error> {
        let well_formed = !candidate.is_empty()
            && candidate.len() <= 50
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        ensure!(
            well_formed,
            InvalidTokenSnafu {
                kind: "delegated role name",
                value: candidate,
            }
        );
        Ok(DelegatedRoleName(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DelegatedRoleName {
    type Error = Error;

    fn try_from(candidate: String) -> Result<Self, Error> {
        DelegatedRoleName::parse(&candidate)
    }
}

impl From<DelegatedRoleName> for String {
    fn from(name: DelegatedRoleName) -> String {
        name.0
    }
}

impl Display for DelegatedRoleName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum KeyType {
    #[serde(rename = "ED25519")]
    Ed25519,
    #[serde(rename = "RSA")]
    Rsa,
}

/// Public half of a role signing key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TufKey {
    pub keytype: KeyType,
    pub keyval: PublicKeyValue,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKeyValue {
    pub public: String,
}

/// Private half of a role signing key, as held by the server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TufPrivateKey {
    pub keytype: KeyType,
    pub keyval: PrivateKeyValue,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivateKeyValue {
    pub private: String,
}

/// A full key pair as returned by the key endpoints.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TufKeyPair {
    pub pubkey: TufKey,
    pub privkey: TufPrivateKey,
}

// The digest tokens are compared and echoed back verbatim, so uppercase
// spellings are rejected rather than normalized.
fn ensure_hex_digest(kind: &'static str, candidate: &str) -> Result<(), Error> {
    let well_formed = candidate.len() == 64
        && !candidate.bytes().any(|b| b.is_ascii_uppercase())
        && hex::decode(candidate).map(|raw| raw.len() == 32).unwrap_or(false);
    ensure!(
        well_formed,
        InvalidTokenSnafu {
            kind,
            value: candidate,
        }
    );
    Ok(())
}

// Display implementation for types which serialize to JSON. Displays as a
// valid JSON object.
pub fn fmt_as_json<T: Serialize>(v: &T, f: &mut Formatter<'_>) -> fmt::Result {
    let string = serde_json::to_string(v).map_err(|_| fmt::Error)?;
    write!(f, "{}", string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "d6c2e2b4ea107ac4d0f0535f5a2d31d4c4b2a7a94bd9e3a5475525d42f9e3c07";

    #[test]
    fn checksum_accepts_a_sha256_rendering() {
        let checksum = RoleChecksum::parse(DIGEST).unwrap();
        assert_eq!(checksum.as_str(), DIGEST);
    }

    #[test]
    fn checksum_rejects_malformed_candidates() {
        assert!(RoleChecksum::parse("").is_err());
        assert!(RoleChecksum::parse("abc123").is_err());
        assert!(RoleChecksum::parse(&DIGEST[..63]).is_err());
        assert!(RoleChecksum::parse(&DIGEST.to_uppercase()).is_err());
        assert!(RoleChecksum::parse(&format!("{}zz", &DIGEST[..62])).is_err());
    }

    #[test]
    fn key_id_rejects_non_digests() {
        assert!(KeyId::parse(DIGEST).is_ok());
        assert!(KeyId::parse("not-a-key-id").is_err());
    }

    #[test]
    fn delegated_role_name_limits_its_alphabet() {
        assert!(DelegatedRoleName::parse("in-house_launcher").is_ok());
        assert!(DelegatedRoleName::parse("").is_err());
        assert!(DelegatedRoleName::parse("has/slash").is_err());
        assert!(DelegatedRoleName::parse(&"x".repeat(51)).is_err());
    }

    #[test]
    fn root_role_serializes_with_underscored_type_tag() {
        let role = RootRole {
            typ: RoleType::Root,
            expires: "2027-01-01T00:00:00Z".parse().unwrap(),
            version: 1,
            keys: HashMap::new(),
            roles: HashMap::new(),
        };
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["_type"], "root");
        assert_eq!(json["version"], 1);
    }

    #[test]
    fn signed_payload_keeps_the_envelope_field_names() {
        let payload = SignedPayload {
            signatures: vec![ClientSignature {
                keyid: KeyId::parse(DIGEST).unwrap(),
                method: SignatureMethod::Ed25519,
                sig: "c2ln".to_string(),
            }],
            signed: serde_json::json!({"version": 3}),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["signatures"][0]["keyid"], DIGEST);
        assert_eq!(json["signatures"][0]["method"], "ed25519");
        assert_eq!(json["signed"]["version"], 3);
    }

    #[test]
    fn checksum_deserialization_validates() {
        let ok: Result<RoleChecksum, _> = serde_json::from_str(&format!("\"{}\"", DIGEST));
        assert!(ok.is_ok());
        let bad: Result<RoleChecksum, _> = serde_json::from_str("\"bogus\"");
        assert!(bad.is_err());
    }
}
