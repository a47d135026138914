// This file is part of the tuf-client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Typed clients for TUF metadata servers.
//!
//! Two services publish and consume signed role metadata: the reposerver,
//! which holds a repository's root, targets and delegation documents, and
//! the director, which holds root metadata for its admin repository. Both
//! speak the same JSON protocol; this crate wraps each in a typed client
//! so callers work with role documents and typed failures instead of raw
//! requests.
//!
//! All payloads correspond directly to Rust data structures via the serde
//! serialization interfaces; signed documents travel inside a
//! [SignedPayload] envelope which the client moves around without ever
//! verifying. Signing, verification and key generation belong to the
//! layers above and below this one.
//!
//! Failed responses carry a JSON body with a `code` field. The `client`
//! module maps selected (status, code) combinations to dedicated [Error]
//! variants through an ordered rule list; everything unmatched surfaces as
//! a generic HTTP failure with the status and raw body. Nothing is retried
//! internally.
//!
//! The operations both servers share are also available behind the
//! [client::TufServer] trait, so callers can manage root metadata and keys
//! without caring which service they are pointed at.

pub mod client;
pub mod director;
pub mod error;
pub mod reposerver;
pub mod types;

pub use client::TufServer;
pub use director::DirectorClient;
pub use error::*;
pub use reposerver::{ReposerverClient, ROLE_CHECKSUM_HEADER};
pub use types::*;
