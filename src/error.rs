// This file is part of the tuf-client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use serde::{Deserialize, Serialize};
use snafu::Snafu;
use surf::StatusCode;

/// Failures surfaced by the metadata server clients.
///
/// Nothing here is retried internally; every failure reaches the caller
/// typed, and retry policy stays a caller concern.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The server does not know the requested role (404 on a root fetch or
    /// a delegation pull).
    #[snafu(display("role not found: {}", description))]
    RoleNotFound { description: String },

    /// A targets push carried a stale checksum, or none when the server
    /// required one.
    #[snafu(display("targets role checksum rejected by the server"))]
    RoleChecksumNotValid,

    /// Any other non-2xx response, with the raw body for debugging.
    #[snafu(display("unexpected response {}: {}", status, body))]
    Http { status: StatusCode, body: String },

    /// The request failed without producing a response at all.
    #[snafu(display("request failed: {}", message))]
    Transport { message: String },

    /// A 2xx body that does not deserialize into the expected type.
    #[snafu(display("cannot decode response body: {}", message))]
    Decode { message: String },

    /// A push payload that does not serialize to JSON.
    #[snafu(display("cannot encode request body: {}", message))]
    Encode { message: String },

    /// A checksum, key id or role name candidate rejected at parse time.
    #[snafu(display("not a valid {}: {:?}", kind, value))]
    InvalidToken { kind: &'static str, value: String },

    /// The base URL and endpoint path do not combine into a request URL.
    #[snafu(display("cannot build request url: {}", source))]
    Url { source: url::ParseError },
}

/// Error `code` values used inside [ErrorRepresentation] bodies.
pub mod codes {
    pub const ROLE_CHECKSUM_MISMATCH: &str = "role_checksum_mismatch";
}

/// JSON body the servers attach to error responses.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorRepresentation {
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// Best human-readable account of a failed response: the structured
/// description when the server sent one, the raw body otherwise.
pub(crate) fn error_description(repr: Option<ErrorRepresentation>, raw_body: &str) -> String {
    match repr {
        Some(repr) if !repr.description.is_empty() => repr.description,
        _ => raw_body.to_string(),
    }
}
