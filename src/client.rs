// This file is part of the tuf-client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{error_description, Error, ErrorRepresentation, UrlSnafu};
use crate::types::{KeyId, RootRole, SignedPayload, TufKeyPair};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::ResultExt;
use surf::{Body, Client, Request, Response, StatusCode, Url};
use tracing::{event, Level};

/// One entry in the ordered status-to-error mapping applied to a response.
///
/// `applies` inspects the status code and the decoded error body, if the
/// body decoded at all; `raise` builds the typed error from the same
/// material plus the raw body. Rules are evaluated in order and the first
/// match wins, so more specific rules go first.
pub struct ErrorRule {
    applies: fn(StatusCode, Option<&ErrorRepresentation>) -> bool,
    raise: fn(StatusCode, Option<ErrorRepresentation>, &str) -> Error,
}

impl ErrorRule {
    pub fn new(
        applies: fn(StatusCode, Option<&ErrorRepresentation>) -> bool,
        raise: fn(StatusCode, Option<ErrorRepresentation>, &str) -> Error,
    ) -> Self {
        ErrorRule { applies, raise }
    }
}

/// A surf client pinned to a base URL, with the response protocol shared by
/// all metadata server endpoints: 2xx bodies are JSON documents, everything
/// else is mapped through [ErrorRule]s into a typed failure.
pub struct HttpClient {
    inner: Client,
    base: Url,
}

impl HttpClient {
    pub fn new(base: Url) -> Self {
        HttpClient::with_client(Client::new(), base)
    }

    /// Use a preconfigured transport. Timeouts, TLS settings and middleware
    /// all live on the [surf::Client] the caller hands in.
    pub fn with_client(inner: Client, base: Url) -> Self {
        HttpClient { inner, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve an endpoint path against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        self.base.join(path).context(UrlSnafu)
    }

    /// Execute a request and map any failure through `rules`.
    ///
    /// On a non-2xx status the body is read and decoded as an
    /// [ErrorRepresentation] when possible; the rules see the decoded body
    /// and unmatched responses become [Error::Http].
    pub async fn send(&self, request: Request, rules: &[ErrorRule]) -> Result<Response, Error> {
        event!(
            Level::DEBUG,
            "--> {} {}",
            request.method(),
            request.url()
        );
        let mut res = self
            .inner
            .send(request)
            .await
            .map_err(|err| Error::Transport {
                message: err.to_string(),
            })?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.body_string().await.unwrap_or_default();
        event!(Level::WARN, "<-- {} {}", status, body);
        Err(map_failure(status, body, rules))
    }

    /// [send], then decode the JSON body into `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: Request,
        rules: &[ErrorRule],
    ) -> Result<T, Error> {
        let mut res = self.send(request, rules).await?;
        response_body(&mut res).await
    }

    /// [send] for endpoints whose success responses carry no body worth
    /// decoding.
    pub async fn execute_unit(&self, request: Request, rules: &[ErrorRule]) -> Result<(), Error> {
        self.send(request, rules).await?;
        Ok(())
    }
}

/// Path of a root document fetch: the floating latest or a pinned version.
pub(crate) fn root_path(version: Option<u64>) -> String {
    match version {
        None => "root.json".to_string(),
        Some(version) => format!("{}.root.json", version),
    }
}

/// 404 means the server has never seen the requested role document.
pub(crate) fn missing_role_rules() -> [ErrorRule; 1] {
    [ErrorRule::new(
        |status, _| status == StatusCode::NotFound,
        |_, repr, body| Error::RoleNotFound {
            description: error_description(repr, body),
        },
    )]
}

fn map_failure(status: StatusCode, body: String, rules: &[ErrorRule]) -> Error {
    let repr: Option<ErrorRepresentation> = serde_json::from_str(&body).ok();
    for rule in rules {
        if (rule.applies)(status, repr.as_ref()) {
            return (rule.raise)(status, repr, &body);
        }
    }
    Error::Http { status, body }
}

/// Deserialize the JSON body of a response.
pub async fn response_body<T: DeserializeOwned>(res: &mut Response) -> Result<T, Error> {
    res.body_json().await.map_err(|err| Error::Decode {
        message: err.to_string(),
    })
}

/// Serialize a request payload as a JSON body.
pub fn json_body<T: Serialize>(payload: &T) -> Result<Body, Error> {
    Body::from_json(payload).map_err(|err| Error::Encode {
        message: err.to_string(),
    })
}

/// Operations every metadata server exposes, whatever namespace it lives
/// under: fetching and publishing root metadata and managing the private
/// keys the server holds for its roles.
///
/// Server-specific operations (targets, delegations) stay inherent methods
/// on the concrete clients.
pub trait TufServer {
    /// Fetch the root role, either the latest or a pinned version.
    fn root<'a>(
        &'a self,
        version: Option<u64>,
    ) -> BoxFuture<'a, Result<SignedPayload<RootRole>, Error>>;

    /// Publish a newly signed root role.
    fn push_signed_root<'a>(
        &'a self,
        payload: &'a SignedPayload<RootRole>,
    ) -> BoxFuture<'a, Result<(), Error>>;

    /// Retrieve the key pair the server holds under `key_id`.
    fn fetch_key_pair<'a>(&'a self, key_id: &'a KeyId) -> BoxFuture<'a, Result<TufKeyPair, Error>>;

    /// Delete the private key held under `key_id`.
    fn delete_key<'a>(&'a self, key_id: &'a KeyId) -> BoxFuture<'a, Result<(), Error>>;
}
