// This file is part of the tuf-client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::client::{json_body, missing_role_rules, root_path, HttpClient, TufServer};
use crate::error::{Error, UrlSnafu};
use crate::types::{KeyId, RootRole, SignedPayload, TufKeyPair};
use futures::future::BoxFuture;
use snafu::ResultExt;
use surf::http::Method;
use surf::{RequestBuilder, Url};

const PREFIX: &str = "api/v1/director/admin/repo/";

/// Client for the director's admin repository namespace.
///
/// The director only exposes the shared root and key operations; there are
/// no targets or delegation documents to manage on it, and its key
/// endpoints live directly under the namespace with no `root/` segment.
pub struct DirectorClient {
    http: HttpClient,
}

impl DirectorClient {
    /// `server` is the host base URL; any path on it must end with `/` to
    /// survive the join.
    pub fn new(server: Url) -> Result<Self, Error> {
        Self::with_client(surf::Client::new(), server)
    }

    pub fn with_client(client: surf::Client, server: Url) -> Result<Self, Error> {
        let base = server.join(PREFIX).context(UrlSnafu)?;
        Ok(DirectorClient {
            http: HttpClient::with_client(client, base),
        })
    }

    /// Fetch the latest root role, or a pinned, immutable version of it.
    pub async fn root(&self, version: Option<u64>) -> Result<SignedPayload<RootRole>, Error> {
        let url = self.http.url(&root_path(version))?;
        self.http
            .execute(RequestBuilder::new(Method::Get, url).build(), &missing_role_rules())
            .await
    }

    pub async fn push_signed_root(&self, payload: &SignedPayload<RootRole>) -> Result<(), Error> {
        let url = self.http.url("root")?;
        let request = RequestBuilder::new(Method::Post, url)
            .body(json_body(payload)?)
            .build();
        self.http.execute_unit(request, &[]).await
    }

    pub async fn fetch_key_pair(&self, key_id: &KeyId) -> Result<TufKeyPair, Error> {
        let url = self.http.url(&format!("private_keys/{}", key_id))?;
        self.http
            .execute(RequestBuilder::new(Method::Get, url).build(), &[])
            .await
    }

    pub async fn delete_key(&self, key_id: &KeyId) -> Result<(), Error> {
        let url = self.http.url(&format!("private_keys/{}", key_id))?;
        self.http
            .execute_unit(RequestBuilder::new(Method::Delete, url).build(), &[])
            .await
    }
}

impl TufServer for DirectorClient {
    fn root<'a>(
        &'a self,
        version: Option<u64>,
    ) -> BoxFuture<'a, Result<SignedPayload<RootRole>, Error>> {
        Box::pin(self.root(version))
    }

    fn push_signed_root<'a>(
        &'a self,
        payload: &'a SignedPayload<RootRole>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(self.push_signed_root(payload))
    }

    fn fetch_key_pair<'a>(&'a self, key_id: &'a KeyId) -> BoxFuture<'a, Result<TufKeyPair, Error>> {
        Box::pin(self.fetch_key_pair(key_id))
    }

    fn delete_key<'a>(&'a self, key_id: &'a KeyId) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(self.delete_key(key_id))
    }
}
