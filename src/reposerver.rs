// This file is part of the tuf-client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::client::{
    json_body, missing_role_rules, response_body, root_path, ErrorRule, HttpClient, TufServer,
};
use crate::error::{codes, Error, UrlSnafu};
use crate::types::{
    DelegatedRoleName, KeyId, RoleChecksum, RootRole, SignedPayload, TargetsResponse, TargetsRole,
    TufKeyPair,
};
use futures::future::BoxFuture;
use snafu::ResultExt;
use surf::http::Method;
use surf::{RequestBuilder, StatusCode, Url};

/// Header carrying the targets role checksum, on both the `targets.json`
/// response and the `targets` push request.
pub const ROLE_CHECKSUM_HEADER: &str = "x-ats-role-checksum";

const PREFIX: &str = "api/v1/user_repo/";

/// Client for a repository's metadata namespace on the reposerver.
///
/// Beyond the shared root and key operations it manages the repository's
/// targets role, guarded by an optimistic-concurrency checksum, and its
/// delegation documents.
pub struct ReposerverClient {
    http: HttpClient,
}

impl ReposerverClient {
    /// `server` is the host base URL; any path on it must end with `/` to
    /// survive the join.
    pub fn new(server: Url) -> Result<Self, Error> {
        Self::with_client(surf::Client::new(), server)
    }

    pub fn with_client(client: surf::Client, server: Url) -> Result<Self, Error> {
        let base = server.join(PREFIX).context(UrlSnafu)?;
        Ok(ReposerverClient {
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
        let url = self.http.url(&format!("root/private_keys/{}", key_id))?;
        self.http
            .execute(RequestBuilder::new(Method::Get, url).build(), &[])
            .await
    }

    pub async fn delete_key(&self, key_id: &KeyId) -> Result<(), Error> {
        let url = self.http.url(&format!("root/private_keys/{}", key_id))?;
        self.http
            .execute_unit(RequestBuilder::new(Method::Delete, url).build(), &[])
            .await
    }

    /// Fetch the targets role and the checksum the server currently holds
    /// for it.
    ///
    /// The checksum is taken from the response header and only kept when it
    /// is a well-formed token; a missing or mangled header yields `None`.
    pub async fn targets(&self) -> Result<TargetsResponse, Error> {
        let url = self.http.url("targets.json")?;
        let mut res = self
            .http
            .send(RequestBuilder::new(Method::Get, url).build(), &[])
            .await?;
        let checksum = res
            .header(ROLE_CHECKSUM_HEADER)
            .and_then(|values| RoleChecksum::parse(values.last().as_str()).ok());
        let targets = response_body(&mut res).await?;
        Ok(TargetsResponse { targets, checksum })
    }

    /// Publish a targets role, echoing the checksum from the last fetch.
    ///
    /// No header is sent when `previous_checksum` is `None`; the server
    /// answers 428 if it required one, and 412 when the echoed checksum is
    /// stale. Both mean the caller must re-fetch before pushing again.
    pub async fn push_targets(
        &self,
        role: &SignedPayload<TargetsRole>,
        previous_checksum: Option<&RoleChecksum>,
    ) -> Result<(), Error> {
        let url = self.http.url("targets")?;
        let mut request = RequestBuilder::new(Method::Put, url).body(json_body(role)?);
        if let Some(checksum) = previous_checksum {
            request = request.header(ROLE_CHECKSUM_HEADER, checksum.as_str());
        }
        self.http.execute_unit(request.build(), &checksum_rules()).await
    }

    pub async fn push_delegation(
        &self,
        name: &DelegatedRoleName,
        payload: &SignedPayload<TargetsRole>,
    ) -> Result<(), Error> {
        let url = self.http.url(&format!("delegations/{}.json", name))?;
        let request = RequestBuilder::new(Method::Put, url)
            .body(json_body(payload)?)
            .build();
        self.http.execute_unit(request, &[]).await
    }

    pub async fn pull_delegation(
        &self,
        name: &DelegatedRoleName,
    ) -> Result<SignedPayload<TargetsRole>, Error> {
        let url = self.http.url(&format!("delegations/{}.json", name))?;
        self.http
            .execute(RequestBuilder::new(Method::Get, url).build(), &missing_role_rules())
            .await
    }
}

impl TufServer for ReposerverClient {
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

// 412 carries a structured body naming the mismatch; 428 is the server
// refusing a push that omitted the checksum entirely, body or no body.
fn checksum_rules() -> [ErrorRule; 2] {
    [
        ErrorRule::new(
            |status, repr| {
                status == StatusCode::PreconditionFailed
                    && repr
                        .map(|r| r.code == codes::ROLE_CHECKSUM_MISMATCH)
                        .unwrap_or(false)
            },
            |_, _, _| Error::RoleChecksumNotValid,
        ),
        ErrorRule::new(
            |status, _| status == StatusCode::PreconditionRequired,
            |_, _, _| Error::RoleChecksumNotValid,
        ),
    ]
}
