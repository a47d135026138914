//! Shared harness for the integration tests: a tide server bound to an
//! ephemeral port that records every request it sees, plus sample role
//! documents to serve from it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use surf::Url;
use tuf_client::types::{
    ClientSignature, KeyId, KeyType, PrivateKeyValue, PublicKeyValue, RoleKeys, RoleType,
    RootRole, SignatureMethod, SignedPayload, TargetItem, TargetsRole, TufKey, TufKeyPair,
    TufPrivateKey,
};
use tuf_client::ROLE_CHECKSUM_HEADER;

/// A well-formed checksum token, as the servers would hand out.
pub const CHECKSUM: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

/// Header value no checksum parser should accept.
pub const MANGLED_CHECKSUM: &str = "not-a-valid-checksum";

const KEY_ID: &str = "0b16609af26654fcd47d9352a218fa0ca6a086b0c4983e3c93c3e4f8f1e720d4";

/// One request the mock server saw.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub checksum_header: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Clone, Default)]
pub struct State {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Record a request into the server state and hand it back for the handler
/// to inspect. Consumes the body.
pub async fn record(req: &mut tide::Request<State>) -> Recorded {
    let body = req.body_string().await.unwrap_or_default();
    let recorded = Recorded {
        method: req.method().to_string(),
        path: req.url().path().to_string(),
        checksum_header: req
            .header(ROLE_CHECKSUM_HEADER)
            .map(|values| values.last().as_str().to_string()),
        body: serde_json::from_str(&body).ok(),
    };
    req.state().requests.lock().unwrap().push(recorded.clone());
    recorded
}

/// Start the server on an ephemeral port and return its base URL once it
/// accepts connections.
pub async fn spawn(app: tide::Server<State>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    async_std::task::spawn(async move {
        let _ = app.listen(addr.to_string()).await;
    });
    for _ in 0..100 {
        if async_std::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        async_std::task::sleep(Duration::from_millis(10)).await;
    }
    Url::parse(&format!("http://{}/", addr)).expect("server url")
}

pub fn key_id() -> KeyId {
    KeyId::parse(KEY_ID).unwrap()
}

fn signature() -> ClientSignature {
    ClientSignature {
        keyid: key_id(),
        method: SignatureMethod::Ed25519,
        sig: "lkQa2sFVz7Jv5pSjLQTAg1wRWHXtnMVd".to_string(),
    }
}

pub fn sample_root() -> SignedPayload<RootRole> {
    let mut keys = HashMap::new();
    keys.insert(
        key_id(),
        TufKey {
            keytype: KeyType::Ed25519,
            keyval: PublicKeyValue {
                public: "MCowBQYDK2VwAyEAn7kQ0t4PviOXJpyZ".to_string(),
            },
        },
    );
    let mut roles = HashMap::new();
    roles.insert(
        RoleType::Root,
        RoleKeys {
            keyids: vec![key_id()],
            threshold: 1,
        },
    );
    SignedPayload {
        signatures: vec![signature()],
        signed: RootRole {
            typ: RoleType::Root,
            expires: "2027-01-01T00:00:00Z".parse().unwrap(),
            version: 1,
            keys,
            roles,
        },
    }
}

pub fn sample_targets() -> SignedPayload<TargetsRole> {
    let mut hashes = HashMap::new();
    hashes.insert("sha256".to_string(), CHECKSUM.to_string());
    let mut targets = HashMap::new();
    targets.insert(
        "launcher-1.4.2.bin".to_string(),
        TargetItem {
            length: 8443,
            hashes,
            custom: None,
        },
    );
    SignedPayload {
        signatures: vec![signature()],
        signed: TargetsRole {
            typ: RoleType::Targets,
            expires: "2027-01-01T00:00:00Z".parse().unwrap(),
            version: 3,
            targets,
        },
    }
}

pub fn sample_key_pair() -> TufKeyPair {
    TufKeyPair {
        pubkey: TufKey {
            keytype: KeyType::Ed25519,
            keyval: PublicKeyValue {
                public: "MCowBQYDK2VwAyEAn7kQ0t4PviOXJpyZ".to_string(),
            },
        },
        privkey: TufPrivateKey {
            keytype: KeyType::Ed25519,
            keyval: PrivateKeyValue {
                private: "MC4CAQAwBQYDK2VwBCIEIGxLdDO7pUvH".to_string(),
            },
        },
    }
}
