//! The HTTP surface: endpoint table, request parsing, response building,
//! and the handlers themselves.

pub mod handlers;
pub mod requests;
pub mod responses;

/// The log's endpoints, named as they appear in URLs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    AddEntry,
    AddCosignature,
    GetLatestSth,
    GetStableSth,
    GetCosignedSth,
    GetProofByHash,
    GetConsistencyProof,
    GetEntries,
    GetAnchors,
}

impl Endpoint {
    pub const ALL: [Endpoint; 9] = [
        Endpoint::AddEntry,
        Endpoint::AddCosignature,
        Endpoint::GetLatestSth,
        Endpoint::GetStableSth,
        Endpoint::GetCosignedSth,
        Endpoint::GetProofByHash,
        Endpoint::GetConsistencyProof,
        Endpoint::GetEntries,
        Endpoint::GetAnchors,
    ];

    /// The endpoint's URL segment.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::AddEntry => "add-entry",
            Endpoint::AddCosignature => "add-cosignature",
            Endpoint::GetLatestSth => "get-latest-sth",
            Endpoint::GetStableSth => "get-stable-sth",
            Endpoint::GetCosignedSth => "get-cosigned-sth",
            Endpoint::GetProofByHash => "get-proof-by-hash",
            Endpoint::GetConsistencyProof => "get-consistency-proof",
            Endpoint::GetEntries => "get-entries",
            Endpoint::GetAnchors => "get-anchors",
        }
    }

    /// The endpoint's path under a log prefix.
    pub fn path(self, prefix: &str) -> String {
        format!("/{}/{}", prefix, self.name())
    }

    /// Whether the endpoint takes POST (all others take GET).
    pub fn is_post(self) -> bool {
        matches!(self, Endpoint::AddEntry | Endpoint::AddCosignature)
    }
}
