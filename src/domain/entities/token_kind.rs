use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Purpose of a signed session token.
///
/// Both kinds are signed with the same key, so the kind claim is the only thing
/// that keeps a refresh token from being accepted where an access token is expected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}
