//! Connection aggregate: one authorization session with one institution.
//!
//! A connection is created when a user starts linking an institution,
//! becomes `linked` once the aggregator reports the requisition as
//! authorized, and ends in `suspended` (user disconnect) or
//! `expired`/`error` (aggregator-reported failure). Terminal states have
//! no outgoing transitions; reconnecting creates a fresh connection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a bank connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Authorization initiated; the user has not yet completed the bank flow.
    Created,
    /// Requisition authorized and internal accounts materialized.
    Linked,
    /// Disconnected by the user. Terminal.
    Suspended,
    /// The aggregator reported the requisition as expired. Terminal.
    Expired,
    /// The aggregator reported a failure during authorization. Terminal.
    Error,
}

impl ConnectionStatus {
    /// Whether the status still participates in the link flow.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Suspended | Self::Expired | Self::Error)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Linked => "linked",
            Self::Suspended => "suspended",
            Self::Expired => "expired",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "linked" => Ok(Self::Linked),
            "suspended" => Ok(Self::Suspended),
            "expired" => Ok(Self::Expired),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown connection status: {other}")),
        }
    }
}

/// One authorization session between a user and a banking institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub institution_id: String,
    pub institution_name: String,
    pub country_code: String,
    /// Aggregator-assigned requisition (session) identifier.
    pub requisition_id: String,
    pub status: ConnectionStatus,
    pub agreement_accepted_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to persist a new connection in `created` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConnection {
    pub user_id: Uuid,
    pub institution_id: String,
    pub institution_name: String,
    pub country_code: String,
    pub requisition_id: String,
}

/// Mint the opaque reference embedded in the aggregator's redirect.
///
/// The aggregator may hand this reference back instead of the requisition
/// id, so callback resolution must recognise the shape (see
/// [`parse_user_reference`]).
#[must_use]
pub fn mint_user_reference(user_id: Uuid, now: DateTime<Utc>) -> String {
    format!("user-{user_id}-{}", now.timestamp())
}

/// Extract the user id from a caller-minted `user-{uuid}-{digits}` reference.
///
/// Returns `None` when the value does not match the minted shape, which
/// lets the callback fall through to its "unknown reference" handling.
///
/// # Examples
/// ```
/// use backend::domain::parse_user_reference;
/// use uuid::Uuid;
///
/// let user = Uuid::new_v4();
/// let parsed = parse_user_reference(&format!("user-{user}-1700000000"));
/// assert_eq!(parsed, Some(user));
/// assert_eq!(parse_user_reference("req_123"), None);
/// ```
#[must_use]
pub fn parse_user_reference(reference: &str) -> Option<Uuid> {
    let rest = reference.strip_prefix("user-")?;
    let (uuid_part, timestamp_part) = rest.rsplit_once('-')?;
    if timestamp_part.is_empty() || !timestamp_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Uuid::parse_str(uuid_part).ok()
}
