//! Legislator records and the upstream member shape
//!
//! The congress.gov member payload is weakly structured: nearly every
//! field can be absent. `RawMember` models that shape with `Option`
//! fields throughout so a missing value is a mapped case, not a
//! runtime surprise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of the upstream member list
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MemberPage {
    #[serde(default)]
    pub members: Vec<RawMember>,
}

/// Upstream member record as returned by the congress.gov API
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMember {
    pub bioguide_id: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub party_history: Vec<RawPartyEntry>,
    pub state: Option<String>,
    pub terms: Vec<RawTerm>,
    pub url: Option<String>,
    pub depiction: Option<RawDepiction>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPartyEntry {
    pub party_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTerm {
    pub chamber: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDepiction {
    pub image_url: Option<String>,
}

/// Normalized legislator record, keyed by `bioguide_id`
#[derive(Debug, Clone, PartialEq)]
pub struct Legislator {
    pub bioguide_id: String,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub chamber: Option<String>,
    pub term_start_date: Option<String>,
    pub term_end_date: Option<String>,
    pub profile_url: Option<String>,
    pub image_url: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl Legislator {
    /// Map an upstream member record into the storage schema.
    ///
    /// Total over the raw shape except for the identity key: a record
    /// without a usable `bioguideId` cannot be reconciled and maps to
    /// `None`. Every other missing field maps to an absent value.
    ///
    /// Party is the current one (first party-history entry). Chamber
    /// and term start come from the first term on file, term end from
    /// the last, so the two dates bound the total service window.
    /// `last_updated` is stamped at mapping time, not taken from the
    /// upstream data.
    pub fn from_raw(raw: &RawMember) -> Option<Self> {
        let bioguide_id = raw
            .bioguide_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())?
            .to_string();

        Some(Self {
            bioguide_id,
            full_name: raw.full_name.clone(),
            first_name: raw.first_name.clone(),
            last_name: raw.last_name.clone(),
            party: raw
                .party_history
                .first()
                .and_then(|entry| entry.party_name.clone()),
            state: raw.state.clone(),
            chamber: raw.terms.first().and_then(|term| term.chamber.clone()),
            term_start_date: raw.terms.first().and_then(|term| term.start.clone()),
            term_end_date: raw.terms.last().and_then(|term| term.end.clone()),
            profile_url: raw.url.clone(),
            image_url: raw
                .depiction
                .as_ref()
                .and_then(|depiction| depiction.image_url.clone()),
            last_updated: Utc::now(),
        })
    }
}
