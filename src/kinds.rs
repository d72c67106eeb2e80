//! The closed set of entity kinds, party roles, and small closed-set enums
//! used throughout the engine (§3 DATA MODEL, §4.4 classifier categories).
//!
//! Representing entity kinds as a tagged sum (rather than a `String`) means
//! any new kind requires a catalog bump and a match-arm update everywhere —
//! the compiler enforces exhaustiveness instead of a runtime lookup failing
//! silently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kinds recognized by the engine (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    // Identifiers
    BookingNumber,
    BlNumber,
    MblNumber,
    HblNumber,
    ContainerNumber,
    SealNumber,
    EntryNumber,
    InTransitNumber,
    IsfNumber,
    AmsNumber,
    HsCode,
    InvoiceNumber,

    // Routing
    Carrier,
    VesselName,
    VoyageNumber,
    PortOfLoading,
    PortOfLoadingCode,
    PortOfDischarge,
    PortOfDischargeCode,
    PlaceOfReceipt,
    PlaceOfDelivery,
    InlandLocation,

    // Dates
    Etd,
    Eta,
    SiCutoff,
    VgmCutoff,
    CargoCutoff,
    GateCutoff,
    DocCutoff,
    ShippedOnBoardDate,
    LastFreeDay,
    FreeTimeDays,

    // Cargo
    CommodityDescription,
    PackageCount,
    GrossWeight,
    NetWeight,
    Volume,
    ContainerType,
    Temperature,
    Incoterms,

    // Financial
    Amount,
    FreightTerms,
    DemurrageRate,
    StorageRate,
}

impl FieldKind {
    /// All kinds the catalog and schema engine must be able to produce.
    /// Used to bound §8 item 9's `total_field_count <= cardinality(kinds)`.
    pub const ALL: &'static [FieldKind] = &[
        FieldKind::BookingNumber,
        FieldKind::BlNumber,
        FieldKind::MblNumber,
        FieldKind::HblNumber,
        FieldKind::ContainerNumber,
        FieldKind::SealNumber,
        FieldKind::EntryNumber,
        FieldKind::InTransitNumber,
        FieldKind::IsfNumber,
        FieldKind::AmsNumber,
        FieldKind::HsCode,
        FieldKind::InvoiceNumber,
        FieldKind::Carrier,
        FieldKind::VesselName,
        FieldKind::VoyageNumber,
        FieldKind::PortOfLoading,
        FieldKind::PortOfLoadingCode,
        FieldKind::PortOfDischarge,
        FieldKind::PortOfDischargeCode,
        FieldKind::PlaceOfReceipt,
        FieldKind::PlaceOfDelivery,
        FieldKind::InlandLocation,
        FieldKind::Etd,
        FieldKind::Eta,
        FieldKind::SiCutoff,
        FieldKind::VgmCutoff,
        FieldKind::CargoCutoff,
        FieldKind::GateCutoff,
        FieldKind::DocCutoff,
        FieldKind::ShippedOnBoardDate,
        FieldKind::LastFreeDay,
        FieldKind::FreeTimeDays,
        FieldKind::CommodityDescription,
        FieldKind::PackageCount,
        FieldKind::GrossWeight,
        FieldKind::NetWeight,
        FieldKind::Volume,
        FieldKind::ContainerType,
        FieldKind::Temperature,
        FieldKind::Incoterms,
        FieldKind::Amount,
        FieldKind::FreightTerms,
        FieldKind::DemurrageRate,
        FieldKind::StorageRate,
    ];

    /// Array-valued kinds deduplicate by canonical form rather than
    /// replace-on-higher-confidence (§3 invariant 5).
    pub fn is_multi_valued(self) -> bool {
        matches!(self, FieldKind::ContainerNumber | FieldKind::SealNumber | FieldKind::Amount)
    }

    /// Whether this kind is stored as a calendar date.
    pub fn is_date(self) -> bool {
        matches!(
            self,
            FieldKind::Etd
                | FieldKind::Eta
                | FieldKind::SiCutoff
                | FieldKind::VgmCutoff
                | FieldKind::CargoCutoff
                | FieldKind::GateCutoff
                | FieldKind::DocCutoff
                | FieldKind::ShippedOnBoardDate
                | FieldKind::LastFreeDay
        )
    }

    /// Identifiers whose shape validation failure must drop the candidate
    /// outright (§3 invariant 6): booking, BL, container.
    pub fn is_critical_identifier(self) -> bool {
        matches!(
            self,
            FieldKind::BookingNumber
                | FieldKind::BlNumber
                | FieldKind::MblNumber
                | FieldKind::HblNumber
                | FieldKind::ContainerNumber
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| format!("{self:?}"));
        write!(f, "{s}")
    }
}

/// Party roles (§3 Parties). Each maps to a [`crate::record::PartyBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Shipper,
    Consignee,
    NotifyParty,
    ImporterOfRecord,
    Buyer,
    Seller,
    Manufacturer,
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| format!("{self:?}"));
        write!(f, "{s}")
    }
}

/// The method that produced a field extraction record (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Regex,
    RegexSubject,
    Schema,
    SchemaTable,
    Ai,
}

impl Method {
    /// Tie-break preference order (§3 invariant 4): schema > regex_subject >
    /// regex > ai. Lower is preferred.
    pub fn priority_rank(self) -> u8 {
        match self {
            Method::Schema | Method::SchemaTable => 0,
            Method::RegexSubject => 1,
            Method::Regex => 2,
            Method::Ai => 3,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Regex => "regex",
            Method::RegexSubject => "regex_subject",
            Method::Schema => "schema",
            Method::SchemaTable => "schema_table",
            Method::Ai => "ai",
        };
        write!(f, "{s}")
    }
}

/// Sender/carrier classification categories (§4.4). Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderCategory {
    Carrier,
    FreightForwarder,
    CustomsBroker,
    Terminal,
    Trucking,
    Rail,
    Shipper,
    Consignee,
    InternalRelay,
    Other,
}

impl Default for SenderCategory {
    fn default() -> Self {
        SenderCategory::Other
    }
}

/// Strategy recorded in metadata (§4.9 step 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    RegexOnly,
    RegexPlusAi,
    AiFallback,
}

/// Per-field quality verdict (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldVerdict {
    Correct,
    LikelyCorrect,
    Suspicious,
    Incorrect,
    Missing,
}

/// Record-level terminal verdict (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordVerdict {
    Approved,
    NeedsReview,
    Rejected,
}

/// Issue severity (§4.8, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}
