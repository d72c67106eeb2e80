//! Concrete pattern catalog data (§4.1). Authored, not inferred; a version
//! bump is required whenever an entry here changes (§4.1 "Versioning").
//!
//! Every entry producing a bare numeric/alphanumeric candidate carries a
//! `negative_context` or is anchored by an adjacent label token, per §4.1's
//! guarantee that "no bare generic digit pattern exists without an anchor".
//! Phone-number and HS-code exclusion contexts are mandatory for
//! `booking_number` specifically, per the same section.

use std::sync::LazyLock;

use crate::catalog::{NormalizerId, PatternCatalog, PatternSpec, ValidatorId};
use crate::kinds::FieldKind;

pub const CATALOG_VERSION: u32 = 1;

/// Shared exclusion context for booking-number candidates: a phone-signature
/// line, or an adjacent HS code label (§4.1).
const BOOKING_EXCLUSION: &str = r"(?i)(ph\.?:?\s*\+?\d|tel\.?:?\s*\+?\d|hs\s*code)";

static PATTERN_SPECS: &[PatternSpec] = &[
    // --- Identifiers ---
    PatternSpec {
        pattern_id: "booking_hash",
        kind: FieldKind::BookingNumber,
        regex: r"(?i)BKG\s*#\s*([0-9]{6,10})",
        confidence_weight: 92,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::DigitsOnly,
        carrier_scope: &[],
        negative_context: Some(BOOKING_EXCLUSION),
    },
    PatternSpec {
        pattern_id: "booking_labeled",
        kind: FieldKind::BookingNumber,
        regex: r"(?i)booking\s*(?:no\.?|number|ref(?:erence)?)?\s*[:#]\s*([A-Z0-9]{6,12})",
        confidence_weight: 85,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: Some(BOOKING_EXCLUSION),
    },
    PatternSpec {
        pattern_id: "bl_labeled",
        kind: FieldKind::BlNumber,
        regex: r"(?i)b/?l\s*(?:no\.?|number)?\s*[:#]\s*([A-Z0-9]{6,15})",
        confidence_weight: 82,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "mbl_labeled",
        kind: FieldKind::MblNumber,
        regex: r"(?i)m(?:aster)?\s*b/?l\s*(?:no\.?|number)?\s*[:#]\s*([A-Z0-9]{6,15})",
        confidence_weight: 88,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "hbl_labeled",
        kind: FieldKind::HblNumber,
        regex: r"(?i)h(?:ouse)?\s*b/?l\s*(?:no\.?|number)?\s*[:#]\s*([A-Z0-9]{6,15})",
        confidence_weight: 88,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "container_iso6346_shape",
        kind: FieldKind::ContainerNumber,
        regex: r"\b([A-Z]{4}[0-9]{7})\b",
        confidence_weight: 80,
        validator_id: ValidatorId::ContainerCheckDigit,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "seal_labeled",
        kind: FieldKind::SealNumber,
        regex: r"(?i)seal\s*(?:no\.?|number|#)?\s*[:#]\s*([A-Z0-9]{5,11})",
        confidence_weight: 82,
        validator_id: ValidatorId::SealNumber,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "entry_number_labeled",
        kind: FieldKind::EntryNumber,
        regex: r"(?i)entry\s*(?:no\.?|number)?\s*[:#]\s*([0-9]{3}-?[0-9]{7}-?[0-9])",
        confidence_weight: 80,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::DigitsOnly,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "in_transit_labeled",
        kind: FieldKind::InTransitNumber,
        regex: r"(?i)in-?transit\s*(?:no\.?|number|#)?\s*[:#]?\s*([0-9]{8,12})",
        confidence_weight: 75,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::DigitsOnly,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "isf_labeled",
        kind: FieldKind::IsfNumber,
        regex: r"(?i)isf\s*(?:no\.?|number)?\s*[:#]\s*([0-9]{10,12})",
        confidence_weight: 80,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::DigitsOnly,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "ams_labeled",
        kind: FieldKind::AmsNumber,
        regex: r"(?i)ams\s*(?:no\.?|number)?\s*[:#]\s*([A-Z0-9]{9,12})",
        confidence_weight: 78,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "hs_code_labeled",
        kind: FieldKind::HsCode,
        regex: r"(?i)hs\s*code\s*[:#]?\s*([0-9]{4}\.?[0-9]{2}\.?[0-9]{0,4})",
        confidence_weight: 85,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::DigitsOnly,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "invoice_labeled",
        kind: FieldKind::InvoiceNumber,
        regex: r"(?i)invoice\s*(?:no\.?|number|#)?\s*[:#]\s*([A-Z0-9-]{4,15})",
        confidence_weight: 80,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    // --- Routing ---
    PatternSpec {
        pattern_id: "carrier_labeled",
        kind: FieldKind::Carrier,
        regex: r"(?i)carrier\s*[:#]\s*([A-Za-z][A-Za-z .&-]{2,30})",
        confidence_weight: 70,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "vessel_labeled",
        kind: FieldKind::VesselName,
        regex: r"(?i)vessel\s*(?:name)?\s*[:#]\s*([A-Z][A-Za-z .-]{2,40})",
        confidence_weight: 75,
        validator_id: ValidatorId::VesselName,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "voyage_labeled",
        kind: FieldKind::VoyageNumber,
        regex: r"(?i)voyage\s*(?:no\.?|number)?\s*[:#]\s*([A-Z0-9]{3,12})",
        confidence_weight: 75,
        validator_id: ValidatorId::VoyageNumber,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "port_of_loading_labeled",
        kind: FieldKind::PortOfLoading,
        regex: r"(?i)port\s*of\s*loading\s*[:#]\s*([A-Z][A-Za-z ,.-]{2,40})",
        confidence_weight: 75,
        validator_id: ValidatorId::PortName,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "pol_code_labeled",
        kind: FieldKind::PortOfLoadingCode,
        regex: r"(?i)pol\s*(?:code)?\s*[:#]\s*([A-Z]{5})",
        confidence_weight: 78,
        validator_id: ValidatorId::UnLocode,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "port_of_discharge_labeled",
        kind: FieldKind::PortOfDischarge,
        regex: r"(?i)port\s*of\s*discharge\s*[:#]\s*([A-Z][A-Za-z ,.-]{2,40})",
        confidence_weight: 75,
        validator_id: ValidatorId::PortName,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "pod_code_labeled",
        kind: FieldKind::PortOfDischargeCode,
        regex: r"(?i)pod\s*(?:code)?\s*[:#]\s*([A-Z]{5})",
        confidence_weight: 78,
        validator_id: ValidatorId::UnLocode,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "place_of_receipt_labeled",
        kind: FieldKind::PlaceOfReceipt,
        regex: r"(?i)place\s*of\s*receipt\s*[:#]\s*([A-Z][A-Za-z ,.-]{2,40})",
        confidence_weight: 70,
        validator_id: ValidatorId::PortName,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "place_of_delivery_labeled",
        kind: FieldKind::PlaceOfDelivery,
        regex: r"(?i)place\s*of\s*delivery\s*[:#]\s*([A-Z][A-Za-z ,.-]{2,40})",
        confidence_weight: 70,
        validator_id: ValidatorId::PortName,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "inland_location_labeled",
        kind: FieldKind::InlandLocation,
        regex: r"(?i)inland\s*(?:location|point)\s*[:#]\s*([A-Z][A-Za-z ,.-]{2,40})",
        confidence_weight: 65,
        validator_id: ValidatorId::PortName,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    // --- Dates ---
    PatternSpec {
        pattern_id: "etd_labeled",
        kind: FieldKind::Etd,
        regex: r"(?i)etd\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 85,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "eta_labeled",
        kind: FieldKind::Eta,
        regex: r"(?i)eta\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 85,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "si_cutoff_labeled",
        kind: FieldKind::SiCutoff,
        regex: r"(?i)si\s*cut-?off\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 82,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "vgm_cutoff_labeled",
        kind: FieldKind::VgmCutoff,
        regex: r"(?i)vgm\s*cut-?off\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 82,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "cargo_cutoff_labeled",
        kind: FieldKind::CargoCutoff,
        regex: r"(?i)cargo\s*cut-?off\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 82,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "gate_cutoff_labeled",
        kind: FieldKind::GateCutoff,
        regex: r"(?i)gate\s*cut-?off\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 80,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "doc_cutoff_labeled",
        kind: FieldKind::DocCutoff,
        regex: r"(?i)doc(?:umentation)?\s*cut-?off\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 80,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "on_board_date_labeled",
        kind: FieldKind::ShippedOnBoardDate,
        regex: r"(?i)(?:on\s*board|shipped\s*on\s*board)\s*(?:date)?\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 82,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "last_free_day_labeled",
        kind: FieldKind::LastFreeDay,
        regex: r"(?i)last\s*free\s*day\s*[:#]?\s*(\d{4}-\d{2}-\d{2})",
        confidence_weight: 80,
        validator_id: ValidatorId::Date,
        normalizer_id: NormalizerId::Date,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "free_time_days_labeled",
        kind: FieldKind::FreeTimeDays,
        regex: r"(?i)free\s*time\s*[:#]?\s*(\d{1,3})\s*days",
        confidence_weight: 70,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::DigitsOnly,
        carrier_scope: &[],
        negative_context: None,
    },
    // --- Cargo ---
    PatternSpec {
        pattern_id: "commodity_labeled",
        kind: FieldKind::CommodityDescription,
        regex: r"(?i)commodity\s*(?:description)?\s*[:#]\s*([A-Za-z0-9 ,.'-]{3,80})",
        confidence_weight: 65,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "package_count_unit_anchored",
        kind: FieldKind::PackageCount,
        regex: r"(?i)(\d{1,6})\s*(?:pkgs?|packages|cartons|pallets)\b",
        confidence_weight: 70,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::DigitsOnly,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "gross_weight_labeled",
        kind: FieldKind::GrossWeight,
        regex: r"(?i)gross\s*weight\s*[:#]\s*([\d,]+\.?\d*\s*(?:kgs?|mt|lbs?))",
        confidence_weight: 75,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::WeightKg,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "net_weight_labeled",
        kind: FieldKind::NetWeight,
        regex: r"(?i)net\s*weight\s*[:#]\s*([\d,]+\.?\d*\s*(?:kgs?|mt|lbs?))",
        confidence_weight: 75,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::WeightKg,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "volume_labeled",
        kind: FieldKind::Volume,
        regex: r"(?i)(?:volume|measurement)\s*[:#]\s*([\d,]+\.?\d*\s*(?:cbm|m3|cum))",
        confidence_weight: 72,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::VolumeCbm,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "container_type_shape",
        kind: FieldKind::ContainerType,
        regex: r"\b(20'?(?:GP|DC|RF|OT|FR)|40'?(?:GP|HC|DC|RF|OT|FR)|45'?HC)\b",
        confidence_weight: 78,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "temperature_labeled",
        kind: FieldKind::Temperature,
        regex: r"(?i)temp(?:erature)?\s*[:#]\s*(-?\d{1,3}\s*°?[CF])",
        confidence_weight: 70,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "incoterms_shape",
        kind: FieldKind::Incoterms,
        regex: r"\b(FOB|CIF|CFR|EXW|DDP|DDU|DAP|FCA|CPT|CIP)\b",
        confidence_weight: 75,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    // --- Financial ---
    PatternSpec {
        pattern_id: "amount_currency_anchored",
        kind: FieldKind::Amount,
        regex: r"\b((?:USD|EUR|GBP|CNY)\s*[\d,]+\.?\d{0,2})\b",
        confidence_weight: 70,
        validator_id: ValidatorId::Currency,
        normalizer_id: NormalizerId::Money,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "freight_terms_labeled",
        kind: FieldKind::FreightTerms,
        regex: r"(?i)freight\s*terms?\s*[:#]\s*(prepaid|collect)",
        confidence_weight: 75,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "demurrage_rate_labeled",
        kind: FieldKind::DemurrageRate,
        regex: r"(?i)demurrage\s*(?:rate)?\s*[:#]\s*(usd\s*[\d,.]+(?:/day)?)",
        confidence_weight: 68,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::Money,
        carrier_scope: &[],
        negative_context: None,
    },
    PatternSpec {
        pattern_id: "storage_rate_labeled",
        kind: FieldKind::StorageRate,
        regex: r"(?i)storage\s*(?:rate)?\s*[:#]\s*(usd\s*[\d,.]+(?:/day)?)",
        confidence_weight: 68,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::Money,
        carrier_scope: &[],
        negative_context: None,
    },
];

pub static CATALOG: LazyLock<PatternCatalog> = LazyLock::new(|| PatternCatalog::compile(CATALOG_VERSION, PATTERN_SPECS));
