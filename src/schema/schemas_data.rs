//! Concrete document schemas (§3, §4.5). One entry per `document_type`;
//! each is `compile`d once behind a [`std::sync::LazyLock`] and looked up by
//! [`crate::schema::schema_for_document_type`].

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::catalog::{NormalizerId, ValidatorId};
use crate::kinds::{FieldKind, PartyRole};
use crate::schema::schema::{
    CarrierVariationSpec, CompiledDocumentSchema, DocumentSchemaSpec, FieldSpec, PartyFieldSpec, SectionSpec,
};

pub const SCHEMA_SET_VERSION: u32 = 1;

static BOOKING_CONFIRMATION: DocumentSchemaSpec = DocumentSchemaSpec {
    document_type: "booking_confirmation",
    display_name: "Booking Confirmation",
    category: "booking",
    sections: &[],
    fields: &[
        FieldSpec {
            name: "booking_number",
            kind: FieldKind::BookingNumber,
            required: true,
            label_patterns: &[r"(?i)booking\s*(?:no\.?|number)\s*:"],
            value_patterns: &[r"[A-Z0-9]{5,12}"],
            section: None,
            validator_id: ValidatorId::None,
            normalizer_id: NormalizerId::UppercaseTrim,
        },
        FieldSpec {
            name: "vessel_name",
            kind: FieldKind::VesselName,
            required: false,
            label_patterns: &[r"(?i)vessel\s*:"],
            value_patterns: &[r"[A-Z][A-Za-z .]{2,40}"],
            section: None,
            validator_id: ValidatorId::VesselName,
            normalizer_id: NormalizerId::UppercaseTrim,
        },
        FieldSpec {
            name: "voyage_number",
            kind: FieldKind::VoyageNumber,
            required: false,
            label_patterns: &[r"(?i)voyage\s*:"],
            value_patterns: &[r"[A-Z0-9]{3,12}"],
            section: None,
            validator_id: ValidatorId::VoyageNumber,
            normalizer_id: NormalizerId::UppercaseTrim,
        },
    ],
    party_fields: &[],
    tables: &[],
    carrier_variations: &[CarrierVariationSpec {
        carrier: "CMA CGM",
        // §8 S4: "CMA CGM VERDI / 0INLRW1MA Vessel/Voyage:" — vessel and
        // voyage share one combined label that follows both values.
        fields: &[
            FieldSpec {
                name: "vessel_name",
                kind: FieldKind::VesselName,
                required: false,
                label_patterns: &[r"(?i)([A-Z][A-Za-z .]{2,30})\s*/\s*[A-Z0-9]{3,12}\s*Vessel/Voyage:"],
                value_patterns: &[],
                section: None,
                validator_id: ValidatorId::VesselName,
                normalizer_id: NormalizerId::UppercaseTrim,
            },
            FieldSpec {
                name: "voyage_number",
                kind: FieldKind::VoyageNumber,
                required: false,
                label_patterns: &[r"(?i)[A-Z][A-Za-z .]{2,30}\s*/\s*([A-Z0-9]{3,12})\s*Vessel/Voyage:"],
                value_patterns: &[],
                section: None,
                validator_id: ValidatorId::VoyageNumber,
                normalizer_id: NormalizerId::UppercaseTrim,
            },
        ],
        party_fields: &[],
    }],
};

static ARRIVAL_NOTICE: DocumentSchemaSpec = DocumentSchemaSpec {
    document_type: "arrival_notice",
    display_name: "Arrival Notice",
    category: "arrival",
    sections: &[],
    fields: &[
        FieldSpec {
            name: "bl_number",
            kind: FieldKind::BlNumber,
            required: true,
            label_patterns: &[r"(?i)b/?l\s*(?:no\.?|number)\s*:"],
            value_patterns: &[r"[A-Z0-9]{6,15}"],
            section: None,
            validator_id: ValidatorId::None,
            normalizer_id: NormalizerId::UppercaseTrim,
        },
        FieldSpec {
            name: "eta",
            kind: FieldKind::Eta,
            required: true,
            label_patterns: &[r"(?i)eta\s*:"],
            value_patterns: &[r"\d{4}-\d{2}-\d{2}"],
            section: None,
            validator_id: ValidatorId::Date,
            normalizer_id: NormalizerId::Date,
        },
        FieldSpec {
            name: "last_free_day",
            kind: FieldKind::LastFreeDay,
            required: false,
            label_patterns: &[r"(?i)last\s*free\s*day\s*:"],
            value_patterns: &[r"\d{4}-\d{2}-\d{2}"],
            section: None,
            validator_id: ValidatorId::Date,
            normalizer_id: NormalizerId::Date,
        },
    ],
    party_fields: &[],
    tables: &[],
    carrier_variations: &[],
};

static HBL: DocumentSchemaSpec = DocumentSchemaSpec {
    document_type: "hbl",
    display_name: "House Bill of Lading",
    category: "bill_of_lading",
    sections: &[
        SectionSpec {
            name: "parties",
            start_markers: &[r"(?im)^shipper\s*:?\s*$"],
            end_markers: &[r"(?im)^description of goods"],
        },
    ],
    fields: &[
        FieldSpec {
            name: "hbl_number",
            kind: FieldKind::HblNumber,
            required: true,
            label_patterns: &[r"(?i)h(?:ouse)?\s*b/?l\s*(?:no\.?|number)\s*:"],
            value_patterns: &[r"[A-Z0-9]{6,15}"],
            section: None,
            validator_id: ValidatorId::None,
            normalizer_id: NormalizerId::UppercaseTrim,
        },
    ],
    party_fields: &[
        PartyFieldSpec { role: PartyRole::Shipper, label_patterns: &[r"(?im)^shipper\s*:?\s*$"], section: Some("parties") },
        PartyFieldSpec { role: PartyRole::Consignee, label_patterns: &[r"(?im)^consignee\s*:?\s*$"], section: None },
        PartyFieldSpec {
            role: PartyRole::NotifyParty,
            label_patterns: &[r"(?im)^notify\s*party\s*:?\s*$"],
            section: None,
        },
    ],
    tables: &[],
    carrier_variations: &[],
};

static MBL: DocumentSchemaSpec = DocumentSchemaSpec {
    document_type: "mbl",
    display_name: "Master Bill of Lading",
    category: "bill_of_lading",
    sections: &[],
    fields: &[
        FieldSpec {
            name: "mbl_number",
            kind: FieldKind::MblNumber,
            required: true,
            label_patterns: &[r"(?i)m(?:aster)?\s*b/?l\s*(?:no\.?|number)\s*:"],
            value_patterns: &[r"[A-Z0-9]{6,15}"],
            section: None,
            validator_id: ValidatorId::None,
            normalizer_id: NormalizerId::UppercaseTrim,
        },
    ],
    party_fields: &[],
    tables: &[],
    carrier_variations: &[],
};

static COMMERCIAL_INVOICE: DocumentSchemaSpec = DocumentSchemaSpec {
    document_type: "commercial_invoice",
    display_name: "Commercial Invoice",
    category: "invoice",
    sections: &[],
    fields: &[
        FieldSpec {
            name: "invoice_number",
            kind: FieldKind::InvoiceNumber,
            required: true,
            label_patterns: &[r"(?i)invoice\s*(?:no\.?|number)\s*:"],
            value_patterns: &[r"[A-Z0-9-]{4,15}"],
            section: None,
            validator_id: ValidatorId::None,
            normalizer_id: NormalizerId::UppercaseTrim,
        },
        FieldSpec {
            name: "incoterms",
            kind: FieldKind::Incoterms,
            required: false,
            label_patterns: &[r"(?i)incoterms?\s*:"],
            value_patterns: &[r"[A-Z]{3}"],
            section: None,
            validator_id: ValidatorId::None,
            normalizer_id: NormalizerId::UppercaseTrim,
        },
    ],
    party_fields: &[
        PartyFieldSpec { role: PartyRole::Buyer, label_patterns: &[r"(?im)^buyer\s*:?\s*$"], section: None },
        PartyFieldSpec { role: PartyRole::Seller, label_patterns: &[r"(?im)^seller\s*:?\s*$"], section: None },
    ],
    tables: &[crate::schema::schema::TableSpec {
        name: "line_items",
        header_patterns: &[r"(?i)description\s+quantity\s+unit price\s+amount"],
        columns: &[
            crate::schema::schema::ColumnSpec { name: "description", kind: FieldKind::CommodityDescription, header_patterns: &[] },
            crate::schema::schema::ColumnSpec { name: "quantity", kind: FieldKind::PackageCount, header_patterns: &[] },
            crate::schema::schema::ColumnSpec { name: "amount", kind: FieldKind::Amount, header_patterns: &[] },
        ],
    }],
    carrier_variations: &[],
};

static SHIPPING_INSTRUCTIONS: DocumentSchemaSpec = DocumentSchemaSpec {
    document_type: "si",
    display_name: "Shipping Instructions",
    category: "instructions",
    sections: &[],
    fields: &[FieldSpec {
        name: "booking_number",
        kind: FieldKind::BookingNumber,
        required: true,
        label_patterns: &[r"(?i)booking\s*(?:no\.?|number)\s*:"],
        value_patterns: &[r"[A-Z0-9]{5,12}"],
        section: None,
        validator_id: ValidatorId::None,
        normalizer_id: NormalizerId::UppercaseTrim,
    }],
    party_fields: &[
        PartyFieldSpec { role: PartyRole::Shipper, label_patterns: &[r"(?im)^shipper\s*:?\s*$"], section: None },
        PartyFieldSpec { role: PartyRole::Consignee, label_patterns: &[r"(?im)^consignee\s*:?\s*$"], section: None },
        PartyFieldSpec {
            role: PartyRole::NotifyParty,
            label_patterns: &[r"(?im)^notify\s*party\s*:?\s*$"],
            section: None,
        },
    ],
    tables: &[],
    carrier_variations: &[],
};

static BOOKING_CONFIRMATION_COMPILED: LazyLock<CompiledDocumentSchema> =
    LazyLock::new(|| CompiledDocumentSchema::compile(&BOOKING_CONFIRMATION));
static ARRIVAL_NOTICE_COMPILED: LazyLock<CompiledDocumentSchema> = LazyLock::new(|| CompiledDocumentSchema::compile(&ARRIVAL_NOTICE));
static HBL_COMPILED: LazyLock<CompiledDocumentSchema> = LazyLock::new(|| CompiledDocumentSchema::compile(&HBL));
static MBL_COMPILED: LazyLock<CompiledDocumentSchema> = LazyLock::new(|| CompiledDocumentSchema::compile(&MBL));
static COMMERCIAL_INVOICE_COMPILED: LazyLock<CompiledDocumentSchema> =
    LazyLock::new(|| CompiledDocumentSchema::compile(&COMMERCIAL_INVOICE));
static SHIPPING_INSTRUCTIONS_COMPILED: LazyLock<CompiledDocumentSchema> =
    LazyLock::new(|| CompiledDocumentSchema::compile(&SHIPPING_INSTRUCTIONS));

static SCHEMA_REGISTRY: LazyLock<HashMap<&'static str, &'static LazyLock<CompiledDocumentSchema>>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("booking_confirmation", &BOOKING_CONFIRMATION_COMPILED);
    map.insert("arrival_notice", &ARRIVAL_NOTICE_COMPILED);
    map.insert("hbl", &HBL_COMPILED);
    map.insert("mbl", &MBL_COMPILED);
    map.insert("commercial_invoice", &COMMERCIAL_INVOICE_COMPILED);
    map.insert("si", &SHIPPING_INSTRUCTIONS_COMPILED);
    map
});

/// Looks up the compiled schema for `document_type` (§3 "selected by
/// `document_type`"). `None` means the type is unrecognized — C5 is skipped
/// and the orchestrator flags `SchemaMismatch` (§7).
pub fn schema_for_document_type(document_type: &str) -> Option<&'static CompiledDocumentSchema> {
    SCHEMA_REGISTRY.get(document_type).map(|lazy| &**lazy)
}

/// Exposed for schema-engine unit tests.
pub fn booking_confirmation_schema() -> &'static CompiledDocumentSchema {
    &BOOKING_CONFIRMATION_COMPILED
}
