//! Sender/Carrier Classifier (C4, §4.4). Pattern-driven over sender domain
//! and local-part; no side effects, no network. A null identity returns
//! `{other, null}`.

use crate::kinds::SenderCategory;

/// Weighted keyword entries per category, checked against the sender
/// identity's lowercased domain + local-part.
struct ClassifierRule {
    category: SenderCategory,
    keywords: &'static [&'static str],
    /// When this rule wins, the identified carrier name (if the category is
    /// `carrier`); `None` for non-carrier categories.
    carrier_name: Option<&'static str>,
}

static RULES: &[ClassifierRule] = &[
    ClassifierRule { category: SenderCategory::Carrier, keywords: &["maersk"], carrier_name: Some("Maersk") },
    ClassifierRule { category: SenderCategory::Carrier, keywords: &["cma-cgm", "cmacgm", "cma cgm"], carrier_name: Some("CMA CGM") },
    ClassifierRule { category: SenderCategory::Carrier, keywords: &["hapag-lloyd", "hapaglloyd"], carrier_name: Some("Hapag-Lloyd") },
    ClassifierRule { category: SenderCategory::Carrier, keywords: &["msc.com", "mscgva"], carrier_name: Some("MSC") },
    ClassifierRule { category: SenderCategory::Carrier, keywords: &["one-line", "oneline"], carrier_name: Some("ONE") },
    ClassifierRule { category: SenderCategory::Carrier, keywords: &["evergreen-line", "evergreen"], carrier_name: Some("Evergreen") },
    ClassifierRule { category: SenderCategory::Carrier, keywords: &["coscoshipping", "cosco"], carrier_name: Some("COSCO") },
    ClassifierRule {
        category: SenderCategory::FreightForwarder,
        keywords: &["forwarder", "logistics", "freight", "cargo-partner", "kuehne", "dhl-global"],
        carrier_name: None,
    },
    ClassifierRule {
        category: SenderCategory::CustomsBroker,
        keywords: &["customs", "broker", "clearance"],
        carrier_name: None,
    },
    ClassifierRule { category: SenderCategory::Terminal, keywords: &["terminal", "port-authority", "apmterminals"], carrier_name: None },
    ClassifierRule { category: SenderCategory::Trucking, keywords: &["trucking", "drayage", "intermodal"], carrier_name: None },
    ClassifierRule { category: SenderCategory::Rail, keywords: &["rail", "railway", "bnsf", "unionpacific"], carrier_name: None },
    ClassifierRule { category: SenderCategory::Shipper, keywords: &["shipper", "exporter"], carrier_name: None },
    ClassifierRule { category: SenderCategory::Consignee, keywords: &["consignee", "importer"], carrier_name: None },
    ClassifierRule {
        category: SenderCategory::InternalRelay,
        keywords: &["internal-relay", "notifications@ops", "noreply-relay"],
        carrier_name: None,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub sender_category: SenderCategory,
    pub carrier: Option<String>,
}

/// Classifies a sender identity (§4.4). When the classifier resolves to
/// `internal_relay`, it MUST prefer `original_sender_identity` for the
/// carrier resolution per §4.4; the caller re-invokes with that identity
/// and keeps `internal_relay` as the category, which [`classify`] handles
/// directly when `original_sender_identity` is supplied.
pub fn classify(sender_identity: Option<&str>, original_sender_identity: Option<&str>) -> Classification {
    let Some(identity) = sender_identity else {
        return Classification { sender_category: SenderCategory::Other, carrier: None };
    };
    let lowered = identity.to_ascii_lowercase();

    let mut best: Option<(&ClassifierRule, usize)> = None;
    for rule in RULES {
        let score = rule.keywords.iter().filter(|kw| lowered.contains(**kw)).count();
        if score == 0 {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((rule, score)),
        }
    }

    let Some((rule, _)) = best else {
        return Classification { sender_category: SenderCategory::Other, carrier: None };
    };

    if rule.category == SenderCategory::InternalRelay {
        // Prefer the original sender identity when resolving the carrier
        // behind an internal relay (§4.4).
        let carrier = original_sender_identity.and_then(|original| classify_carrier_only(original));
        return Classification { sender_category: SenderCategory::InternalRelay, carrier };
    }

    Classification { sender_category: rule.category, carrier: rule.carrier_name.map(|s| s.to_string()) }
}

fn classify_carrier_only(identity: &str) -> Option<String> {
    let lowered = identity.to_ascii_lowercase();
    RULES
        .iter()
        .filter(|r| r.category == SenderCategory::Carrier)
        .find(|r| r.keywords.iter().any(|kw| lowered.contains(kw)))
        .and_then(|r| r.carrier_name.map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_identity_returns_other() {
        let result = classify(None, None);
        assert_eq!(result.sender_category, SenderCategory::Other);
        assert_eq!(result.carrier, None);
    }

    #[test]
    fn maersk_domain_classifies_as_carrier() {
        let result = classify(Some("booking@maersk.com"), None);
        assert_eq!(result.sender_category, SenderCategory::Carrier);
        assert_eq!(result.carrier.as_deref(), Some("Maersk"));
    }

    #[test]
    fn cma_cgm_domain_classifies_as_carrier() {
        let result = classify(Some("notify@cma-cgm.com"), None);
        assert_eq!(result.carrier.as_deref(), Some("CMA CGM"));
    }

    #[test]
    fn internal_relay_prefers_original_sender_for_carrier() {
        let result = classify(Some("ops@internal-relay.corp"), Some("docs@hapag-lloyd.com"));
        assert_eq!(result.sender_category, SenderCategory::InternalRelay);
        assert_eq!(result.carrier.as_deref(), Some("Hapag-Lloyd"));
    }

    #[test]
    fn unmatched_identity_returns_other() {
        let result = classify(Some("someone@example.com"), None);
        assert_eq!(result.sender_category, SenderCategory::Other);
    }
}
