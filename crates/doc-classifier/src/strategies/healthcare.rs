//! Healthcare documents: records, prescriptions, labs, bills, imaging

use once_cell::sync::Lazy;

use super::{any_match, compile, header_overlap, KeywordCatalog, PatternGroup, RuleContext};

pub const DOCUMENT_TYPES: &[&str] = &[
    "medical_record",
    "prescription",
    "lab_report",
    "medical_bill",
    "insurance_claim",
    "medical_imaging",
    "discharge_summary",
    "vaccination_record",
];

pub const KEYWORDS: KeywordCatalog = &[
    (
        "medical_record",
        &[
            "patient history",
            "vital signs",
            "medical record number",
            "chief complaint",
            "diagnosis",
            "treatment plan",
            "allergies",
            "medications",
            "physical examination",
            "medical history",
            "family history",
            "social history",
        ],
    ),
    (
        "prescription",
        &[
            "rx",
            "prescribe",
            "dosage",
            "refill",
            "pharmacy",
            "sig",
            "dispense",
            "prescription",
            "medication",
            "take as directed",
            "tablets",
            "capsules",
        ],
    ),
    (
        "lab_report",
        &[
            "lab results",
            "test date",
            "reference range",
            "specimen",
            "laboratory",
            "collected",
            "test name",
            "values",
            "units",
            "normal range",
            "analysis",
            "methodology",
        ],
    ),
    (
        "medical_bill",
        &[
            "amount due",
            "service date",
            "billing code",
            "charges",
            "insurance",
            "payment",
            "cpt code",
            "provider",
            "itemized charges",
            "adjustment",
            "balance",
            "due date",
        ],
    ),
    (
        "insurance_claim",
        &[
            "claim number",
            "policy number",
            "coverage",
            "insured",
            "benefits",
            "authorization",
            "provider",
            "diagnosis code",
            "icd code",
            "subscriber",
            "group number",
            "pre-authorization",
        ],
    ),
    (
        "medical_imaging",
        &[
            "radiology",
            "imaging",
            "scan",
            "x-ray",
            "mri",
            "ct scan",
            "ultrasound",
            "impression",
            "technique",
            "contrast",
            "findings",
            "comparison",
        ],
    ),
    (
        "discharge_summary",
        &[
            "discharge date",
            "admission date",
            "hospital course",
            "follow up",
            "discharge diagnosis",
            "medications",
            "condition",
            "disposition",
            "follow-up care",
            "discharge instructions",
            "admission diagnosis",
            "hospital stay",
        ],
    ),
    (
        "vaccination_record",
        &[
            "vaccine",
            "immunization",
            "dose",
            "vaccination date",
            "lot number",
            "administered",
            "next due date",
            "manufacturer",
            "injection site",
            "vaccine type",
            "immunity",
            "booster",
        ],
    ),
];

/// Protected health information markers (SSN, MRN, DOB, name, contact)
static PHI: PatternGroup = Lazy::new(|| {
    compile(&[
        r"\b\d{3}-\d{2}-\d{4}\b",
        r"\b(MRN|Medical Record Number):\s*\d+\b",
        r"\bDOB:\s*\d{1,2}/\d{1,2}/\d{2,4}\b",
        r"\b(patient|name):\s*[A-Za-z\s,]+\b",
        r"\b(address|phone|email):\s*.+\b",
    ])
});

static LAB: PatternGroup = Lazy::new(|| {
    compile(&[
        r"(test|lab)\s+results?",
        r"reference\s+range",
        r"specimen\s+(collected|type)",
        r"normal\s+range",
        r"\b(high|low)\b.*\b(value|result)\b",
        r"laboratory\s+report",
        r"collection\s+date",
        r"test\s+performed",
    ])
});

static PRESCRIPTION: PatternGroup = Lazy::new(|| {
    compile(&[
        r"\brx\b",
        r"take\s+\d+\s+(tablet|capsule)",
        r"refills?:\s*\d+",
        r"sig:",
        r"dispense:\s*\d+",
        r"prescribed\s+by",
        r"pharmacy",
        r"medication\s+order",
    ])
});

static IMAGING: PatternGroup = Lazy::new(|| {
    compile(&[
        r"(radiology|imaging)\s+report",
        r"(mri|ct|x-ray|ultrasound)\s+findings",
        r"impression:",
        r"technique:",
        r"contrast(\s+material)?:",
        r"comparison:",
        r"anatomic\s+region",
    ])
});

static DISCHARGE: PatternGroup = Lazy::new(|| {
    compile(&[
        r"discharge\s+summary",
        r"admission\s+date",
        r"discharge\s+date",
        r"hospital\s+course",
        r"follow\s+up",
        r"discharge\s+medications",
        r"discharge\s+diagnosis",
        r"discharge\s+instructions",
    ])
});

static VACCINATION: PatternGroup = Lazy::new(|| {
    compile(&[
        r"vaccine\s+record",
        r"immunization\s+history",
        r"(vaccine|immunization)\s+administered",
        r"lot\s+number",
        r"next\s+dose\s+due",
        r"vaccination\s+site",
        r"dose\s+(\d+|series)",
    ])
});

static BILLING: PatternGroup = Lazy::new(|| {
    compile(&[
        r"bill(ing)?\s+statement",
        r"amount\s+due",
        r"payment\s+due\s+date",
        r"insurance\s+claim",
        r"cpt\s+code",
        r"total\s+charges",
        r"patient\s+responsibility",
    ])
});

const LAB_HEADERS: &[&str] = &[
    "test",
    "result",
    "value",
    "range",
    "units",
    "reference",
    "normal",
    "specimen",
    "collection",
];

const VITAL_HEADERS: &[&str] = &[
    "temperature",
    "pulse",
    "blood pressure",
    "respiration",
    "height",
    "weight",
    "bmi",
    "oxygen",
    "pain",
];

const BILLING_HEADERS: &[&str] = &[
    "code",
    "description",
    "charge",
    "amount",
    "date",
    "service",
    "payment",
    "adjustment",
    "balance",
];

/// Rules in priority order; the first that fires decides the type
pub fn custom_rules(text: &str, context: &RuleContext<'_>) -> Result<Option<&'static str>, String> {
    if any_match(&PHI, "PHI", text)? {
        if any_match(&LAB, "lab", text)? {
            return Ok(Some("lab_report"));
        }
        if any_match(&PRESCRIPTION, "prescription", text)? {
            return Ok(Some("prescription"));
        }
        if any_match(&IMAGING, "imaging", text)? {
            return Ok(Some("medical_imaging"));
        }
    }

    if any_match(&DISCHARGE, "discharge", text)? {
        return Ok(Some("discharge_summary"));
    }
    if any_match(&VACCINATION, "vaccination", text)? {
        return Ok(Some("vaccination_record"));
    }
    if any_match(&BILLING, "billing", text)? {
        return Ok(Some("medical_bill"));
    }

    if header_overlap(context.tables, LAB_HEADERS, 3) {
        return Ok(Some("lab_report"));
    }
    if header_overlap(context.tables, VITAL_HEADERS, 3) {
        return Ok(Some("medical_record"));
    }
    if header_overlap(context.tables, BILLING_HEADERS, 3) {
        return Ok(Some("medical_bill"));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::IndustryStrategy;
    use crate::types::{ClassificationMethod, Table};

    fn rule(text: &str) -> Option<&'static str> {
        custom_rules(text, &RuleContext::default()).unwrap()
    }

    fn header_table(headers: &[&str]) -> Vec<Table> {
        vec![vec![
            headers.iter().map(|h| h.to_string()).collect(),
            headers.iter().map(|_| "1".to_string()).collect(),
        ]]
    }

    #[test]
    fn test_phi_gated_rules() {
        assert_eq!(rule("MRN: 445566 reference range 70-99"), Some("lab_report"));
        assert_eq!(rule("SSN 123-45-6789 Rx amoxicillin"), Some("prescription"));
        assert_eq!(rule("DOB: 1/2/1980 Impression: no acute findings"), Some("medical_imaging"));
    }

    #[test]
    fn test_lab_pattern_without_phi_falls_through() {
        assert_eq!(rule("reference range only"), None);
    }

    #[test]
    fn test_ungated_rules_in_order() {
        assert_eq!(rule("Discharge Summary and admission date"), Some("discharge_summary"));
        assert_eq!(rule("lot number AB12 booster"), Some("vaccination_record"));
        assert_eq!(rule("total charges 120.00"), Some("medical_bill"));
        // Discharge outranks billing
        assert_eq!(rule("amount due after hospital course"), Some("discharge_summary"));
    }

    #[test]
    fn test_table_rules() {
        let lab = header_table(&["Test", "Result", "Units", "Flag"]);
        assert_eq!(custom_rules("", &RuleContext::with_tables(&lab)).unwrap(), Some("lab_report"));

        let vitals = header_table(&["Temperature", "Pulse", "Blood Pressure"]);
        assert_eq!(
            custom_rules("", &RuleContext::with_tables(&vitals)).unwrap(),
            Some("medical_record")
        );

        let bill = header_table(&["Code", "Description", "Charge"]);
        assert_eq!(custom_rules("", &RuleContext::with_tables(&bill)).unwrap(), Some("medical_bill"));
    }

    #[test]
    fn test_keyword_fallback() {
        let text = "radiology imaging scan with ultrasound";
        let result = IndustryStrategy::Healthcare.classify(text, &RuleContext::default());
        assert_eq!(result.document_type, "medical_imaging");
        assert_eq!(result.method, ClassificationMethod::KeywordMatching);
        assert!((result.confidence_score - 4.0 / 12.0).abs() < 1e-12);
    }
}
