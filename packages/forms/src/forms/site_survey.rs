//! Site survey checklist
//!
//! Checklist answers are tri-state: `yes`, `no` or `n/a`, with an
//! unanswered item left empty.

use folio_record::{FieldSpec, FormSchema, SchemaBuilder, SchemaError};
use serde_json::{json, Map, Value};

pub const NAME: &str = "site-survey";

pub const ANSWERS: [&str; 3] = ["yes", "no", "n/a"];

const CHECKS: [(&str, &str); 8] = [
    ("power", "Power available"),
    ("water", "Water available"),
    ("vehicleAccess", "Vehicle access"),
    ("parking", "Parking"),
    ("storage", "Material storage area"),
    ("security", "Site secured"),
    ("neighbours", "Neighbours notified"),
    ("hazards", "Hazards identified"),
];

pub fn schema() -> Result<FormSchema, SchemaError> {
    let mut builder = SchemaBuilder::new(NAME)
        .title("Site Survey")
        .field(FieldSpec::text("siteAddress").label("Site Address"))
        .field(FieldSpec::date("surveyDate").label("Survey Date"))
        .field(FieldSpec::text("surveyor").label("Surveyor"));

    let mut template = Map::new();
    for (key, label) in CHECKS {
        builder = builder.field(
            FieldSpec::text(format!("checks.{key}"))
                .label(label)
                .allowed(ANSWERS.iter().copied().chain([""])),
        );
        template.insert(key.to_string(), json!(""));
    }

    builder
        .field(FieldSpec::text("notes").label("Notes"))
        .template(json!({ "checks": Value::Object(template) }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_record::{FieldPath, Scalar};

    #[test]
    fn test_checks_accept_tri_state_answers() {
        let schema = schema().unwrap();
        let power = schema.descriptor_for(&FieldPath::parse("checks.power").unwrap()).unwrap();
        assert!(power.allows(&Scalar::text("n/a")));
        assert!(power.allows(&Scalar::text("")));
        assert!(!power.allows(&Scalar::text("maybe")));
    }
}
