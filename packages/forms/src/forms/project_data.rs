//! Project data sheet: parties to the contract and key dates

use folio_record::{derive, FieldSpec, FormSchema, SchemaBuilder, SchemaError};

pub const NAME: &str = "project-data";

const PARTIES: [&str; 3] = ["owner", "architect", "contractor"];

pub fn schema() -> Result<FormSchema, SchemaError> {
    let mut builder = SchemaBuilder::new(NAME)
        .title("Project Data")
        .field(FieldSpec::text("projectName").label("Project"))
        .field(FieldSpec::text("projectNumber").label("Project No."))
        .field(FieldSpec::text("siteAddress").label("Site Address"));

    for party in PARTIES {
        builder = builder
            .field(FieldSpec::text(format!("{party}.name")))
            .field(FieldSpec::text(format!("{party}.phone")))
            .field(FieldSpec::text(format!("{party}.email")));
    }

    builder
        .field(FieldSpec::number("contractAmount").label("Contract Amount"))
        .field(FieldSpec::date("startDate").label("Start Date"))
        .field(FieldSpec::date("completionDate").label("Completion Date"))
        .field(
            FieldSpec::number("contractDays")
                .label("Contract Days")
                .derived(derive::days_between("startDate", "completionDate")),
        )
        .build()
}
