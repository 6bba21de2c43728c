//! Transmittal letter listing the documents sent

use folio_record::{FieldSpec, FormSchema, SchemaBuilder, SchemaError};
use serde_json::json;

pub const NAME: &str = "transmittal";

pub fn schema() -> Result<FormSchema, SchemaError> {
    SchemaBuilder::new(NAME)
        .title("Letter of Transmittal")
        .field(FieldSpec::text("to").label("To"))
        .field(FieldSpec::text("attention").label("Attention"))
        .field(FieldSpec::text("project").label("Project"))
        .field(FieldSpec::date("date").label("Date"))
        .field(FieldSpec::text("via").label("Sent Via").allowed(["mail", "courier", "hand", "email", ""]))
        .field(FieldSpec::number("items.*.copies").label("Copies"))
        .field(FieldSpec::date("items.*.date").label("Dated"))
        .field(FieldSpec::text("items.*.description").label("Description"))
        .field(FieldSpec::boolean("forApproval").label("For approval"))
        .field(FieldSpec::boolean("forYourUse").label("For your use"))
        .field(FieldSpec::text("remarks").label("Remarks"))
        .template(json!({ "items": [{ "id": 1, "copies": "", "date": "", "description": "" }] }))
        .row_template("items", json!({ "copies": "", "date": "", "description": "" }))
        .build()
}
