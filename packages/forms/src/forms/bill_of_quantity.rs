//! Bill of quantity: priced line items with a running subtotal

use folio_record::{derive, FieldSpec, FormSchema, SchemaBuilder, SchemaError};
use serde_json::json;

pub const NAME: &str = "boq";

pub fn schema() -> Result<FormSchema, SchemaError> {
    SchemaBuilder::new(NAME)
        .title("Bill of Quantity")
        .field(FieldSpec::text("projectName").label("Project"))
        .field(FieldSpec::date("date").label("Date"))
        .field(FieldSpec::text("items.*.description").label("Description"))
        .field(FieldSpec::text("items.*.unit").label("Unit"))
        .field(FieldSpec::number("items.*.qty").label("Qty"))
        .field(FieldSpec::number("items.*.rate").label("Rate"))
        .field(
            FieldSpec::text("items.*.amount")
                .label("Amount")
                .derived(derive::product("items.*.qty", "items.*.rate")),
        )
        .field(
            FieldSpec::text("subtotal")
                .label("Subtotal")
                .derived(derive::sum(&["items.*.amount"])),
        )
        .template(json!({ "items": [{ "id": 1, "qty": "", "rate": "", "amount": "" }] }))
        .row_template("items", json!({ "qty": "", "rate": "", "amount": "" }))
        .build()
}
