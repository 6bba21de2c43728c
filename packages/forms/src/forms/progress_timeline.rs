//! Per-client progress timeline (Gantt table)

use folio_record::{derive, FieldSpec, FormSchema, SchemaBuilder, SchemaError};
use serde_json::json;

pub const NAME: &str = "progress-timeline";

pub fn schema() -> Result<FormSchema, SchemaError> {
    SchemaBuilder::new(NAME)
        .title("Progress Timeline")
        .field(FieldSpec::text("client").label("Client"))
        .field(FieldSpec::text("project").label("Project"))
        .field(FieldSpec::text("tasks.*.name").label("Task"))
        .field(FieldSpec::date("tasks.*.start").label("Start"))
        .field(FieldSpec::date("tasks.*.end").label("End"))
        .field(
            FieldSpec::number("tasks.*.duration")
                .label("Days")
                .derived(derive::days_between("tasks.*.start", "tasks.*.end")),
        )
        .field(FieldSpec::number("tasks.*.percentComplete").label("% Complete"))
        .template(json!({
            "tasks": [{ "id": 1, "name": "", "start": "", "end": "", "duration": "", "percentComplete": "" }]
        }))
        .row_template(
            "tasks",
            json!({ "name": "", "start": "", "end": "", "duration": "", "percentComplete": "" }),
        )
        .build()
}
