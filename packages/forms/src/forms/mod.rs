pub mod bill_of_quantity;
pub mod payment_application;
pub mod progress_timeline;
pub mod project_data;
pub mod site_survey;
pub mod transmittal;

use folio_record::{FormSchema, SchemaError};

pub(crate) const ALL: [fn() -> Result<FormSchema, SchemaError>; 6] = [
    bill_of_quantity::schema,
    payment_application::schema,
    progress_timeline::schema,
    project_data::schema,
    site_survey::schema,
    transmittal::schema,
];
