//! Application and certificate for payment
//!
//! Change orders are tracked as two fixed sub-records, approved in
//! previous periods and approved this period. Every total below the
//! contract sum is derived; the cascade settles them in one edit.

use folio_record::{derive, format_money, FieldSpec, FormSchema, Scalar, SchemaBuilder, SchemaError};
use serde_json::json;

pub const NAME: &str = "payment-application";

pub fn schema() -> Result<FormSchema, SchemaError> {
    SchemaBuilder::new(NAME)
        .title("Application for Payment")
        .field(FieldSpec::text("project").label("Project"))
        .field(FieldSpec::number("applicationNumber").label("Application No."))
        .field(FieldSpec::date("periodTo").label("Period To"))
        .field(FieldSpec::number("originalContractSum").label("Original Contract Sum"))
        .field(FieldSpec::number("changeOrdersPrevious.additions").label("Previous Additions"))
        .field(FieldSpec::number("changeOrdersPrevious.deductions").label("Previous Deductions"))
        .field(FieldSpec::number("changeOrdersThisPeriod.additions").label("Additions This Period"))
        .field(FieldSpec::number("changeOrdersThisPeriod.deductions").label("Deductions This Period"))
        .field(FieldSpec::text("netChangeOrders").label("Net Change by Change Orders").derived(
            derive::custom(
                "net_change_orders",
                &[
                    "changeOrdersPrevious.additions",
                    "changeOrdersThisPeriod.additions",
                    "changeOrdersPrevious.deductions",
                    "changeOrdersThisPeriod.deductions",
                ],
                |values| {
                    let inputs: Vec<Option<f64>> = values
                        .iter()
                        .map(|v| v.first().and_then(Scalar::as_number))
                        .collect();
                    if inputs.iter().all(Option::is_none) {
                        return Scalar::text("");
                    }
                    let amount = |i: usize| inputs.get(i).copied().flatten().unwrap_or(0.0);
                    Scalar::Text(format_money(amount(0) + amount(1) - amount(2) - amount(3)))
                },
            ),
        ))
        .field(
            FieldSpec::text("contractSumToDate")
                .label("Contract Sum to Date")
                .derived(derive::sum(&["originalContractSum", "netChangeOrders"])),
        )
        .field(FieldSpec::number("completedToDate").label("Total Completed and Stored to Date"))
        .field(
            FieldSpec::text("percentComplete")
                .label("% Complete")
                .derived(derive::percent_of("completedToDate", "contractSumToDate")),
        )
        .field(FieldSpec::number("retainage").label("Retainage"))
        .field(
            FieldSpec::text("earnedLessRetainage")
                .label("Total Earned Less Retainage")
                .derived(derive::difference("completedToDate", "retainage")),
        )
        .field(FieldSpec::number("previousCertificates").label("Less Previous Certificates"))
        .field(
            FieldSpec::text("currentPaymentDue")
                .label("Current Payment Due")
                .derived(derive::difference("earnedLessRetainage", "previousCertificates")),
        )
        .field(
            FieldSpec::text("balanceToFinish")
                .label("Balance to Finish")
                .derived(derive::difference("contractSumToDate", "earnedLessRetainage")),
        )
        .template(json!({
            "changeOrdersPrevious": { "additions": "", "deductions": "" },
            "changeOrdersThisPeriod": { "additions": "", "deductions": "" }
        }))
        .build()
}
