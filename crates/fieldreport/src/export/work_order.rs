//! Work-order export: a work-order sheet and a to-do sheet over the same records
//!
//! Both sheets list the work-order checks of the input. A photo is compressed
//! once for the first sheet; the second sheet reads it back from the session's
//! temp file.

use ahash::AHashSet;
use fieldreport_core::CellValue;

use super::{date, number, title, ColumnSpec, ExportContext, ExportOutcome, RowContext, SheetSchema};
use crate::error::Result;
use crate::options::ExportOptions;
use crate::photo::{ImageCompressor, JpegCompressor};
use crate::record::{DomainRecord, RecordKind, ReportMetadata};

/// File name prefix of work-order documents
pub const WORK_ORDERS_PREFIX: &str = "WorkOrders";

const WORK_ORDER_SHEET: &str = "Work Orders";
const TODO_SHEET: &str = "To-Do";

fn machine(ctx: &RowContext<'_>) -> CellValue {
    CellValue::from(&ctx.record.machine)
}

fn details(ctx: &RowContext<'_>) -> CellValue {
    CellValue::from(ctx.record.work_order_details().unwrap_or_default())
}

fn notes(ctx: &RowContext<'_>) -> CellValue {
    CellValue::from(&ctx.record.notes)
}

fn work_order_schema(options: &ExportOptions) -> SheetSchema {
    SheetSchema {
        sheet_name: WORK_ORDER_SHEET,
        columns: vec![
            ColumnSpec::field("No", 6.0, number),
            ColumnSpec::field("Machine", 20.0, machine),
            ColumnSpec::field("Title", 28.0, title),
            ColumnSpec::field("Date", 18.0, date),
            ColumnSpec::field("Details", 36.0, details),
            ColumnSpec::photo("Photo", options.photo_column_width),
        ],
    }
}

fn todo_schema(options: &ExportOptions) -> SheetSchema {
    SheetSchema {
        sheet_name: TODO_SHEET,
        columns: vec![
            ColumnSpec::field("No", 6.0, number),
            ColumnSpec::field("Machine", 20.0, machine),
            ColumnSpec::field("Title", 28.0, title),
            ColumnSpec::field("Details", 36.0, details),
            ColumnSpec::field("Notes", 30.0, notes),
            ColumnSpec::photo("Photo", options.photo_column_width),
        ],
    }
}

/// Operators of the machines that own at least one of `rows`, de-duplicated
/// in first-seen order
pub(crate) fn operator_names<'m>(
    rows: &[(usize, &DomainRecord)],
    metadata: &'m ReportMetadata,
) -> Vec<&'m str> {
    let mut seen_machines = AHashSet::new();
    let mut seen_operators = AHashSet::new();
    let mut names = Vec::new();

    for (_, record) in rows {
        if !seen_machines.insert(record.machine.as_str()) {
            continue;
        }
        let Some(machine) = metadata.machine(&record.machine) else {
            continue;
        };
        for operator in &machine.operators {
            if seen_operators.insert(operator.as_str()) {
                names.push(operator.as_str());
            }
        }
    }

    names
}

fn operator_summary(rows: &[(usize, &DomainRecord)], metadata: &ReportMetadata) -> Option<String> {
    let names = operator_names(rows, metadata);
    if names.is_empty() {
        None
    } else {
        Some(format!("Operators: {}", names.join(", ")))
    }
}

/// Export the work-order checks among `records` as a two-sheet report
///
/// Records of other kinds are ignored. Row numbers restart at 1 on each sheet,
/// while photos stay keyed by the record's position in `records`.
pub fn export_work_orders(
    records: &[DomainRecord],
    metadata: &ReportMetadata,
    options: &ExportOptions,
) -> Result<ExportOutcome> {
    let compressor = JpegCompressor::new(options.image);
    export_work_orders_with(records, metadata, options, &compressor)
}

/// [`export_work_orders`] with a caller-provided compressor
pub fn export_work_orders_with(
    records: &[DomainRecord],
    metadata: &ReportMetadata,
    options: &ExportOptions,
    compressor: &dyn ImageCompressor,
) -> Result<ExportOutcome> {
    let rows: Vec<(usize, &DomainRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| matches!(r.kind, RecordKind::WorkOrderCheck { .. }))
        .collect();

    let mut ctx =
        ExportContext::new(WORK_ORDERS_PREFIX, options, rows.len()).with_compressor(compressor);

    let summary = operator_summary(&rows, metadata);
    ctx.write_schema_sheet(&work_order_schema(options), &metadata.title, &rows, summary.as_deref())?;
    ctx.write_schema_sheet(&todo_schema(options), &metadata.title, &rows, summary.as_deref())?;

    ctx.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Machine;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn work_order(machine: &str) -> DomainRecord {
        DomainRecord::new("Fix", at())
            .with_machine(machine)
            .with_kind(RecordKind::WorkOrderCheck {
                details: "replace seal".into(),
            })
    }

    #[test]
    fn test_operator_names_first_seen_order() {
        let metadata = ReportMetadata::new("Plant")
            .with_machine(Machine::new("Press", ["Ana", "Ben"]))
            .with_machine(Machine::new("Lathe", ["Ben", "Cleo"]))
            .with_machine(Machine::new("Idle", ["Dan"]));

        let records = [work_order("Lathe"), work_order("Press"), work_order("Lathe")];
        let rows: Vec<_> = records.iter().enumerate().collect();

        assert_eq!(operator_names(&rows, &metadata), vec!["Ben", "Cleo", "Ana"]);
        assert_eq!(
            operator_summary(&rows, &metadata).as_deref(),
            Some("Operators: Ben, Cleo, Ana")
        );
    }

    #[test]
    fn test_operator_summary_absent() {
        let metadata = ReportMetadata::new("Plant").with_machine(Machine::new("Press", Vec::<String>::new()));
        let records = [work_order("Press"), work_order("Unknown")];
        let rows: Vec<_> = records.iter().enumerate().collect();

        assert!(operator_summary(&rows, &metadata).is_none());
        assert!(operator_summary(&[], &metadata).is_none());
    }
}
