//! Free-form template export

use crate::error::Result;
use crate::layout::write_header_row;
use crate::options::ExportOptions;
use crate::record::{ReportTemplate, TemplateRowKind};
use crate::style_registry::StyleKind;

use super::{ExportContext, ExportOutcome};

/// File name prefix of template documents
pub const TEMPLATE_PREFIX: &str = "Template";

/// Export a user-authored template as a single sheet
///
/// The column labels form the first row under the scaffolding; each template
/// row follows in order. Cells past the last column are dropped.
pub fn export_template(template: &ReportTemplate, options: &ExportOptions) -> Result<ExportOutcome> {
    let mut ctx = ExportContext::new(TEMPLATE_PREFIX, options, template.rows.len());

    let widths: Vec<f64> = template.columns.iter().map(|c| c.width).collect();
    let report = ctx.new_sheet(&template.sheet_name, &template.title, &widths)?;
    let column_count = template.columns.len();

    let mut row = report.next_row;
    if column_count > 0 {
        let labels: Vec<&str> = template.columns.iter().map(|c| c.label.as_str()).collect();
        let (sheet, registry) = ctx.sheet_mut(report.index)?;
        row = write_header_row(sheet, registry, row, &labels)?;
    }

    for template_row in &template.rows {
        ctx.options().check_cancelled()?;

        let kind = match template_row.kind {
            TemplateRowKind::Header => StyleKind::SectionBanner,
            TemplateRowKind::Data => StyleKind::DataCell,
        };

        {
            let (sheet, registry) = ctx.sheet_mut(report.index)?;
            let style = registry.style(kind);
            for (col, text) in template_row.cells.iter().take(column_count).enumerate() {
                let col = col as u16;
                sheet.set_cell_value_at(row, col, text.as_str())?;
                sheet.set_cell_style_at(row, col, style)?;
            }
        }

        ctx.count_row();
        row += 1;
    }

    ctx.finish()
}
