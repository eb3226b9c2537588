use crate::error::Result;
use crate::models::candidate::ReportType;
use crate::store::{cell_text, Record};
use rust_xlsxwriter::*;
use serde_json::Value;

pub struct ExportService;

impl ExportService {
    /// Styled XLSX workbook with one row per candidate in the report.
    pub fn generate_report_xlsx(report: ReportType, rows: &[Record]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Relatorio")?;

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        let columns = report.columns();
        let last_col = columns.len() as u16; // column 0 holds the row number

        worksheet.set_column_width(0, 8.0)?;
        for (i, (label, _)) in columns.iter().enumerate() {
            let width = if label.starts_with("Nome") || label.starts_with("Motivo") {
                32.0
            } else {
                18.0
            };
            worksheet.set_column_width(i as u16 + 1, width)?;
        }

        // ── Title row ──
        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, last_col, report.title(), &title_format)?;

        // ── Subtitle row ──
        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(1, 22)?;
        let now = chrono::Utc::now().format("%d/%m/%Y %H:%M UTC").to_string();
        let subtitle = format!("Exportado em {}  •  Total de candidatos: {}", now, rows.len());
        worksheet.merge_range(1, 0, 1, last_col, &subtitle, &subtitle_format)?;

        // ── Header row ──
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        worksheet.write_string_with_format(header_row, 0, "Nº", &header_format)?;
        for (i, (label, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16 + 1, *label, &header_format)?;
        }

        // ── Data rows ──
        let data_start_row = 3;
        for (idx, record) in rows.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };
            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);

            worksheet.set_row_height(row, 20)?;
            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;

            for (i, (_, column)) in columns.iter().enumerate() {
                let col = i as u16 + 1;
                match record.get(*column) {
                    Some(Value::Number(n)) => {
                        let value = n.as_f64().unwrap_or_default();
                        worksheet.write_number_with_format(row, col, value, &center_fmt)?;
                    }
                    // CPFs and phones stay text so leading zeros survive.
                    Some(value) => {
                        worksheet.write_string_with_format(row, col, cell_text(value), &base_fmt)?;
                    }
                    None => {
                        worksheet.write_string_with_format(row, col, "", &base_fmt)?;
                    }
                }
            }
        }

        worksheet.set_freeze_panes(3, 0)?;
        let last_row = (data_start_row + rows.len() as u32).saturating_sub(1).max(header_row);
        worksheet.autofilter(header_row, 0, last_row, last_col)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn produces_a_zip_container() {
        let rows = vec![json!({ "NOMECOMPLETO": "Maria", "CPF": "01234567890", "interview_score": 87 })
            .as_object()
            .cloned()
            .unwrap()];
        let bytes = ExportService::generate_report_xlsx(ReportType::EntrevistaDesclassificados, &rows).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_reports_still_export() {
        let bytes = ExportService::generate_report_xlsx(ReportType::Todos, &[]).unwrap();
        assert!(!bytes.is_empty());
    }
}
