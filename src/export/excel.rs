use rust_xlsxwriter::{Format, Workbook};

use super::{Cell, ExportError, ExportTable};

/// One worksheet: the title in the first row, bold headers in the third and
/// data below.
pub fn render(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(table.sheet_name.as_str())?;
    worksheet.write_string_with_format(0, 0, table.title.as_str(), &bold)?;

    for (col, header) in table.headers.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(2, col, header.as_str(), &bold)?;
        worksheet.set_column_width(col, 18)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let row_number = 3 + index as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(row_number, col as u16, text.as_str())?;
                }
                Cell::Number(number) => {
                    worksheet.write_number_with_format(row_number, col as u16, *number, &money)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
