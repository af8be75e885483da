//! Excel workbook assembly.
//!
//! Layout of a generated template:
//! - `Upload_to_SAC`: one header row (dimension names then month labels),
//!   `excel.data_rows` blank entry rows, dimension cells tinted and a
//!   thick border closing the dimension block.
//! - One sheet per dimension column listing its members as a worksheet
//!   table, referenced by the upload sheet's dropdown validation through a
//!   defined name (inline lists hit Excel's 255-character limit).

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    DataValidation, Format, FormatAlign, FormatBorder, Formula, Table, TableColumn, TableStyle,
    Workbook, Worksheet,
};
use tracing::debug;

use crate::config::Settings;

use super::template_composer::{ResolvedColumn, ResolvedTemplate};

const UPLOAD_SHEET: &str = "Upload_to_SAC";
const MEMBER_TITLE_COLOR: u32 = 0xA9D08E;
const MEMBER_HEADER_COLOR: u32 = 0xC6E0B4;
const DIM_COLUMN_WIDTH: f64 = 18.0;
const DATE_COLUMN_WIDTH: f64 = 10.0;
const DESCRIPTION_COLUMN_WIDTH: f64 = 40.0;
const ID_COLUMN_WIDTH: f64 = 30.0;
const SHEET_NAME_LIMIT: usize = 31;

pub struct WorkbookBuilder;

impl WorkbookBuilder {
    /// Build the workbook into a buffer; the caller decides where it lands.
    pub fn build(resolved: &ResolvedTemplate, settings: &Settings) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        let dim_header = parse_color(&settings.colors.dim_header, 0xC6E0B4);
        let date_header = parse_color(&settings.colors.date_header, 0xBDD7EE);
        let dim_cell = parse_color(&settings.colors.dim_cell, 0xE2EFDA);
        let data_rows = resolved.data_rows.unwrap_or(settings.excel.data_rows);

        {
            let upload = workbook.add_worksheet();
            upload.set_name(UPLOAD_SHEET)?;
            Self::write_upload_sheet(
                upload,
                resolved,
                dim_header,
                date_header,
                dim_cell,
                data_rows,
            )?;
        }

        for column in &resolved.columns {
            let sheet_name = sheet_name_for(&column.name);
            {
                let sheet = workbook.add_worksheet();
                sheet.set_name(&sheet_name)?;
                Self::write_member_sheet(sheet, column, &sheet_name)?;
            }
            if column.count > 0 {
                // Defined name covering the member sheet's ID column, the
                // target of the upload sheet's dropdown.
                let last_data_row = 2 + column.count;
                workbook.define_name(
                    &ids_name(&column.table_name),
                    &format!(
                        "={}!$B$3:$B${}",
                        quote_sheet_name(&sheet_name),
                        last_data_row
                    ),
                )?;
            }
        }

        // Validations go on last so every defined name already exists.
        {
            let upload = workbook
                .worksheet_from_name(UPLOAD_SHEET)
                .context("upload sheet missing")?;
            for (col_idx, column) in resolved.columns.iter().enumerate() {
                if column.count == 0 {
                    debug!("Skipping validation for empty dimension '{}'", column.name);
                    continue;
                }
                let validation = DataValidation::new()
                    .allow_list_formula(Formula::new(format!("={}", ids_name(&column.table_name))))
                    .ignore_blank(true)
                    .set_error_title("Invalid entry")?
                    .set_error_message(&format!("Please select a valid {}", column.name))?;
                upload.add_data_validation(1, col_idx as u16, data_rows, col_idx as u16, &validation)?;
            }
        }

        let buffer = workbook.save_to_buffer()?;
        debug!(
            "Built workbook '{}' ({} columns, {} months, {} bytes)",
            resolved.name,
            resolved.columns.len(),
            resolved.date_axis.len(),
            buffer.len()
        );
        Ok(buffer)
    }

    fn write_upload_sheet(
        sheet: &mut Worksheet,
        resolved: &ResolvedTemplate,
        dim_header: u32,
        date_header: u32,
        dim_cell: u32,
        data_rows: u32,
    ) -> Result<()> {
        let dim_count = resolved.columns.len();

        let header_base = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);
        let dim_header_fmt = header_base.clone().set_background_color(dim_header);
        // Thick right border closes the dimension block visually.
        let dim_header_last_fmt = dim_header_fmt.clone().set_border_right(FormatBorder::Thick);
        let date_header_fmt = header_base.set_background_color(date_header);
        let dim_cell_fmt = Format::new()
            .set_background_color(dim_cell)
            .set_border(FormatBorder::Thin);
        let dim_cell_last_fmt = dim_cell_fmt.clone().set_border_right(FormatBorder::Thick);
        let date_cell_fmt = Format::new().set_border(FormatBorder::Thin);

        for (i, column) in resolved.columns.iter().enumerate() {
            let col = i as u16;
            let fmt = if i + 1 == dim_count {
                &dim_header_last_fmt
            } else {
                &dim_header_fmt
            };
            sheet.write_string_with_format(0, col, &column.name, fmt)?;
            sheet.set_column_width(col, DIM_COLUMN_WIDTH)?;

            let cell_fmt = if i + 1 == dim_count {
                &dim_cell_last_fmt
            } else {
                &dim_cell_fmt
            };
            for row in 1..=data_rows {
                sheet.write_blank(row, col, cell_fmt)?;
            }
        }

        for (j, label) in resolved.date_axis.iter().enumerate() {
            let col = (dim_count + j) as u16;
            sheet.write_string_with_format(0, col, label, &date_header_fmt)?;
            sheet.set_column_width(col, DATE_COLUMN_WIDTH)?;
            // Date entry cells are free-form but share the grid's borders.
            for row in 1..=data_rows {
                sheet.write_blank(row, col, &date_cell_fmt)?;
            }
        }

        Ok(())
    }

    fn write_member_sheet(
        sheet: &mut Worksheet,
        column: &ResolvedColumn,
        sheet_name: &str,
    ) -> Result<()> {
        let title_fmt = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(MEMBER_TITLE_COLOR);
        let header_fmt = Format::new()
            .set_bold()
            .set_background_color(MEMBER_HEADER_COLOR)
            .set_border(FormatBorder::Thin);

        sheet.merge_range(0, 0, 0, 1, &column.name, &title_fmt)?;
        sheet.write_string_with_format(1, 0, "Description", &header_fmt)?;
        sheet.write_string_with_format(1, 1, "ID", &header_fmt)?;
        sheet.set_column_width(0, DESCRIPTION_COLUMN_WIDTH)?;
        sheet.set_column_width(1, ID_COLUMN_WIDTH)?;

        for (i, member) in column.members.iter().enumerate() {
            let row = 2 + i as u32;
            sheet.write_string(row, 0, &member.description)?;
            sheet.write_string(row, 1, &member.id)?;
        }

        // An empty member set gets no table: Excel rejects tables without
        // data rows.
        if column.count > 0 {
            let table = Table::new()
                .set_name(&column.table_name)
                .set_style(TableStyle::Light9)
                .set_columns(&[
                    TableColumn::new().set_header("Description"),
                    TableColumn::new().set_header("ID"),
                ]);
            let last_row = 1 + column.count as u32;
            sheet.add_table(1, 0, last_row, 1, &table)?;
        } else {
            debug!("Member sheet '{}' has no members", sheet_name);
        }
        Ok(())
    }
}

/// Hex color string (`#RRGGBB`) to an RGB value, falling back when malformed.
pub fn parse_color(value: &str, fallback: u32) -> u32 {
    let trimmed = value.trim().trim_start_matches('#');
    if trimmed.len() == 6 {
        if let Ok(rgb) = u32::from_str_radix(trimmed, 16) {
            return rgb;
        }
    }
    fallback
}

/// Excel sheet names: 31 chars max, a handful of forbidden characters.
fn sheet_name_for(dimension: &str) -> String {
    let cleaned: String = dimension
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' | '\'' => '_',
            other => other,
        })
        .collect();
    cleaned.chars().take(SHEET_NAME_LIMIT).collect()
}

fn quote_sheet_name(name: &str) -> String {
    format!("'{name}'")
}

fn ids_name(table_name: &str) -> String {
    format!("{table_name}_ids")
}
