// 📤 Export - teacher registry and rateio as CSV / Excel workbooks

use crate::apportionment::ApportionmentReport;
use crate::teacher::TeacherRecord;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One exported line of the registry
#[derive(Debug, Serialize)]
struct TeacherExportRow<'a> {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Nome")]
    name: &'a str,
    #[serde(rename = "CPF")]
    cpf: String,
    #[serde(rename = "RG")]
    rg: &'a str,
    #[serde(rename = "Matrícula")]
    registration: &'a str,
    #[serde(rename = "Escola")]
    school: &'a str,
    #[serde(rename = "Cargo")]
    role: &'a str,
    #[serde(rename = "Situação")]
    status: &'static str,
    #[serde(rename = "Data de Admissão")]
    admission_date: String,
    #[serde(rename = "Telefone")]
    phone: &'a str,
    #[serde(rename = "E-mail")]
    email: &'a str,
    #[serde(rename = "Endereço")]
    address: &'a str,
    #[serde(rename = "Banco")]
    bank: &'a str,
    #[serde(rename = "Agência")]
    branch: &'a str,
    #[serde(rename = "Conta")]
    account: &'a str,
    #[serde(rename = "Tipo de Conta")]
    account_type: &'static str,
    #[serde(rename = "Início FUNDEF")]
    fundef_start: String,
    #[serde(rename = "Fim FUNDEF")]
    fundef_end: String,
    #[serde(rename = "Carga Horária")]
    workload_hours: u32,
    #[serde(rename = "Meses Trabalhados")]
    months_worked: u32,
    #[serde(rename = "Cadastrado em")]
    created_at: String,
}

impl<'a> From<&'a TeacherRecord> for TeacherExportRow<'a> {
    fn from(t: &'a TeacherRecord) -> Self {
        TeacherExportRow {
            id: t.id.unwrap_or_default(),
            name: &t.name,
            cpf: t.cpf.formatted(),
            rg: &t.rg,
            registration: &t.registration,
            school: &t.school,
            role: &t.role,
            status: t.status.label(),
            admission_date: t.admission_date.format("%d/%m/%Y").to_string(),
            phone: &t.phone,
            email: &t.email,
            address: &t.address,
            bank: &t.bank,
            branch: &t.branch,
            account: &t.account,
            account_type: t.account_type.label(),
            fundef_start: t.fundef_start.format("%d/%m/%Y").to_string(),
            fundef_end: t.fundef_end.format("%d/%m/%Y").to_string(),
            workload_hours: t.workload_hours,
            months_worked: t.months_worked,
            created_at: t
                .created_at
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }
}

const TEACHER_HEADERS: [&str; 21] = [
    "ID",
    "Nome",
    "CPF",
    "RG",
    "Matrícula",
    "Escola",
    "Cargo",
    "Situação",
    "Data de Admissão",
    "Telefone",
    "E-mail",
    "Endereço",
    "Banco",
    "Agência",
    "Conta",
    "Tipo de Conta",
    "Início FUNDEF",
    "Fim FUNDEF",
    "Carga Horária",
    "Meses Trabalhados",
    "Cadastrado em",
];

pub fn export_csv(teachers: &[TeacherRecord]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    if teachers.is_empty() {
        wtr.write_record(TEACHER_HEADERS)?;
    }
    for teacher in teachers {
        wtr.serialize(TeacherExportRow::from(teacher))?;
    }

    wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

pub fn export_xlsx(teachers: &[TeacherRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Professores")?;

        for (col, title) in TEACHER_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &header)?;
        }

        for (i, teacher) in teachers.iter().enumerate() {
            let row = i as u32 + 1;
            let line = TeacherExportRow::from(teacher);
            let text_cells = [
                line.name,
                line.cpf.as_str(),
                line.rg,
                line.registration,
                line.school,
                line.role,
                line.status,
                line.admission_date.as_str(),
                line.phone,
                line.email,
                line.address,
                line.bank,
                line.branch,
                line.account,
                line.account_type,
                line.fundef_start.as_str(),
                line.fundef_end.as_str(),
            ];

            sheet.write_number(row, 0, line.id as f64)?;
            for (offset, value) in text_cells.iter().enumerate() {
                sheet.write_string(row, offset as u16 + 1, *value)?;
            }
            sheet.write_number(row, 18, line.workload_hours)?;
            sheet.write_number(row, 19, line.months_worked)?;
            sheet.write_string(row, 20, line.created_at.as_str())?;
        }

        sheet.set_column_width(1, 32)?;
        sheet.set_column_width(5, 28)?;
    }

    Ok(workbook.save_to_buffer()?)
}

#[derive(Debug, Serialize)]
struct ApportionmentExportRow<'a> {
    #[serde(rename = "Nome")]
    name: &'a str,
    #[serde(rename = "CPF")]
    cpf: &'a str,
    #[serde(rename = "Escola")]
    school: &'a str,
    #[serde(rename = "Cargo")]
    role: &'a str,
    #[serde(rename = "Situação")]
    status: &'static str,
    #[serde(rename = "Meses Trabalhados")]
    months_worked: u32,
    #[serde(rename = "Valor")]
    share: String,
}

pub fn export_apportionment_csv(report: &ApportionmentReport) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    for row in &report.rows {
        wtr.serialize(ApportionmentExportRow {
            name: &row.name,
            cpf: &row.cpf,
            school: &row.school,
            role: &row.role,
            status: row.status.label(),
            months_worked: row.months_worked,
            share: row.share.to_string(),
        })?;
    }
    let total_months = report.total_months.to_string();
    let total = report.total.to_string();
    wtr.write_record(["TOTAL", "", "", "", "", total_months.as_str(), total.as_str()])?;

    wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

pub fn export_apportionment_xlsx(report: &ApportionmentReport) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let currency = Format::new().set_num_format("#,##0.00");

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Rateio")?;

        let titles = ["Nome", "CPF", "Escola", "Cargo", "Situação", "Meses Trabalhados", "Valor"];
        for (col, title) in titles.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &header)?;
        }

        for (i, line) in report.rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, line.name.as_str())?;
            sheet.write_string(row, 1, line.cpf.as_str())?;
            sheet.write_string(row, 2, line.school.as_str())?;
            sheet.write_string(row, 3, line.role.as_str())?;
            sheet.write_string(row, 4, line.status.label())?;
            sheet.write_number(row, 5, line.months_worked)?;
            sheet.write_number_with_format(row, 6, line.share.cents() as f64 / 100.0, &currency)?;
        }

        let total_row = report.rows.len() as u32 + 1;
        sheet.write_string_with_format(total_row, 0, "TOTAL", &header)?;
        sheet.write_number(total_row, 5, report.total_months as f64)?;
        sheet.write_number_with_format(
            total_row,
            6,
            report.total.cents() as f64 / 100.0,
            &currency,
        )?;
        sheet.set_column_width(0, 32)?;
    }

    Ok(workbook.save_to_buffer()?)
}
