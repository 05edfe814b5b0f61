// 👩‍🏫 Teacher Record - typed registration data + form validation
//
// Submitted forms arrive as TeacherForm (every field optional). A full
// submission is validated into a TeacherRecord; a draft only has the fields it
// does carry checked for shape.

use crate::cpf::Cpf;
use crate::duration::{DurationError, EligibilityWindow};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_WORKLOAD_HOURS: u32 = 60;

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServantStatus {
    Active,
    Retired,
    Deceased,
    NoBond,
}

impl ServantStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "active" | "ativo" | "ativa" => Some(ServantStatus::Active),
            "retired" | "aposentado" | "aposentada" => Some(ServantStatus::Retired),
            "deceased" | "falecido" | "falecida" => Some(ServantStatus::Deceased),
            "no_bond" | "sem_vinculo" | "sem_vínculo" => Some(ServantStatus::NoBond),
            _ => None,
        }
    }

    /// Storage code
    pub fn as_str(&self) -> &'static str {
        match self {
            ServantStatus::Active => "active",
            ServantStatus::Retired => "retired",
            ServantStatus::Deceased => "deceased",
            ServantStatus::NoBond => "no_bond",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServantStatus::Active => "Ativo",
            ServantStatus::Retired => "Aposentado",
            ServantStatus::Deceased => "Falecido",
            ServantStatus::NoBond => "Sem vínculo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    Salary,
}

impl AccountType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "checking" | "corrente" | "conta corrente" => Some(AccountType::Checking),
            "savings" | "poupanca" | "poupança" => Some(AccountType::Savings),
            "salary" | "salario" | "salário" | "conta salário" => Some(AccountType::Salary),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Salary => "salary",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Checking => "Corrente",
            AccountType::Savings => "Poupança",
            AccountType::Salary => "Salário",
        }
    }
}

// ============================================================================
// TEACHER RECORD
// ============================================================================

/// A fully validated teacher registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherRecord {
    /// Storage id, `None` until inserted
    #[serde(default)]
    pub id: Option<i64>,

    // Personal data
    pub name: String,
    pub cpf: Cpf,
    pub rg: String,
    pub phone: String,
    pub email: String,
    pub address: String,

    // Functional data
    pub registration: String,
    pub school: String,
    pub role: String,
    pub admission_date: NaiveDate,
    pub status: ServantStatus,
    pub workload_hours: u32,

    // Bank data
    pub bank: String,
    pub branch: String,
    pub account: String,
    pub account_type: AccountType,

    // FUNDEF tenure
    pub fundef_start: NaiveDate,
    pub fundef_end: NaiveDate,
    pub months_worked: u32,

    pub declaration_accepted: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TeacherRecord {
    /// Back to an editable form, e.g. to re-open a record for editing.
    pub fn to_form(&self) -> TeacherForm {
        TeacherForm {
            name: Some(self.name.clone()),
            cpf: Some(self.cpf.as_str().to_string()),
            rg: Some(self.rg.clone()),
            phone: Some(self.phone.clone()),
            email: Some(self.email.clone()),
            address: Some(self.address.clone()),
            registration: Some(self.registration.clone()),
            school: Some(self.school.clone()),
            role: Some(self.role.clone()),
            admission_date: Some(self.admission_date.format("%Y-%m-%d").to_string()),
            status: Some(self.status.as_str().to_string()),
            workload_hours: Some(self.workload_hours),
            bank: Some(self.bank.clone()),
            branch: Some(self.branch.clone()),
            account: Some(self.account.clone()),
            account_type: Some(self.account_type.as_str().to_string()),
            fundef_start: Some(self.fundef_start.format("%Y-%m-%d").to_string()),
            fundef_end: Some(self.fundef_end.format("%Y-%m-%d").to_string()),
            declaration_accepted: self.declaration_accepted,
        }
    }
}

// ============================================================================
// FORM + VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Raw submitted fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherForm {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub rg: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub registration: Option<String>,
    pub school: Option<String>,
    pub role: Option<String>,
    pub admission_date: Option<String>,
    pub status: Option<String>,
    pub workload_hours: Option<u32>,
    pub bank: Option<String>,
    pub branch: Option<String>,
    pub account: Option<String>,
    pub account_type: Option<String>,
    pub fundef_start: Option<String>,
    pub fundef_end: Option<String>,
    pub declaration_accepted: bool,
}

/// Fields that parsed, collected while checking shapes.
#[derive(Default)]
struct Parsed {
    cpf: Option<Cpf>,
    phone: Option<String>,
    admission_date: Option<NaiveDate>,
    status: Option<ServantStatus>,
    account_type: Option<AccountType>,
    fundef_start: Option<NaiveDate>,
    fundef_end: Option<NaiveDate>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accepts `YYYY-MM-DD` and `DD/MM/YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

fn is_valid_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    match raw.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if (10..=11).contains(&digits.len()) {
        Some(digits)
    } else {
        None
    }
}

impl TeacherForm {
    /// Name shown for a draft in listings.
    pub fn reference_name(&self) -> String {
        present(&self.name).unwrap_or_default().to_string()
    }

    /// Shape checks on the fields that are filled in.
    fn check_present(&self, errors: &mut Vec<FieldError>) -> Parsed {
        let mut parsed = Parsed::default();

        if let Some(raw) = present(&self.cpf) {
            match Cpf::parse(raw) {
                Ok(cpf) => parsed.cpf = Some(cpf),
                Err(e) => errors.push(FieldError::new("cpf", e.to_string())),
            }
        }

        if let Some(raw) = present(&self.email) {
            if !is_valid_email(raw) {
                errors.push(FieldError::new("email", "Invalid e-mail address"));
            }
        }

        if let Some(raw) = present(&self.phone) {
            match normalize_phone(raw) {
                Some(phone) => parsed.phone = Some(phone),
                None => errors.push(FieldError::new(
                    "phone",
                    "Phone must have 10 or 11 digits including area code",
                )),
            }
        }

        for (field, value, slot) in [
            ("admission_date", &self.admission_date, &mut parsed.admission_date),
            ("fundef_start", &self.fundef_start, &mut parsed.fundef_start),
            ("fundef_end", &self.fundef_end, &mut parsed.fundef_end),
        ] {
            if let Some(raw) = present(value) {
                match parse_date(raw) {
                    Some(date) => *slot = Some(date),
                    None => errors.push(FieldError::new(
                        field,
                        format!("'{}' is not a date (YYYY-MM-DD or DD/MM/YYYY)", raw),
                    )),
                }
            }
        }

        if let Some(raw) = present(&self.status) {
            match ServantStatus::parse(raw) {
                Some(status) => parsed.status = Some(status),
                None => errors.push(FieldError::new("status", format!("Unknown status '{}'", raw))),
            }
        }

        if let Some(raw) = present(&self.account_type) {
            match AccountType::parse(raw) {
                Some(kind) => parsed.account_type = Some(kind),
                None => errors.push(FieldError::new(
                    "account_type",
                    format!("Unknown account type '{}'", raw),
                )),
            }
        }

        if let Some(hours) = self.workload_hours {
            if hours == 0 || hours > MAX_WORKLOAD_HOURS {
                errors.push(FieldError::new(
                    "workload_hours",
                    format!("Weekly workload must be between 1 and {}", MAX_WORKLOAD_HOURS),
                ));
            }
        }

        if let (Some(start), Some(end)) = (parsed.fundef_start, parsed.fundef_end) {
            if start > end {
                errors.push(FieldError::new(
                    "fundef_end",
                    "FUNDEF end date must not be before the start date",
                ));
            }
        }

        parsed
    }

    /// Relaxed validation for drafts: nothing is required.
    pub fn validate_draft(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        self.check_present(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Full validation into a record; months worked are computed against `window`.
    pub fn validate(&self, window: &EligibilityWindow) -> Result<TeacherRecord, Vec<FieldError>> {
        let mut errors = Vec::new();
        let parsed = self.check_present(&mut errors);

        let mut required = |field: &str, value: &Option<String>| -> String {
            match present(value) {
                Some(v) => v.to_string(),
                None => {
                    errors.push(FieldError::new(field, "Required field is empty"));
                    String::new()
                }
            }
        };

        let name = required("name", &self.name);
        let rg = required("rg", &self.rg);
        let email = required("email", &self.email);
        let address = required("address", &self.address);
        let registration = required("registration", &self.registration);
        let school = required("school", &self.school);
        let role = required("role", &self.role);
        let bank = required("bank", &self.bank);
        let branch = required("branch", &self.branch);
        let account = required("account", &self.account);
        for (field, value) in [
            ("cpf", &self.cpf),
            ("phone", &self.phone),
            ("admission_date", &self.admission_date),
            ("status", &self.status),
            ("account_type", &self.account_type),
            ("fundef_start", &self.fundef_start),
            ("fundef_end", &self.fundef_end),
        ] {
            required(field, value);
        }

        if self.workload_hours.is_none() {
            errors.push(FieldError::new("workload_hours", "Required field is empty"));
        }

        if !self.declaration_accepted {
            errors.push(FieldError::new(
                "declaration_accepted",
                "The declaration must be accepted",
            ));
        }

        if let (Some(admission), Some(end)) = (parsed.admission_date, parsed.fundef_end) {
            if admission > end {
                errors.push(FieldError::new(
                    "admission_date",
                    "Admission date is after the end of the FUNDEF period",
                ));
            }
        }

        let months_worked = match (parsed.fundef_start, parsed.fundef_end) {
            (Some(start), Some(end)) if start <= end => match window.months_worked(start, end) {
                Ok(months) => Some(months),
                Err(DurationError::InvalidRange { .. }) => {
                    errors.push(FieldError::new(
                        "fundef_start",
                        format!(
                            "Period does not overlap the FUNDEF window {} to {}",
                            window.start, window.end
                        ),
                    ));
                    None
                }
            },
            _ => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        match (
            parsed.cpf,
            parsed.phone,
            parsed.admission_date,
            parsed.status,
            parsed.account_type,
            parsed.fundef_start,
            parsed.fundef_end,
            months_worked,
            self.workload_hours,
        ) {
            (
                Some(cpf),
                Some(phone),
                Some(admission_date),
                Some(status),
                Some(account_type),
                Some(fundef_start),
                Some(fundef_end),
                Some(months_worked),
                Some(workload_hours),
            ) => Ok(TeacherRecord {
                id: None,
                name,
                cpf,
                rg,
                phone,
                email,
                address,
                registration,
                school,
                role,
                admission_date,
                status,
                workload_hours,
                bank,
                branch,
                account,
                account_type,
                fundef_start,
                fundef_end,
                months_worked,
                declaration_accepted: true,
                created_at: None,
            }),
            _ => Err(vec![FieldError::new("form", "Incomplete submission")]),
        }
    }
}

// ============================================================================
// DRAFT
// ============================================================================

/// A partially filled registration saved with relaxed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: i64,
    pub form: TeacherForm,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    pub fn reference_name(&self) -> String {
        self.form.reference_name()
    }
}
