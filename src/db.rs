use crate::cpf::Cpf;
use crate::duration::EligibilityWindow;
use crate::teacher::{AccountType, Draft, FieldError, ServantStatus, TeacherForm, TeacherRecord};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a teacher with CPF {0} is already registered")]
    DuplicateCpf(String),

    #[error("record {0} not found")]
    NotFound(i64),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("draft payload error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

pub fn setup_database(conn: &Connection) -> StoreResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Teachers Table (CPF is the natural identity)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            cpf TEXT NOT NULL UNIQUE,
            rg TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            registration TEXT NOT NULL,
            school TEXT NOT NULL,
            role TEXT NOT NULL,
            admission_date TEXT NOT NULL,
            status TEXT NOT NULL,
            workload_hours INTEGER NOT NULL,
            bank TEXT NOT NULL,
            branch TEXT NOT NULL,
            account TEXT NOT NULL,
            account_type TEXT NOT NULL,
            fundef_start TEXT NOT NULL,
            fundef_end TEXT NOT NULL,
            months_worked INTEGER NOT NULL,
            declaration_accepted INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Drafts Table (relaxed validation, payload kept as JSON)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS teacher_drafts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            reference_name TEXT NOT NULL DEFAULT '',
            cpf TEXT NOT NULL DEFAULT '',
            data_json TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_name ON teachers(name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_drafts_updated ON teacher_drafts(updated_at)",
        [],
    )?;

    Ok(())
}

fn now_str() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn unknown_code(idx: usize, code: &str) -> rusqlite::Error {
    conversion_error(
        idx,
        std::io::Error::new(std::io::ErrorKind::InvalidData, format!("unknown code '{}'", code)),
    )
}

fn get_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}

fn get_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

const TEACHER_COLUMNS: &str = "id, name, cpf, rg, phone, email, address,
    registration, school, role, admission_date, status, workload_hours,
    bank, branch, account, account_type,
    fundef_start, fundef_end, months_worked, declaration_accepted, created_at";

fn row_to_teacher(row: &Row) -> rusqlite::Result<TeacherRecord> {
    let cpf_raw: String = row.get(2)?;
    let status_raw: String = row.get(11)?;
    let account_type_raw: String = row.get(16)?;

    Ok(TeacherRecord {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        cpf: Cpf::parse(&cpf_raw).map_err(|e| conversion_error(2, e))?,
        rg: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        address: row.get(6)?,
        registration: row.get(7)?,
        school: row.get(8)?,
        role: row.get(9)?,
        admission_date: get_date(row, 10)?,
        status: ServantStatus::parse(&status_raw).ok_or_else(|| unknown_code(11, &status_raw))?,
        workload_hours: row.get(12)?,
        bank: row.get(13)?,
        branch: row.get(14)?,
        account: row.get(15)?,
        account_type: AccountType::parse(&account_type_raw)
            .ok_or_else(|| unknown_code(16, &account_type_raw))?,
        fundef_start: get_date(row, 17)?,
        fundef_end: get_date(row, 18)?,
        months_worked: row.get(19)?,
        declaration_accepted: row.get(20)?,
        created_at: Some(get_timestamp(row, 21)?),
    })
}

/// Map a UNIQUE violation on `teachers.cpf` to `DuplicateCpf`.
fn map_unique(err: rusqlite::Error, cpf: &Cpf) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            StoreError::DuplicateCpf(cpf.formatted())
        }
        other => StoreError::Sqlite(other),
    }
}

// ============================================================================
// TEACHERS
// ============================================================================

pub fn insert_teacher(conn: &Connection, teacher: &TeacherRecord) -> StoreResult<i64> {
    let created_at = teacher
        .created_at
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
        .unwrap_or_else(now_str);

    conn.execute(
        "INSERT INTO teachers (
            name, cpf, rg, phone, email, address,
            registration, school, role, admission_date, status, workload_hours,
            bank, branch, account, account_type,
            fundef_start, fundef_end, months_worked, declaration_accepted, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            teacher.name,
            teacher.cpf.as_str(),
            teacher.rg,
            teacher.phone,
            teacher.email,
            teacher.address,
            teacher.registration,
            teacher.school,
            teacher.role,
            date_str(teacher.admission_date),
            teacher.status.as_str(),
            teacher.workload_hours,
            teacher.bank,
            teacher.branch,
            teacher.account,
            teacher.account_type.as_str(),
            date_str(teacher.fundef_start),
            date_str(teacher.fundef_end),
            teacher.months_worked,
            teacher.declaration_accepted,
            created_at,
        ],
    )
    .map_err(|e| map_unique(e, &teacher.cpf))?;

    let id = conn.last_insert_rowid();
    debug!(id, cpf = %teacher.cpf, "teacher inserted");
    Ok(id)
}

pub fn update_teacher(conn: &Connection, id: i64, teacher: &TeacherRecord) -> StoreResult<()> {
    let changed = conn
        .execute(
            "UPDATE teachers SET
                name = ?1, cpf = ?2, rg = ?3, phone = ?4, email = ?5, address = ?6,
                registration = ?7, school = ?8, role = ?9, admission_date = ?10,
                status = ?11, workload_hours = ?12,
                bank = ?13, branch = ?14, account = ?15, account_type = ?16,
                fundef_start = ?17, fundef_end = ?18, months_worked = ?19,
                declaration_accepted = ?20
             WHERE id = ?21",
            params![
                teacher.name,
                teacher.cpf.as_str(),
                teacher.rg,
                teacher.phone,
                teacher.email,
                teacher.address,
                teacher.registration,
                teacher.school,
                teacher.role,
                date_str(teacher.admission_date),
                teacher.status.as_str(),
                teacher.workload_hours,
                teacher.bank,
                teacher.branch,
                teacher.account,
                teacher.account_type.as_str(),
                date_str(teacher.fundef_start),
                date_str(teacher.fundef_end),
                teacher.months_worked,
                teacher.declaration_accepted,
                id,
            ],
        )
        .map_err(|e| map_unique(e, &teacher.cpf))?;

    if changed == 0 {
        return Err(StoreError::NotFound(id));
    }

    debug!(id, "teacher updated");
    Ok(())
}

pub fn delete_teacher(conn: &Connection, id: i64) -> StoreResult<()> {
    let changed = conn.execute("DELETE FROM teachers WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StoreError::NotFound(id));
    }

    debug!(id, "teacher deleted");
    Ok(())
}

pub fn get_teacher(conn: &Connection, id: i64) -> StoreResult<Option<TeacherRecord>> {
    let sql = format!("SELECT {} FROM teachers WHERE id = ?1", TEACHER_COLUMNS);
    Ok(conn.query_row(&sql, params![id], row_to_teacher).optional()?)
}

pub fn find_teacher_by_cpf(conn: &Connection, cpf: &Cpf) -> StoreResult<Option<TeacherRecord>> {
    let sql = format!("SELECT {} FROM teachers WHERE cpf = ?1", TEACHER_COLUMNS);
    Ok(conn
        .query_row(&sql, params![cpf.as_str()], row_to_teacher)
        .optional()?)
}

pub fn list_teachers(conn: &Connection, order: SortOrder) -> StoreResult<Vec<TeacherRecord>> {
    let direction = match order {
        SortOrder::NewestFirst => "DESC",
        SortOrder::OldestFirst => "ASC",
    };
    let sql = format!(
        "SELECT {} FROM teachers ORDER BY id {}",
        TEACHER_COLUMNS, direction
    );

    let mut stmt = conn.prepare(&sql)?;
    let teachers = stmt
        .query_map([], row_to_teacher)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(teachers)
}

/// Teachers in the order the rateio is presented (by name).
pub fn teachers_for_apportionment(conn: &Connection) -> StoreResult<Vec<TeacherRecord>> {
    let sql = format!(
        "SELECT {} FROM teachers ORDER BY name ASC, id ASC",
        TEACHER_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let teachers = stmt
        .query_map([], row_to_teacher)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(teachers)
}

pub fn count_teachers(conn: &Connection) -> StoreResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM teachers", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// DRAFTS
// ============================================================================

/// Create a draft, or update it when `draft_id` exists. An unknown id creates a
/// new draft.
pub fn save_draft(conn: &Connection, form: &TeacherForm, draft_id: Option<i64>) -> StoreResult<i64> {
    let now = now_str();
    let payload = serde_json::to_string(form)?;
    let reference_name = form.reference_name();
    let cpf = form.cpf.clone().unwrap_or_default();

    if let Some(id) = draft_id {
        let changed = conn.execute(
            "UPDATE teacher_drafts
             SET reference_name = ?1, cpf = ?2, data_json = ?3, updated_at = ?4
             WHERE id = ?5",
            params![reference_name, cpf, payload, now, id],
        )?;
        if changed > 0 {
            debug!(id, "draft updated");
            return Ok(id);
        }
    }

    conn.execute(
        "INSERT INTO teacher_drafts (reference_name, cpf, data_json, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![reference_name, cpf, payload, now],
    )?;

    let id = conn.last_insert_rowid();
    debug!(id, "draft created");
    Ok(id)
}

fn row_to_draft(row: &Row) -> rusqlite::Result<Draft> {
    let payload: String = row.get(1)?;
    // An unreadable payload loads as an empty form rather than hiding the draft
    let form = serde_json::from_str(&payload).unwrap_or_default();

    Ok(Draft {
        id: row.get(0)?,
        form,
        created_at: get_timestamp(row, 2)?,
        updated_at: get_timestamp(row, 3)?,
    })
}

pub fn load_draft(conn: &Connection, id: i64) -> StoreResult<Option<Draft>> {
    Ok(conn
        .query_row(
            "SELECT id, data_json, created_at, updated_at FROM teacher_drafts WHERE id = ?1",
            params![id],
            row_to_draft,
        )
        .optional()?)
}

/// Most recently updated first.
pub fn list_drafts(conn: &Connection) -> StoreResult<Vec<Draft>> {
    let mut stmt = conn.prepare(
        "SELECT id, data_json, created_at, updated_at
         FROM teacher_drafts
         ORDER BY updated_at DESC, id DESC",
    )?;

    let drafts = stmt
        .query_map([], row_to_draft)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(drafts)
}

pub fn remove_draft(conn: &Connection, id: i64) -> StoreResult<()> {
    let changed = conn.execute("DELETE FROM teacher_drafts WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StoreError::NotFound(id));
    }

    debug!(id, "draft removed");
    Ok(())
}

/// Fully validate a draft, register it as a teacher and drop the draft, all in
/// one transaction.
pub fn promote_draft(
    conn: &mut Connection,
    id: i64,
    window: &EligibilityWindow,
) -> StoreResult<TeacherRecord> {
    let tx = conn.transaction()?;

    let draft = load_draft(&tx, id)?.ok_or(StoreError::NotFound(id))?;
    let mut record = draft.form.validate(window).map_err(StoreError::Validation)?;

    let teacher_id = insert_teacher(&tx, &record)?;
    remove_draft(&tx, id)?;
    tx.commit()?;

    record.id = Some(teacher_id);
    debug!(draft = id, teacher = teacher_id, "draft promoted");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teacher::tests::sample_form;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn record(name: &str, cpf: &str) -> TeacherRecord {
        sample_form(name, cpf)
            .validate(&EligibilityWindow::fundef())
            .unwrap()
    }

    #[test]
    fn test_insert_and_read_back() {
        let conn = open();
        let teacher = record("Maria da Silva", "529.982.247-25");

        let id = insert_teacher(&conn, &teacher).unwrap();
        let stored = get_teacher(&conn, id).unwrap().expect("teacher stored");

        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.name, teacher.name);
        assert_eq!(stored.cpf, teacher.cpf);
        assert_eq!(stored.fundef_end, teacher.fundef_end);
        assert_eq!(stored.months_worked, 12);
        assert_eq!(stored.status, ServantStatus::Active);
        assert!(stored.created_at.is_some());
        assert_eq!(count_teachers(&conn).unwrap(), 1);
    }

    #[test]
    fn test_cpf_uniqueness() {
        let conn = open();
        insert_teacher(&conn, &record("Maria", "529.982.247-25")).unwrap();

        let err = insert_teacher(&conn, &record("Outra Maria", "52998224725")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCpf(ref cpf) if cpf == "529.982.247-25"));
        assert_eq!(count_teachers(&conn).unwrap(), 1);
    }

    #[test]
    fn test_update_and_cpf_conflict_on_update() {
        let conn = open();
        let first = insert_teacher(&conn, &record("Maria", "529.982.247-25")).unwrap();
        let second = insert_teacher(&conn, &record("João", "111.444.777-35")).unwrap();

        let mut changed = record("Maria Souza", "529.982.247-25");
        changed.school = "EM Nova".to_string();
        update_teacher(&conn, first, &changed).unwrap();

        let stored = get_teacher(&conn, first).unwrap().unwrap();
        assert_eq!(stored.name, "Maria Souza");
        assert_eq!(stored.school, "EM Nova");

        let clash = record("João", "529.982.247-25");
        assert!(matches!(
            update_teacher(&conn, second, &clash),
            Err(StoreError::DuplicateCpf(_))
        ));
        assert!(matches!(
            update_teacher(&conn, 999, &changed),
            Err(StoreError::NotFound(999))
        ));
    }

    #[test]
    fn test_delete() {
        let conn = open();
        let id = insert_teacher(&conn, &record("Maria", "529.982.247-25")).unwrap();

        delete_teacher(&conn, id).unwrap();
        assert!(get_teacher(&conn, id).unwrap().is_none());
        assert!(matches!(delete_teacher(&conn, id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_listing_orders() {
        let conn = open();
        insert_teacher(&conn, &record("Carla", "529.982.247-25")).unwrap();
        insert_teacher(&conn, &record("Ana", "111.444.777-35")).unwrap();
        insert_teacher(&conn, &record("Bruno", "123.456.789-09")).unwrap();

        let newest: Vec<String> = list_teachers(&conn, SortOrder::NewestFirst)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(newest, vec!["Bruno", "Ana", "Carla"]);

        let oldest = list_teachers(&conn, SortOrder::OldestFirst).unwrap();
        assert_eq!(oldest[0].name, "Carla");

        let by_name: Vec<String> = teachers_for_apportionment(&conn)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(by_name, vec!["Ana", "Bruno", "Carla"]);

        let cpf = Cpf::parse("111.444.777-35").unwrap();
        let found = find_teacher_by_cpf(&conn, &cpf).unwrap().unwrap();
        assert_eq!(found.name, "Ana");
    }

    #[test]
    fn test_draft_lifecycle() {
        let conn = open();
        let form = TeacherForm {
            name: Some("Rascunho Um".to_string()),
            ..Default::default()
        };

        let id = save_draft(&conn, &form, None).unwrap();
        let second = save_draft(&conn, &TeacherForm::default(), None).unwrap();
        assert_ne!(id, second);

        let drafts = list_drafts(&conn).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].id, second);

        let mut edited = form.clone();
        edited.cpf = Some("529.982.247-25".to_string());
        assert_eq!(save_draft(&conn, &edited, Some(id)).unwrap(), id);

        let loaded = load_draft(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.form, edited);
        assert_eq!(loaded.reference_name(), "Rascunho Um");

        // Unknown id falls back to creating a new draft
        let created = save_draft(&conn, &form, Some(4242)).unwrap();
        assert_ne!(created, 4242);
        assert_eq!(list_drafts(&conn).unwrap().len(), 3);

        remove_draft(&conn, id).unwrap();
        assert!(load_draft(&conn, id).unwrap().is_none());
    }

    #[test]
    fn test_promote_draft() {
        let mut conn = open();
        let id = save_draft(&conn, &sample_form("Maria", "529.982.247-25"), None).unwrap();

        let teacher = promote_draft(&mut conn, id, &EligibilityWindow::fundef()).unwrap();
        assert!(teacher.id.is_some());
        assert_eq!(count_teachers(&conn).unwrap(), 1);
        assert!(load_draft(&conn, id).unwrap().is_none());
    }

    #[test]
    fn test_promote_incomplete_draft_keeps_it() {
        let mut conn = open();
        let form = TeacherForm {
            name: Some("Incompleto".to_string()),
            ..Default::default()
        };
        let id = save_draft(&conn, &form, None).unwrap();

        let err = promote_draft(&mut conn, id, &EligibilityWindow::fundef()).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref errors) if !errors.is_empty()));
        assert!(load_draft(&conn, id).unwrap().is_some());
        assert_eq!(count_teachers(&conn).unwrap(), 0);
    }

    #[test]
    fn test_promote_duplicate_cpf_rolls_back() {
        let mut conn = open();
        insert_teacher(&conn, &record("Maria", "529.982.247-25")).unwrap();
        let id = save_draft(&conn, &sample_form("Maria 2", "529.982.247-25"), None).unwrap();

        let err = promote_draft(&mut conn, id, &EligibilityWindow::fundef()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCpf(_)));
        assert!(load_draft(&conn, id).unwrap().is_some());
    }
}
