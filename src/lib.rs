// FUNDEF Registry - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod money;          // Currency in centavos
pub mod duration;       // Months worked inside the FUNDEF window
pub mod apportionment;  // Proportional rateio with reconciliation
pub mod cpf;
pub mod teacher;        // Records, forms, drafts
pub mod db;
pub mod export;         // CSV / Excel
pub mod config;
pub mod telemetry;

#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use money::{Money, MoneyError};
pub use duration::{months_worked, DurationError, EligibilityWindow, MAX_MONTHS, MIN_MONTHS};
pub use apportionment::{
    apportion, apportion_records, total_allocated,
    Allocation, ApportionmentError, ApportionmentReport, ApportionmentRow,
};
pub use cpf::{Cpf, CpfError};
pub use teacher::{
    parse_date, AccountType, Draft, FieldError, ServantStatus, TeacherForm, TeacherRecord,
};
pub use db::{
    setup_database, insert_teacher, update_teacher, delete_teacher, get_teacher,
    find_teacher_by_cpf, list_teachers, teachers_for_apportionment, count_teachers,
    save_draft, load_draft, list_drafts, remove_draft, promote_draft,
    SortOrder, StoreError, StoreResult,
};
pub use export::{
    export_csv, export_xlsx, export_apportionment_csv, export_apportionment_xlsx, ExportError,
};
pub use config::{AppConfig, ConfigError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
