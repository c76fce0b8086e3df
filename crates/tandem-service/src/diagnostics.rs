//! Pre-flight checks for a deployment: upload directory and database file.

use crate::MIGRATIONS;
use crate::uploads::PhotoStore;
use diesel::{Connection, sqlite::SqliteConnection};
use diesel_migrations::MigrationHarness;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

#[derive(Debug, Clone)]
pub struct CheckLine {
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct DiagnosticReport {
    lines: Vec<CheckLine>,
}

impl DiagnosticReport {
    fn push(&mut self, status: CheckStatus, message: impl Into<String>) {
        self.lines.push(CheckLine {
            status,
            message: message.into(),
        });
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.lines.iter().filter(|l| l.status == status).count()
    }

    pub fn lines(&self) -> &[CheckLine] {
        &self.lines
    }

    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    pub fn warnings(&self) -> usize {
        self.count(CheckStatus::Warn)
    }

    pub fn is_healthy(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            let tag = match line.status {
                CheckStatus::Pass => "PASS",
                CheckStatus::Fail => "FAIL",
                CheckStatus::Warn => "WARN",
                CheckStatus::Info => "INFO",
            };
            writeln!(f, "[{tag}] {}", line.message)?;
        }
        write!(
            f,
            "{} passed, {} failed, {} warnings",
            self.passed(),
            self.failed(),
            self.warnings()
        )
    }
}

pub async fn run_checks(database_url: &str, photos: &PhotoStore) -> DiagnosticReport {
    let mut report = DiagnosticReport::default();
    check_uploads(&mut report, photos).await;
    check_database(&mut report, database_url);
    report
}

async fn check_uploads(report: &mut DiagnosticReport, photos: &PhotoStore) {
    let root = photos.root();
    if !root.exists() {
        report.push(
            CheckStatus::Warn,
            format!(
                "upload directory {} does not exist, it is created at startup",
                root.display()
            ),
        );
        return;
    }

    match photos.check_writable().await {
        Ok(()) => report.push(
            CheckStatus::Pass,
            format!("upload directory {} is writable", root.display()),
        ),
        Err(err) => report.push(
            CheckStatus::Fail,
            format!("upload directory {} is not writable: {err}", root.display()),
        ),
    }
    check_mode(report, root);
}

fn check_database(report: &mut DiagnosticReport, database_url: &str) {
    let path = Path::new(database_url);
    if database_url != ":memory:" {
        if !path.exists() {
            report.push(
                CheckStatus::Warn,
                format!("database {database_url} does not exist, it is created at startup"),
            );
            return;
        }

        if let Ok(meta) = path.metadata() {
            report.push(
                CheckStatus::Info,
                format!("database size: {:.2} KiB", meta.len() as f64 / 1024.0),
            );
        }
        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(_) => report.push(CheckStatus::Pass, "database file is readable and writable"),
            Err(err) => report.push(
                CheckStatus::Fail,
                format!("database file permissions are insufficient: {err}"),
            ),
        }
    }

    match SqliteConnection::establish(database_url) {
        Ok(mut conn) => match conn.has_pending_migration(MIGRATIONS) {
            Ok(false) => report.push(CheckStatus::Pass, "database schema is current"),
            Ok(true) => report.push(
                CheckStatus::Warn,
                "database has pending migrations, they run at startup",
            ),
            Err(err) => report.push(
                CheckStatus::Fail,
                format!("could not inspect migrations: {err}"),
            ),
        },
        Err(err) => report.push(
            CheckStatus::Fail,
            format!("could not open database: {err}"),
        ),
    }
}

#[cfg(unix)]
fn check_mode(report: &mut DiagnosticReport, dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(meta) = dir.metadata() else {
        report.push(CheckStatus::Warn, "could not read upload directory permissions");
        return;
    };
    let mode = meta.permissions().mode() & 0o777;
    report.push(CheckStatus::Info, format!("upload directory mode: {mode:o}"));
    if !matches!(mode, 0o755 | 0o775 | 0o777) {
        report.push(
            CheckStatus::Warn,
            format!("upload directory mode {mode:o} may be too strict, 755 is recommended"),
        );
    }
}

#[cfg(not(unix))]
fn check_mode(_report: &mut DiagnosticReport, _dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_paths_only_warn() {
        let dir = tempfile::tempdir().unwrap();
        let photos = PhotoStore::new(dir.path().join("uploads"));
        let db = dir.path().join("journal.db");

        let report = run_checks(db.to_str().unwrap(), &photos).await;
        assert!(report.is_healthy());
        assert_eq!(report.warnings(), 2);
    }

    #[tokio::test]
    async fn test_existing_setup_passes() {
        let dir = tempfile::tempdir().unwrap();
        let photos = PhotoStore::new(dir.path());
        let db = dir.path().join("journal.db");
        let db_url = db.to_str().unwrap().to_string();

        let mut conn = SqliteConnection::establish(&db_url).unwrap();
        crate::run_migrations(&mut conn).unwrap();
        drop(conn);

        let report = run_checks(&db_url, &photos).await;
        assert!(report.is_healthy(), "{report}");
        assert!(report.passed() >= 3);
        assert!(report.to_string().contains("database schema is current"));
    }
}
