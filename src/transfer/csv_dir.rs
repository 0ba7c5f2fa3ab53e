//! Flat-file layout: one CSV per collection inside a directory, each with a
//! header row of field names. An empty `instructor_id` cell means the course
//! has no instructor.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::Snapshot;
use crate::error::{RecordError, Result};

pub const STUDENTS_FILE: &str = "students.csv";
pub const INSTRUCTORS_FILE: &str = "instructors.csv";
pub const COURSES_FILE: &str = "courses.csv";
pub const REGISTRATIONS_FILE: &str = "registrations.csv";

const PERSON_HEADERS: &[&str] = &["id", "name", "age", "email"];
const COURSE_HEADERS: &[&str] = &["id", "name", "instructor_id"];
const REGISTRATION_HEADERS: &[&str] = &["student_id", "course_id"];

/// Write the four tables into `dir`, creating it if needed. Existing files
/// with the same names are overwritten.
pub fn write_dir(dir: &Path, snapshot: &Snapshot) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| RecordError::io(dir, err))?;

    write_table(&dir.join(STUDENTS_FILE), PERSON_HEADERS, &snapshot.students)?;
    write_table(&dir.join(INSTRUCTORS_FILE), PERSON_HEADERS, &snapshot.instructors)?;
    write_table(&dir.join(COURSES_FILE), COURSE_HEADERS, &snapshot.courses)?;
    write_table(
        &dir.join(REGISTRATIONS_FILE),
        REGISTRATION_HEADERS,
        &snapshot.registrations,
    )?;
    Ok(())
}

/// Read the four tables from `dir`. A table whose file is absent is treated
/// as empty, but the directory itself must exist.
pub fn read_dir(dir: &Path) -> Result<Snapshot> {
    if !dir.is_dir() {
        return Err(RecordError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "export directory not found"),
        ));
    }

    Ok(Snapshot {
        students: read_table(&dir.join(STUDENTS_FILE))?,
        instructors: read_table(&dir.join(INSTRUCTORS_FILE))?,
        courses: read_table(&dir.join(COURSES_FILE))?,
        registrations: read_table(&dir.join(REGISTRATIONS_FILE))?,
    })
}

/// Headers are written by hand so empty tables still carry them.
fn write_table<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| csv_error(path, err))?;

    writer
        .write_record(headers)
        .map_err(|err| csv_error(path, err))?;
    for row in rows {
        writer.serialize(row).map_err(|err| csv_error(path, err))?;
    }
    writer.flush().map_err(|err| RecordError::io(path, err))
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = ::csv::Reader::from_path(path).map_err(|err| csv_error(path, err))?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|err| csv_error(path, err))
}

fn csv_error(path: &Path, err: ::csv::Error) -> RecordError {
    let message = err.to_string();
    match err.into_kind() {
        ::csv::ErrorKind::Io(source) => RecordError::io(path, source),
        _ => RecordError::format(path, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CourseRecord, PersonRecord, RegistrationRecord};
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        Snapshot {
            students: vec![PersonRecord {
                id: "S1".into(),
                name: "Ana, Jr.".into(),
                age: 20,
                email: "ana@x.com".into(),
            }],
            instructors: vec![],
            courses: vec![
                CourseRecord {
                    id: "C1".into(),
                    name: "Algebra".into(),
                    instructor_id: None,
                },
                CourseRecord {
                    id: "C2".into(),
                    name: "Logic".into(),
                    instructor_id: Some("I1".into()),
                },
            ],
            registrations: vec![RegistrationRecord {
                student_id: "S1".into(),
                course_id: "C1".into(),
            }],
        }
    }

    #[test]
    fn write_then_read_keeps_tables() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("export");

        write_dir(&out, &sample()).unwrap();
        assert_eq!(read_dir(&out).unwrap(), sample());
    }

    #[test]
    fn empty_tables_still_have_headers() {
        let dir = TempDir::new().unwrap();
        write_dir(dir.path(), &sample()).unwrap();

        let instructors = fs::read_to_string(dir.path().join(INSTRUCTORS_FILE)).unwrap();
        assert_eq!(instructors.trim(), "id,name,age,email");

        let courses = fs::read_to_string(dir.path().join(COURSES_FILE)).unwrap();
        let lines: Vec<_> = courses.lines().collect();
        assert_eq!(lines, ["id,name,instructor_id", "C1,Algebra,", "C2,Logic,I1"]);
    }

    #[test]
    fn missing_column_is_format_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STUDENTS_FILE), "id,name,age\nS1,Ana,20\n").unwrap();

        let err = read_dir(dir.path()).unwrap_err();
        assert!(matches!(err, RecordError::PersistenceFormat { .. }));
    }

    #[test]
    fn non_numeric_age_is_format_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(STUDENTS_FILE),
            "id,name,age,email\nS1,Ana,twenty,ana@x.com\n",
        )
        .unwrap();

        let err = read_dir(dir.path()).unwrap_err();
        assert!(matches!(err, RecordError::PersistenceFormat { .. }));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
    }
}
