use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::db::Snapshot;
use crate::error::{RecordError, Result};

/// Write `snapshot` as a pretty-printed JSON object with `students`,
/// `instructors`, `courses` and `registrations` arrays.
pub fn write(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| RecordError::io(parent, err))?;
    }

    let file = File::create(path).map_err(|err| RecordError::io(path, err))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|err| json_error(path, err))?;
    writer.flush().map_err(|err| RecordError::io(path, err))
}

/// Parse a JSON document. A missing or misspelled top-level array and a
/// missing field inside a record are both `PersistenceFormat` errors.
pub fn read(path: &Path) -> Result<Snapshot> {
    let file = File::open(path).map_err(|err| RecordError::io(path, err))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|err| json_error(path, err))
}

/// I/O failures surfacing through serde stay `Io`; everything else is a
/// format problem.
fn json_error(path: &Path, err: serde_json::Error) -> RecordError {
    if err.is_io() {
        RecordError::io(path, err.into())
    } else {
        RecordError::format(path, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{PersonRecord, RegistrationRecord};
    use tempfile::TempDir;

    #[test]
    fn write_then_read_keeps_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export").join("school.json");
        let snapshot = Snapshot {
            students: vec![PersonRecord {
                id: "S1".into(),
                name: "Ana".into(),
                age: 20,
                email: "ana@x.com".into(),
            }],
            registrations: vec![RegistrationRecord {
                student_id: "S1".into(),
                course_id: "C1".into(),
            }],
            ..Snapshot::default()
        };

        write(&path, &snapshot).unwrap();
        assert_eq!(read(&path).unwrap(), snapshot);
    }

    #[test]
    fn document_uses_flat_field_maps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("school.json");
        fs::write(
            &path,
            r#"{
                "courses": [{"id": "C1", "name": "Algebra"}],
                "students": [{"id": "S1", "name": "Ana", "age": 20, "email": "ana@x.com"}],
                "instructors": [],
                "registrations": []
            }"#,
        )
        .unwrap();

        let snapshot = read(&path).unwrap();
        assert_eq!(snapshot.courses[0].instructor_id, None);
        assert_eq!(snapshot.students[0].name, "Ana");
        assert!(snapshot.instructors.is_empty());
    }

    #[test]
    fn malformed_documents_are_format_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read(&path).unwrap_err(),
            RecordError::PersistenceFormat { .. }
        ));

        fs::write(&path, r#"{"students": [{"id": "S1", "name": "Ana"}]}"#).unwrap();
        assert!(matches!(
            read(&path).unwrap_err(),
            RecordError::PersistenceFormat { .. }
        ));
    }

    #[test]
    fn missing_or_misspelled_arrays_are_format_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        let complete = r#""students": [], "instructors": [], "courses": [], "registrations": []"#;

        for body in [
            "{}".to_string(),
            r#"{"studnets": []}"#.to_string(),
            format!(r#"{{{complete}, "extra": []}}"#),
        ] {
            fs::write(&path, &body).unwrap();
            assert!(
                matches!(read(&path).unwrap_err(), RecordError::PersistenceFormat { .. }),
                "{body} should be rejected"
            );
        }

        fs::write(&path, format!("{{{complete}}}")).unwrap();
        assert!(read(&path).unwrap().is_empty());
    }

    #[test]
    fn serializer_io_failure_is_io_error() {
        let path = Path::new("school.json");
        let broken = serde_json::Error::io(std::io::Error::other("disk full"));
        assert!(matches!(json_error(path, broken), RecordError::Io { .. }));

        let syntax = serde_json::from_str::<Snapshot>("{").unwrap_err();
        assert!(matches!(
            json_error(path, syntax),
            RecordError::PersistenceFormat { .. }
        ));
    }

    #[test]
    fn write_under_a_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = write(&blocker.join("school.json"), &Snapshot::default()).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
    }
}
