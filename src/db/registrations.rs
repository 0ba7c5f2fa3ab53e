use rusqlite::{params, Connection, Row};
use tracing::{info, warn};

use super::people::{self, STUDENTS};
use super::{courses, is_unique_violation, LOG_TARGET};
use crate::error::{EntityKind, RecordError, Result};
use crate::models::Registration;

fn registration_from_row(row: &Row<'_>) -> rusqlite::Result<Registration> {
    Ok(Registration {
        id: row.get(0)?,
        student_id: row.get(1)?,
        course_id: row.get(2)?,
    })
}

/// Link a student to a course. Both sides must exist and the pair must be
/// new; the `UNIQUE(student_id, course_id)` constraint backs the second rule.
pub(super) fn insert(conn: &Connection, student_id: &str, course_id: &str) -> Result<Registration> {
    if !people::exists(conn, STUDENTS, student_id)? {
        return Err(RecordError::unknown_reference(EntityKind::Student, student_id));
    }
    if !courses::exists(conn, course_id)? {
        return Err(RecordError::unknown_reference(EntityKind::Course, course_id));
    }

    conn.execute(
        "INSERT INTO registrations (student_id, course_id) VALUES (?1, ?2)",
        params![student_id, course_id],
    )
    .map_err(|err| {
        if is_unique_violation(&err) {
            RecordError::DuplicateRegistration {
                student_id: student_id.to_string(),
                course_id: course_id.to_string(),
            }
        } else {
            err.into()
        }
    })?;

    Ok(Registration {
        id: conn.last_insert_rowid(),
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
    })
}

pub(super) fn fetch_all(conn: &Connection) -> Result<Vec<Registration>> {
    let mut stmt = conn.prepare("SELECT id, student_id, course_id FROM registrations ORDER BY id")?;
    let registrations = stmt
        .query_map([], registration_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(registrations)
}

impl super::RecordStore {
    /// Register a student for a course and return the new join row.
    pub fn register(&mut self, student_id: &str, course_id: &str) -> Result<Registration> {
        let result = insert(&self.conn, student_id, course_id);
        match &result {
            Ok(registration) => info!(
                target: LOG_TARGET,
                registration_id = registration.id,
                student_id,
                course_id,
                "student registered"
            ),
            Err(err) => warn!(
                target: LOG_TARGET,
                student_id,
                course_id,
                error = %err,
                "registration rejected"
            ),
        }
        result
    }

    /// Drop a single registration by its id.
    pub fn unregister(&mut self, registration_id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM registrations WHERE id = ?1", [registration_id])?;
        if deleted == 0 {
            warn!(target: LOG_TARGET, registration_id, "unregister rejected: not found");
            return Err(RecordError::not_found(
                EntityKind::Registration,
                registration_id.to_string(),
            ));
        }
        info!(target: LOG_TARGET, registration_id, "registration removed");
        Ok(())
    }

    /// Raw join rows ordered by registration id.
    pub fn list_registrations(&self) -> Result<Vec<Registration>> {
        fetch_all(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::RecordStore;
    use crate::error::{EntityKind, RecordError};

    fn seeded() -> RecordStore {
        let mut store = RecordStore::open_in_memory().unwrap();
        store.add_student("S1", "Ana", 20, "ana@x.com").unwrap();
        store.add_student("S2", "Bob", 21, "bob@x.com").unwrap();
        store.add_course("C1", "Algebra", None).unwrap();
        store.add_course("C2", "Logic", None).unwrap();
        store
    }

    #[test]
    fn register_requires_existing_student_and_course() {
        let mut store = seeded();

        let err = store.register("S9", "C1").unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnknownReference { entity: EntityKind::Student, .. }
        ));

        let err = store.register("S1", "C9").unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnknownReference { entity: EntityKind::Course, .. }
        ));

        assert!(store.list_registrations().unwrap().is_empty());
    }

    #[test]
    fn registering_same_pair_twice_fails() {
        let mut store = seeded();
        store.register("S1", "C1").unwrap();

        let err = store.register("S1", "C1").unwrap_err();
        assert!(matches!(
            err,
            RecordError::DuplicateRegistration { ref student_id, ref course_id }
                if student_id == "S1" && course_id == "C1"
        ));
        assert_eq!(store.list_registrations().unwrap().len(), 1);
    }

    #[test]
    fn registration_ids_increase() {
        let mut store = seeded();
        let first = store.register("S1", "C1").unwrap();
        let second = store.register("S2", "C1").unwrap();
        let third = store.register("S1", "C2").unwrap();

        assert!(first.id < second.id && second.id < third.id);
        let listed: Vec<_> = store
            .list_registrations()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, [first.id, second.id, third.id]);
    }

    #[test]
    fn unregister_removes_only_that_row() {
        let mut store = seeded();
        let keep = store.register("S1", "C1").unwrap();
        let drop = store.register("S2", "C1").unwrap();

        store.unregister(drop.id).unwrap();
        let remaining = store.list_registrations().unwrap();
        assert_eq!(remaining, vec![keep]);

        let err = store.unregister(drop.id).unwrap_err();
        assert!(matches!(
            err,
            RecordError::NotFound { entity: EntityKind::Registration, .. }
        ));
    }

    #[test]
    fn deleting_student_or_course_cascades_registrations() {
        let mut store = seeded();
        store.register("S1", "C1").unwrap();
        store.register("S1", "C2").unwrap();
        store.register("S2", "C2").unwrap();

        store.delete_student("S1").unwrap();
        let left = store.list_registrations().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].student_id, "S2");

        store.delete_course("C2").unwrap();
        assert!(store.list_registrations().unwrap().is_empty());
    }
}
