use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use super::people::{self, INSTRUCTORS};
use super::{is_primary_key_violation, like_pattern, normalize_ref, LOG_TARGET};
use crate::error::{EntityKind, RecordError, Result};
use crate::models::Course;
use crate::validation::validate_required;

pub(super) fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        instructor_id: row.get(2)?,
    })
}

pub(super) fn exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM courses WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}

/// Validate the fields and the optional instructor link of a course.
fn validated(id: &str, name: &str, instructor_id: Option<&str>) -> Result<Course> {
    let id = validate_required("Course ID", id)?;
    let name = validate_required("Course name", name)?;
    Ok(Course {
        id: id.to_string(),
        name: name.to_string(),
        instructor_id: normalize_ref(instructor_id).map(str::to_string),
    })
}

fn check_instructor(conn: &Connection, course: &Course) -> Result<()> {
    match &course.instructor_id {
        Some(instructor_id) if !people::exists(conn, INSTRUCTORS, instructor_id)? => Err(
            RecordError::unknown_reference(EntityKind::Instructor, instructor_id),
        ),
        _ => Ok(()),
    }
}

/// Insert a course after checking its instructor reference.
pub(super) fn insert(
    conn: &Connection,
    id: &str,
    name: &str,
    instructor_id: Option<&str>,
) -> Result<Course> {
    let course = validated(id, name, instructor_id)?;
    check_instructor(conn, &course)?;

    conn.execute(
        "INSERT INTO courses (id, name, instructor_id) VALUES (?1, ?2, ?3)",
        params![course.id, course.name, course.instructor_id],
    )
    .map_err(|err| {
        if is_primary_key_violation(&err) {
            RecordError::DuplicateKey {
                entity: EntityKind::Course,
                id: course.id.clone(),
            }
        } else {
            err.into()
        }
    })?;

    Ok(course)
}

fn update(conn: &Connection, id: &str, name: &str, instructor_id: Option<&str>) -> Result<Course> {
    let course = validated(id, name, instructor_id)?;
    if !exists(conn, &course.id)? {
        return Err(RecordError::not_found(EntityKind::Course, &course.id));
    }
    check_instructor(conn, &course)?;

    conn.execute(
        "UPDATE courses SET name = ?1, instructor_id = ?2 WHERE id = ?3",
        params![course.name, course.instructor_id, course.id],
    )?;
    Ok(course)
}

fn assign(conn: &Connection, instructor_id: &str, course_id: &str) -> Result<()> {
    if !people::exists(conn, INSTRUCTORS, instructor_id)? {
        return Err(RecordError::unknown_reference(
            EntityKind::Instructor,
            instructor_id,
        ));
    }
    if !exists(conn, course_id)? {
        return Err(RecordError::unknown_reference(EntityKind::Course, course_id));
    }

    conn.execute(
        "UPDATE courses SET instructor_id = ?1 WHERE id = ?2",
        params![instructor_id, course_id],
    )?;
    Ok(())
}

/// Every course in insertion order.
pub(super) fn fetch_all(conn: &Connection) -> Result<Vec<Course>> {
    let mut stmt = conn.prepare("SELECT id, name, instructor_id FROM courses ORDER BY rowid")?;
    let courses = stmt
        .query_map([], course_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(courses)
}

impl super::RecordStore {
    /// Insert a course with an optional instructor link. A link to an unknown
    /// instructor fails with `UnknownReference`.
    pub fn add_course(
        &mut self,
        id: &str,
        name: &str,
        instructor_id: Option<&str>,
    ) -> Result<Course> {
        let result = insert(&self.conn, id, name, instructor_id);
        match &result {
            Ok(course) => info!(target: LOG_TARGET, id = %course.id, "course added"),
            Err(err) => warn!(target: LOG_TARGET, id, error = %err, "course add rejected"),
        }
        result
    }

    /// Replace a course's name and instructor link. The link is re-validated.
    pub fn update_course(
        &mut self,
        id: &str,
        name: &str,
        instructor_id: Option<&str>,
    ) -> Result<Course> {
        let result = update(&self.conn, id, name, instructor_id);
        match &result {
            Ok(course) => info!(target: LOG_TARGET, id = %course.id, "course updated"),
            Err(err) => warn!(target: LOG_TARGET, id, error = %err, "course update rejected"),
        }
        result
    }

    /// Remove a course together with its registrations.
    pub fn delete_course(&mut self, id: &str) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM courses WHERE id = ?1", [id])?;
        if deleted == 0 {
            warn!(target: LOG_TARGET, id, "course delete rejected: not found");
            return Err(RecordError::not_found(EntityKind::Course, id));
        }
        info!(target: LOG_TARGET, id, "course deleted");
        Ok(())
    }

    /// Point a course at an instructor, replacing any previous assignment.
    pub fn assign_instructor(&mut self, instructor_id: &str, course_id: &str) -> Result<()> {
        let result = assign(&self.conn, instructor_id, course_id);
        match &result {
            Ok(()) => info!(target: LOG_TARGET, instructor_id, course_id, "instructor assigned"),
            Err(err) => warn!(
                target: LOG_TARGET,
                instructor_id,
                course_id,
                error = %err,
                "instructor assignment rejected"
            ),
        }
        result
    }

    pub fn get_course(&self, id: &str) -> Result<Option<Course>> {
        debug!(target: LOG_TARGET, id, "get course");
        let course = self
            .conn
            .query_row(
                "SELECT id, name, instructor_id FROM courses WHERE id = ?1",
                [id],
                course_from_row,
            )
            .optional()?;
        Ok(course)
    }

    pub fn list_courses(&self) -> Result<Vec<Course>> {
        fetch_all(&self.conn)
    }

    /// Courses whose id or name contains `query`, ignoring case.
    pub fn search_courses(&self, query: &str) -> Result<Vec<Course>> {
        if query.trim().is_empty() {
            return self.list_courses();
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, name, instructor_id FROM courses
             WHERE LOWER(id) LIKE ?1 ESCAPE '\\' OR LOWER(name) LIKE ?1 ESCAPE '\\'
             ORDER BY rowid",
        )?;
        let courses = stmt
            .query_map([like_pattern(query)], course_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(courses)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::RecordStore;
    use crate::error::{EntityKind, RecordError};

    fn store_with_instructors() -> RecordStore {
        let mut store = RecordStore::open_in_memory().unwrap();
        store.add_instructor("I1", "Grace", 45, "grace@x.com").unwrap();
        store.add_instructor("I2", "Alan", 41, "alan@x.com").unwrap();
        store
    }

    #[test]
    fn course_with_unknown_instructor_is_rejected() {
        let mut store = store_with_instructors();

        let err = store.add_course("C1", "Algebra", Some("I404")).unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnknownReference { entity: EntityKind::Instructor, ref id } if id == "I404"
        ));
        assert!(store.get_course("C1").unwrap().is_none());
    }

    #[test]
    fn course_without_instructor_is_allowed() {
        let mut store = store_with_instructors();
        store.add_course("C1", "Algebra", None).unwrap();
        store.add_course("C2", "Logic", Some("  ")).unwrap();

        assert_eq!(store.get_course("C1").unwrap().unwrap().instructor_id, None);
        assert_eq!(store.get_course("C2").unwrap().unwrap().instructor_id, None);
    }

    #[test]
    fn duplicate_course_id_is_rejected() {
        let mut store = store_with_instructors();
        store.add_course("C1", "Algebra", Some("I1")).unwrap();

        let err = store.add_course("C1", "Geometry", None).unwrap_err();
        assert!(matches!(err, RecordError::DuplicateKey { entity: EntityKind::Course, .. }));
        assert_eq!(store.get_course("C1").unwrap().unwrap().name, "Algebra");
    }

    #[test]
    fn update_revalidates_instructor_link() {
        let mut store = store_with_instructors();
        store.add_course("C1", "Algebra", Some("I1")).unwrap();

        let err = store.update_course("C1", "Algebra II", Some("I9")).unwrap_err();
        assert!(matches!(err, RecordError::UnknownReference { .. }));
        let course = store.get_course("C1").unwrap().unwrap();
        assert_eq!(course.name, "Algebra");
        assert_eq!(course.instructor_id.as_deref(), Some("I1"));

        store.update_course("C1", "Algebra II", None).unwrap();
        let course = store.get_course("C1").unwrap().unwrap();
        assert_eq!(course.name, "Algebra II");
        assert_eq!(course.instructor_id, None);

        let err = store.update_course("C9", "Nope", None).unwrap_err();
        assert!(matches!(err, RecordError::NotFound { entity: EntityKind::Course, .. }));
    }

    #[test]
    fn reassigning_overwrites_link() {
        let mut store = store_with_instructors();
        store.add_course("C1", "Algebra", None).unwrap();

        store.assign_instructor("I1", "C1").unwrap();
        assert_eq!(
            store.get_course("C1").unwrap().unwrap().instructor_id.as_deref(),
            Some("I1")
        );

        store.assign_instructor("I2", "C1").unwrap();
        assert_eq!(
            store.get_course("C1").unwrap().unwrap().instructor_id.as_deref(),
            Some("I2")
        );
    }

    #[test]
    fn assignment_requires_both_sides() {
        let mut store = store_with_instructors();
        store.add_course("C1", "Algebra", None).unwrap();

        let err = store.assign_instructor("I9", "C1").unwrap_err();
        assert!(matches!(err, RecordError::UnknownReference { entity: EntityKind::Instructor, .. }));

        let err = store.assign_instructor("I1", "C9").unwrap_err();
        assert!(matches!(err, RecordError::UnknownReference { entity: EntityKind::Course, .. }));
    }

    #[test]
    fn deleting_instructor_clears_course_links() {
        let mut store = store_with_instructors();
        store.add_course("C1", "Algebra", Some("I1")).unwrap();
        store.add_course("C2", "Logic", Some("I2")).unwrap();

        store.delete_instructor("I1").unwrap();

        assert_eq!(store.get_course("C1").unwrap().unwrap().instructor_id, None);
        assert_eq!(
            store.get_course("C2").unwrap().unwrap().instructor_id.as_deref(),
            Some("I2")
        );
    }

    #[test]
    fn delete_course_requires_existing_id() {
        let mut store = store_with_instructors();
        store.add_course("C1", "Algebra", None).unwrap();
        store.delete_course("C1").unwrap();

        let err = store.delete_course("C1").unwrap_err();
        assert!(matches!(err, RecordError::NotFound { entity: EntityKind::Course, .. }));
    }

    #[test]
    fn search_courses_by_name() {
        let mut store = store_with_instructors();
        store.add_course("C1", "Linear Algebra", None).unwrap();
        store.add_course("C2", "Logic", None).unwrap();

        let hits = store.search_courses("ALGEBRA").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "C1");
    }
}
