//! Students and instructors share one table shape, so the queries are written
//! once against a `PersonTable` and the public methods pick the table.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use super::{is_primary_key_violation, like_pattern, LOG_TARGET};
use crate::error::{EntityKind, RecordError, Result};
use crate::models::{Instructor, Person, Student};
use crate::validation::{validate_age, validate_email, validate_required};

/// Table that stores one of the two person roles.
#[derive(Clone, Copy)]
pub(super) struct PersonTable {
    pub(super) kind: EntityKind,
    pub(super) table: &'static str,
}

pub(super) const STUDENTS: PersonTable = PersonTable {
    kind: EntityKind::Student,
    table: "students",
};

pub(super) const INSTRUCTORS: PersonTable = PersonTable {
    kind: EntityKind::Instructor,
    table: "instructors",
};

/// Run every field validator and return the normalized person.
pub(super) fn validated(id: &str, name: &str, age: i64, email: &str) -> Result<Person> {
    let id = validate_required("ID", id)?;
    let name = validate_required("Name", name)?;
    let age = validate_age(age)?;
    let email = validate_email(email)?;
    Ok(Person {
        id: id.to_string(),
        name: name.to_string(),
        age,
        email: email.to_string(),
    })
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        email: row.get(3)?,
    })
}

pub(super) fn exists(conn: &Connection, table: PersonTable, id: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table.table);
    let found = conn
        .query_row(&sql, [id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}

/// Insert a validated person, turning a primary key collision into
/// `DuplicateKey`.
pub(super) fn insert(conn: &Connection, table: PersonTable, person: &Person) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, name, age, email) VALUES (?1, ?2, ?3, ?4)",
        table.table
    );
    conn.execute(
        &sql,
        params![person.id, person.name, person.age, person.email],
    )
    .map_err(|err| {
        if is_primary_key_violation(&err) {
            RecordError::DuplicateKey {
                entity: table.kind,
                id: person.id.clone(),
            }
        } else {
            err.into()
        }
    })?;
    Ok(())
}

fn update(conn: &Connection, table: PersonTable, person: &Person) -> Result<()> {
    let sql = format!(
        "UPDATE {} SET name = ?1, age = ?2, email = ?3 WHERE id = ?4",
        table.table
    );
    let updated = conn.execute(
        &sql,
        params![person.name, person.age, person.email, person.id],
    )?;

    if updated == 0 {
        Err(RecordError::not_found(table.kind, &person.id))
    } else {
        Ok(())
    }
}

fn delete(conn: &Connection, table: PersonTable, id: &str) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table.table);
    let deleted = conn.execute(&sql, [id])?;

    if deleted == 0 {
        Err(RecordError::not_found(table.kind, id))
    } else {
        Ok(())
    }
}

fn fetch(conn: &Connection, table: PersonTable, id: &str) -> Result<Option<Person>> {
    let sql = format!(
        "SELECT id, name, age, email FROM {} WHERE id = ?1",
        table.table
    );
    Ok(conn.query_row(&sql, [id], person_from_row).optional()?)
}

/// Every row in insertion order.
pub(super) fn fetch_all(conn: &Connection, table: PersonTable) -> Result<Vec<Person>> {
    let sql = format!(
        "SELECT id, name, age, email FROM {} ORDER BY rowid",
        table.table
    );
    let mut stmt = conn.prepare(&sql)?;
    let people = stmt
        .query_map([], person_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(people)
}

fn search(conn: &Connection, table: PersonTable, query: &str) -> Result<Vec<Person>> {
    if query.trim().is_empty() {
        return fetch_all(conn, table);
    }

    let sql = format!(
        "SELECT id, name, age, email FROM {}
         WHERE LOWER(id) LIKE ?1 ESCAPE '\\' OR LOWER(name) LIKE ?1 ESCAPE '\\'
         ORDER BY rowid",
        table.table
    );
    let mut stmt = conn.prepare(&sql)?;
    let people = stmt
        .query_map([like_pattern(query)], person_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(people)
}

/// Shared add path for both roles so the two stay symmetric.
fn add(
    conn: &Connection,
    table: PersonTable,
    id: &str,
    name: &str,
    age: i64,
    email: &str,
) -> Result<Person> {
    let result = validated(id, name, age, email).and_then(|person| {
        insert(conn, table, &person)?;
        Ok(person)
    });

    match &result {
        Ok(person) => info!(target: LOG_TARGET, entity = %table.kind, id = %person.id, "record added"),
        Err(err) => warn!(target: LOG_TARGET, entity = %table.kind, id, error = %err, "add rejected"),
    }
    result
}

fn replace(
    conn: &Connection,
    table: PersonTable,
    id: &str,
    name: &str,
    age: i64,
    email: &str,
) -> Result<Person> {
    let result = validated(id, name, age, email).and_then(|person| {
        update(conn, table, &person)?;
        Ok(person)
    });

    match &result {
        Ok(person) => info!(target: LOG_TARGET, entity = %table.kind, id = %person.id, "record updated"),
        Err(err) => warn!(target: LOG_TARGET, entity = %table.kind, id, error = %err, "update rejected"),
    }
    result
}

fn remove(conn: &Connection, table: PersonTable, id: &str) -> Result<()> {
    let result = delete(conn, table, id);
    match &result {
        Ok(()) => info!(target: LOG_TARGET, entity = %table.kind, id, "record deleted"),
        Err(err) => warn!(target: LOG_TARGET, entity = %table.kind, id, error = %err, "delete rejected"),
    }
    result
}

impl super::RecordStore {
    /// Insert a new student. Fails with `DuplicateKey` when the id is taken
    /// and with `Validation` when any field is invalid.
    pub fn add_student(&mut self, id: &str, name: &str, age: i64, email: &str) -> Result<Student> {
        add(&self.conn, STUDENTS, id, name, age, email).map(|person| Student { person })
    }

    /// Replace the name, age and email of an existing student.
    pub fn update_student(
        &mut self,
        id: &str,
        name: &str,
        age: i64,
        email: &str,
    ) -> Result<Student> {
        replace(&self.conn, STUDENTS, id, name, age, email).map(|person| Student { person })
    }

    /// Remove a student. Their registrations cascade away with them.
    pub fn delete_student(&mut self, id: &str) -> Result<()> {
        remove(&self.conn, STUDENTS, id)
    }

    pub fn get_student(&self, id: &str) -> Result<Option<Student>> {
        debug!(target: LOG_TARGET, id, "get student");
        Ok(fetch(&self.conn, STUDENTS, id)?.map(|person| Student { person }))
    }

    pub fn list_students(&self) -> Result<Vec<Student>> {
        let people = fetch_all(&self.conn, STUDENTS)?;
        Ok(people.into_iter().map(|person| Student { person }).collect())
    }

    /// Students whose id or name contains `query`, ignoring case.
    pub fn search_students(&self, query: &str) -> Result<Vec<Student>> {
        let people = search(&self.conn, STUDENTS, query)?;
        Ok(people.into_iter().map(|person| Student { person }).collect())
    }

    /// Insert a new instructor. Same rules as `add_student`.
    pub fn add_instructor(
        &mut self,
        id: &str,
        name: &str,
        age: i64,
        email: &str,
    ) -> Result<Instructor> {
        add(&self.conn, INSTRUCTORS, id, name, age, email).map(|person| Instructor { person })
    }

    pub fn update_instructor(
        &mut self,
        id: &str,
        name: &str,
        age: i64,
        email: &str,
    ) -> Result<Instructor> {
        replace(&self.conn, INSTRUCTORS, id, name, age, email).map(|person| Instructor { person })
    }

    /// Remove an instructor. Courses they taught keep existing with no
    /// instructor assigned.
    pub fn delete_instructor(&mut self, id: &str) -> Result<()> {
        remove(&self.conn, INSTRUCTORS, id)
    }

    pub fn get_instructor(&self, id: &str) -> Result<Option<Instructor>> {
        debug!(target: LOG_TARGET, id, "get instructor");
        Ok(fetch(&self.conn, INSTRUCTORS, id)?.map(|person| Instructor { person }))
    }

    pub fn list_instructors(&self) -> Result<Vec<Instructor>> {
        let people = fetch_all(&self.conn, INSTRUCTORS)?;
        Ok(people.into_iter().map(|person| Instructor { person }).collect())
    }

    pub fn search_instructors(&self, query: &str) -> Result<Vec<Instructor>> {
        let people = search(&self.conn, INSTRUCTORS, query)?;
        Ok(people.into_iter().map(|person| Instructor { person }).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::RecordStore;
    use crate::error::{EntityKind, RecordError, ValidationError};

    fn store() -> RecordStore {
        RecordStore::open_in_memory().unwrap()
    }

    #[test]
    fn add_then_get_returns_same_fields() {
        let mut store = store();
        store.add_student("S1", "Ana", 20, "ana@x.com").unwrap();

        let student = store.get_student("S1").unwrap().unwrap();
        assert_eq!(student.person.id, "S1");
        assert_eq!(student.person.name, "Ana");
        assert_eq!(student.person.age, 20);
        assert_eq!(student.person.email, "ana@x.com");
    }

    #[test]
    fn padded_id_is_one_key_across_operations() {
        let mut store = store();
        store.add_student(" S1 ", " Ana ", 20, "ana@x.com").unwrap();

        let student = store.get_student(" S1 ").unwrap().unwrap();
        assert_eq!(student.person.id, " S1 ");
        assert_eq!(student.person.name, " Ana ");
        assert_eq!(store.get_student("S1").unwrap(), None);

        store.update_student(" S1 ", "Ana", 21, "ana@x.com").unwrap();
        assert_eq!(store.get_student(" S1 ").unwrap().unwrap().person.age, 21);
        assert!(matches!(
            store.update_student("S1", "Ana", 21, "ana@x.com").unwrap_err(),
            RecordError::NotFound { entity: EntityKind::Student, .. }
        ));

        store.add_course("C1", "Algebra", None).unwrap();
        store.register(" S1 ", "C1").unwrap();
        assert_eq!(store.courses_for_student(" S1 ").unwrap().len(), 1);

        store.delete_student(" S1 ").unwrap();
        assert!(store.list_students().unwrap().is_empty());
        assert!(store.list_registrations().unwrap().is_empty());
    }

    #[test]
    fn duplicate_student_id_is_rejected_and_original_kept() {
        let mut store = store();
        store.add_student("S1", "Ana", 20, "ana@x.com").unwrap();

        let err = store.add_student("S1", "Bob", 21, "bob@x.com").unwrap_err();
        assert!(matches!(
            err,
            RecordError::DuplicateKey { entity: EntityKind::Student, ref id } if id == "S1"
        ));

        let student = store.get_student("S1").unwrap().unwrap();
        assert_eq!(student.person.name, "Ana");
        assert_eq!(store.list_students().unwrap().len(), 1);
    }

    #[test]
    fn invalid_fields_are_validation_errors() {
        let mut store = store();

        let err = store.add_student("S1", "Ana", -3, "ana@x.com").unwrap_err();
        assert!(matches!(
            err,
            RecordError::Validation(ValidationError::NegativeAge { age: -3 })
        ));

        let err = store.add_instructor("I1", "Grace", 40, "grace").unwrap_err();
        assert!(matches!(
            err,
            RecordError::Validation(ValidationError::InvalidEmail { .. })
        ));

        let err = store.add_student("  ", "Ana", 20, "ana@x.com").unwrap_err();
        assert!(matches!(
            err,
            RecordError::Validation(ValidationError::Blank { field: "ID" })
        ));

        assert!(store.list_students().unwrap().is_empty());
        assert!(store.list_instructors().unwrap().is_empty());
    }

    #[test]
    fn same_id_may_exist_as_student_and_instructor() {
        let mut store = store();
        store.add_student("P1", "Ana", 20, "ana@x.com").unwrap();
        store.add_instructor("P1", "Grace", 45, "grace@x.com").unwrap();
    }

    #[test]
    fn update_replaces_fields_and_requires_existing_id() {
        let mut store = store();
        store.add_instructor("I1", "Grace", 45, "grace@x.com").unwrap();

        store
            .update_instructor("I1", "Grace Hopper", 46, "hopper@navy.mil")
            .unwrap();
        let instructor = store.get_instructor("I1").unwrap().unwrap();
        assert_eq!(instructor.person.name, "Grace Hopper");
        assert_eq!(instructor.person.age, 46);

        let err = store
            .update_instructor("I9", "Nobody", 30, "no@body.com")
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFound { entity: EntityKind::Instructor, .. }));
    }

    #[test]
    fn invalid_update_leaves_row_untouched() {
        let mut store = store();
        store.add_student("S1", "Ana", 20, "ana@x.com").unwrap();

        assert!(store.update_student("S1", "Ana", 20, "broken").is_err());
        let student = store.get_student("S1").unwrap().unwrap();
        assert_eq!(student.person.email, "ana@x.com");
    }

    #[test]
    fn delete_requires_existing_id() {
        let mut store = store();
        store.add_student("S1", "Ana", 20, "ana@x.com").unwrap();

        store.delete_student("S1").unwrap();
        assert!(store.get_student("S1").unwrap().is_none());

        let err = store.delete_student("S1").unwrap_err();
        assert!(matches!(err, RecordError::NotFound { entity: EntityKind::Student, .. }));
    }

    #[test]
    fn list_keeps_insertion_order() {
        let mut store = store();
        store.add_student("S3", "Cleo", 22, "cleo@x.com").unwrap();
        store.add_student("S1", "Ana", 20, "ana@x.com").unwrap();
        store.add_student("S2", "Bob", 21, "bob@x.com").unwrap();
        store.update_student("S3", "Cleo", 23, "cleo@x.com").unwrap();

        let ids: Vec<_> = store
            .list_students()
            .unwrap()
            .into_iter()
            .map(|s| s.person.id)
            .collect();
        assert_eq!(ids, ["S3", "S1", "S2"]);
    }

    #[test]
    fn search_matches_id_or_name_ignoring_case() {
        let mut store = store();
        store.add_student("S1", "Ana Lima", 20, "ana@x.com").unwrap();
        store.add_student("S2", "Bob", 21, "bob@x.com").unwrap();
        store.add_student("X_9", "Cleo", 22, "cleo@x.com").unwrap();

        let hits = store.search_students("lim").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "S1");

        assert_eq!(store.search_students("s").unwrap().len(), 2);
        assert_eq!(store.search_students("_").unwrap().len(), 1);
        assert_eq!(store.search_students("   ").unwrap().len(), 3);
    }
}
