use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::{Course, Instructor, JoinedRegistration, Person, Student};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Pad or cut `text` to exactly `width` characters.
pub(crate) fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{text:<width$}")
    } else if width == 0 {
        String::new()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

fn person_row(person: &Person) -> String {
    format!(
        "{} {} {:>3}  {}",
        fit(&person.id, 10),
        fit(&person.name, 24),
        person.age,
        person.email
    )
}

pub(crate) fn student_row(student: &Student) -> String {
    person_row(&student.person)
}

pub(crate) fn instructor_row(instructor: &Instructor) -> String {
    person_row(&instructor.person)
}

pub(crate) fn course_row(course: &Course) -> String {
    format!(
        "{} {} {}",
        fit(&course.id, 10),
        fit(&course.name, 28),
        course.instructor_id.as_deref().unwrap_or("-")
    )
}

pub(crate) fn registration_row(row: &JoinedRegistration) -> String {
    format!(
        "#{:<4} {} {} {} {} {}",
        row.registration_id,
        fit(&row.student_id, 8),
        fit(&row.student_name, 18),
        fit(&row.course_id, 8),
        fit(&row.course_name, 20),
        row.instructor_label()
    )
}
