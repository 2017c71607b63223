//! Student roster

use crate::schema::RawRosterRecord;
use std::fmt;

/// A student account that may be picked on a lab machine
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub contact_email: String,
    pub secret: String,
    pub school: String,
    pub grade: String,
    pub group: String,
}

impl Identity {
    pub fn from_raw(raw: RawRosterRecord) -> Self {
        let (grade, group) = split_class(&raw.class);
        Self {
            display_name: raw.full_name.trim().to_string(),
            contact_email: raw.email.trim().to_string(),
            secret: raw.password,
            school: raw.school.trim().to_string(),
            grade,
            group,
        }
    }

    /// True when this identity belongs to the given class
    pub fn in_class(&self, school: &str, grade: &str, group: &str) -> bool {
        self.school == school && self.grade == grade && self.group == group
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("display_name", &self.display_name)
            .field("contact_email", &self.contact_email)
            .field("secret", &"<redacted>")
            .field("school", &self.school)
            .field("grade", &self.grade)
            .field("group", &self.group)
            .finish()
    }
}

/// Split "<grade> - <group>" on the first separator
fn split_class(class: &str) -> (String, String) {
    match class.split_once(" - ") {
        Some((grade, group)) => (grade.trim().to_string(), group.trim().to_string()),
        None => (class.trim().to_string(), String::new()),
    }
}

/// The loaded roster, in file order
#[derive(Debug, Clone, Default)]
pub struct Roster {
    identities: Vec<Identity>,
}

impl Roster {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Members of one class, sorted by display name
    pub fn class_members(&self, school: &str, grade: &str, group: &str) -> Vec<&Identity> {
        let mut members: Vec<&Identity> = self
            .identities
            .iter()
            .filter(|i| i.in_class(school, grade, group))
            .collect();
        members.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, class: &str) -> RawRosterRecord {
        RawRosterRecord {
            full_name: name.into(),
            email: format!("{}@example.org", name.to_lowercase()),
            password: "hunter2".into(),
            school: " Central ".into(),
            class: class.into(),
        }
    }

    #[test]
    fn class_is_split_into_grade_and_group() {
        let identity = Identity::from_raw(record("Ana", "5th grade - A"));
        assert_eq!(identity.grade, "5th grade");
        assert_eq!(identity.group, "A");
        assert_eq!(identity.school, "Central");
    }

    #[test]
    fn class_without_separator_is_grade_only() {
        let identity = Identity::from_raw(record("Ana", "5th grade"));
        assert_eq!(identity.grade, "5th grade");
        assert_eq!(identity.group, "");
    }

    #[test]
    fn class_splits_on_first_separator_only() {
        let identity = Identity::from_raw(record("Ana", "5th grade - A - morning"));
        assert_eq!(identity.grade, "5th grade");
        assert_eq!(identity.group, "A - morning");
    }

    #[test]
    fn debug_output_hides_secret() {
        let identity = Identity::from_raw(record("Ana", "5th grade - A"));
        let debug = format!("{:?}", identity);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn class_members_are_filtered_and_sorted() {
        let roster = Roster::new(vec![
            Identity::from_raw(record("Carla", "5th grade - A")),
            Identity::from_raw(record("Bruno", "5th grade - B")),
            Identity::from_raw(record("Ana", "5th grade - A")),
        ]);

        let names: Vec<&str> = roster
            .class_members("Central", "5th grade", "A")
            .iter()
            .map(|i| i.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Ana", "Carla"]);
    }
}
