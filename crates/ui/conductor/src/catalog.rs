//! Course catalog of the school.
//!
//! Static reference data; courses are not edited from the console.
use form_engine::FieldOption;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Course {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub monthly_fee: f64,
}

pub const CATEGORIES: &[(&str, &str)] = &[
    ("keys", "Keys"),
    ("strings", "Strings"),
    ("winds", "Winds"),
    ("voice", "Voice"),
];

pub const COURSES: &[Course] = &[
    Course {
        id: "piano-beginner",
        name: "Piano I",
        category: "keys",
        monthly_fee: 80.0,
    },
    Course {
        id: "piano-advanced",
        name: "Piano II",
        category: "keys",
        monthly_fee: 95.0,
    },
    Course {
        id: "organ",
        name: "Organ",
        category: "keys",
        monthly_fee: 110.0,
    },
    Course {
        id: "violin-kids",
        name: "Violin for kids",
        category: "strings",
        monthly_fee: 70.0,
    },
    Course {
        id: "cello",
        name: "Cello",
        category: "strings",
        monthly_fee: 90.0,
    },
    Course {
        id: "guitar",
        name: "Classical guitar",
        category: "strings",
        monthly_fee: 75.0,
    },
    Course {
        id: "flute",
        name: "Flute",
        category: "winds",
        monthly_fee: 75.0,
    },
    Course {
        id: "sax",
        name: "Saxophone",
        category: "winds",
        monthly_fee: 85.0,
    },
    Course {
        id: "choir",
        name: "Choir",
        category: "voice",
        monthly_fee: 40.0,
    },
    Course {
        id: "singing",
        name: "Solo singing",
        category: "voice",
        monthly_fee: 90.0,
    },
];

/// Instruments a teacher can be assigned to.
pub const INSTRUMENTS: &[(&str, &str)] = &[
    ("piano", "Piano"),
    ("organ", "Organ"),
    ("violin", "Violin"),
    ("cello", "Cello"),
    ("guitar", "Guitar"),
    ("flute", "Flute"),
    ("sax", "Saxophone"),
    ("voice", "Voice"),
];

pub fn course(id: &str) -> Option<&'static Course> {
    COURSES.iter().find(|c| c.id == id)
}

pub fn courses_in(category: &str) -> impl Iterator<Item = &'static Course> + '_ {
    COURSES.iter().filter(move |c| c.category == category)
}

pub fn category_options() -> Vec<FieldOption> {
    CATEGORIES
        .iter()
        .map(|(value, label)| FieldOption::new(*value, *label))
        .collect()
}

/// Courses of one category; every course when no category is picked yet.
pub fn course_options(category: Option<&str>) -> Vec<FieldOption> {
    COURSES
        .iter()
        .filter(|c| category.map_or(true, |cat| c.category == cat))
        .map(|c| FieldOption::new(c.id, c.name))
        .collect()
}

pub fn instrument_options() -> Vec<FieldOption> {
    INSTRUMENTS
        .iter()
        .map(|(value, label)| FieldOption::new(*value, *label))
        .collect()
}
