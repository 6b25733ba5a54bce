//! Fixed vocabularies shared by the upload form, filters and category
//! browsing.

/// Subjects a material can be tagged with.
pub const SUBJECTS: [&str; 16] = [
    "Math",
    "Science",
    "English",
    "History",
    "Computer Science",
    "Foreign Language",
    "Art",
    "Music",
    "Economics",
    "Psychology",
    "Biology",
    "Chemistry",
    "Physics",
    "SAT/ACT Prep",
    "AP Courses",
    "Other",
];

/// Difficulty levels, easiest first.
pub const DIFFICULTIES: [&str; 5] = [
    "Beginner",
    "Intermediate",
    "Advanced",
    "AP/College Level",
    "All Levels",
];

/// Category slug to subject name.
pub const CATEGORY_SUBJECTS: [(&str, &str); 15] = [
    ("math", "Math"),
    ("science", "Science"),
    ("english", "English"),
    ("history", "History"),
    ("computer-science", "Computer Science"),
    ("foreign-language", "Foreign Language"),
    ("art", "Art"),
    ("music", "Music"),
    ("economics", "Economics"),
    ("psychology", "Psychology"),
    ("biology", "Biology"),
    ("chemistry", "Chemistry"),
    ("physics", "Physics"),
    ("sat-act-prep", "SAT/ACT Prep"),
    ("ap-courses", "AP Courses"),
];

/// Subject name for a category slug. Unknown slugs map to themselves.
pub fn subject_for_category(slug: &str) -> &str {
    CATEGORY_SUBJECTS
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, subject)| *subject)
        .unwrap_or(slug)
}

pub fn is_known_subject(subject: &str) -> bool {
    SUBJECTS.contains(&subject)
}

pub fn is_known_difficulty(difficulty: &str) -> bool {
    DIFFICULTIES.contains(&difficulty)
}
