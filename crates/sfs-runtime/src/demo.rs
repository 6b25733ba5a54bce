//! Demo data for `--offline` runs.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sfs_01_memberships::{InMemoryMembershipBackend, UserProfile};
use sfs_02_catalog::{InMemoryMaterialRepository, Material, MaterialType, ReviewStatus};
use shared_types::{ItemId, MembershipKind, UserId};

/// The user offline sessions sign in as unless told otherwise.
pub const DEMO_USER: &str = "demo-student";

const OTHER_USER: &str = "peer-tutor";

struct Seed {
    id: u64,
    owner: &'static str,
    material_type: MaterialType,
    title: &'static str,
    url: Option<&'static str>,
    subjects: &'static [&'static str],
    difficulties: &'static [&'static str],
    status: ReviewStatus,
    upvotes: u64,
    days_ago: i64,
}

const SEEDS: [Seed; 6] = [
    Seed {
        id: 1,
        owner: OTHER_USER,
        material_type: MaterialType::Youtube,
        title: "Derivatives in 10 minutes",
        url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
        subjects: &["Math", "AP Courses"],
        difficulties: &["Beginner"],
        status: ReviewStatus::Approved,
        upvotes: 12,
        days_ago: 20,
    },
    Seed {
        id: 2,
        owner: DEMO_USER,
        material_type: MaterialType::Pdf,
        title: "Cell biology notes",
        url: None,
        subjects: &["Biology", "Science"],
        difficulties: &["Intermediate"],
        status: ReviewStatus::Approved,
        upvotes: 5,
        days_ago: 14,
    },
    Seed {
        id: 3,
        owner: OTHER_USER,
        material_type: MaterialType::Link,
        title: "Python for absolute beginners",
        url: Some("https://docs.python.org/3/tutorial/"),
        subjects: &["Computer Science"],
        difficulties: &["Beginner", "All Levels"],
        status: ReviewStatus::Approved,
        upvotes: 8,
        days_ago: 9,
    },
    Seed {
        id: 4,
        owner: OTHER_USER,
        material_type: MaterialType::Document,
        title: "AP US History period outlines",
        url: Some("https://docs.google.com/document/d/apush-outline"),
        subjects: &["History", "AP Courses"],
        difficulties: &["AP/College Level"],
        status: ReviewStatus::Pending,
        upvotes: 0,
        days_ago: 3,
    },
    Seed {
        id: 5,
        owner: OTHER_USER,
        material_type: MaterialType::Course,
        title: "Linear algebra, full course",
        url: Some("https://ocw.mit.edu/courses/18-06-linear-algebra"),
        subjects: &["Math"],
        difficulties: &["Advanced"],
        status: ReviewStatus::Approved,
        upvotes: 3,
        days_ago: 6,
    },
    Seed {
        id: 6,
        owner: DEMO_USER,
        material_type: MaterialType::Link,
        title: "SAT reading strategies",
        url: Some("https://satsuite.collegeboard.org/sat/practice-preparation"),
        subjects: &["SAT/ACT Prep", "English"],
        difficulties: &["All Levels"],
        status: ReviewStatus::Pending,
        upvotes: 0,
        days_ago: 1,
    },
];

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn material(seed: &Seed) -> Material {
    let submitted_at = epoch() - Duration::days(seed.days_ago);
    let file_url = (seed.material_type == MaterialType::Pdf).then(|| {
        format!(
            "memory://study-materials/{}/{}_demo.pdf",
            seed.owner,
            submitted_at.timestamp_millis()
        )
    });
    let reviewed = seed.status != ReviewStatus::Pending;
    Material {
        id: ItemId::from(seed.id),
        user_id: UserId::from(seed.owner),
        material_type: seed.material_type,
        title: seed.title.to_string(),
        url: seed.url.map(str::to_string),
        file_url,
        description: None,
        subjects: seed.subjects.iter().map(|s| s.to_string()).collect(),
        difficulties: seed.difficulties.iter().map(|s| s.to_string()).collect(),
        status: seed.status,
        submitted_at,
        reviewed_at: reviewed.then(|| submitted_at + Duration::days(1)),
        reviewer_notes: None,
        upvote_count: seed.upvotes,
        thumbnail_url: None,
    }
}

/// Backends pre-filled with a small catalog and the demo user's
/// profile, favorites, upvotes and enrollments.
pub fn seeded_backends() -> (InMemoryMembershipBackend, InMemoryMaterialRepository) {
    let memberships = InMemoryMembershipBackend::new();
    let repo = InMemoryMaterialRepository::new();
    let user = UserId::from(DEMO_USER);

    for seed in &SEEDS {
        repo.seed(material(seed));
        memberships.set_counter(ItemId::from(seed.id), seed.upvotes);
    }

    memberships.seed(&user, MembershipKind::FavoriteMaterial, [ItemId::from(1u64), ItemId::from(3u64)]);
    repo.record_favorite(&user, ItemId::from(1u64), epoch() - Duration::days(2));
    repo.record_favorite(&user, ItemId::from(3u64), epoch() - Duration::hours(5));

    memberships.seed(&user, MembershipKind::UpvoteMaterial, [ItemId::from(1u64)]);
    memberships.seed(&user, MembershipKind::FavoriteCourse, [ItemId::from("intro-to-statistics")]);
    memberships.seed(&user, MembershipKind::Enrollment, [ItemId::from("intro-to-statistics")]);
    memberships.seed_progress(&user, &ItemId::from("intro-to-statistics"), 40);

    let mut profile = UserProfile::new(DEMO_USER);
    profile.full_name = Some("Demo Student".into());
    profile.email = Some("demo@students4students.org".into());
    memberships.set_profile(profile);

    (memberships, repo)
}
