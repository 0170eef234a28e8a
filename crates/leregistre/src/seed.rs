//! Built-in program catalog.

use lemoteur::{GradeAverage, Track, MIN_GRADE_AVERAGE};
use rusqlite::{params, params_from_iter};
use tracing::{info, warn};

use crate::error::{Result, StorageError};
use crate::schema::{now, Storage};

/// Program names inserted by [`seed_catalog`]
pub const CATALOG: &[&str] = &[
    "BS Computer Science",
    "BS Information Technology",
    "BS Civil Engineering",
    "BS Computer Engineering",
    "BS Electronics Engineering",
    "BS Mechanical Engineering",
    "BS Electrical Engineering",
    "BS Data Science",
    "BS Mathematics",
    "BS Statistics",
    "BS Geodetic Engineering",
    "BS Industrial Engineering",
    "BS Cybersecurity",
    "BS Accountancy",
    "BS Business Administration major in Marketing Management",
    "BS Business Administration major in Financial Management",
    "BS Business Administration major in Human Resource Management",
    "BS Entrepreneurship",
    "BS Customs Administration",
    "BS Real Estate Management",
    "BS Accounting Information Systems",
    "BS Management Accounting",
    "BS Business Administration major in Operations Management",
    "BS Business Economics",
    "BS Agribusiness",
    "BS Legal Management",
    "Bachelor of Public Administration",
    "BS Medical Technology",
    "BS Pharmacy",
    "BS Physical Therapy",
    "BS Occupational Therapy",
    "BS Biology",
    "BS Radiologic Technology",
    "BS Nutrition and Dietetics",
    "BS Midwifery",
    "BS Nursing",
    "BS Speech-Language Pathology",
    "BS Respiratory Therapy",
    "BS Chemistry",
    "BS Marine Biology",
    "BS Environmental Science",
    "BS Optometry",
    "BS Health Information Management",
    "BS Biotechnology",
    "BS Exercise and Sports Science",
    "BS Psychology",
    "BS Interior Design",
    "Bachelor of Fine Arts",
    "BA in Communication",
    "BS Entertainment and Multimedia Computing",
    "BA in Fashion Design and Merchandising",
    "BS Industrial Design",
    "BA in Digital Filmmaking",
    "BS Clothing Technology",
    "BS Architecture",
    "BS Multimedia Arts",
    "BA in Advertising Arts",
    "BA in Animation",
    "BA in Game Art and Design",
    "BA in Photography",
    "BA in Music Production",
    "BA in Theater Arts",
    "BS Landscape Architecture",
    "BA in Journalism",
    "BS Criminology",
    "BS Hospitality Management",
    "Bachelor of Secondary Education",
    "BS Tourism Management",
    "BS Office Administration",
    "Bachelor of Elementary Education",
    "BA in Political Science",
    "BS Social Work",
    "BS Development Communication",
    "Bachelor of Library and Information Science",
    "BS Community Development",
    "BS Forensic Science",
    "Bachelor of Special Needs Education",
    "BA in International Studies",
    "BA in Sociology",
    "BA in Philosophy",
    "Bachelor of Early Childhood Education",
    "Bachelor of Physical Education",
    "BA in Linguistics",
    "BS Environmental Planning",
    "BS Marine Transportation",
    "BS Marine Engineering",
    "BS Agriculture",
    "BS Forestry",
    "BS Fisheries",
    "Doctor of Veterinary Medicine",
    "BS Aeronautical Engineering",
    "BS Aircraft Maintenance Technology",
    "BS Aviation Electronics Technology",
    "BS Geology",
    "BS Physics",
    "BS Meteorology",
    "BS Food Technology",
    "BS Culinary Management",
    "Bachelor of Technical-Vocational Teacher Education",
];

const STEM_TERMS: &[&str] = &[
    "Engineering", "Science", "Technology", "Computer", "Computing", "Data", "Mathematics",
    "Statistics", "Physics", "Chemistry", "Biology", "Geology", "Forestry", "Fisheries",
    "Veterinary", "Cybersecurity", "Pharmacy", "Therapy", "Nursing", "Medical", "Meteorology",
    "Agriculture", "Architecture", "Marine",
];

const ABM_TERMS: &[&str] = &[
    "Business", "Accountancy", "Accounting", "Entrepreneurship", "Management", "Economics",
    "Agribusiness", "Customs", "Real Estate",
];

const HUMSS_TERMS: &[&str] = &[
    "Communication", "Journalism", "Philosophy", "Sociology", "Psychology", "Political",
    "Linguistics", "International", "Legal", "Public Administration", "Development",
    "Social Work", "Education", "Criminology", "Library", "Arts", "Animation", "Photography",
    "Filmmaking", "Music", "Theater",
];

const TVL_TERMS: &[&str] = &["Culinary", "Technical-Vocational", "Hospitality", "Tourism", "Office"];

/// Track a catalog program is offered to, derived from keywords in its name.
///
/// Keyword groups are tried in the order TVL, HUMSS, STEM, ABM; names
/// matching none fall back to STEM.
pub fn derive_track(name: &str) -> Track {
    let matches = |terms: &[&str]| terms.iter().any(|term| name.contains(term));
    if matches(TVL_TERMS) {
        Track::Tvl
    } else if matches(HUMSS_TERMS) {
        Track::Humss
    } else if matches(STEM_TERMS) {
        Track::Stem
    } else if matches(ABM_TERMS) {
        Track::Abm
    } else {
        Track::Stem
    }
}

/// Insert the built-in catalog in one transaction.
///
/// Refuses with [`StorageError::AlreadySeeded`] when any catalog name is
/// already present, unless `replace` is set, in which case every existing
/// course (and, by cascade, its recommendations) is removed first.
/// Returns the number of courses inserted.
pub fn seed_catalog(storage: &mut Storage, replace: bool) -> Result<usize> {
    let placeholders = vec!["?"; CATALOG.len()].join(", ");
    let existing: i64 = storage.conn().query_row(
        &format!(
            "SELECT COUNT(*) FROM courses WHERE course_name IN ({})",
            placeholders
        ),
        params_from_iter(CATALOG.iter()),
        |row| row.get(0),
    )?;

    if existing > 0 && !replace {
        warn!("{} catalog course(s) already exist; refusing to seed", existing);
        return Err(StorageError::AlreadySeeded(existing as usize));
    }

    let minimum = GradeAverage::new(MIN_GRADE_AVERAGE)
        .map_err(|e| StorageError::invalid(e.to_string()))?;
    let timestamp = now();
    let tx = storage.conn_mut().transaction()?;

    if existing > 0 {
        let removed = tx.execute("DELETE FROM courses", [])?;
        info!("Cleared {} existing courses", removed);
    }

    {
        let mut stmt = tx.prepare(
            "INSERT INTO courses (course_name, description, required_strand, minimum_gwa, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for name in CATALOG {
            stmt.execute(params![
                name,
                format!("Description for {}", name),
                derive_track(name).as_str(),
                minimum.value(),
                timestamp,
                timestamp,
            ])?;
        }
    }

    tx.commit()?;
    info!("Seeded {} courses", CATALOG.len());
    Ok(CATALOG.len())
}
