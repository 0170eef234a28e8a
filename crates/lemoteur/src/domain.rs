// Domain types shared by the engine, the register and the server

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Database identifier of a learner (user row).
pub type UserId = i64;

/// Database identifier of a program (course row).
pub type CourseId = i64;

/// Database identifier of a recommendation row.
pub type RecommendationId = i64;

/// Lowest grade average accepted anywhere in the system.
pub const MIN_GRADE_AVERAGE: f64 = 75.0;

/// Highest grade average accepted anywhere in the system.
pub const MAX_GRADE_AVERAGE: f64 = 100.0;

/// Academic track (senior high school strand).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Track {
    /// Science, Technology, Engineering and Mathematics
    Stem,
    /// Accountancy, Business and Management
    Abm,
    /// Humanities and Social Sciences
    Humss,
    /// Technical-Vocational-Livelihood
    Tvl,
}

impl Track {
    /// Every track, in display order.
    pub const ALL: [Track; 4] = [Track::Stem, Track::Humss, Track::Abm, Track::Tvl];

    /// Return the canonical string representation of the track.
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Stem => "STEM",
            Track::Abm => "ABM",
            Track::Humss => "HUMSS",
            Track::Tvl => "TVL",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STEM" => Ok(Track::Stem),
            "ABM" => Ok(Track::Abm),
            "HUMSS" => Ok(Track::Humss),
            "TVL" => Ok(Track::Tvl),
            other => Err(EngineError::InvalidValue(format!(
                "Unknown track '{}'. Must be one of: STEM, ABM, HUMSS, TVL",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Track {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Track> for String {
    fn from(track: Track) -> Self {
        track.as_str().to_string()
    }
}

/// General weighted average, bounded to `[75, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct GradeAverage(f64);

impl GradeAverage {
    /// Create a grade average, rejecting values outside `[75, 100]`.
    pub fn new(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() || !(MIN_GRADE_AVERAGE..=MAX_GRADE_AVERAGE).contains(&value) {
            return Err(EngineError::InvalidValue(format!(
                "Grade average must be between {} and {}, got {}",
                MIN_GRADE_AVERAGE, MAX_GRADE_AVERAGE, value
            )));
        }
        Ok(Self(value))
    }

    /// Raw value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for GradeAverage {
    type Error = EngineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GradeAverage> for f64 {
    fn from(value: GradeAverage) -> Self {
        value.0
    }
}

impl fmt::Display for GradeAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recommendation confidence, bounded to `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConfidenceScore(f64);

impl ConfidenceScore {
    /// Create a confidence score, rejecting values outside `[0, 100]`.
    pub fn new(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(EngineError::InvalidValue(format!(
                "Confidence score must be between 0 and 100, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Clamp an already computed value into `[0, 100]`.
    pub(crate) fn saturating(value: f64) -> Self {
        Self(value.clamp(0.0, 100.0))
    }

    /// Raw value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ConfidenceScore {
    type Error = EngineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfidenceScore> for f64 {
    fn from(value: ConfidenceScore) -> Self {
        value.0
    }
}

/// Lifecycle status of a recommendation.
///
/// Transitions are free-form: any status may be replaced by any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    /// Generated or created, awaiting a decision
    #[default]
    Pending,
    /// Accepted by the learner or an administrator
    Accepted,
    /// Rejected by the learner or an administrator
    Rejected,
}

impl RecommendationStatus {
    /// Every status value.
    pub const ALL: [RecommendationStatus; 3] = [
        RecommendationStatus::Pending,
        RecommendationStatus::Accepted,
        RecommendationStatus::Rejected,
    ];

    /// Return the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Pending => "pending",
            RecommendationStatus::Accepted => "accepted",
            RecommendationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(RecommendationStatus::Pending),
            "accepted" => Ok(RecommendationStatus::Accepted),
            "rejected" => Ok(RecommendationStatus::Rejected),
            other => Err(EngineError::InvalidValue(format!(
                "Status must be pending, accepted, or rejected, got '{}'",
                other
            ))),
        }
    }
}

/// The learner attributes the engine reasons about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// Learner (user) ID
    pub id: UserId,
    /// Academic track the learner belongs to
    pub track: Track,
    /// Learner grade average
    pub grade_average: GradeAverage,
}

/// A catalog entry the engine may recommend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Program (course) ID
    pub id: CourseId,
    /// Display name
    pub name: String,
    /// Track a learner must belong to
    pub required_track: Track,
    /// Minimum qualifying grade average
    pub minimum_average: GradeAverage,
}

/// A recommendation ready to be written to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecommendation {
    /// Learner the recommendation is for
    pub profile_id: UserId,
    /// Recommended program
    pub program_id: CourseId,
    /// Confidence score
    pub score: ConfidenceScore,
    /// Human-readable justification
    pub reasoning: String,
    /// Initial status
    pub status: RecommendationStatus,
}
