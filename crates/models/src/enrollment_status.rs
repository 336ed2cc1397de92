use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

#[cfg(feature = "database")]
use sea_orm::sea_query::StringLen;

/// Status of a learner in a program
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[cfg_attr(feature = "database", derive(sea_orm::DeriveActiveEnum))]
#[cfg_attr(
    feature = "database",
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProgramEnrollmentStatus {
    #[cfg_attr(feature = "database", sea_orm(string_value = "enrolled"))]
    Enrolled,
    #[cfg_attr(feature = "database", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "database", sea_orm(string_value = "suspended"))]
    Suspended,
    #[cfg_attr(feature = "database", sea_orm(string_value = "canceled"))]
    Canceled,
    #[cfg_attr(feature = "database", sea_orm(string_value = "ended"))]
    Ended,
}

impl ProgramEnrollmentStatus {
    /// Whether the learner still has access to the program's courses
    pub fn is_active(self) -> bool {
        matches!(self, Self::Enrolled | Self::Pending)
    }

    pub fn active() -> Vec<Self> {
        Self::iter().filter(|status| status.is_active()).collect()
    }
}

/// Status of a learner in one course run of a program
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[cfg_attr(feature = "database", derive(sea_orm::DeriveActiveEnum))]
#[cfg_attr(
    feature = "database",
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProgramCourseEnrollmentStatus {
    #[cfg_attr(feature = "database", sea_orm(string_value = "active"))]
    Active,
    #[cfg_attr(feature = "database", sea_orm(string_value = "inactive"))]
    Inactive,
}

impl ProgramCourseEnrollmentStatus {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Enrollment track of a course enrollment
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[cfg_attr(feature = "database", derive(sea_orm::DeriveActiveEnum))]
#[cfg_attr(
    feature = "database",
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CourseMode {
    #[cfg_attr(feature = "database", sea_orm(string_value = "audit"))]
    Audit,
    #[cfg_attr(feature = "database", sea_orm(string_value = "honor"))]
    Honor,
    #[cfg_attr(feature = "database", sea_orm(string_value = "verified"))]
    Verified,
    #[cfg_attr(feature = "database", sea_orm(string_value = "professional"))]
    Professional,
    #[cfg_attr(feature = "database", sea_orm(string_value = "no-id-professional"))]
    NoIdProfessional,
    #[cfg_attr(feature = "database", sea_orm(string_value = "credit"))]
    Credit,
    #[cfg_attr(feature = "database", sea_orm(string_value = "masters"))]
    Masters,
}

impl CourseMode {
    /// Modes that are silently upgraded when a program learner enrolls
    pub fn promotes_to_masters(self) -> bool {
        matches!(self, Self::Audit | Self::Honor)
    }
}

/// Per-learner outcome of a bulk write that did not apply
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WriteError {
    /// The request listed the same learner more than once
    Duplicated,
    /// The requested status isn't one of the known statuses
    InvalidStatus,
    /// A record exists and updating wasn't allowed, or another program
    /// already holds the learner's active seat in the course
    Conflict,
    /// The learner has no enrollment in the program
    NotInProgram,
    /// The learner has no enrollment in the course and creating wasn't allowed
    NotFound,
    /// The change isn't allowed in the learner's current state
    IllegalOperation,
    InternalError,
}

/// Per-learner outcome of a bulk write
///
/// Serializes to the bare status string, e.g. `"enrolled"` or `"conflict"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WriteStatus<S> {
    Written(S),
    Failed(WriteError),
}

impl<S> WriteStatus<S> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

impl<S> From<WriteError> for WriteStatus<S> {
    fn from(error: WriteError) -> Self {
        Self::Failed(error)
    }
}

/// Aggregate outcome of a batch of writes or reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Nothing to report
    Empty,
    /// Every item succeeded
    AllOk,
    /// Some items succeeded
    Partial,
    /// No item succeeded
    AllFailed,
}

impl BatchOutcome {
    /// Summarizes a batch from per-item success flags
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let (mut ok, mut failed) = (0usize, 0usize);
        for flag in flags {
            if flag {
                ok += 1;
            } else {
                failed += 1;
            }
        }

        match (ok, failed) {
            (0, 0) => Self::Empty,
            (_, 0) => Self::AllOk,
            (0, _) => Self::AllFailed,
            _ => Self::Partial,
        }
    }
}
