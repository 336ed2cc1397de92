use crate::enrollment_status::WriteError;
use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
};
use thiserror::Error;

/// Largest number of learners a single bulk write may carry
pub const MAX_ENROLLMENT_RECORDS: usize = 25;

/// Which kinds of writes a bulk request may perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMode {
    pub create: bool,
    pub update: bool,
}

impl WriteMode {
    /// POST semantics
    pub const CREATE: Self = WriteMode {
        create: true,
        update: false,
    };
    /// PATCH semantics
    pub const UPDATE: Self = WriteMode {
        create: false,
        update: true,
    };
    /// PUT semantics
    pub const UPSERT: Self = WriteMode {
        create: true,
        update: true,
    };
}

/// A single learner entry of a bulk write
pub trait KeyedRequest {
    /// The learner's key in the external identity system
    fn key(&self) -> &str;

    /// The status as sent by the client, not yet validated
    fn raw_status(&self) -> &str;
}

/// What the database already holds for a learner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// A record exists and may be updated
    Exists,
    /// No record exists yet
    Absent,
    /// The learner can't be written at all (e.g. isn't in the program)
    Rejected(WriteError),
}

/// A write that passed planning and should be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedWrite<'a, R, S> {
    Create { request: &'a R, status: S },
    Update { request: &'a R, status: S },
}

impl<R: KeyedRequest, S> PlannedWrite<'_, R, S> {
    pub fn key(&self) -> &str {
        match self {
            Self::Create { request, .. } | Self::Update { request, .. } => request.key(),
        }
    }
}

/// The batch was refused before planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{requested} enrollments requested, but limit is {}.", MAX_ENROLLMENT_RECORDS)]
pub struct TooManyRecords {
    pub requested: usize,
}

/// Outcome of planning a bulk write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan<'a, R, S> {
    /// Writes to apply, in request order
    pub writes: Vec<PlannedWrite<'a, R, S>>,
    /// Learners rejected during planning, by key
    pub rejected: BTreeMap<String, WriteError>,
}

/// Decides, for every learner of a batch, whether to create, update, or reject
///
/// Every key appearing more than once is rejected as
/// [`WriteError::Duplicated`] and never written. A status that doesn't
/// parse is [`WriteError::InvalidStatus`]. Existing records are updated
/// when `mode.update` is set and otherwise conflict; missing ones are
/// created when `mode.create` is set and otherwise rejected with
/// `absent_error`.
pub fn plan_writes<'a, R, S, F>(
    requests: &'a [R],
    mode: WriteMode,
    absent_error: WriteError,
    mut state_of: F,
) -> Result<WritePlan<'a, R, S>, TooManyRecords>
where
    R: KeyedRequest,
    S: FromStr,
    F: FnMut(&R) -> RecordState,
{
    if requests.len() > MAX_ENROLLMENT_RECORDS {
        return Err(TooManyRecords {
            requested: requests.len(),
        });
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for request in requests {
        *counts.entry(request.key()).or_default() += 1;
    }

    let mut plan = WritePlan {
        writes: Vec::new(),
        rejected: BTreeMap::new(),
    };

    for request in requests {
        let key = request.key();
        if counts[key] > 1 {
            plan.rejected
                .insert(key.to_string(), WriteError::Duplicated);
            continue;
        }

        let Ok(status) = S::from_str(request.raw_status()) else {
            plan.rejected
                .insert(key.to_string(), WriteError::InvalidStatus);
            continue;
        };

        let write = match state_of(request) {
            RecordState::Rejected(error) => Err(error),
            RecordState::Exists if mode.update => Ok(PlannedWrite::Update { request, status }),
            RecordState::Exists => Err(WriteError::Conflict),
            RecordState::Absent if mode.create => Ok(PlannedWrite::Create { request, status }),
            RecordState::Absent => Err(absent_error),
        };

        match write {
            Ok(write) => plan.writes.push(write),
            Err(error) => {
                plan.rejected.insert(key.to_string(), error);
            }
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enrollment_status::ProgramEnrollmentStatus;
    use std::collections::HashSet;

    #[derive(Debug, PartialEq, Eq)]
    struct Request(&'static str, &'static str);

    impl KeyedRequest for Request {
        fn key(&self) -> &str {
            self.0
        }

        fn raw_status(&self) -> &str {
            self.1
        }
    }

    fn plan<'a>(
        requests: &'a [Request],
        existing: &[&str],
        mode: WriteMode,
    ) -> WritePlan<'a, Request, ProgramEnrollmentStatus> {
        let existing: HashSet<_> = existing.iter().copied().collect();
        plan_writes(requests, mode, WriteError::NotInProgram, |request| {
            if existing.contains(request.key()) {
                RecordState::Exists
            } else {
                RecordState::Absent
            }
        })
        .unwrap()
    }

    #[test]
    fn test_create_only() {
        let requests = [Request("new", "enrolled"), Request("old", "pending")];
        let plan = plan(&requests, &["old"], WriteMode::CREATE);

        assert_eq!(
            plan.writes,
            vec![PlannedWrite::Create {
                request: &requests[0],
                status: ProgramEnrollmentStatus::Enrolled
            }]
        );
        assert_eq!(plan.rejected["old"], WriteError::Conflict);
    }

    #[test]
    fn test_update_only() {
        let requests = [Request("new", "enrolled"), Request("old", "canceled")];
        let plan = plan(&requests, &["old"], WriteMode::UPDATE);

        assert_eq!(plan.writes.len(), 1);
        assert_eq!(plan.writes[0].key(), "old");
        assert!(matches!(plan.writes[0], PlannedWrite::Update { .. }));
        assert_eq!(plan.rejected["new"], WriteError::NotInProgram);
    }

    #[test]
    fn test_upsert() {
        let requests = [Request("new", "enrolled"), Request("old", "ended")];
        let plan = plan(&requests, &["old"], WriteMode::UPSERT);

        assert_eq!(plan.writes.len(), 2);
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn test_duplicates_are_never_written() {
        let requests = [
            Request("dup", "enrolled"),
            Request("ok", "enrolled"),
            Request("dup", "pending"),
        ];
        let plan = plan(&requests, &[], WriteMode::UPSERT);

        assert_eq!(plan.writes.len(), 1);
        assert_eq!(plan.writes[0].key(), "ok");
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.rejected["dup"], WriteError::Duplicated);
    }

    #[test]
    fn test_invalid_status() {
        let requests = [Request("a", "graduated")];
        let plan = plan(&requests, &[], WriteMode::CREATE);

        assert!(plan.writes.is_empty());
        assert_eq!(plan.rejected["a"], WriteError::InvalidStatus);
    }

    #[test]
    fn test_rejected_state_wins() {
        let requests = [Request("a", "enrolled")];
        let plan: WritePlan<'_, Request, ProgramEnrollmentStatus> =
            plan_writes(&requests, WriteMode::UPSERT, WriteError::NotFound, |_| {
                RecordState::Rejected(WriteError::NotInProgram)
            })
            .unwrap();

        assert_eq!(plan.rejected["a"], WriteError::NotInProgram);
    }

    #[test]
    fn test_too_many_records() {
        let requests: Vec<_> = (0..=MAX_ENROLLMENT_RECORDS)
            .map(|_| Request("k", "enrolled"))
            .collect();
        let err = plan_writes::<_, ProgramEnrollmentStatus, _>(
            &requests,
            WriteMode::CREATE,
            WriteError::NotInProgram,
            |_| RecordState::Absent,
        )
        .unwrap_err();

        assert_eq!(err.requested, MAX_ENROLLMENT_RECORDS + 1);
        assert_eq!(err.to_string(), "26 enrollments requested, but limit is 25.");
    }
}
