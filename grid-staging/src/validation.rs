use crate::config::EngineConfig;
use crate::entity::Entity;
use crate::grouping::partition_by_group;
use crate::identity::Identity;
use crate::row::{Row, RowStatus};
use crate::util::errors::{Result, StagingError};
use std::collections::HashMap;
use std::fmt;

pub const REPRESENTATIVE_REQUIRED: &str = "representative required";
pub const ONLY_ONE_REPRESENTATIVE: &str = "only one representative allowed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    MissingField,
    RepresentativeRequired,
    MultipleRepresentatives,
    DuplicateBusinessKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub identity: Identity,
    pub field: String,
    pub message: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.identity, self.field, self.message)
    }
}

/// Ordered, non-empty list of violations when a working set is invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn for_row<'a>(&'a self, identity: &'a Identity) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| &v.identity == identity)
    }

    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> + '_ {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    fn push(&mut self, identity: &Identity, field: &str, message: impl Into<String>, kind: ViolationKind) {
        self.violations.push(Violation {
            identity: identity.clone(),
            field: field.to_string(),
            message: message.into(),
            kind,
        });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} problem(s)", self.violations.len())?;
        for (i, violation) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{violation}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationReport),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(report) => Some(report),
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(report) => Err(StagingError::Validation(report)),
        }
    }
}

impl From<ValidationReport> for ValidationResult {
    fn from(report: ValidationReport) -> Self {
        if report.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(report)
        }
    }
}

/// Pre-commit structural checks over a group or a whole working set.
///
/// Rules run in priority order (required fields, representative count,
/// business-key uniqueness) and every rule reports all of its failures.
/// Business keys are only checked against the rows passed in; rows that
/// are not loaded are the server's concern.
#[derive(Debug, Clone)]
pub struct InvariantValidator {
    enforce_representative: bool,
    enforce_unique_business_key: bool,
}

impl Default for InvariantValidator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl InvariantValidator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            enforce_representative: config.enforce_representative,
            enforce_unique_business_key: config.enforce_unique_business_key,
        }
    }

    pub fn validate<E: Entity>(&self, rows: &[Row<E>]) -> ValidationResult {
        let mut report = ValidationReport::default();
        check_required(rows, &mut report);
        if self.enforce_representative {
            check_representatives(rows, &mut report);
        }
        if self.enforce_unique_business_key {
            check_business_keys(rows, &mut report);
        }
        report.into()
    }
}

fn check_required<E: Entity>(rows: &[Row<E>], report: &mut ValidationReport) {
    for row in rows {
        if !matches!(row.status(), RowStatus::New | RowStatus::Updated) {
            continue;
        }
        for field in row.payload().missing_required() {
            report.push(row.identity(), field, format!("{field} is required"), ViolationKind::MissingField);
        }
    }
}

fn check_representatives<E: Entity>(rows: &[Row<E>], report: &mut ValidationReport) {
    for group in partition_by_group(rows.iter().filter(|row| row.is_live())) {
        let participates = group.rows.iter().any(|row| row.payload().is_representative().is_some());
        if !participates {
            continue;
        }
        let representatives = group.representatives();
        match representatives.len() {
            0 => report.push(
                group.rows[0].identity(),
                E::REPRESENTATIVE_FIELD,
                REPRESENTATIVE_REQUIRED,
                ViolationKind::RepresentativeRequired,
            ),
            1 => {}
            _ => {
                for row in representatives {
                    report.push(
                        row.identity(),
                        E::REPRESENTATIVE_FIELD,
                        ONLY_ONE_REPRESENTATIVE,
                        ViolationKind::MultipleRepresentatives,
                    );
                }
            }
        }
    }
}

fn check_business_keys<E: Entity>(rows: &[Row<E>], report: &mut ValidationReport) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<&Identity>)> = Vec::new();

    for row in rows.iter().filter(|row| row.is_live()) {
        let Some(key) = row.payload().business_key() else {
            continue;
        };
        if key.trim().is_empty() {
            continue;
        }
        match seen.get(&key) {
            Some(&slot) => buckets[slot].1.push(row.identity()),
            None => {
                seen.insert(key.clone(), buckets.len());
                buckets.push((key, vec![row.identity()]));
            }
        }
    }

    for (key, identities) in buckets.into_iter().filter(|(_, ids)| ids.len() > 1) {
        for identity in identities {
            report.push(
                identity,
                E::BUSINESS_KEY_FIELD,
                format!("{} '{key}' is used by more than one row", E::BUSINESS_KEY_FIELD),
                ViolationKind::DuplicateBusinessKey,
            );
        }
    }
}
