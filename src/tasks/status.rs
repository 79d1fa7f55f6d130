//! Task lifecycle and advisory findings

use std::fmt;

/// Lifecycle of a search task
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Ready,
    Queued,
    InProgress,
    Done,
    /// The run failed; the message describes why
    ExecutionError(String),
    /// Cancelled before completion
    Terminated,
}

impl TaskStatus {
    /// Queued or running
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::InProgress)
    }

    /// Done, failed or terminated
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TaskStatus::Done | TaskStatus::ExecutionError(_) | TaskStatus::Terminated
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Ready => f.write_str("ready"),
            TaskStatus::Queued => f.write_str("queued"),
            TaskStatus::InProgress => f.write_str("in progress"),
            TaskStatus::Done => f.write_str("done"),
            TaskStatus::ExecutionError(message) => write!(f, "execution error: {}", message),
            TaskStatus::Terminated => f.write_str("terminated"),
        }
    }
}

/// Data-quality finding attached to a finished fit
///
/// Advisory only: a result is still produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Details {
    #[default]
    None,
    InsufficientDataInRange,
    /// Specific heat or density tables are missing for the derived properties
    InsufficientDataInProblemStatement,
    SignificantCorrelationBetweenParameters,
    ParameterValuesNotSensible,
    AbnormalDistributionOfResiduals,
    MaxIterationsReached,
}

impl fmt::Display for Details {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Details::None => "none",
            Details::InsufficientDataInRange => "insufficient data in range",
            Details::InsufficientDataInProblemStatement => "insufficient data in problem statement",
            Details::SignificantCorrelationBetweenParameters => "significant correlation between parameters",
            Details::ParameterValuesNotSensible => "parameter values not sensible",
            Details::AbnormalDistributionOfResiduals => "abnormal distribution of residuals",
            Details::MaxIterationsReached => "maximum iterations reached",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        assert!(TaskStatus::Queued.is_active());
        assert!(!TaskStatus::Ready.is_active());
        assert!(TaskStatus::ExecutionError("x".into()).is_finished());
        assert!(!TaskStatus::InProgress.is_finished());
    }

    #[test]
    fn test_display() {
        assert_eq!(TaskStatus::ExecutionError("boom".into()).to_string(), "execution error: boom");
        assert_eq!(
            Details::AbnormalDistributionOfResiduals.to_string(),
            "abnormal distribution of residuals"
        );
    }
}
