//! Legal session transitions. Anything not listed is rejected.

use super::types::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Resume,
    Advance { last: bool },
    End,
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::Start => "start the interview",
            SessionCommand::Resume => "resume the interview",
            SessionCommand::Advance { .. } => "advance to the next question",
            SessionCommand::End => "end the interview",
        }
    }
}

pub fn next_status(current: SessionStatus, command: SessionCommand) -> Option<SessionStatus> {
    match (current, command) {
        (SessionStatus::NotStarted | SessionStatus::Ended, SessionCommand::Start) => {
            Some(SessionStatus::InProgress)
        }
        (SessionStatus::NotStarted, SessionCommand::Resume) => Some(SessionStatus::InProgress),
        (SessionStatus::InProgress, SessionCommand::Advance { last: false }) => {
            Some(SessionStatus::InProgress)
        }
        (SessionStatus::InProgress, SessionCommand::Advance { last: true }) => {
            Some(SessionStatus::Ended)
        }
        (SessionStatus::InProgress, SessionCommand::End) => Some(SessionStatus::Ended),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::next_status;
    use super::SessionCommand::*;
    use super::SessionStatus::*;

    #[test]
    fn test_start_from_not_started() {
        assert_eq!(next_status(NotStarted, Start), Some(InProgress));
    }

    #[test]
    fn test_start_again_after_end() {
        assert_eq!(next_status(Ended, Start), Some(InProgress));
    }

    #[test]
    fn test_start_while_in_progress_rejected() {
        assert_eq!(next_status(InProgress, Start), None);
    }

    #[test]
    fn test_resume_only_from_not_started() {
        assert_eq!(next_status(NotStarted, Resume), Some(InProgress));
        assert_eq!(next_status(Ended, Resume), None);
    }

    #[test]
    fn test_advance_on_last_question_ends() {
        assert_eq!(next_status(InProgress, Advance { last: true }), Some(Ended));
        assert_eq!(
            next_status(InProgress, Advance { last: false }),
            Some(InProgress)
        );
    }

    #[test]
    fn test_advance_outside_session_rejected() {
        assert_eq!(next_status(NotStarted, Advance { last: false }), None);
        assert_eq!(next_status(Ended, Advance { last: true }), None);
    }

    #[test]
    fn test_end_only_from_in_progress() {
        assert_eq!(next_status(InProgress, End), Some(Ended));
        assert_eq!(next_status(NotStarted, End), None);
        assert_eq!(next_status(Ended, End), None);
    }
}
