use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error,
}

/// Outcome of a command: a status plus an optional closing message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Exit {
    status: ExitStatus,
    message: Option<String>,
}

impl Exit {
    pub fn success() -> Self {
        Self {
            status: ExitStatus::Success,
            message: None,
        }
    }

    pub fn error() -> Self {
        Self {
            status: ExitStatus::Error,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// Print the message (to stderr on error) and turn the status into a
    /// process exit code.
    #[must_use]
    pub fn report(self, quiet: bool) -> ExitCode {
        match (self.status, self.message) {
            (ExitStatus::Success, Some(message)) if !quiet => println!("{message}"),
            (ExitStatus::Error, Some(message)) => eprintln!("{message}"),
            _ => {}
        }
        match self.status {
            ExitStatus::Success => ExitCode::SUCCESS,
            ExitStatus::Error => ExitCode::FAILURE,
        }
    }
}
