use anyhow::Result;

/// Operator input port. Calls block until the operator answers.
pub trait Prompter: Send + Sync {
    /// Yes/no question.
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
    /// Single choice list. Returns the index of the chosen entry.
    fn select(&self, message: &str, choices: &[&str], default: usize) -> Result<usize>;
    /// Press-enter acknowledgment.
    fn acknowledge(&self, message: &str) -> Result<()>;
}

pub const PRESS_ENTER: &str = "PRESS ENTER TO CONTINUE..";

#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let answer = inquire::Confirm::new(message)
            .with_default(default)
            .prompt()?;
        Ok(answer)
    }

    fn select(&self, message: &str, choices: &[&str], default: usize) -> Result<usize> {
        let picked = inquire::Select::new(message, choices.to_vec())
            .with_starting_cursor(default.min(choices.len().saturating_sub(1)))
            .raw_prompt()?;
        Ok(picked.index)
    }

    fn acknowledge(&self, message: &str) -> Result<()> {
        inquire::Text::new(message).prompt()?;
        Ok(())
    }
}

/// True when the error comes from the operator aborting a prompt (Esc or Ctrl-C).
pub fn is_prompt_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<inquire::InquireError>(),
            Some(inquire::InquireError::OperationCanceled)
                | Some(inquire::InquireError::OperationInterrupted)
        )
    })
}
