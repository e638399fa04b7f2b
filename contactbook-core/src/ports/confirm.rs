//! Confirmation port - blocking yes/no prompt before destructive actions

use crate::domain::result::Result;

pub trait Confirmer {
    /// Ask the user; `Ok(false)` means declined
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

impl<F> Confirmer for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(self(prompt))
    }
}

/// Confirms everything (for `--force`)
pub struct AlwaysConfirm;

impl Confirmer for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}
