use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{LedgerError, Result};

/// Scoped "ledger write in progress" marker.
///
/// Held from serialization until the file is flushed and renamed; dropping
/// it clears the marker on every exit path. Process-local only.
#[derive(Debug)]
pub struct WriteTransaction<'a> {
    flag: &'a AtomicBool,
}

impl<'a> WriteTransaction<'a> {
    pub fn begin(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LedgerError::WriteInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) { self.flag.store(false, Ordering::Release); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_refused_until_drop() {
        let flag = AtomicBool::new(false);
        let first = WriteTransaction::begin(&flag).unwrap();
        assert!(matches!(WriteTransaction::begin(&flag), Err(LedgerError::WriteInProgress)));
        drop(first);
        assert!(!flag.load(Ordering::Acquire));
        assert!(WriteTransaction::begin(&flag).is_ok());
    }
}
