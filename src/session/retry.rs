use log::warn;

use crate::error::SessionError;

/// Counts consecutive misses and gives up once `limit` is reached.
#[derive(Debug)]
pub struct MissCounter {
    limit: u32,
    misses: u32,
}

impl MissCounter {
    pub fn new(limit: u32) -> Self {
        Self { limit, misses: 0 }
    }

    /// Takes effect on the next miss; the current streak is kept.
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    #[cfg(test)]
    pub fn misses(&self) -> u32 {
        self.misses
    }

    /// A value resets the streak. A miss extends it and fails with
    /// `ConnectionLost` on the `limit`-th in a row.
    pub fn observe<T>(&mut self, value: Option<T>) -> Result<Option<T>, SessionError> {
        match value {
            Some(v) => {
                if self.misses > 0 {
                    warn!("recovered after {} missed frames", self.misses);
                }
                self.misses = 0;
                Ok(Some(v))
            }
            None => {
                self.misses += 1;
                if self.misses >= self.limit {
                    return Err(SessionError::ConnectionLost {
                        misses: self.misses,
                    });
                }
                Ok(None)
            }
        }
    }
}

/// Calls `fetch` until it yields a value or the counter gives up.
pub fn acquire<T, E>(
    counter: &mut MissCounter,
    mut fetch: impl FnMut() -> Result<Option<T>, E>,
) -> Result<T, SessionError>
where
    SessionError: From<E>,
{
    loop {
        if let Some(v) = counter.observe(fetch()?)? {
            return Ok(v);
        }
    }
}
