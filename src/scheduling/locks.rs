use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::repository::RepoError;

/// Per-party critical sections around "read calendar, check, write".
///
/// Every booking path locks the physician it touches (and the patient where
/// the patient's own calendar is checked), so two requests for the same
/// physician can't both pass the conflict check before either has written.
///
/// In-process mutexes serialize callers of one server. With a pool attached,
/// each section also holds `pg_advisory_xact_lock` on every key, which
/// extends the exclusion to other instances sharing the database.
#[derive(Clone, Default)]
pub struct BookingLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
    advisory: Option<PgPool>,
}

/// Held for the duration of a check-then-write sequence. Dropping it rolls
/// back the advisory transaction, which releases the database locks.
pub struct BookingGuard {
    _local: Vec<OwnedMutexGuard<()>>,
    _advisory: Option<Transaction<'static, Postgres>>,
}

impl BookingLocks {
    pub fn with_advisory(pool: PgPool) -> Self {
        Self {
            advisory: Some(pool),
            ..Self::default()
        }
    }

    /// Lock every key. Keys are taken in sorted order so overlapping key
    /// sets can't deadlock each other.
    pub async fn acquire(&self, keys: &[Uuid]) -> Result<BookingGuard, RepoError> {
        let mut keys = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let mutexes: Vec<Arc<AsyncMutex<()>>> = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on are dropped.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            keys.iter()
                .map(|k| Arc::clone(map.entry(*k).or_default()))
                .collect()
        };

        let mut local = Vec::with_capacity(mutexes.len());
        for m in mutexes {
            local.push(m.lock_owned().await);
        }

        let advisory = match &self.advisory {
            Some(pool) => Some(lock_in_database(pool, &keys).await?),
            None => None,
        };

        Ok(BookingGuard {
            _local: local,
            _advisory: advisory,
        })
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

async fn lock_in_database(
    pool: &PgPool,
    keys: &[Uuid],
) -> Result<Transaction<'static, Postgres>, RepoError> {
    let mut ids: Vec<i64> = keys.iter().map(|k| advisory_key(*k)).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut tx = pool.begin().await?;
    for id in ids {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    Ok(tx)
}

/// Advisory locks take a bigint; fold the uuid into one.
fn advisory_key(id: Uuid) -> i64 {
    let (hi, lo) = id.as_u64_pair();
    (hi ^ lo) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = BookingLocks::default();
        let key = Uuid::new_v4();

        let guard = locks.acquire(&[key]).await.unwrap();
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[key])).await;
        assert!(second.is_err(), "second acquire should block while the first is held");

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[key])).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let locks = BookingLocks::default();
        let _a = locks.acquire(&[Uuid::new_v4()]).await.unwrap();
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[Uuid::new_v4()])).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn duplicate_keys_do_not_self_deadlock() {
        let locks = BookingLocks::default();
        let key = Uuid::new_v4();
        let guard = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[key, key])).await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = BookingLocks::default();
        drop(locks.acquire(&[Uuid::new_v4(), Uuid::new_v4()]).await.unwrap());
        let _held = locks.acquire(&[Uuid::new_v4()]).await.unwrap();
        assert_eq!(locks.tracked(), 1);
    }

    #[test]
    fn advisory_key_is_stable_per_party() {
        let id = Uuid::from_u64_pair(0x0123_4567_89ab_cdef, 0x1111_2222_3333_4444);
        assert_eq!(advisory_key(id), advisory_key(id));
        assert_eq!(advisory_key(id), (0x0123_4567_89ab_cdef_u64 ^ 0x1111_2222_3333_4444) as i64);
        assert_ne!(advisory_key(id), advisory_key(Uuid::from_u64_pair(1, 2)));
    }

    #[test]
    fn plain_locks_have_no_database() {
        assert!(BookingLocks::default().advisory.is_none());
    }
}
