use soroban_sdk::{contracttype, Env};

use crate::Lock;

const DAY_IN_LEDGERS: u32 = 17280;
const LEDGER_CLOSE_SECONDS: u64 = 5;

pub(crate) const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
pub(crate) const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;

pub(crate) const LOCK_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const LOCK_LIFETIME_THRESHOLD: u32 = LOCK_BUMP_AMOUNT - DAY_IN_LEDGERS;

/// Storage keys for the contract's persistent data
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Id the next created lock will receive (absent means 0)
    NextLockId,
    /// Lock record by id (lock_id -> Lock)
    Lock(u64),
}

pub(crate) fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Number of locks ever created, which is also the next id to assign.
pub(crate) fn next_lock_id(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::NextLockId)
        .unwrap_or(0)
}

pub(crate) fn set_next_lock_id(env: &Env, next: u64) {
    env.storage().instance().set(&DataKey::NextLockId, &next);
}

pub(crate) fn read_lock(env: &Env, lock_id: u64) -> Option<Lock> {
    let key = DataKey::Lock(lock_id);
    let lock: Option<Lock> = env.storage().persistent().get(&key);
    if lock.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(&key, LOCK_LIFETIME_THRESHOLD, LOCK_BUMP_AMOUNT);
    }
    lock
}

pub(crate) fn write_lock(env: &Env, lock: &Lock) {
    let key = DataKey::Lock(lock.lock_id);
    let extend_to = lock_ttl(env, lock);
    env.storage().persistent().set(&key, lock);
    env.storage().persistent().extend_ttl(
        &key,
        extend_to.saturating_sub(DAY_IN_LEDGERS),
        extend_to,
    );
}

/// Ledgers a lock record must stay live: until a day past its unlock time,
/// at least `LOCK_BUMP_AMOUNT`, at most the host maximum.
fn lock_ttl(env: &Env, lock: &Lock) -> u32 {
    let remaining = lock.unlock_time.saturating_sub(env.ledger().timestamp());
    let ledgers = (remaining / LEDGER_CLOSE_SECONDS).saturating_add(u64::from(DAY_IN_LEDGERS));
    u32::try_from(ledgers)
        .unwrap_or(u32::MAX)
        .max(LOCK_BUMP_AMOUNT)
        .min(env.storage().max_ttl())
}
