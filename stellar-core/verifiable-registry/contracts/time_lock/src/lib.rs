#![no_std]

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, log, token, Address, Env,
    Vec,
};

mod storage;


use storage::{extend_instance, next_lock_id, read_lock, set_next_lock_id, write_lock};

/// Ledger time units (seconds) per requested lock hour
pub const SECONDS_PER_HOUR: u64 = 3600;

/// A single time-committed deposit awaiting one withdrawal.
///
/// Records are never removed: once `withdrawn` flips to `true` the lock is
/// frozen and stays queryable as history.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lock {
    /// Sequential identifier, starting at 0
    pub lock_id: u64,
    /// Token contract holding the locked asset
    pub token_contract: Address,
    /// Depositor, the only address allowed to withdraw
    pub locker: Address,
    /// Quantity held in custody, always positive
    pub amount: i128,
    /// Ledger timestamp from which withdrawal is permitted
    pub unlock_time: u64,
    pub withdrawn: bool,
}

/// Event emitted when tokens are locked
#[contractevent]
#[derive(Clone, Debug)]
pub struct LockCreatedEvent {
    pub lock_id: u64,
    pub token_contract: Address,
    pub locker: Address,
    pub amount: i128,
    pub unlock_time: u64,
}

/// Event emitted when a lock is released to its owner
#[contractevent]
#[derive(Clone, Debug)]
pub struct TokensWithdrawnEvent {
    pub lock_id: u64,
    pub token_contract: Address,
    pub locker: Address,
    pub amount: i128,
}

/// Contract error codes
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum TokenLockerError {
    /// Lock amount must be strictly positive
    InvalidAmount = 1,
    /// Lock duration must be at least one hour
    InvalidDuration = 2,
    /// No lock exists with the given id
    LockNotFound = 3,
    /// Caller is not the depositor of the lock
    NotOwner = 4,
    /// Unlock time has not been reached
    TooEarly = 5,
    /// Lock has already been released
    AlreadyWithdrawn = 6,
    /// Token contract does not match the locked asset
    AssetMismatch = 7,
    /// Token contract refused the transfer
    AssetTransferFailed = 8,
    /// Unlock time overflows the ledger timestamp range
    ArithmeticOverflow = 9,
}

/// Time-locked escrow for SEP-41 tokens
#[contract]
pub struct TokenLocker;

#[contractimpl]
impl TokenLocker {
    /// Contract interface version
    pub fn version(_env: Env) -> u32 {
        1
    }

    /// Lock `amount` of `token_contract` for `duration_hours`
    ///
    /// The locker must have approved this contract to spend at least
    /// `amount` beforehand; the tokens are pulled with `transfer_from`.
    ///
    /// # Arguments
    /// * `env` - The Soroban environment
    /// * `locker` - The depositor, sole address allowed to withdraw later
    /// * `token_contract` - The token contract of the asset to lock
    /// * `amount` - Quantity to lock (must be positive)
    /// * `duration_hours` - Lock duration in hours (must be positive)
    ///
    /// # Returns
    /// * `Result<u64, TokenLockerError>` - The assigned lock ID or error
    pub fn lock_tokens(
        env: Env,
        locker: Address,
        token_contract: Address,
        amount: i128,
        duration_hours: u64,
    ) -> Result<u64, TokenLockerError> {
        locker.require_auth();

        if amount <= 0 {
            return Err(TokenLockerError::InvalidAmount);
        }
        if duration_hours == 0 {
            return Err(TokenLockerError::InvalidDuration);
        }

        let unlock_time = duration_hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(|secs| env.ledger().timestamp().checked_add(secs))
            .ok_or(TokenLockerError::ArithmeticOverflow)?;

        // Custody first: a refused transfer must leave no record behind
        Self::transfer_in(&env, &token_contract, &locker, amount)?;

        let lock_id = next_lock_id(&env);
        let next = lock_id
            .checked_add(1)
            .ok_or(TokenLockerError::ArithmeticOverflow)?;

        let lock = Lock {
            lock_id,
            token_contract: token_contract.clone(),
            locker: locker.clone(),
            amount,
            unlock_time,
            withdrawn: false,
        };
        write_lock(&env, &lock);
        set_next_lock_id(&env, next);
        extend_instance(&env);

        LockCreatedEvent {
            lock_id,
            token_contract,
            locker: locker.clone(),
            amount,
            unlock_time,
        }
        .publish(&env);

        log!(
            &env,
            "Lock {} created by {} for {} until {}",
            lock_id,
            locker,
            amount,
            unlock_time
        );

        Ok(lock_id)
    }

    /// Release a matured lock back to its depositor
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// existence, ownership, unlock time, withdrawn flag, then asset.
    ///
    /// # Arguments
    /// * `env` - The Soroban environment
    /// * `caller` - The caller address (must be the locker)
    /// * `token_contract` - The token contract of the locked asset
    /// * `lock_id` - The lock to release
    ///
    /// # Returns
    /// * `Result<(), TokenLockerError>` - Success or error
    pub fn withdraw_tokens(
        env: Env,
        caller: Address,
        token_contract: Address,
        lock_id: u64,
    ) -> Result<(), TokenLockerError> {
        caller.require_auth();

        let mut lock = read_lock(&env, lock_id).ok_or(TokenLockerError::LockNotFound)?;

        if caller != lock.locker {
            return Err(TokenLockerError::NotOwner);
        }
        if env.ledger().timestamp() < lock.unlock_time {
            return Err(TokenLockerError::TooEarly);
        }
        if lock.withdrawn {
            return Err(TokenLockerError::AlreadyWithdrawn);
        }
        if token_contract != lock.token_contract {
            return Err(TokenLockerError::AssetMismatch);
        }

        // Flag is persisted before the outbound call so a re-entrant
        // withdrawal sees the lock as released. A failed transfer aborts the
        // invocation and the host discards the flag with it.
        lock.withdrawn = true;
        write_lock(&env, &lock);

        Self::transfer_out(&env, &lock.token_contract, &lock.locker, lock.amount)?;
        extend_instance(&env);

        TokensWithdrawnEvent {
            lock_id,
            token_contract: lock.token_contract,
            locker: lock.locker.clone(),
            amount: lock.amount,
        }
        .publish(&env);

        log!(
            &env,
            "Lock {} withdrawn by {} ({})",
            lock_id,
            lock.locker,
            lock.amount
        );

        Ok(())
    }

    // ============ View Functions ============

    /// Get every lock not yet withdrawn, in ascending id order
    pub fn get_all_active_locks(env: Env) -> Vec<Lock> {
        let mut active = Vec::new(&env);
        for lock_id in 0..next_lock_id(&env) {
            if let Some(lock) = read_lock(&env, lock_id) {
                if !lock.withdrawn {
                    active.push_back(lock);
                }
            }
        }
        active
    }

    /// Get the active locks among ids `[start_id, start_id + limit)`
    ///
    /// At most `limit` records are read per call, so a page may hold fewer
    /// than `limit` locks (or none) while later ids are still active. Resume
    /// with `start_id + limit` until it reaches `lock_count()`.
    pub fn get_active_locks_page(env: Env, start_id: u64, limit: u32) -> Vec<Lock> {
        let mut page = Vec::new(&env);
        let end = start_id
            .saturating_add(u64::from(limit))
            .min(next_lock_id(&env));
        for lock_id in start_id..end {
            if let Some(lock) = read_lock(&env, lock_id) {
                if !lock.withdrawn {
                    page.push_back(lock);
                }
            }
        }
        page
    }

    /// Get a lock by id, including withdrawn ones
    pub fn get_lock(env: Env, lock_id: u64) -> Result<Lock, TokenLockerError> {
        read_lock(&env, lock_id).ok_or(TokenLockerError::LockNotFound)
    }

    /// Get the number of locks ever created
    pub fn lock_count(env: Env) -> u64 {
        next_lock_id(&env)
    }

    // ============ Internal Helper Functions ============

    /// Pull `amount` from `from` into custody using its allowance
    fn transfer_in(
        env: &Env,
        token_contract: &Address,
        from: &Address,
        amount: i128,
    ) -> Result<(), TokenLockerError> {
        let this = env.current_contract_address();
        match token::Client::new(env, token_contract).try_transfer_from(&this, from, &this, &amount)
        {
            Ok(Ok(())) => Ok(()),
            _ => Err(TokenLockerError::AssetTransferFailed),
        }
    }

    /// Send `amount` from custody to `to`
    fn transfer_out(
        env: &Env,
        token_contract: &Address,
        to: &Address,
        amount: i128,
    ) -> Result<(), TokenLockerError> {
        let this = env.current_contract_address();
        match token::Client::new(env, token_contract).try_transfer(&this, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(TokenLockerError::AssetTransferFailed),
        }
    }
}
