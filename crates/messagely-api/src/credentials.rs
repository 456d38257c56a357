use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;

use messagely_db::Database;
use messagely_db::models::UserRow;
use messagely_types::api::RegisterRequest;
use messagely_types::models::{UserProfile, UserRecord, UserSummary};

use crate::error::ApiError;

/// Argon2id cost parameters. Hashing time bounds login and registration
/// latency, so deployments tune this rather than hard-coding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashCost {
    /// Cheapest cost argon2 accepts. Only fit for tests.
    pub const MIN: HashCost = HashCost {
        memory_kib: Params::MIN_M_COST,
        iterations: Params::MIN_T_COST,
        parallelism: Params::MIN_P_COST,
    };
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Users and their password hashes.
pub struct CredentialStore {
    db: Arc<Database>,
    hasher: Argon2<'static>,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>, cost: HashCost) -> anyhow::Result<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| anyhow::anyhow!("Invalid password hash cost {:?}: {}", cost, e))?;

        Ok(Self {
            db,
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Store a new user. The returned record still holds the hash; do not
    /// send it to clients.
    pub fn register(&self, req: &RegisterRequest) -> Result<UserRecord, ApiError> {
        let required = [
            &req.username,
            &req.password,
            &req.first_name,
            &req.last_name,
            &req.phone,
        ];
        if required.iter().any(|field| field.is_empty()) {
            return Err(ApiError::Validation(
                "Please enter all required information".into(),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .hasher
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
            .to_string();

        let now = Utc::now();
        let row = UserRow {
            username: req.username.clone(),
            password: password_hash,
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            phone: req.phone.clone(),
            join_at: now,
            last_login_at: now,
        };

        if !self.db.create_user(&row)? {
            return Err(ApiError::Conflict(
                "Username is taken. Please select another".into(),
            ));
        }

        Ok(UserRecord {
            username: row.username,
            password_hash: row.password,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
        })
    }

    /// True only when `username` exists and `password` matches its hash.
    /// Wrong credentials are an ordinary `false`, not an error.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool, ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Please enter username and password".into(),
            ));
        }

        let Some(stored) = self.db.get_password_hash(username)? else {
            return Ok(false);
        };

        let parsed = PasswordHash::new(&stored)
            .map_err(|e| anyhow::anyhow!("Corrupt password hash for {}: {}", username, e))?;

        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Record a login. Does nothing for unknown usernames.
    pub fn touch_login(&self, username: &str) -> Result<(), ApiError> {
        self.db.touch_login(username, Utc::now())?;
        Ok(())
    }

    pub fn all(&self) -> Result<Vec<UserSummary>, ApiError> {
        let rows = self.db.list_users()?;
        Ok(rows
            .into_iter()
            .map(|row| UserSummary {
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
            })
            .collect())
    }

    pub fn get(&self, username: &str) -> Result<Option<UserProfile>, ApiError> {
        let row = self.db.get_user_by_username(username)?;
        Ok(row.map(|row| UserProfile {
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            join_at: row.join_at,
            last_login_at: row.last_login_at,
        }))
    }
}
