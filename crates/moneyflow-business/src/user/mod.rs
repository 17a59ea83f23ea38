//! User management.

mod db;
mod models;
mod password;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use moneyflow_core::generate_id;
use moneyflow_store::{RecordStore, Transactor};
use tokio_util::sync::CancellationToken;

pub use models::{NewUser, UpdateUser, User};

use crate::check::{page_offset, parse_id, validate};
use crate::error::BusinessError;
use db::UserRecord;

pub(crate) const TABLE: &str = "users";
const RESOURCE: &str = "user";
const EMAIL_TAKEN: &str = "email is already in use";

/// User business operations.
pub struct UserCore<T: Transactor> {
    store: RecordStore<T, UserRecord>,
}

impl<T: Transactor> Clone for UserCore<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T: Transactor> std::fmt::Debug for UserCore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCore").finish_non_exhaustive()
    }
}

impl<T: Transactor> UserCore<T> {
    /// Creates the core on `transactor`.
    pub fn new(transactor: Arc<T>) -> Self {
        Self {
            store: RecordStore::new(transactor),
        }
    }

    /// The same core, aborting store work once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            store: self.store.with_cancellation(token),
        }
    }

    /// Adds a user. Emails are unique; the password is stored hashed.
    pub async fn create(&self, nu: NewUser, now: DateTime<Utc>) -> Result<User, BusinessError> {
        validate(&nu)?;
        let password_hash = password::hash(nu.password).await?;

        let record = UserRecord {
            user_id: generate_id(),
            name: nu.name,
            email: nu.email,
            roles: nu.roles,
            password_hash,
            date_created: now,
            date_updated: now,
        };

        self.store
            .scope()
            .within_transaction(|scope| {
                let tx = self.store.with_scope(scope);
                let record = &record;
                async move {
                    let taken = tx.query_by_field("email", &record.email).await?;
                    if !taken.is_empty() {
                        return Err(BusinessError::field("email", EMAIL_TAKEN));
                    }
                    tx.create(record).await?;
                    Ok(())
                }
            })
            .await?;

        Ok(record.into())
    }

    /// Modifies the user `user_id`.
    pub async fn update(
        &self,
        user_id: &str,
        uu: UpdateUser,
        now: DateTime<Utc>,
    ) -> Result<(), BusinessError> {
        parse_id(user_id)?;
        validate(&uu)?;
        let password_hash = match uu.password {
            Some(password) => Some(password::hash(password).await?),
            None => None,
        };

        self.store
            .scope()
            .within_transaction(|scope| {
                let tx = self.store.with_scope(scope);
                async move {
                    let mut record = tx
                        .query_by_id(user_id)
                        .await
                        .map_err(BusinessError::missing(RESOURCE))?;

                    if let Some(name) = uu.name {
                        record.name = name;
                    }
                    if let Some(email) = uu.email {
                        let taken = tx.query_by_field("email", &email).await?;
                        if taken.iter().any(|other| other.user_id != record.user_id) {
                            return Err(BusinessError::field("email", EMAIL_TAKEN));
                        }
                        record.email = email;
                    }
                    if let Some(granted) = uu.roles {
                        record.roles = granted;
                    }
                    if let Some(hash) = password_hash {
                        record.password_hash = hash;
                    }
                    record.date_updated = now;

                    tx.update(&record)
                        .await
                        .map_err(BusinessError::missing(RESOURCE))
                }
            })
            .await
    }

    /// Removes the user `user_id`. Removing an absent user succeeds.
    pub async fn delete(&self, user_id: &str) -> Result<(), BusinessError> {
        parse_id(user_id)?;
        self.store.delete(user_id).await?;
        tracing::debug!(%user_id, "user deleted");
        Ok(())
    }

    /// Returns one page of users in creation order. Pages start at 1.
    pub async fn query(&self, page: usize, rows: usize) -> Result<Vec<User>, BusinessError> {
        let records = self.store.query(page_offset(page, rows), rows).await?;
        Ok(records.into_iter().map(User::from).collect())
    }

    /// Returns the user `user_id`.
    pub async fn query_by_id(&self, user_id: &str) -> Result<User, BusinessError> {
        parse_id(user_id)?;
        self.store
            .query_by_id(user_id)
            .await
            .map(User::from)
            .map_err(BusinessError::missing(RESOURCE))
    }

    /// Returns the user whose email and password both match.
    ///
    /// An unknown email and a wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, BusinessError> {
        let Some(record) = self
            .store
            .query_by_field("email", email)
            .await?
            .into_iter()
            .next()
        else {
            tracing::debug!("authentication failed: unknown email");
            return Err(BusinessError::AuthFailed);
        };

        if !password::verify(password.to_string(), record.password_hash.clone()).await? {
            tracing::debug!(user_id = %record.user_id, "authentication failed: wrong password");
            return Err(BusinessError::AuthFailed);
        }
        Ok(record.into())
    }

    /// Returns the user with `email`.
    pub async fn query_by_email(&self, email: &str) -> Result<User, BusinessError> {
        self.store
            .query_by_field("email", email)
            .await?
            .into_iter()
            .next()
            .map(User::from)
            .ok_or(BusinessError::NotFound { resource: RESOURCE })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneyflow_core::roles;
    use moneyflow_store::MemoryDb;

    fn core() -> (MemoryDb, UserCore<MemoryDb>) {
        let db = MemoryDb::new();
        (db.clone(), UserCore::new(Arc::new(db)))
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada Lovelace".into(),
            email: email.into(),
            roles: vec![roles::USER.into()],
            password: "gophers".into(),
            password_confirm: "gophers".into(),
        }
    }

    #[tokio::test]
    async fn test_create_sets_id_and_dates() {
        let (_, core) = core();
        let now = Utc::now();
        let user = core.create(new_user("ada@example.com"), now).await.unwrap();

        assert!(parse_id(&user.id).is_ok());
        assert_eq!(user.date_created, now);
        assert_eq!(user.date_updated, now);
        assert_eq!(core.query_by_id(&user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (_, core) = core();
        core.create(new_user("ada@example.com"), Utc::now()).await.unwrap();

        let err = core
            .create(new_user("ada@example.com"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::Validation(ref f) if f.contains("email")));
        assert_eq!(core.query(1, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_reads_and_writes_in_one_transaction() {
        let (db, core) = core();
        let user = core.create(new_user("ada@example.com"), Utc::now()).await.unwrap();
        let begun = db.stats().begun;

        let later = Utc::now();
        core.update(
            &user.id,
            UpdateUser {
                name: Some("Countess".into()),
                ..UpdateUser::default()
            },
            later,
        )
        .await
        .unwrap();

        assert_eq!(db.stats().begun, begun + 1);
        let saved = core.query_by_id(&user.id).await.unwrap();
        assert_eq!(saved.name, "Countess");
        assert_eq!(saved.email, "ada@example.com");
        assert_eq!(saved.date_updated, later);
        assert_eq!(saved.date_created, user.date_created);
    }

    #[tokio::test]
    async fn test_update_email_collision() {
        let (_, core) = core();
        let ada = core.create(new_user("ada@example.com"), Utc::now()).await.unwrap();
        core.create(new_user("bob@example.com"), Utc::now()).await.unwrap();

        let same = UpdateUser {
            email: Some("ada@example.com".into()),
            ..UpdateUser::default()
        };
        core.update(&ada.id, same, Utc::now()).await.unwrap();

        let taken = UpdateUser {
            email: Some("bob@example.com".into()),
            ..UpdateUser::default()
        };
        assert!(matches!(
            core.update(&ada.id, taken, Utc::now()).await,
            Err(BusinessError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_ids() {
        let (_, core) = core();
        let absent = generate_id();

        assert!(matches!(
            core.query_by_id(&absent).await,
            Err(BusinessError::NotFound { resource: "user" })
        ));
        assert!(matches!(
            core.update(&absent, UpdateUser::default(), Utc::now()).await,
            Err(BusinessError::NotFound { .. })
        ));
        assert!(matches!(
            core.query_by_id("not-a-uuid").await,
            Err(BusinessError::InvalidId)
        ));
        assert!(matches!(core.delete("nope").await, Err(BusinessError::InvalidId)));
        core.delete(&absent).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_by_email() {
        let (_, core) = core();
        let user = core.create(new_user("ada@example.com"), Utc::now()).await.unwrap();
        assert_eq!(core.query_by_email("ada@example.com").await.unwrap().id, user.id);
        assert!(matches!(
            core.query_by_email("nobody@example.com").await,
            Err(BusinessError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (_, core) = core();
        let user = core.create(new_user("ada@example.com"), Utc::now()).await.unwrap();

        let found = core.authenticate("ada@example.com", "gophers").await.unwrap();
        assert_eq!(found.id, user.id);

        assert!(matches!(
            core.authenticate("ada@example.com", "wrong").await,
            Err(BusinessError::AuthFailed)
        ));
        assert!(matches!(
            core.authenticate("bob@example.com", "gophers").await,
            Err(BusinessError::AuthFailed)
        ));
    }

    #[tokio::test]
    async fn test_update_password() {
        let (_, core) = core();
        let user = core.create(new_user("ada@example.com"), Utc::now()).await.unwrap();

        core.update(
            &user.id,
            UpdateUser {
                password: Some("analytical engine".into()),
                password_confirm: Some("analytical engine".into()),
                ..UpdateUser::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(core.authenticate("ada@example.com", "gophers").await.is_err());
        assert!(core
            .authenticate("ada@example.com", "analytical engine")
            .await
            .is_ok());
    }
}
