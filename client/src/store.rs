use shared::{NewUser, User, UserChanges};
use tokio::sync::watch;

use crate::service::{ServiceError, ServiceResult, UserApi};

/// Client-side mirror of the users collection.
///
/// The list is only ever replaced wholesale by [`UserStore::load`]; every
/// mutation goes to the server first and is followed by a full reload, so the
/// list never holds state the server has not confirmed. Failures are logged
/// and handed back to the caller with the list left as it was.
pub struct UserStore<A> {
    api: A,
    users: watch::Sender<Vec<User>>,
}

impl<A: UserApi> UserStore<A> {
    pub fn new(api: A) -> Self {
        let (users, _) = watch::channel(Vec::new());
        Self { api, users }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Snapshot of the current list, newest first.
    pub fn users(&self) -> Vec<User> {
        self.users.borrow().clone()
    }

    /// Receiver that is notified every time the list is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Vec<User>> {
        self.users.subscribe()
    }

    pub async fn load(&self) -> ServiceResult<()> {
        let users = self
            .api
            .fetch_users()
            .await
            .inspect_err(|e| tracing::error!("Error loading users: {}", e))?;
        tracing::debug!("Loaded {} users", users.len());
        self.users.send_replace(users);

        Ok(())
    }

    /// Creates the user, then reloads. Returns the created record.
    pub async fn add(&self, new_user: &NewUser) -> ServiceResult<User> {
        async {
            let user = self.api.create_user(new_user).await?;
            self.load().await?;
            Ok::<_, ServiceError>(user)
        }
        .await
        .inspect_err(|e| tracing::error!("Error adding user: {}", e))
    }

    /// Updates the user, then reloads. Returns the updated record.
    pub async fn edit(&self, id: i64, changes: &UserChanges) -> ServiceResult<User> {
        async {
            let user = self.api.update_user(id, changes).await?;
            self.load().await?;
            Ok::<_, ServiceError>(user)
        }
        .await
        .inspect_err(|e| tracing::error!("Error editing user: {}", e))
    }

    pub async fn remove(&self, id: i64) -> ServiceResult<()> {
        async {
            self.api.delete_user(id).await?;
            self.load().await
        }
        .await
        .inspect_err(|e| tracing::error!("Error deleting user: {}", e))
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    };

    use super::*;
    use chrono::Utc;
    use reqwest::StatusCode;
    use shared::{MessageBody, Sex};
    use tokio_test::{assert_err, assert_ok};
    use tracing_test::traced_test;

    /// In-memory stand-in for the api with the same status semantics.
    #[derive(Default)]
    struct FakeApi {
        users: Mutex<Vec<User>>,
        next_id: AtomicUsize,
        fetches: AtomicUsize,
        fail_fetch: AtomicBool,
    }

    fn status(status: StatusCode, message: &str) -> ServiceError {
        ServiceError::Status {
            status,
            message: message.to_string(),
        }
    }

    impl FakeApi {
        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl UserApi for FakeApi {
        async fn create_user(&self, user: &NewUser) -> ServiceResult<User> {
            let mut users = self.users.lock().unwrap();
            if users
                .iter()
                .any(|u| u.first_name == user.first_name && u.last_name == user.last_name)
            {
                return Err(status(
                    StatusCode::BAD_REQUEST,
                    "A user with that name already exists.",
                ));
            }
            let now = Utc::now();
            let created = User {
                id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1,
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                phone: user.phone.clone(),
                sex: user.sex,
                created_at: now,
                updated_at: now,
            };
            users.insert(0, created.clone());
            Ok(created)
        }

        async fn fetch_users(&self) -> ServiceResult<Vec<User>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(status(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"));
            }
            Ok(self.users.lock().unwrap().clone())
        }

        async fn fetch_user(&self, id: i64) -> ServiceResult<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or_else(|| status(StatusCode::NOT_FOUND, "User not found"))
        }

        async fn update_user(&self, id: i64, changes: &UserChanges) -> ServiceResult<User> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| status(StatusCode::NOT_FOUND, "User not found or no changes made"))?;
            if let Some(phone) = &changes.phone {
                user.phone = phone.clone();
            }
            if let Some(sex) = changes.sex {
                user.sex = sex;
            }
            Ok(user.clone())
        }

        async fn delete_user(&self, id: i64) -> ServiceResult<MessageBody> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.id != id);
            if users.len() == before {
                return Err(status(StatusCode::NOT_FOUND, "User not found"));
            }
            Ok(MessageBody::new("User deleted successfully"))
        }
    }

    fn new_user(first_name: &str, last_name: &str) -> NewUser {
        NewUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone: "555-0100".to_string(),
            sex: Sex::Female,
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_load_replaces_list() {
        let store = UserStore::new(FakeApi::default());
        assert_ok!(store.load().await);
        assert!(store.users().is_empty());

        store.api().create_user(&new_user("Ada", "Lovelace")).await.unwrap();
        assert!(store.users().is_empty());

        assert_ok!(store.load().await);
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_add_reloads() {
        let store = UserStore::new(FakeApi::default());
        let mut rx = store.subscribe();

        let ada = store.add(&new_user("Ada", "Lovelace")).await.unwrap();
        let grace = store.add(&new_user("Grace", "Hopper")).await.unwrap();

        assert_eq!(store.api().fetches(), 2);
        assert_eq!(store.users(), vec![grace, ada]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_add_failure_skips_reload() {
        let store = UserStore::new(FakeApi::default());
        store.add(&new_user("Ada", "Lovelace")).await.unwrap();

        let err = assert_err!(store.add(&new_user("Ada", "Lovelace")).await);
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(store.api().fetches(), 1);
        assert_eq!(store.users().len(), 1);
        assert!(logs_contain("Error adding user"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_edit_reloads() {
        let store = UserStore::new(FakeApi::default());
        let ada = store.add(&new_user("Ada", "Lovelace")).await.unwrap();

        let changes = UserChanges {
            phone: Some("555-0199".to_string()),
            ..Default::default()
        };
        let updated = store.edit(ada.id, &changes).await.unwrap();

        assert_eq!(updated.phone, "555-0199");
        assert_eq!(store.users(), vec![updated]);
        assert_eq!(store.api().fetches(), 2);

        let err = assert_err!(store.edit(ada.id + 1, &changes).await);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(store.api().fetches(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_remove_reloads() {
        let store = UserStore::new(FakeApi::default());
        let ada = store.add(&new_user("Ada", "Lovelace")).await.unwrap();

        assert_ok!(store.remove(ada.id).await);
        assert!(store.users().is_empty());

        let err = assert_err!(store.remove(ada.id).await);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(logs_contain("Error deleting user"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_reload_keeps_list() {
        let store = UserStore::new(FakeApi::default());
        store.add(&new_user("Ada", "Lovelace")).await.unwrap();

        store.api().fail_fetch.store(true, Ordering::SeqCst);
        let err = assert_err!(store.add(&new_user("Grace", "Hopper")).await);
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));

        // The create went through; only the reload failed.
        assert_eq!(store.users().len(), 1);
        assert_eq!(store.api().users.lock().unwrap().len(), 2);
        assert!(logs_contain("Error loading users"));
    }
}
