//! 会话标识
//!
//! 为一个浏览上下文提供稳定的匿名会话 ID，仅用于关联同一上下文内的事件。
//! 存储不可用时退化为临时 ID，绝不向宿主页面抛错。

mod store;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::analytics::is_valid_identifier;

const SESSION_PREFIX: &str = "sess_";
const MAX_SESSION_ID_LENGTH: usize = 128;

/// 生成新的会话 ID
pub fn generate_session_id() -> String {
    format!("{}{}", SESSION_PREFIX, uuid::Uuid::new_v4().simple())
}

pub struct SessionIdentityProvider<S: SessionStore> {
    store: S,
    current: Mutex<Option<String>>,
}

impl<S: SessionStore> SessionIdentityProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 获取当前会话 ID，首次调用时生成并持久化
    pub fn get_or_create_session_id(&self) -> String {
        let mut current = self.current.lock();
        if let Some(id) = current.as_ref() {
            return id.clone();
        }

        let id = match self.store.load() {
            Ok(Some(id)) if is_valid_identifier(&id, MAX_SESSION_ID_LENGTH) => {
                debug!("Session restored: {}", id);
                id
            }
            Ok(stored) => {
                if stored.is_some() {
                    warn!("Stored session id is malformed, regenerating");
                }
                let id = generate_session_id();
                if let Err(e) = self.store.save(&id) {
                    warn!("Session storage unavailable, using ephemeral id: {:#}", e);
                }
                id
            }
            Err(e) => {
                warn!("Session storage unavailable, using ephemeral id: {:#}", e);
                generate_session_id()
            }
        };

        *current = Some(id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn load(&self) -> anyhow::Result<Option<String>> {
            anyhow::bail!("storage disabled")
        }
        fn save(&self, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("storage disabled")
        }
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert!(a.starts_with("sess_"));
        assert_eq!(a.len(), 5 + 32);
        assert_ne!(a, b);
        assert!(is_valid_identifier(&a, MAX_SESSION_ID_LENGTH));
    }

    #[test]
    fn same_context_returns_same_id() {
        let provider = SessionIdentityProvider::new(MemorySessionStore::new());
        let first = provider.get_or_create_session_id();
        assert_eq!(provider.get_or_create_session_id(), first);
        assert_eq!(provider.store().load().unwrap(), Some(first));
    }

    #[test]
    fn broken_storage_fails_soft() {
        let provider = SessionIdentityProvider::new(BrokenStore);
        let id = provider.get_or_create_session_id();
        assert!(id.starts_with("sess_"));
        assert_eq!(provider.get_or_create_session_id(), id);
    }

    #[test]
    fn malformed_stored_value_is_replaced() {
        let store = MemorySessionStore::new();
        store.save("not a valid id!").unwrap();
        let provider = SessionIdentityProvider::new(store);
        let id = provider.get_or_create_session_id();
        assert!(id.starts_with("sess_"));
        assert_eq!(provider.store().load().unwrap(), Some(id));
    }
}
