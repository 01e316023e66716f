//! Session identity tests

use adtrack::session::{FileSessionStore, SessionIdentityProvider, SessionStore};
use tempfile::TempDir;

#[test]
fn file_store_keeps_identity_across_providers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("session");

    let first = SessionIdentityProvider::new(FileSessionStore::new(&path))
        .get_or_create_session_id();
    assert!(first.starts_with("sess_"));
    assert!(path.exists());

    // 新的 provider 模拟同一浏览上下文的页面重新加载
    let second = SessionIdentityProvider::new(FileSessionStore::new(&path))
        .get_or_create_session_id();
    assert_eq!(first, second);
}

#[test]
fn separate_contexts_get_different_ids() {
    let dir = TempDir::new().unwrap();

    let a = SessionIdentityProvider::new(FileSessionStore::new(dir.path().join("a")))
        .get_or_create_session_id();
    let b = SessionIdentityProvider::new(FileSessionStore::new(dir.path().join("b")))
        .get_or_create_session_id();
    assert_ne!(a, b);
}

#[test]
fn missing_file_loads_as_none() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::new(dir.path().join("absent"));
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn unreadable_location_falls_back_to_ephemeral_id() {
    let dir = TempDir::new().unwrap();
    // 目录不能当作文件读写
    let provider = SessionIdentityProvider::new(FileSessionStore::new(dir.path()));

    let id = provider.get_or_create_session_id();
    assert!(id.starts_with("sess_"));
    assert_eq!(provider.get_or_create_session_id(), id);
}
