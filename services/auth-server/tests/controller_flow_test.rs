mod common;

use auth_server::application::controller::LOGIN_FAILED;
use auth_server::application::{LoginCommand, NewUser, NonceProof, PasswordEdit, UserEdit};
use authgate_auth_core::hash_challenge;
use authgate_common::UserId;
use authgate_errors::{AppError, NonceFailure};
use authgate_ports::{ChallengeRecord, NonceStore, UserRepository};
use base64::{Engine, engine::general_purpose::URL_SAFE};
use chrono::{Duration, Utc};
use common::{ADDR, Harness, OTHER_ADDR, secret};

fn login_cmd(username: &str, password: &str) -> LoginCommand {
    LoginCommand {
        username: username.to_string(),
        password: secret(password),
    }
}

fn new_user(username: &str, password: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: secret(password),
        admin: false,
        enabled: true,
    }
}

fn rename(target: UserId, email: &str) -> UserEdit {
    UserEdit {
        target_id: target,
        username: None,
        email: Some(email.to_string()),
        admin: None,
        enabled: None,
    }
}

#[tokio::test]
async fn test_admin_login_yields_admin_claim() {
    let h = Harness::new();
    let id = h.create_user("root", "root-password-1", true).await;

    let claims = h.login_claims("root", "root-password-1").await;

    assert_eq!(claims.sub, id);
    assert_eq!(claims.username, "root");
    assert_eq!(claims.email, "root@example.com");
    assert!(claims.admin);
    assert!(claims.exp > Utc::now().timestamp());
}

#[tokio::test]
async fn test_login_wrong_password_is_login_error() {
    let h = Harness::new();
    h.create_user("alice", "alice-password", false).await;

    let proof = h.proof(ADDR).await;
    let result = h.controller.login(login_cmd("alice", "wrong-password"), &proof).await;

    assert!(matches!(result, Err(AppError::Login(_))));
}

#[tokio::test]
async fn test_login_unknown_user_is_not_found() {
    let h = Harness::new();
    let proof = h.proof(ADDR).await;

    let result = h.controller.login(login_cmd("ghost", "whatever-pass"), &proof).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_disabled_account_cannot_login() {
    let h = Harness::new();
    common::create_user(&h.infra, h.users.as_ref(), "carol", "carol-password", false, false).await;

    let proof = h.proof(ADDR).await;
    let result = h.controller.login(login_cmd("carol", "carol-password"), &proof).await;
    assert!(matches!(result, Err(AppError::Login(_))));
}

#[tokio::test]
async fn test_disabled_account_is_indistinguishable_from_wrong_password() {
    let h = Harness::new();
    h.create_user("alice", "alice-password", false).await;
    common::create_user(&h.infra, h.users.as_ref(), "carol", "carol-password", false, false).await;

    let mut messages = Vec::new();
    for (username, password) in [
        ("alice", "wrong-password"),
        ("carol", "wrong-password"),
        ("carol", "carol-password"),
    ] {
        let proof = h.proof(ADDR).await;
        match h.controller.login(login_cmd(username, password), &proof).await {
            Err(AppError::Login(msg)) => messages.push(msg),
            other => panic!("expected login error, got {:?}", other),
        }
    }

    assert!(messages.iter().all(|m| m == LOGIN_FAILED));
}

#[tokio::test]
async fn test_nonce_is_single_use() {
    let h = Harness::new();
    h.create_user("alice", "alice-password", false).await;

    let proof = h.proof(ADDR).await;
    h.controller
        .login(login_cmd("alice", "alice-password"), &proof)
        .await
        .unwrap();

    let replay = h.controller.login(login_cmd("alice", "alice-password"), &proof).await;
    assert!(matches!(
        replay,
        Err(AppError::Nonce(NonceFailure::InvalidOrExpired))
    ));
}

#[tokio::test]
async fn test_nonce_from_different_address_is_rejected() {
    let h = Harness::new();
    h.create_user("alice", "alice-password", false).await;

    let issued = h.proof(ADDR).await;
    let stolen = NonceProof::new(issued.nonce.clone(), OTHER_ADDR);

    let result = h.controller.login(login_cmd("alice", "alice-password"), &stolen).await;
    assert!(matches!(
        result,
        Err(AppError::Nonce(NonceFailure::InvalidOrExpired))
    ));

    // 原地址仍可使用
    h.controller
        .login(login_cmd("alice", "alice-password"), &issued)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expired_nonce_is_rejected() {
    let h = Harness::new();
    h.create_user("alice", "alice-password", false).await;

    let raw = [42u8; 64];
    h.nonce_store
        .issue(ChallengeRecord {
            hash: hash_challenge(&raw),
            remote_address: ADDR.to_string(),
            issued_at: Utc::now() - Duration::minutes(6),
        })
        .await
        .unwrap();

    let token = URL_SAFE.encode(raw);
    let result = h
        .controller
        .login(login_cmd("alice", "alice-password"), &NonceProof::new(token, ADDR))
        .await;

    assert!(matches!(
        result,
        Err(AppError::Nonce(NonceFailure::InvalidOrExpired))
    ));
}

#[tokio::test]
async fn test_malformed_nonce() {
    let h = Harness::new();
    let result = h
        .controller
        .login(
            login_cmd("alice", "alice-password"),
            &NonceProof::new("***", ADDR),
        )
        .await;

    assert!(matches!(result, Err(AppError::Nonce(NonceFailure::Malformed))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_with_same_nonce_succeed_once() {
    let h = Harness::new();
    h.create_user("alice", "alice-password", false).await;
    let proof = h.proof(ADDR).await;

    let first = {
        let controller = h.controller.clone();
        let proof = proof.clone();
        tokio::spawn(async move {
            controller
                .login(login_cmd("alice", "alice-password"), &proof)
                .await
        })
    };
    let second = {
        let controller = h.controller.clone();
        let proof = proof.clone();
        tokio::spawn(async move {
            controller
                .login(login_cmd("alice", "alice-password"), &proof)
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(AppError::Nonce(NonceFailure::InvalidOrExpired))))
    );
}

#[tokio::test]
async fn test_add_user_then_login() {
    let h = Harness::new();

    let proof = h.proof(ADDR).await;
    let id = h
        .controller
        .add_user(new_user("dave", "dave-password"), &proof)
        .await
        .unwrap();

    let claims = h.login_claims("dave", "dave-password").await;
    assert_eq!(claims.sub, id);
    assert!(!claims.admin);

    let stored = h.users.find_by_id(&id).await.unwrap();
    assert!(stored.password_hash.as_str().starts_with("$2b$04$"));
}

#[tokio::test]
async fn test_add_user_weak_password_and_duplicate() {
    let h = Harness::new();
    h.create_user("alice", "alice-password", false).await;

    let proof = h.proof(ADDR).await;
    let weak = h.controller.add_user(new_user("erin", "short"), &proof).await;
    assert!(matches!(weak, Err(AppError::Validation(_))));

    let proof = h.proof(ADDR).await;
    let duplicate = h
        .controller
        .add_user(new_user("alice", "another-password"), &proof)
        .await;
    assert!(matches!(duplicate, Err(AppError::Duplicate(_))));
}

#[tokio::test]
async fn test_edit_user_self_and_other() {
    let h = Harness::new();
    let alice = h.create_user("alice", "alice-password", false).await;
    let bob = h.create_user("bob", "bob-password1", false).await;
    let claims = h.login_claims("alice", "alice-password").await;

    let proof = h.proof(ADDR).await;
    h.controller
        .edit_user(rename(alice, "alice@new.example"), &claims, &proof)
        .await
        .unwrap();
    assert_eq!(
        h.users.find_by_id(&alice).await.unwrap().email,
        "alice@new.example"
    );

    let proof = h.proof(ADDR).await;
    let result = h
        .controller
        .edit_user(rename(bob, "pwned@example.com"), &claims, &proof)
        .await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert_eq!(h.users.find_by_id(&bob).await.unwrap().email, "bob@example.com");
}

#[tokio::test]
async fn test_admin_edits_any_user() {
    let h = Harness::new();
    h.create_user("root", "root-password-1", true).await;
    let bob = h.create_user("bob", "bob-password1", false).await;
    let claims = h.login_claims("root", "root-password-1").await;

    let proof = h.proof(ADDR).await;
    let edit = UserEdit {
        target_id: bob,
        username: None,
        email: None,
        admin: None,
        enabled: Some(false),
    };
    h.controller.edit_user(edit, &claims, &proof).await.unwrap();
    assert!(!h.users.find_by_id(&bob).await.unwrap().enabled);
}

#[tokio::test]
async fn test_non_admin_cannot_grant_self_admin() {
    let h = Harness::new();
    let alice = h.create_user("alice", "alice-password", false).await;
    let claims = h.login_claims("alice", "alice-password").await;

    let proof = h.proof(ADDR).await;
    let edit = UserEdit {
        target_id: alice,
        username: None,
        email: None,
        admin: Some(true),
        enabled: None,
    };
    let result = h.controller.edit_user(edit, &claims, &proof).await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert!(!h.users.find_by_id(&alice).await.unwrap().admin);
}

#[tokio::test]
async fn test_empty_patch_is_validation_error() {
    let h = Harness::new();
    let alice = h.create_user("alice", "alice-password", false).await;
    let claims = h.login_claims("alice", "alice-password").await;

    let proof = h.proof(ADDR).await;
    let edit = UserEdit {
        target_id: alice,
        username: None,
        email: None,
        admin: None,
        enabled: None,
    };
    assert!(matches!(
        h.controller.edit_user(edit, &claims, &proof).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_wrong_old_password_leaves_hash_unchanged() {
    let h = Harness::new();
    let alice = h.create_user("alice", "alice-password", false).await;
    let claims = h.login_claims("alice", "alice-password").await;
    let before = h.users.find_by_id(&alice).await.unwrap().password_hash;

    let proof = h.proof(ADDR).await;
    let edit = PasswordEdit {
        target_id: alice,
        old_password: Some(secret("not-the-password")),
        new_password: secret("brand-new-password"),
    };
    let result = h.controller.edit_user_password(edit, &claims, &proof).await;

    assert!(matches!(result, Err(AppError::Login(_))));
    assert_eq!(h.users.find_by_id(&alice).await.unwrap().password_hash, before);
}

#[tokio::test]
async fn test_missing_old_password_for_non_admin() {
    let h = Harness::new();
    let alice = h.create_user("alice", "alice-password", false).await;
    let claims = h.login_claims("alice", "alice-password").await;

    let proof = h.proof(ADDR).await;
    let edit = PasswordEdit {
        target_id: alice,
        old_password: None,
        new_password: secret("brand-new-password"),
    };
    assert!(matches!(
        h.controller.edit_user_password(edit, &claims, &proof).await,
        Err(AppError::Login(_))
    ));
}

#[tokio::test]
async fn test_self_password_change_then_login() {
    let h = Harness::new();
    let alice = h.create_user("alice", "alice-password", false).await;
    let claims = h.login_claims("alice", "alice-password").await;

    let proof = h.proof(ADDR).await;
    let edit = PasswordEdit {
        target_id: alice,
        old_password: Some(secret("alice-password")),
        new_password: secret("brand-new-password"),
    };
    h.controller
        .edit_user_password(edit, &claims, &proof)
        .await
        .unwrap();

    let proof = h.proof(ADDR).await;
    assert!(matches!(
        h.controller.login(login_cmd("alice", "alice-password"), &proof).await,
        Err(AppError::Login(_))
    ));
    h.login("alice", "brand-new-password").await;
}

#[tokio::test]
async fn test_admin_resets_password_without_old_password() {
    let h = Harness::new();
    h.create_user("root", "root-password-1", true).await;
    let bob = h.create_user("bob", "bob-password1", false).await;
    let claims = h.login_claims("root", "root-password-1").await;

    let proof = h.proof(ADDR).await;
    let edit = PasswordEdit {
        target_id: bob,
        old_password: None,
        new_password: secret("reset-by-admin"),
    };
    h.controller
        .edit_user_password(edit, &claims, &proof)
        .await
        .unwrap();

    h.login("bob", "reset-by-admin").await;
}

#[tokio::test]
async fn test_non_admin_cannot_change_other_password() {
    let h = Harness::new();
    h.create_user("alice", "alice-password", false).await;
    let bob = h.create_user("bob", "bob-password1", false).await;
    let claims = h.login_claims("alice", "alice-password").await;

    let proof = h.proof(ADDR).await;
    let edit = PasswordEdit {
        target_id: bob,
        old_password: Some(secret("bob-password1")),
        new_password: secret("stolen-password"),
    };
    assert!(matches!(
        h.controller.edit_user_password(edit, &claims, &proof).await,
        Err(AppError::Unauthorized(_))
    ));
}
