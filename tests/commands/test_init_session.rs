//! Tests for init_session command

use telegram_relay::commands::init_session::is_confirmed;

#[test]
fn test_init_session_confirmation_yes() {
    assert!(is_confirmed("YES"));
}

#[test]
fn test_init_session_confirmation_case_sensitive() {
    assert!(!is_confirmed("yes"));
    assert!(!is_confirmed("Yes"));
}

#[test]
fn test_init_session_trimming() {
    assert!(is_confirmed(" YES "));
    assert!(is_confirmed("YES\n"));
}

#[tokio::test]
#[ignore] // Requires user interaction
async fn test_init_session_run() {
    use telegram_relay::commands::init_session;

    let _ = init_session::run().await;
}
