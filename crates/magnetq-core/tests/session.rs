use std::time::Duration;

use magnetq_core::{CoreError, DEFAULT_LOGIN_TIMEOUT, authenticate};
use magnetq_test_support::{DaemonCall, LoginBehavior, StubDaemon};
use tokio::time::Instant;

#[tokio::test]
async fn accepted_login_yields_session() -> anyhow::Result<()> {
    let daemon = StubDaemon::new();
    let session = authenticate(&daemon, DEFAULT_LOGIN_TIMEOUT).await?;
    assert!(std::ptr::eq(session.client(), &daemon));
    assert_eq!(daemon.calls(), vec![DaemonCall::Login]);
    Ok(())
}

#[tokio::test]
async fn rejected_login_maps_to_login_failed() {
    let daemon = StubDaemon::new().with_login(LoginBehavior::Reject);
    let err = authenticate(&daemon, DEFAULT_LOGIN_TIMEOUT)
        .await
        .expect_err("login should fail");
    assert!(matches!(err, CoreError::LoginFailed));
}

#[tokio::test(start_paused = true)]
async fn hanging_login_is_abandoned_at_the_bound() {
    let daemon = StubDaemon::new().with_login(LoginBehavior::Hang);
    let started = Instant::now();
    let err = authenticate(&daemon, DEFAULT_LOGIN_TIMEOUT)
        .await
        .expect_err("login should time out");
    let waited = started.elapsed();
    assert!(matches!(err, CoreError::LoginTimeout { timeout } if timeout == DEFAULT_LOGIN_TIMEOUT));
    assert!(waited >= DEFAULT_LOGIN_TIMEOUT);
    assert!(waited < DEFAULT_LOGIN_TIMEOUT + Duration::from_secs(1));
}
