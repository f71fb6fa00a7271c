use std::sync::Arc;
use std::time::Duration;

use folio::application::sessions::{AuthError, SessionManager};
use folio::infra::sweeper::spawn_sweeper;

const SESSION: Duration = Duration::from_secs(24 * 60 * 60);
const SWEEP: Duration = Duration::from_secs(60 * 60);

#[tokio::test(start_paused = true)]
async fn session_lifecycle_with_background_sweep() {
    let sessions = Arc::new(SessionManager::new("admin", "correct horse", SESSION));
    let sweeper = spawn_sweeper(Arc::clone(&sessions), SWEEP, "sessions");

    assert_eq!(
        sessions.login("admin", "battery staple"),
        Err(AuthError::InvalidCredentials)
    );

    let token = sessions.login("admin", "correct horse").expect("login");
    assert!(sessions.validate(&token));

    tokio::time::sleep(SESSION - Duration::from_secs(1)).await;
    assert!(sessions.validate(&token), "no sliding refresh, still inside window");

    // The next hourly sweep after expiry removes the session without a lookup.
    tokio::time::sleep(SWEEP).await;
    assert_eq!(sessions.active_sessions(), 0);
    assert!(!sessions.validate(&token));

    sweeper.abort();
}

#[tokio::test(start_paused = true)]
async fn logout_ends_only_that_session() {
    let sessions = SessionManager::new("admin", "pw", SESSION);
    let first = sessions.login("admin", "pw").expect("login");
    let second = sessions.login("admin", "pw").expect("login");

    sessions.logout(&first);

    assert!(!sessions.validate(&first));
    assert!(sessions.validate(&second));
    assert_eq!(sessions.active_sessions(), 1);
}

#[test]
fn concurrent_logins_and_validations() {
    let sessions = Arc::new(SessionManager::new("admin", "pw", SESSION));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sessions = Arc::clone(&sessions);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let token = sessions.login("admin", "pw").expect("login");
                    assert!(sessions.validate(&token));
                    sessions.logout(&token);
                    assert!(!sessions.validate(&token));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread should not panic");
    }
    assert_eq!(sessions.active_sessions(), 0);
}
