mod common;

use std::sync::Arc;

use telenurse_core::models::assessment::{InputMode, Language};
use telenurse_core::models::session::SessionPhase;
use telenurse_session::SessionError;

use telenurse_storage::policy::PolicyStore;

use common::{GatedModel, ScriptedModel, manager};

#[tokio::test]
async fn second_mutation_during_a_call_is_busy() {
    let dir = tempfile::tempdir().unwrap();
    let model = GatedModel::new("Hello!");
    let session = Arc::new(manager(model.clone(), &dir));

    let starting = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.start("P-1", Language::En, InputMode::Keyboard).await }
    });
    model.entered.notified().await;

    let status = session.status();
    assert!(status.busy);
    assert_eq!(status.phase, SessionPhase::NotStarted);
    let err = session.start("P-2", Language::En, InputMode::Keyboard).await.unwrap_err();
    assert!(matches!(err, SessionError::Busy { .. }));

    model.release.notify_one();
    starting.await.unwrap().unwrap();
    assert!(!session.status().busy);

    let sending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.send_message("I'm tired").await }
    });
    model.entered.notified().await;

    let during = session.status();
    assert!(during.busy);
    assert_eq!(during.transcript.len(), 1);
    assert!(matches!(
        session.send_message("Hello?").await,
        Err(SessionError::Busy { .. })
    ));
    assert!(matches!(session.cancel(), Err(SessionError::Busy { .. })));

    model.release.notify_one();
    sending.await.unwrap().unwrap();
    let after = session.status();
    assert!(!after.busy);
    assert_eq!(after.transcript.len(), 3);
}

#[tokio::test]
async fn status_during_finish_reports_extracting() {
    let dir = tempfile::tempdir().unwrap();
    let model = GatedModel::new("{\"symptoms\": []}");
    let session = Arc::new(manager(model.clone(), &dir));

    let starting = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.start("P-1", Language::En, InputMode::Keyboard).await }
    });
    model.entered.notified().await;
    model.release.notify_one();
    starting.await.unwrap().unwrap();

    let finishing = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.finish().await }
    });
    model.entered.notified().await;

    let status = session.status();
    assert_eq!(status.phase, SessionPhase::Extracting);
    assert!(status.active);
    assert!(status.busy);
    assert!(matches!(session.reset(), Err(SessionError::InvalidState { .. })));

    model.release.notify_one();
    finishing.await.unwrap().unwrap();
    assert_eq!(session.status().phase, SessionPhase::Finished);
}

#[tokio::test]
async fn abandoned_finish_returns_the_session_to_active() {
    let dir = tempfile::tempdir().unwrap();
    let model = GatedModel::new("Hello!");
    let session = Arc::new(manager(model.clone(), &dir));

    let starting = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.start("P-1", Language::En, InputMode::Keyboard).await }
    });
    model.entered.notified().await;
    model.release.notify_one();
    starting.await.unwrap().unwrap();

    let finishing = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.finish().await }
    });
    model.entered.notified().await;
    finishing.abort();
    let _ = finishing.await;

    let status = session.status();
    assert_eq!(status.phase, SessionPhase::Active);
    assert!(!status.busy);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_policy_updates_keep_disk_and_memory_in_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system-prompt.md");
    let session = Arc::new(
        manager(ScriptedModel::new(Vec::<String>::new()), &dir).with_policy_store(PolicyStore::new(&path)),
    );

    for round in 0..10 {
        let updates: Vec<_> = (0..8)
            .map(|i| {
                let session = session.clone();
                tokio::spawn(async move { session.update_policy(&format!("policy {round}-{i}")).await })
            })
            .collect();
        for update in updates {
            update.await.unwrap().unwrap();
        }

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, &*session.policy(), "round {round}");
    }

    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 1);
}
