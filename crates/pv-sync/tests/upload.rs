//! Upload scenarios: adding file nodes, rollback, idempotent compensation

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use common::{alice, manager_on, FailingStep};
use pv_core::PvError;
use pv_crypto::NodeKeyPair;
use pv_dht::MemoryDht;
use pv_process::{Process, ProcessId, ProcessState, ProcessStep};
use pv_profile::ROOT;
use pv_sync::contexts::UploadContext;
use pv_sync::ops::upload_process;
use pv_sync::steps::UpdateProfileStep;
use pv_sync::UserProfileManager;

/// A registered profile with a "docs" directory, plus a sync root on disk
/// holding docs/report.pdf.
async fn setup() -> (Arc<MemoryDht>, Arc<UserProfileManager>, TempDir, PathBuf) {
    common::init_tracing();
    let dht = Arc::new(MemoryDht::new());
    let manager = manager_on(&dht, &alice());
    let pid = ProcessId::new();

    let mut profile = pv_profile::UserProfile::new("alice");
    manager.start_modification(pid).await.unwrap();
    manager.put_profile(pid, &mut profile).await.unwrap();
    manager
        .commit_with_retry(pid, |profile| {
            profile
                .add_child(ROOT, "docs", NodeKeyPair::generate(), None)
                .map(|_| ())
        })
        .await
        .unwrap();

    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("docs")).unwrap();
    let file = root.path().join("docs/report.pdf");
    std::fs::write(&file, b"%PDF-1.4 quarterly numbers").unwrap();

    (dht, manager, root, file)
}

#[tokio::test]
async fn upload_adds_file_node_with_content_hash() {
    let (_dht, manager, root, file) = setup().await;

    let (mut process, mut ctx) = upload_process(
        manager.clone(),
        root.path().to_path_buf(),
        file.clone(),
        CancellationToken::new(),
    );
    process.run(&mut ctx, &CancellationToken::new()).await.unwrap();
    assert_eq!(process.state(), ProcessState::Completed);

    let profile = manager.get_profile(ProcessId::new()).await.unwrap();
    assert_eq!(
        profile.paths(),
        vec!["docs".to_string(), "docs/report.pdf".to_string()]
    );

    let node_id = profile.find_by_path("docs/report.pdf").unwrap();
    let node = profile.node(node_id).unwrap();
    assert!(node.is_file());
    assert_eq!(
        node.content_hash().unwrap(),
        &pv_crypto::hash_bytes(b"%PDF-1.4 quarterly numbers")
    );
    // The node carries the keys generated by the first step.
    assert_eq!(
        node.key_pair(),
        ctx.meta_keys.as_ref().expect("meta keys kept in context")
    );
}

#[tokio::test]
async fn rollback_leaves_tree_identical_to_before() {
    let (_dht, manager, root, file) = setup().await;
    let before = manager
        .get_profile(ProcessId::new())
        .await
        .unwrap()
        .paths();

    // The update step commits the new node, then the next step fails.
    let mut process = Process::new("upload-then-fail", UpdateProfileStep::default());
    process.push_step(FailingStep);
    let mut ctx = UploadContext {
        process_id: process.id(),
        manager: manager.clone(),
        cancel: CancellationToken::new(),
        sync_root: root.path().to_path_buf(),
        file_path: file,
        meta_keys: Some(NodeKeyPair::generate()),
    };

    let err = process
        .run(&mut ctx, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PvError::Dht(_)));
    assert_eq!(process.state(), ProcessState::RolledBack);

    // The add was committed and then compensated: path enumeration
    // matches the pre-upload tree exactly.
    let after = manager.get_profile(ProcessId::new()).await.unwrap().paths();
    assert_eq!(after, before);
}

#[tokio::test]
async fn failure_before_the_update_step_compensates_key_generation() {
    let (_dht, manager, root, file) = setup().await;

    // Steps append in order: the injected failure lands between key
    // generation and the dynamically appended update step.
    let (mut process, mut ctx) = upload_process(
        manager.clone(),
        root.path().to_path_buf(),
        file,
        CancellationToken::new(),
    );
    process.push_step(FailingStep);

    let err = process
        .run(&mut ctx, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PvError::Dht(_)));
    assert!(ctx.meta_keys.is_none(), "generated keys were cleared");

    // The profile was never touched.
    let profile = manager.get_profile(ProcessId::new()).await.unwrap();
    assert_eq!(profile.paths(), vec!["docs".to_string()]);
}

#[tokio::test]
async fn compensation_is_idempotent() {
    let (_dht, manager, root, file) = setup().await;
    let pid = ProcessId::new();

    let mut step = UpdateProfileStep::default();
    let mut ctx = UploadContext {
        process_id: pid,
        manager: manager.clone(),
        cancel: CancellationToken::new(),
        sync_root: root.path().to_path_buf(),
        file_path: file,
        meta_keys: Some(NodeKeyPair::generate()),
    };

    step.execute(&mut ctx).await.unwrap();
    let with_file = manager.get_profile(pid).await.unwrap().paths();
    assert!(with_file.contains(&"docs/report.pdf".to_string()));

    let reason = PvError::Dht("forcing rollback".into());
    step.rollback(&mut ctx, &reason).await.unwrap();
    let after_first = manager.get_profile(pid).await.unwrap().paths();
    assert_eq!(after_first, vec!["docs".to_string()]);

    // A second rollback finds nothing to remove and changes nothing.
    step.rollback(&mut ctx, &reason).await.unwrap();
    let after_second = manager.get_profile(pid).await.unwrap().paths();
    assert_eq!(after_second, after_first);
}

#[tokio::test]
async fn upload_to_unknown_directory_fails_clean() {
    let (_dht, manager, root, _file) = setup().await;

    // On disk but never announced in the tree.
    std::fs::create_dir(root.path().join("scratch")).unwrap();
    let stray = root.path().join("scratch/notes.txt");
    std::fs::write(&stray, b"scribbles").unwrap();

    let (mut process, mut ctx) = upload_process(
        manager.clone(),
        root.path().to_path_buf(),
        stray,
        CancellationToken::new(),
    );
    let err = process
        .run(&mut ctx, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PvError::NotFound(_)));
    let profile = manager.get_profile(ProcessId::new()).await.unwrap();
    assert_eq!(profile.paths(), vec!["docs".to_string()]);
}

#[tokio::test]
async fn duplicate_upload_is_a_structural_violation() {
    let (_dht, manager, root, file) = setup().await;

    let (mut first, mut first_ctx) = upload_process(
        manager.clone(),
        root.path().to_path_buf(),
        file.clone(),
        CancellationToken::new(),
    );
    first
        .run(&mut first_ctx, &CancellationToken::new())
        .await
        .unwrap();

    let (mut second, mut second_ctx) = upload_process(
        manager.clone(),
        root.path().to_path_buf(),
        file,
        CancellationToken::new(),
    );
    let err = second
        .run(&mut second_ctx, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PvError::StructuralViolation(_)));
}

#[tokio::test]
async fn cancelled_upload_commits_nothing() {
    let (_dht, manager, root, file) = setup().await;

    let cancel = CancellationToken::new();
    let (mut process, mut ctx) = upload_process(
        manager.clone(),
        root.path().to_path_buf(),
        file,
        cancel.clone(),
    );
    cancel.cancel();

    let err = process.run(&mut ctx, &cancel).await.unwrap_err();
    assert!(matches!(err, PvError::Stopped(_)));

    let profile = manager.get_profile(ProcessId::new()).await.unwrap();
    assert_eq!(profile.paths(), vec!["docs".to_string()]);
}
