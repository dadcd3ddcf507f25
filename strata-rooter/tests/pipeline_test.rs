//! Pipeline integration tests over the in-memory CAS and ledger.

use std::sync::Arc;
use std::time::Duration;
use strata_codec::{merkle_root, AnchorFile, BatchFile};
use strata_model::{Cas, ProtocolParameters, ProtocolVersions, SHA256_CODE};
use strata_mockstore::{MemoryCas, MemoryLedger};
use strata_rooter::{RooterError, RooterHandle};

/// Long enough that the periodic ticker never fires during a test; ticks are
/// driven manually through the handle.
const MANUAL: Duration = Duration::from_secs(3600);

fn capped_protocol(cap: usize) -> ProtocolVersions {
    ProtocolVersions::new(vec![(
        0,
        ProtocolParameters {
            max_operations_per_batch: cap,
            hash_algorithm_code: SHA256_CODE,
        },
    )])
    .unwrap()
}

fn spawn_rooter(cap: usize) -> (RooterHandle, Arc<MemoryCas>, Arc<MemoryLedger>) {
    let cas = Arc::new(MemoryCas::new());
    let ledger = Arc::new(MemoryLedger::new());
    let handle = RooterHandle::spawn(cas.clone(), ledger.clone(), capped_protocol(cap), MANUAL);
    (handle, cas, ledger)
}

#[tokio::test]
async fn test_empty_tick_touches_nothing() {
    let (rooter, cas, ledger) = spawn_rooter(100);

    let anchored = rooter.tick_now().await.unwrap();
    assert!(anchored.is_none());
    assert!(cas.is_empty());
    assert!(ledger.anchored().is_empty());
    assert_eq!(rooter.queue_len().await.unwrap(), 0);

    rooter.close().await;
}

#[tokio::test]
async fn test_under_cap_tick_anchors_whole_queue() {
    let (rooter, cas, ledger) = spawn_rooter(100);
    let ops = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
    for op in &ops {
        rooter.submit(op.clone()).await.unwrap();
    }

    let anchored = rooter.tick_now().await.unwrap().unwrap();
    assert_eq!(anchored.operation_count, 3);
    assert_eq!(rooter.queue_len().await.unwrap(), 0);

    // Exactly two CAS artifacts (batch + anchor) and one ledger write.
    assert_eq!(cas.len(), 2);
    let anchored_txs = ledger.anchored();
    assert_eq!(anchored_txs.len(), 1);
    assert_eq!(
        anchored_txs[0].transaction.anchor_file_hash,
        anchored.anchor_file_hash
    );

    // The anchor file on CAS commits the batch file and its Merkle root.
    let anchor_bytes = cas.read(anchored.anchor_file_hash.clone()).await.unwrap();
    let anchor = AnchorFile::from_buffer(&anchor_bytes).unwrap();
    assert_eq!(anchor.batch_file_hash, anchored.batch_file_hash);
    assert_eq!(anchor.merkle_root, merkle_root(&ops, SHA256_CODE).unwrap());

    // The batch file on CAS round-trips the submitted operations in order.
    let batch_bytes = cas.read(anchored.batch_file_hash.clone()).await.unwrap();
    let batch = BatchFile::from_buffer(&batch_bytes).unwrap();
    assert_eq!(batch.operations(), ops.as_slice());

    rooter.close().await;
}

#[tokio::test]
async fn test_over_cap_tick_drains_fifo_slice() {
    let (rooter, cas, _ledger) = spawn_rooter(100);
    for i in 0..250u32 {
        rooter.submit(i.to_be_bytes().to_vec()).await.unwrap();
    }

    let anchored = rooter.tick_now().await.unwrap().unwrap();
    assert_eq!(anchored.operation_count, 100);
    assert_eq!(rooter.queue_len().await.unwrap(), 150);

    // FIFO: the first batch holds operations 0..100 in submission order.
    let batch_bytes = cas.read(anchored.batch_file_hash.clone()).await.unwrap();
    let batch = BatchFile::from_buffer(&batch_bytes).unwrap();
    for (i, op) in batch.operations().iter().enumerate() {
        assert_eq!(op.as_slice(), (i as u32).to_be_bytes().as_slice());
    }

    // The next ticks take the rest.
    let second = rooter.tick_now().await.unwrap().unwrap();
    assert_eq!(second.operation_count, 100);
    let third = rooter.tick_now().await.unwrap().unwrap();
    assert_eq!(third.operation_count, 50);
    assert_eq!(rooter.queue_len().await.unwrap(), 0);

    rooter.close().await;
}

#[tokio::test]
async fn test_cas_failure_leaves_queue_intact() {
    let (rooter, cas, ledger) = spawn_rooter(100);
    rooter.submit(b"keep-me".to_vec()).await.unwrap();

    cas.set_unavailable(true);
    let err = rooter.tick_now().await.unwrap_err();
    assert!(matches!(err, RooterError::Cas(_)));
    assert_eq!(rooter.queue_len().await.unwrap(), 1);
    assert!(ledger.anchored().is_empty());

    // Next tick retries the same operations.
    cas.set_unavailable(false);
    let anchored = rooter.tick_now().await.unwrap().unwrap();
    assert_eq!(anchored.operation_count, 1);
    assert_eq!(rooter.queue_len().await.unwrap(), 0);
    assert_eq!(ledger.anchored().len(), 1);

    rooter.close().await;
}

#[tokio::test]
async fn test_ledger_failure_leaves_queue_intact() {
    let (rooter, _cas, ledger) = spawn_rooter(100);
    rooter.submit(b"keep-me".to_vec()).await.unwrap();

    // last_block is the first ledger call, so fail after it by toggling
    // between ticks is not possible; instead verify the whole-tick failure.
    ledger.set_unavailable(true);
    let err = rooter.tick_now().await.unwrap_err();
    assert!(matches!(err, RooterError::Ledger(_)));
    assert_eq!(rooter.queue_len().await.unwrap(), 1);

    ledger.set_unavailable(false);
    let anchored = rooter.tick_now().await.unwrap().unwrap();
    assert_eq!(anchored.operation_count, 1);
    assert_eq!(ledger.anchored().len(), 1);

    rooter.close().await;
}

#[tokio::test]
async fn test_anchor_hash_is_deterministic_across_nodes() {
    let (first, _, _) = spawn_rooter(100);
    let (second, _, _) = spawn_rooter(100);

    for rooter in [&first, &second] {
        rooter.submit(b"one".to_vec()).await.unwrap();
        rooter.submit(b"two".to_vec()).await.unwrap();
    }

    let a = first.tick_now().await.unwrap().unwrap();
    let b = second.tick_now().await.unwrap().unwrap();
    assert_eq!(a.batch_file_hash, b.batch_file_hash);
    assert_eq!(a.merkle_root, b.merkle_root);
    assert_eq!(a.anchor_file_hash, b.anchor_file_hash);

    first.close().await;
    second.close().await;
}

#[tokio::test]
async fn test_periodic_rooting_anchors_without_manual_ticks() {
    let cas = Arc::new(MemoryCas::new());
    let ledger = Arc::new(MemoryLedger::new());
    let rooter = RooterHandle::spawn(
        cas,
        ledger,
        capped_protocol(100),
        Duration::from_millis(20),
    );
    let mut anchored_rx = rooter.subscribe_anchored();

    rooter.submit(b"scheduled".to_vec()).await.unwrap();

    let anchored = tokio::time::timeout(Duration::from_secs(5), anchored_rx.recv())
        .await
        .expect("periodic tick should fire")
        .unwrap();
    assert_eq!(anchored.operation_count, 1);
    assert_eq!(rooter.queue_len().await.unwrap(), 0);

    rooter.close().await;
}

#[tokio::test]
async fn test_submissions_between_ticks_wait_for_next_tick() {
    let (rooter, _cas, ledger) = spawn_rooter(2);
    for op in [b"a".to_vec(), b"b".to_vec(), b"c".to_vec()] {
        rooter.submit(op).await.unwrap();
    }

    // Cap 2: first tick anchors a+b, c stays queued for the next tick.
    assert_eq!(rooter.tick_now().await.unwrap().unwrap().operation_count, 2);
    rooter.submit(b"d".to_vec()).await.unwrap();
    assert_eq!(rooter.queue_len().await.unwrap(), 2);
    assert_eq!(rooter.tick_now().await.unwrap().unwrap().operation_count, 2);
    assert_eq!(ledger.anchored().len(), 2);

    rooter.close().await;
}
