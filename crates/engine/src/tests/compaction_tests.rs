use super::helpers::{count_segment_files, flush_every_put, mem_only, open, segment_file};
use crate::*;
use anyhow::Result;
use tempfile::tempdir;

// --------------------- The compaction trigger ---------------------

#[test]
fn third_flush_folds_the_stack_into_one_file() -> Result<()> {
    let dir = tempdir()?;
    let engine = open(dir.path(), Config::default()); // 5 / 3

    // Fifteen distinct keys: flushes after k4 and k9, then the flush
    // after k14 reaches the threshold and compacts everything.
    for i in 0..15u32 {
        engine.put(format!("k{}", i).into_bytes(), format!("v{}", i).into_bytes())?;
    }

    assert_eq!(count_segment_files(dir.path()), 1);
    assert_eq!(engine.segment_count(), 1);
    // seg_0..seg_2 were unlinked; the survivor took the next id.
    assert!(segment_file(dir.path(), 3).exists());
    Ok(())
}

#[test]
fn compacted_store_recovers_after_restart() -> Result<()> {
    let dir = tempdir()?;

    {
        let engine = open(dir.path(), Config::default());
        for i in 0..15u32 {
            engine.put(format!("k{}", i).into_bytes(), format!("v{}", i).into_bytes())?;
        }
    }

    let engine = open(dir.path(), mem_only());
    assert_eq!(engine.get(b"k10")?, b"v10");
    assert_eq!(engine.get(b"k14")?, b"v14");
    assert_eq!(engine.get(b"k0")?, b"v0");
    Ok(())
}

// --------------------- Merge polarity ---------------------

#[test]
fn newest_copy_survives_the_merge() -> Result<()> {
    let dir = tempdir()?;
    let engine = open(dir.path(), flush_every_put());

    engine.put(b"k".to_vec(), b"v1".to_vec())?;
    engine.put(b"k".to_vec(), b"v2".to_vec())?;
    engine.put(b"k".to_vec(), b"v3".to_vec())?;
    engine.put(b"pad".to_vec(), b"x".to_vec())?;
    assert_eq!(engine.segment_count(), 4);

    engine.compact()?;
    assert_eq!(engine.segment_count(), 1);
    assert_eq!(count_segment_files(dir.path()), 1);
    assert_eq!(engine.get(b"k")?, b"v3");
    assert_eq!(engine.get(b"pad")?, b"x");
    Ok(())
}

// --------------------- Visible state is preserved ---------------------

#[test]
fn gets_are_identical_before_and_after_compaction() -> Result<()> {
    let dir = tempdir()?;
    let engine = open(dir.path(), flush_every_put());

    for i in 0..8u32 {
        engine.put(format!("k{}", i).into_bytes(), format!("v{}", i).into_bytes())?;
    }
    engine.put(b"k3".to_vec(), b"rewritten".to_vec())?;

    let before: Vec<_> = (0..8u32)
        .map(|i| engine.get(format!("k{}", i).as_bytes()).unwrap())
        .collect();

    engine.compact()?;

    let after: Vec<_> = (0..8u32)
        .map(|i| engine.get(format!("k{}", i).as_bytes()).unwrap())
        .collect();
    assert_eq!(before, after);
    assert_eq!(engine.get(b"k3")?, b"rewritten");
    Ok(())
}

// --------------------- Deletes across compaction ---------------------

#[test]
fn delete_applied_in_memory_vanishes_from_the_merge() -> Result<()> {
    let dir = tempdir()?;
    let engine = open(dir.path(), mem_only());

    engine.put(b"doomed".to_vec(), b"x".to_vec())?;
    engine.del(b"doomed")?; // acknowledged: still memory-resident

    // The flushes that follow never contain "doomed".
    drop(engine);
    let engine = open(dir.path(), flush_every_put());
    for i in 0..3u32 {
        engine.put(format!("k{}", i).into_bytes(), b"v".to_vec())?;
    }
    engine.compact()?;

    assert!(matches!(engine.get(b"doomed"), Err(EngineError::KeyNotFound)));
    Ok(())
}

#[test]
fn segment_resident_key_survives_its_delete() -> Result<()> {
    // No tombstones travel across segments: a delete whose target lives
    // only in an older segment cannot remove that copy.
    let dir = tempdir()?;
    let engine = open(dir.path(), flush_every_put());

    engine.put(b"sticky".to_vec(), b"v".to_vec())?;
    assert!(matches!(engine.del(b"sticky"), Err(EngineError::KeyNotFound)));

    engine.put(b"k1".to_vec(), b"x".to_vec())?;
    engine.put(b"k2".to_vec(), b"y".to_vec())?;
    engine.compact()?;

    assert_eq!(engine.get(b"sticky")?, b"v");
    Ok(())
}

// --------------------- Id monotonicity ---------------------

#[test]
fn ids_never_collide_across_repeated_compactions() -> Result<()> {
    let dir = tempdir()?;
    let engine = open(dir.path(), Config::default()); // 5 / 3

    // First cycle: seg_0, seg_1, seg_2 -> compacted into seg_3.
    for i in 0..15u32 {
        engine.put(format!("a{}", i).into_bytes(), b"v".to_vec())?;
    }
    assert!(segment_file(dir.path(), 3).exists());

    // Second cycle: flushes continue at seg_4 and seg_5; the stack
    // [seg_3, seg_4, seg_5] then compacts into seg_6.
    for i in 0..10u32 {
        engine.put(format!("b{}", i).into_bytes(), b"v".to_vec())?;
    }
    assert!(segment_file(dir.path(), 6).exists());
    assert_eq!(count_segment_files(dir.path()), 1);

    // Everything from both cycles is still readable.
    assert_eq!(engine.get(b"a0")?, b"v");
    assert_eq!(engine.get(b"b9")?, b"v");
    Ok(())
}

#[test]
fn single_segment_compaction_rewrites_under_a_fresh_id() -> Result<()> {
    let dir = tempdir()?;
    let engine = open(dir.path(), flush_every_put());

    engine.put(b"k".to_vec(), b"v".to_vec())?;
    assert_eq!(engine.segment_count(), 1);

    engine.compact()?;
    assert_eq!(engine.segment_count(), 1);
    assert_eq!(count_segment_files(dir.path()), 1);
    assert!(!segment_file(dir.path(), 0).exists());
    assert!(segment_file(dir.path(), 1).exists());
    assert_eq!(engine.get(b"k")?, b"v");
    Ok(())
}

#[test]
fn compaction_on_an_empty_stack_is_vacuous() -> Result<()> {
    let dir = tempdir()?;
    let engine = open(dir.path(), flush_every_put());

    engine.compact()?;
    assert_eq!(engine.segment_count(), 0);
    assert_eq!(count_segment_files(dir.path()), 0);
    Ok(())
}
