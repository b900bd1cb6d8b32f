mod helpers;

use helpers::{make_items, no_labels, read_records, test_store, StubEmbedder, TILE_SIZE};
use tilevec::labels::LabelIndex;
use tilevec::pipeline::shard::{run_pipeline, PipelineContext};

const DIM: usize = 16;

#[test]
fn labels_join_on_tile_id() {
    let tmp = tempfile::tempdir().unwrap();
    let items = make_items(tmp.path(), 4, &[]);

    let labels_path = tmp.path().join("labels.csv");
    std::fs::write(&labels_path, "id,label\nt_000,tumor\nt_002,stroma\n").unwrap();
    let labels = LabelIndex::load(Some(&labels_path)).unwrap();

    let store = test_store(tmp.path());
    let embedder = StubEmbedder::new(DIM);
    let ctx = PipelineContext {
        embedder: &embedder,
        labels: &labels,
        store: &store,
        image_size: TILE_SIZE,
    };
    run_pipeline(&ctx, &items, 10);

    let records = read_records(&store.metadata_path("batch_00001"));
    let by_id: Vec<(&str, Option<&str>)> = records
        .iter()
        .map(|r| (r.file_id.as_str(), r.label.as_deref()))
        .collect();
    assert_eq!(
        by_id,
        vec![
            ("t_000", Some("tumor")),
            ("t_001", None),
            ("t_002", Some("stroma")),
            ("t_003", None),
        ]
    );
}

#[test]
fn omitted_label_source_yields_all_null_labels() {
    let tmp = tempfile::tempdir().unwrap();
    let items = make_items(tmp.path(), 3, &[]);
    let store = test_store(tmp.path());
    let embedder = StubEmbedder::new(DIM);
    let labels = no_labels();

    let ctx = PipelineContext {
        embedder: &embedder,
        labels: &labels,
        store: &store,
        image_size: TILE_SIZE,
    };
    let summary = run_pipeline(&ctx, &items, 10);

    assert_eq!(summary.embedded, 3);
    let records = read_records(&store.metadata_path("batch_00001"));
    assert!(records.iter().all(|r| r.label.is_none()));
}

#[test]
fn failed_items_never_consume_their_label() {
    let tmp = tempfile::tempdir().unwrap();
    let items = make_items(tmp.path(), 3, &[1]);

    let labels_path = tmp.path().join("labels.csv");
    std::fs::write(&labels_path, "t_000,a\nt_001,b\nt_002,c\n").unwrap();
    let labels = LabelIndex::load(Some(&labels_path)).unwrap();

    let store = test_store(tmp.path());
    let embedder = StubEmbedder::new(DIM);
    let ctx = PipelineContext {
        embedder: &embedder,
        labels: &labels,
        store: &store,
        image_size: TILE_SIZE,
    };
    run_pipeline(&ctx, &items, 10);

    let records = read_records(&store.metadata_path("batch_00001"));
    let labels_seen: Vec<Option<&str>> = records.iter().map(|r| r.label.as_deref()).collect();
    assert_eq!(labels_seen, vec![Some("a"), Some("c")]);
}
