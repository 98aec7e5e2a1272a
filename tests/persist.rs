//! Round-trip and structural checks for persisted models.

use canopy::io::{read_model_header, ClassifierOutputStream, DeserializeError};
use canopy::{
    ClassifierInputStream, EnsembleClassifier, Forest, ForestFileReader, ForestFileWriter,
    ForestTrainer, ForestTrainerParams, PointsView, ScalarKind, StreamError, Verbosity, VoteTable,
};

fn training_data() -> (Vec<f64>, Vec<u8>) {
    let point_count = 120;
    let mut data = Vec::with_capacity(point_count * 3);
    let mut labels = Vec::with_capacity(point_count);
    for i in 0..point_count {
        let x = ((i * 29) % 100) as f64 / 100.0;
        let y = ((i * 43) % 100) as f64 / 100.0;
        let z = ((i * 71) % 100) as f64 / 100.0;
        data.extend([x, y, z]);
        labels.push(((x > 0.5) as u8) + ((y > 0.5) as u8));
    }
    (data, labels)
}

fn train_into_memory(data: &[f64], labels: &[u8]) -> Forest<f64> {
    let points = PointsView::new(data, 3).unwrap();
    let mut forest = Forest::new(3, 3);
    let trainer = ForestTrainer::new(ForestTrainerParams {
        tree_count: 15,
        seed: 31,
        verbosity: Verbosity::Silent,
        ..Default::default()
    });
    trainer.train(points, labels, &mut forest).unwrap();
    forest
}

#[test]
fn file_round_trip_reproduces_in_memory_votes() {
    let (data, labels) = training_data();
    let forest = train_into_memory(&data, &labels);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.cnpy");
    {
        let mut writer = ForestFileWriter::<f64>::create(&path, 3, 3).unwrap();
        for tree in forest.trees() {
            writer.write_tree(tree).unwrap();
        }
        writer.close().unwrap();
    }

    let header = read_model_header(&path).unwrap();
    assert_eq!(header.scalar, ScalarKind::F64);
    assert_eq!(header.class_count, 3);
    assert_eq!(header.feature_count, 3);

    let points = PointsView::new(&data, 3).unwrap();
    let mut in_memory = forest.clone();
    let mut memory_votes = VoteTable::new(points.point_count(), 3);
    let memory_labels = {
        let mut ensemble = EnsembleClassifier::new(&mut in_memory, 0);
        ensemble.classify_and_vote(points, &mut memory_votes).unwrap();
        ensemble.classify(points).unwrap()
    };

    for preload in [0, 4, 100] {
        let mut reader = ForestFileReader::<f64>::open(&path, preload).unwrap();
        assert_eq!(reader.class_count(), 3);
        assert_eq!(reader.feature_count(), 3);

        let mut file_votes = VoteTable::new(points.point_count(), 3);
        let mut ensemble = EnsembleClassifier::new(&mut reader, 0);
        let voters = ensemble.classify_and_vote(points, &mut file_votes).unwrap();
        assert_eq!(voters, forest.tree_count() as u32);
        assert_eq!(file_votes, memory_votes);
        assert_eq!(ensemble.classify(points).unwrap(), memory_labels);
    }
}

#[test]
fn trainer_writes_directly_to_a_file_stream() {
    let (data, labels) = training_data();
    let points = PointsView::new(&data, 3).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.cnpy");
    let mut writer = ForestFileWriter::<f64>::create(&path, 3, 3).unwrap();
    let trainer = ForestTrainer::new(ForestTrainerParams {
        tree_count: 8,
        seed: 31,
        thread_count: 2,
        verbosity: Verbosity::Silent,
        ..Default::default()
    });
    trainer.train(points, &labels, &mut writer).unwrap();
    writer.close().unwrap();

    let mut reader = ForestFileReader::<f64>::open(&path, 0).unwrap();
    let mut count = 0;
    reader.rewind().unwrap();
    while let Some(tree) = reader.next_classifier().unwrap() {
        tree.validate().unwrap();
        count += 1;
    }
    assert_eq!(count, 8);
}

#[test]
fn garbage_file_is_not_a_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.cnpy");
    std::fs::write(&path, b"definitely not a forest model").unwrap();

    let err = ForestFileReader::<f64>::open(&path, 1).unwrap_err();
    assert!(matches!(
        err,
        StreamError::Read(DeserializeError::NotAModel)
    ));
}

#[test]
fn truncated_model_is_detected() {
    let (data, labels) = training_data();
    let forest = train_into_memory(&data, &labels);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.cnpy");
    {
        let mut writer = ForestFileWriter::<f64>::create(&path, 3, 3).unwrap();
        for tree in forest.trees() {
            writer.write_tree(tree).unwrap();
        }
        writer.close().unwrap();
    }

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    // The damaged final frame surfaces as an error on some pass through the
    // stream; trees before it still decode.
    let mut reader = ForestFileReader::<f64>::open(&path, 0).unwrap();
    let mut result = Ok(());
    let mut decoded = 0;
    loop {
        match reader.next_classifier() {
            Ok(Some(_)) => decoded += 1,
            Ok(None) => break,
            Err(err) => {
                result = Err(err);
                break;
            }
        }
    }
    assert!(matches!(
        result,
        Err(StreamError::Read(DeserializeError::Truncated { .. }))
    ));
    assert_eq!(decoded, forest.tree_count() - 1);
}
