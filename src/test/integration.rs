//! End-to-end checks over a small literal catalog: build, search, vote,
//! and the file-backed pipeline.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::descriptor::Descriptor;
use crate::error::CbirIndexError;
use crate::feats;
use crate::kdtree::{KdTree, KdTreeBuilder, SplitMethod};
use crate::query::find_similar;

/// Four images in three dimensions with a couple of deliberate overlaps:
/// the descriptor (10, 9, 7) appears in images 1 and 3.
fn catalog() -> Catalog<f64> {
    let features: [&[[f64; 3]]; 4] = [
        &[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.0, 0.5, 1.0]],
        &[[0.1, 0.0, 0.0], [10.0, 9.0, 7.0]],
        &[[0.5, -0.5, 0.0], [1.5, 0.6, 1.0], [-10.0, -9.0, -7.0]],
        &[[10.0, 9.0, 7.0], [8.0, 9.0, 7.0], [10.0, 0.0, 0.0]],
    ];

    let mut catalog = Catalog::new();
    for (image_id, rows) in features.iter().enumerate() {
        let descriptors = rows
            .iter()
            .map(|coords| Descriptor::new(image_id, coords.to_vec()).unwrap())
            .collect();
        catalog.push_image(descriptors).unwrap();
    }
    catalog
}

fn build(method: SplitMethod) -> KdTree<f64> {
    let mut builder = KdTreeBuilder::new().split_method(method);
    builder.extend_from_catalog(catalog());
    builder.finish().unwrap()
}

#[test]
fn querying_an_images_own_features_ranks_it_first() {
    let catalog = catalog();
    let tree = build(SplitMethod::MaxSpread);
    for image_id in 0..catalog.num_images() {
        let queries = catalog.image(image_id).unwrap();
        let ranking = tree.find_similar(queries, 1, 1).unwrap();
        assert_eq!(ranking, vec![image_id]);
    }
}

#[test]
fn query_with_image_1_features_ranks_image_1_first() {
    let catalog = catalog();
    let tree = build(SplitMethod::Incremental);
    let queries = catalog.image(1).unwrap();
    let ranking = tree.find_similar(queries, 2, 4).unwrap();
    assert_eq!(ranking[0], 1);
    // Image 1 collects both its own vote and the shared (10, 9, 7) match;
    // images 0 and 3 get one vote each; image 2 none.
    assert_eq!(ranking, vec![1, 0, 3, 2]);
}

#[test]
fn shared_descriptor_resolves_to_the_lower_image_id() {
    let tree = build(SplitMethod::MaxSpread);
    let query = vec![Descriptor::new(0, vec![10.0, 9.0, 7.0]).unwrap()];
    let ranking = tree.find_similar(&query, 1, 1).unwrap();
    assert_eq!(ranking, vec![1]);
}

#[test]
fn origin_query_votes_split_across_the_three_closest_images() {
    let tree = build(SplitMethod::MaxSpread);
    let query = vec![Descriptor::new(0, vec![0.0, 0.0, 0.0]).unwrap()];
    let ranking = tree.find_similar(&query, 3, 2).unwrap();
    // One vote each for images 0, 1 and 2; the tie goes to the lowest id.
    assert_eq!(ranking, vec![0, 1]);
}

#[test]
fn unvoted_images_pad_the_ranking_in_ascending_order() {
    let tree = build(SplitMethod::MaxSpread);
    let query = vec![Descriptor::new(0, vec![10.0, 9.0, 7.0]).unwrap()];
    let ranking = tree.find_similar(&query, 1, 4).unwrap();
    assert_eq!(ranking, vec![1, 0, 2, 3]);
}

#[test]
fn one_query_descriptor_votes_once_per_image() {
    // Image 2 holds both of the query's two nearest descriptors; with the
    // per-descriptor cap it still collects a single vote, leaving a
    // three-way tie resolved by ascending id.
    let mut catalog = Catalog::new();
    catalog
        .push_image(vec![Descriptor::new(0, vec![1.0, 0.0]).unwrap()])
        .unwrap();
    catalog
        .push_image(vec![Descriptor::new(1, vec![2.0, 0.0]).unwrap()])
        .unwrap();
    catalog
        .push_image(vec![
            Descriptor::new(2, vec![0.0, 0.0]).unwrap(),
            Descriptor::new(2, vec![0.001, 0.0]).unwrap(),
        ])
        .unwrap();

    let mut builder = KdTreeBuilder::new();
    builder.extend_from_catalog(catalog);
    let tree = builder.finish().unwrap();

    let queries = vec![
        Descriptor::new(0, vec![0.0, 0.0]).unwrap(),
        Descriptor::new(0, vec![1.5, 0.0]).unwrap(),
    ];
    let ranking = tree.find_similar(&queries, 2, 3).unwrap();
    assert_eq!(ranking, vec![0, 1, 2]);
}

#[test]
fn ranking_is_identical_across_split_methods() {
    let catalog = catalog();
    let queries = catalog.image(2).unwrap();
    let mut rankings = Vec::new();
    for method in [
        SplitMethod::Incremental,
        SplitMethod::Random,
        SplitMethod::MaxSpread,
    ] {
        let tree = build(method);
        rankings.push(tree.find_similar(queries, 2, 4).unwrap());
    }
    assert_eq!(rankings[0], rankings[1]);
    assert_eq!(rankings[1], rankings[2]);
    assert_eq!(rankings[0][0], 2);
}

#[test]
fn find_similar_checks_its_arguments() {
    let tree = build(SplitMethod::MaxSpread);
    let query = vec![Descriptor::new(0, vec![0.0, 0.0, 0.0]).unwrap()];

    let empty: Vec<Descriptor<f64>> = vec![];
    assert!(matches!(
        tree.find_similar(&empty, 1, 1),
        Err(CbirIndexError::InvalidArgument(_))
    ));
    assert!(matches!(
        tree.find_similar(&query, 0, 1),
        Err(CbirIndexError::InvalidArgument(_))
    ));
    assert!(matches!(
        tree.find_similar(&query, 1, 0),
        Err(CbirIndexError::InvalidArgument(_))
    ));
    // More result slots than catalog images.
    assert!(matches!(
        tree.find_similar(&query, 1, 5),
        Err(CbirIndexError::InvalidArgument(_))
    ));
    // Query dimension mismatch.
    let flat = vec![Descriptor::new(0, vec![0.0, 0.0]).unwrap()];
    assert!(matches!(
        tree.find_similar(&flat, 1, 1),
        Err(CbirIndexError::InvalidArgument(_))
    ));
}

#[test]
fn find_similar_rejects_out_of_range_image_ids() {
    let mut builder = KdTreeBuilder::new();
    builder.push(Descriptor::new(5, vec![0.0, 0.0]).unwrap());
    let tree = builder.finish().unwrap();

    let query = vec![Descriptor::new(0, vec![0.0, 0.0]).unwrap()];
    assert!(matches!(
        find_similar(&tree, &query, 1, 1, 2),
        Err(CbirIndexError::InvalidArgument(_))
    ));
}

#[test]
fn file_backed_catalog_round_trips_through_the_pipeline() {
    let dim = 10;
    let num_images = 3;
    let mut rng = StdRng::seed_from_u64(19);

    let dir = tempdir().unwrap();
    let config_text = format!(
        "images_directory = {:?}\n\
         images_prefix = \"img\"\n\
         images_suffix = \".png\"\n\
         num_images = {num_images}\n\
         pca_dimension = {dim}\n\
         extraction_mode = false\n\
         knn = 2\n\
         num_similar_images = 2\n",
        dir.path()
    );
    let config = Config::from_toml(&config_text).unwrap();

    // An earlier extraction run, cached to disk.
    let mut written = Vec::new();
    for image_id in 0..num_images {
        let descriptors: Vec<Descriptor<f64>> = (0..4)
            .map(|_| {
                let offset = (image_id * 100) as f64;
                let coords: Vec<f64> =
                    (0..dim).map(|_| offset + rng.gen_range(0.0..1.0)).collect();
                Descriptor::new(image_id, coords).unwrap()
            })
            .collect();
        feats::save_features(config.features_path(image_id).unwrap(), &descriptors).unwrap();
        written.push(descriptors);
    }

    let catalog: Catalog<f64> = Catalog::load(&config).unwrap();
    assert_eq!(catalog.num_images(), num_images);
    assert_eq!(catalog.dim(), Some(dim));
    for (image_id, descriptors) in written.iter().enumerate() {
        assert_eq!(catalog.image(image_id).unwrap(), &descriptors[..]);
    }

    let mut builder = KdTreeBuilder::new().split_method(config.split_method);
    builder.extend_from_catalog(catalog);
    let tree = builder.finish().unwrap();

    for (image_id, descriptors) in written.iter().enumerate() {
        let ranking = tree
            .find_similar(descriptors, config.knn, config.num_similar_images)
            .unwrap();
        assert_eq!(ranking[0], image_id);
    }
}
