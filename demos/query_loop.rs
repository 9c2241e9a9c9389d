//! Interactive retrieval loop over a pre-extracted catalog.
//!
//! Loads the configuration (`-c <file>`, default `cbir.toml`), reads every
//! image's feature-cache file, builds the tree, then repeatedly asks for a
//! query feature file and prints the best candidate images. Enter `<>` to
//! exit.
//!
//! Feature extraction itself is out of scope here; run with
//! `extraction_mode = false` against caches written by your extractor.

use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use cbir_index::{feats, Catalog, Config, Descriptor, KdTree, KdTreeBuilder};

const EXIT_TOKEN: &str = "<>";

fn config_path() -> Result<String, String> {
    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => Ok("cbir.toml".to_string()),
        3 if args[1] == "-c" => Ok(args[2].clone()),
        _ => Err(format!("usage: {} [-c <config_file>]", args[0])),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_path(config_path()?)?;
    if config.extraction_mode {
        return Err(
            "extraction_mode = true needs an external feature extractor; \
             set it to false to query cached features"
                .into(),
        );
    }

    let catalog: Catalog<f64> = Catalog::load(&config)?;
    let mut builder = KdTreeBuilder::with_capacity(catalog.num_descriptors())
        .split_method(config.split_method);
    builder.extend_from_catalog(catalog);
    let tree: KdTree<f64> = builder.finish()?;
    println!(
        "Indexed {} descriptors from {} images.",
        tree.len(),
        tree.num_images()
    );

    let stdin = io::stdin();
    loop {
        print!("Please enter a query features file path ({EXIT_TOKEN} to exit):\n> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == EXIT_TOKEN {
            break;
        }

        let loaded: cbir_index::Result<Vec<Descriptor<f64>>> =
            feats::load_features(line, 0, config.pca_dimension);
        let queries = match loaded {
            Ok(queries) => queries,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        let ranking = tree.find_similar(&queries, config.knn, config.num_similar_images)?;

        println!("Best candidates for - {line} - are:");
        for image_id in ranking {
            println!("{}", config.image_path(image_id)?.display());
        }
    }

    println!("Exiting...");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
