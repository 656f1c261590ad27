use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use apparel::{ApparelClassifier, ApparelConfig, ClassifierBuilder};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(author, version, about = "Build and apply the apparel product classifier", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model from a labeled CSV corpus
    Build {
        /// Training corpus (defaults to `corpus` from the configuration)
        #[arg(short, long)]
        corpus: Option<PathBuf>,
        /// Directory the model and its metadata are written to
        #[arg(short, long, default_value = ".")]
        outpath: PathBuf,
        /// Skip cross validation
        #[arg(long)]
        no_validate: bool,
    },
    /// Classify a product: NAME [DESCRIPTION [KEYWORDS]]
    Classify {
        /// Product name, then optional description and keywords
        #[arg(required = true, num_args = 1..=3)]
        text: Vec<String>,
        /// Model to use (defaults to `model` from the configuration)
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Print the features behind the decision
        #[arg(short, long)]
        explain: bool,
    },
    /// List every label a model knows
    Labels {
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Print the resolved configuration
    Config,
}

fn resolve(path: Option<PathBuf>, fallback: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    match path.or(fallback) {
        Some(path) => Ok(path),
        None => bail!("No {} given: pass --{} or set `{}` in the configuration", what, what, what),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = ApparelConfig::load().context("Failed to load configuration")?;

    let default_level = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match args.command {
        Command::Build { corpus, outpath, no_validate } => {
            let corpus = resolve(corpus, config.corpus.clone(), "corpus")?;
            let start_time = Instant::now();
            info!("=== Building classifier from {:?} ===", corpus);

            let mut builder = ClassifierBuilder::new(&corpus)
                .with_output_dir(&outpath)?
                .with_validation(!no_validate);
            let result = builder.build().context("Build failed")?;

            println!("{}", serde_json::to_string_pretty(&result.info)?);
            info!("=== Classifier Built Successfully (took {:.2?}) ===", start_time.elapsed());
        }
        Command::Classify { text, model, explain } => {
            let model = resolve(model, config.model.clone(), "model")?;
            let classifier = ApparelClassifier::new(&model)
                .with_context(|| format!("Failed to load model {:?}", model))?;

            let name = text[0].as_str();
            let description = text.get(1).map(String::as_str);
            let keywords = text.get(2).map(String::as_str);

            for (label, probability) in classifier.classify(name, description, keywords) {
                println!("{:<24} {:.4}", label, probability);
            }
            if explain {
                println!();
                print!("{}", classifier.explain(name, description, keywords));
            }
        }
        Command::Labels { model } => {
            let model = resolve(model, config.model.clone(), "model")?;
            let classifier = ApparelClassifier::new(&model)
                .with_context(|| format!("Failed to load model {:?}", model))?;
            for label in classifier.labels() {
                println!("{}", label);
            }
        }
        Command::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_flag() {
        let path = resolve(Some(PathBuf::from("a.csv")), Some(PathBuf::from("b.csv")), "corpus").unwrap();
        assert_eq!(path, PathBuf::from("a.csv"));
        let path = resolve(None, Some(PathBuf::from("b.csv")), "corpus").unwrap();
        assert_eq!(path, PathBuf::from("b.csv"));
        assert!(resolve(None, None, "corpus").is_err());
    }

    #[test]
    fn test_parse_classify_args() {
        let args = Args::try_parse_from(["apparel-classify", "classify", "Leather Tote", "A bag", "--explain"]).unwrap();
        match args.command {
            Command::Classify { text, explain, model } => {
                assert_eq!(text, vec!["Leather Tote", "A bag"]);
                assert!(explain);
                assert!(model.is_none());
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn test_parse_build_args() {
        let args = Args::try_parse_from(["apparel-classify", "build", "--corpus", "c.csv", "--no-validate"]).unwrap();
        match args.command {
            Command::Build { corpus, outpath, no_validate } => {
                assert_eq!(corpus, Some(PathBuf::from("c.csv")));
                assert_eq!(outpath, PathBuf::from("."));
                assert!(no_validate);
            }
            _ => panic!("expected build"),
        }
    }
}
