//! Test driver for minixml.
//!
//! Runs a self-check of the node API, loads a file with the `type`
//! attribute classifier, optionally checks that element search finds a
//! first and a second sibling-level match, and writes the tree to standard
//! output with HTML-style formatting. Exits with 0 on success and 1 on any
//! failure.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use minixml::locate::Descend;
use minixml::parser::{load_with_options, ParseOptions, TypeAttributeClassifier};
use minixml::serial::{save, HtmlWhitespace, SaveOptions};
use minixml::{ConstructionError, Document, NodeId, NodeType, ParseError, SaveError};

/// Element searched for when the input file is named `test.xml`.
const FIXTURE_FILE: &str = "test.xml";
const FIXTURE_ELEMENT: &str = "choice";

/// mxmltest -- exercise the minixml loader, locator and saver on a file.
#[derive(Parser, Debug)]
#[command(name = "mxmltest", version, about, long_about = None)]
struct Cli {
    /// Markup file to load.
    file: PathBuf,

    /// Require two successive matches of this element: the first anywhere
    /// below the root, the second at the first match's sibling level.
    /// Defaults to `choice` when the file is named `test.xml`.
    #[arg(long, value_name = "NAME")]
    find: Option<String>,
}

#[derive(Debug, Error)]
enum Failure {
    #[error("self-check failed: {0}")]
    SelfCheck(String),
    #[error("self-check failed: {0}")]
    Construction(#[from] ConstructionError),
    #[error("{path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("unable to read markup file: {0}")]
    Load(#[from] ParseError),
    #[error("unable to find {ordinal} <{name}> element in tree")]
    NotFound { ordinal: &'static str, name: String },
    #[error("unable to write tree: {0}")]
    Save(#[from] SaveError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Usage errors exit with 1 like every other failure.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            eprint!("{err}");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            print!("{err}");
            return ExitCode::SUCCESS;
        }
    };
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mxmltest: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    self_check()?;
    debug!("self-check passed");

    let file = File::open(&cli.file).map_err(|source| Failure::Open {
        path: cli.file.clone(),
        source,
    })?;
    let options = ParseOptions::default().classifier(TypeAttributeClassifier);
    let doc = load_with_options(file, &options)?;
    let root = doc.root().ok_or_else(|| Failure::SelfCheck("loaded tree has no root".into()))?;
    info!(file = %cli.file.display(), nodes = doc.node_count(), "loaded");

    if let Some(name) = search_target(cli) {
        check_find(&doc, root, &name)?;
    }

    let stdout = io::stdout();
    let options = SaveOptions::default().whitespace(HtmlWhitespace);
    save(&doc, root, BufWriter::new(stdout.lock()), &options)?;
    Ok(())
}

fn search_target(cli: &Cli) -> Option<String> {
    if let Some(name) = &cli.find {
        return Some(name.clone());
    }
    let is_fixture = cli
        .file
        .file_name()
        .is_some_and(|name| name == FIXTURE_FILE);
    is_fixture.then(|| FIXTURE_ELEMENT.to_string())
}

/// Finds `name` anywhere below `root`, then again at that match's
/// sibling level. Either miss is a failure.
fn check_find(doc: &Document, root: NodeId, name: &str) -> Result<(), Failure> {
    let not_found = |ordinal| Failure::NotFound {
        ordinal,
        name: name.to_string(),
    };
    let first = doc
        .find_element(root, root, Some(name), None, None, Descend::Yes)
        .ok_or_else(|| not_found("first"))?;
    let second = doc
        .find_element(first, root, Some(name), None, None, Descend::No)
        .ok_or_else(|| not_found("second"))?;
    debug!(?first, ?second, "found both matches");
    Ok(())
}

fn ensure(cond: bool, message: &str) -> Result<(), Failure> {
    if cond {
        Ok(())
    } else {
        Err(Failure::SelfCheck(message.to_string()))
    }
}

/// Builds a small tree through the node API and checks every step.
fn self_check() -> Result<(), Failure> {
    let mut doc = Document::new();
    let tree = doc.new_element(None, "element")?;
    ensure(doc.node_type(tree) == NodeType::Element, "parent is not an element")?;
    ensure(doc.element_name(tree) == Some("element"), "parent name is not \"element\"")?;

    doc.new_integer(Some(tree), 123)?;
    doc.new_opaque(Some(tree), "opaque")?;
    doc.new_real(Some(tree), 123.4)?;
    doc.new_text(Some(tree), true, "text")?;

    let kids: Vec<NodeId> = doc.children(tree).collect();
    ensure(kids.len() == 4, "expected four children")?;
    ensure(doc.integer(kids[0]) == Some(123), "first child is not integer 123")?;
    ensure(doc.opaque(kids[1]) == Some("opaque"), "second child is not opaque \"opaque\"")?;
    ensure(
        doc.real(kids[2]).is_some_and(|v| (v - 123.4).abs() < 1e-9),
        "third child is not real 123.4",
    )?;
    ensure(
        doc.text(kids[3]) == Some("text") && doc.text_whitespace(kids[3]) == Some(true),
        "fourth child is not text 1,\"text\"",
    )?;

    while let Some(child) = doc.first_child(tree) {
        doc.delete(child);
    }
    ensure(doc.first_child(tree).is_none(), "child link not empty after deleting all children")?;
    ensure(doc.last_child(tree).is_none(), "last child link not empty after deleting all children")?;

    doc.delete(tree);
    ensure(doc.node_count() == 0, "nodes left after deleting the tree")
}
