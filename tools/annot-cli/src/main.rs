mod document;

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use annot_controller::{AnnotatorController, GestureOutcome, MarkClick, RenderNode};
use annot_protocol::{Interval, Label, Span};
use annot_resolver::{MemorySelection, SelectionPoint};
use annot_segmenter::{token_at_byte, ByteRange};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};

use crate::document::{load_config, Document, SegmentRow};

#[derive(Parser)]
#[command(author, version, about = "Annotate token spans from the command line")]
struct Cli {
    /// JSON document: {"tokens": [...], "value": [...]}
    #[arg(short, long, value_name = "FILE", conflicts_with = "text")]
    doc: Option<PathBuf>,

    /// Plain text, split on whitespace, with no spans
    #[arg(short, long)]
    text: Option<String>,

    /// Controller config JSON: {"overlap": "layer" | "reject", "style": ...}
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the resulting document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the render segments as JSON
    Segment,
    /// Print the text with marked runs in brackets
    Render,
    /// Simulate a selection gesture from anchor to focus, given either as
    /// TOKEN[:OFFSET] or as byte offsets into the text
    Select {
        #[arg(long, value_parser = parse_point, required_unless_present = "anchor_byte")]
        anchor: Option<(usize, usize)>,
        #[arg(long, value_parser = parse_point, required_unless_present = "focus_byte")]
        focus: Option<(usize, usize)>,
        /// Byte offset of the anchor in the text (tokens joined by spaces for --doc)
        #[arg(long, conflicts_with_all = ["anchor", "focus"], requires = "focus_byte")]
        anchor_byte: Option<usize>,
        #[arg(long, conflicts_with_all = ["anchor", "focus"], requires = "anchor_byte")]
        focus_byte: Option<usize>,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Add a span over [start, end)
    Add {
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Remove the span over [start, end), as a click on its mark would
    Remove {
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
    },
}

fn parse_point(s: &str) -> Result<(usize, usize), String> {
    let (token, offset) = match s.split_once(':') {
        Some((t, o)) => (t, o),
        None => (s, "0"),
    };
    let token = token.parse().map_err(|_| format!("invalid token index '{}'", token))?;
    let offset = offset.parse().map_err(|_| format!("invalid offset '{}'", offset))?;
    Ok((token, offset))
}

type Controller = AnnotatorController<Label>;

fn build_controller(
    cli: &Cli,
    tag: Option<String>,
) -> Result<(Controller, Rc<RefCell<Option<Vec<Span<Label>>>>>)> {
    let config = load_config(cli.config.as_deref())?;
    let latest = Rc::new(RefCell::new(None));
    let sink_latest = Rc::clone(&latest);

    let controller = AnnotatorController::<Label>::builder()
        .config(config)
        .enricher(move |interval: Interval, _: &[String]| {
            Span::from_interval(interval, Label { tag: tag.clone() })
        })
        .sink(move |value: Vec<Span<Label>>| {
            *sink_latest.borrow_mut() = Some(value);
        })
        .build();

    Ok((controller, latest))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut doc = match (&cli.doc, &cli.text) {
        (Some(path), _) => Document::load(path)?,
        (None, Some(text)) => Document::from_text(text),
        (None, None) => bail!("either --doc or --text is required"),
    };
    if let Err(e) = annot_store::validate(doc.tokens.len(), &doc.value) {
        warn!("document spans are not well formed: {}", e);
    }
    debug!("loaded {} tokens, {} spans", doc.tokens.len(), doc.value.len());

    match &cli.command {
        Command::Segment => {
            let rows: Vec<SegmentRow> = annot_segmenter::segment(&doc.tokens, &doc.value)
                .iter()
                .map(|seg| SegmentRow {
                    start: seg.start,
                    end: seg.end,
                    marked: seg.is_marked(),
                    content: seg.content(),
                    key: seg.mark.map(|s| s.render_key()),
                    tag: seg.mark.and_then(|s| s.payload.tag.clone()),
                })
                .collect();
            emit(&cli, &serde_json::to_string_pretty(&rows)?)?;
        }
        Command::Render => {
            let (controller, _) = build_controller(&cli, None)?;
            let line: Vec<String> = controller
                .render(&doc.tokens, &doc.value)
                .into_iter()
                .map(|node| match node {
                    RenderNode::Token { content, .. } => content,
                    RenderNode::Mark(mark) => mark,
                })
                .collect();
            emit(&cli, &line.join(" "))?;
        }
        Command::Select { anchor, focus, anchor_byte, focus_byte, tag } => {
            let (mut controller, latest) = build_controller(&cli, tag.clone())?;
            let mut source = MemorySelection::for_tokens(doc.tokens.len());
            match (anchor, focus, anchor_byte, focus_byte) {
                (Some(anchor), Some(focus), _, _) => source.select_tokens(*anchor, *focus),
                (_, _, Some(anchor), Some(focus)) => {
                    let ranges = match &cli.text {
                        Some(text) => byte_ranges(text),
                        None => byte_ranges(&doc.tokens.join(" ")),
                    };
                    select_bytes(&mut source, &ranges, *anchor, *focus);
                }
                _ => bail!("select needs --anchor/--focus or --anchor-byte/--focus-byte"),
            }

            controller.pointer_down();
            let outcome = controller.pointer_release(&mut source, &doc.tokens, &doc.value);
            report(&outcome);
            adopt(&mut doc, &latest);
            emit(&cli, &doc.to_json()?)?;
        }
        Command::Add { start, end, tag } => {
            let interval = Interval::checked(*start, *end, doc.tokens.len())
                .context("span does not fit the document")?;
            let config = load_config(cli.config.as_deref())?;
            let span = Span::from_interval(interval, Label { tag: tag.clone() });
            doc.value = annot_store::try_add(&doc.value, span, config.overlap)?;
            info!("added {}", interval);
            emit(&cli, &doc.to_json()?)?;
        }
        Command::Remove { start, end } => {
            let (mut controller, latest) = build_controller(&cli, None)?;
            let outcome = controller.mark_click(MarkClick { start: *start, end: *end }, &doc.value);
            report(&outcome);
            adopt(&mut doc, &latest);
            emit(&cli, &doc.to_json()?)?;
        }
    }

    Ok(())
}

fn byte_ranges(text: &str) -> Vec<ByteRange> {
    annot_segmenter::tokenize(text).into_iter().map(|(range, _)| range).collect()
}

/// Selects between two byte offsets. Offsets on whitespace land on an
/// untagged node, so the resolver reports them as outside any token.
fn select_bytes(source: &mut MemorySelection, ranges: &[ByteRange], anchor: usize, focus: usize) {
    let gap = source.push_untagged();
    let point = |offset: usize| match token_at_byte(ranges, offset) {
        Some(index) => {
            let i = index.get();
            SelectionPoint::new(MemorySelection::node(i), offset - ranges[i].start)
        }
        None => SelectionPoint::new(gap, offset),
    };
    source.select(point(anchor), point(focus));
}

fn adopt(doc: &mut Document, latest: &Rc<RefCell<Option<Vec<Span<Label>>>>>) {
    if let Some(value) = latest.borrow_mut().take() {
        doc.value = value;
    }
}

fn report(outcome: &GestureOutcome) {
    match outcome {
        GestureOutcome::Added(i) => info!("added {}", i),
        GestureOutcome::Removed(i) => info!("removed {}", i),
        GestureOutcome::Unchanged(i) => warn!("no span at {}", i),
        GestureOutcome::Rejected(i) => warn!("rejected {}", i),
        GestureOutcome::NoSelection(e) => warn!("no change: {}", e),
        GestureOutcome::Ignored => warn!("read-only"),
    }
}

fn emit(cli: &Cli, body: &str) -> Result<()> {
    match &cli.output {
        Some(path) => fs::write(path, format!("{}\n", body))
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{}", body);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("3"), Ok((3, 0)));
        assert_eq!(parse_point("3:2"), Ok((3, 2)));
        assert!(parse_point("x:1").is_err());
        assert!(parse_point("1:y").is_err());
    }

    #[test]
    fn test_select_bytes_maps_columns_to_tokens() {
        let ranges = byte_ranges("The quick  brown fox");
        let mut source = MemorySelection::for_tokens(ranges.len());
        select_bytes(&mut source, &ranges, 13, 5);
        assert_eq!(annot_resolver::resolve(&source), Ok(Interval::new(1, 3)));

        // Column 10 is the second space between "quick" and "brown"
        select_bytes(&mut source, &ranges, 10, 1);
        assert!(annot_resolver::resolve(&source).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
