use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use razor_editor_config::Config;
use razor_editor_engine::{
    DocumentParseComplete, DocumentSnapshot, EditorParser, StaticTagHelpers, TextChange,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// How long to wait for a background parse before giving up.
const PARSE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "razor-editor-cli")]
#[command(about = "Replay edits against a Razor template and show how each one is parsed")]
struct Args {
    /// Template to open
    file: PathBuf,

    /// Config file (defaults to ~/.config/razor-editor/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Edit to apply, as INDEX:REMOVED:TEXT (byte offsets; \n, \t and \\ are unescaped)
    #[arg(long = "edit", value_name = "INDEX:REMOVED:TEXT")]
    edits: Vec<EditSpec>,

    /// Print the final syntax tree instead of the final text
    #[arg(long)]
    dump: bool,
}

/// One `--edit` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditSpec(TextChange);

impl FromStr for EditSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let (Some(index), Some(removed), Some(text)) = (parts.next(), parts.next(), parts.next())
        else {
            bail!("expected INDEX:REMOVED:TEXT, got {s:?}");
        };
        let index = index
            .parse()
            .with_context(|| format!("invalid index {index:?}"))?;
        let removed = removed
            .parse()
            .with_context(|| format!("invalid removed length {removed:?}"))?;
        Ok(EditSpec(TextChange::new(index, removed, unescape(text)?)))
    }
}

fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => bail!("unknown escape \\{other}"),
            None => bail!("dangling backslash"),
        }
    }
    Ok(out)
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?
            .ok_or_else(|| anyhow!("config file {} not found", path.display()))?,
        None => Config::load()?.unwrap_or_default(),
    };
    Ok(config)
}

fn wait_for_parse(updates: &Receiver<DocumentParseComplete>) -> Result<DocumentParseComplete> {
    updates
        .recv_timeout(PARSE_TIMEOUT)
        .context("background parse did not finish")
}

/// Applies `change` to `snapshot`, refusing edits that fall outside the text
/// or split a UTF-8 sequence.
fn apply_edit(snapshot: &DocumentSnapshot, change: &TextChange) -> Result<DocumentSnapshot> {
    if change.old_end() > snapshot.len() {
        bail!("edit {change} is outside the document ({} bytes)", snapshot.len());
    }
    for offset in [change.absolute_index, change.old_end()] {
        if !snapshot.text.is_codepoint_boundary(offset) {
            bail!("edit {change} splits a character at byte {offset}");
        }
    }
    Ok(snapshot.apply(change))
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let tag_helpers = config.resolve_tag_helpers()?;
    log::info!("{} tag helpers in scope", tag_helpers.len());

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let mut parser = EditorParser::builder(&args.file)
        .debounce(config.debounce())
        .tag_helpers(Arc::new(StaticTagHelpers::new(tag_helpers)))
        .build()?;
    let updates = parser.subscribe()?;

    let mut snapshot = DocumentSnapshot::new(0, source.as_str());
    parser.check_for_structure_changes(&TextChange::insertion(0, source.as_str()), snapshot.clone())?;
    wait_for_parse(&updates)?;

    for EditSpec(change) in &args.edits {
        snapshot = apply_edit(&snapshot, change)?;
        let result = parser.check_for_structure_changes(change, snapshot.clone())?;
        println!("{change} -> {result}");
        if result.is_rejected() {
            let event = wait_for_parse(&updates)?;
            println!(
                "  reparsed version {} (structure changed: {})",
                event.snapshot_version, event.tree_structure_changed
            );
        }
    }

    let tree = parser
        .current_tree()
        .ok_or_else(|| anyhow!("no syntax tree was produced"))?;
    if args.dump {
        print!("{}", tree.dump());
    } else {
        println!("{}", tree.text());
    }
    println!("full parses: {}", parser.parse_count());

    parser.dispose()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::insertion("13:0:.", TextChange::insertion(13, "."))]
    #[case::deletion("10:4:", TextChange::deletion(10, 4))]
    #[case::replacement("5:4:if", TextChange::replacement(5, 4, "if"))]
    #[case::colon_in_text("0:0:@:x", TextChange::insertion(0, "@:x"))]
    #[case::escapes("3:0:a\\nb\\t\\\\", TextChange::insertion(3, "a\nb\t\\"))]
    fn parses_edit_specs(#[case] spec: &str, #[case] expected: TextChange) {
        assert_eq!(spec.parse::<EditSpec>().unwrap(), EditSpec(expected));
    }

    #[rstest]
    #[case::missing_text("1:2")]
    #[case::bad_index("x:0:a")]
    #[case::bad_escape("0:0:\\q")]
    #[case::dangling_backslash("0:0:\\")]
    fn rejects_malformed_edit_specs(#[case] spec: &str) {
        assert!(spec.parse::<EditSpec>().is_err());
    }

    #[rstest]
    #[case::past_the_end(TextChange::insertion(6, "x"))]
    #[case::removal_past_the_end(TextChange::deletion(4, 3))]
    #[case::inside_a_character(TextChange::insertion(1, "x"))]
    #[case::removal_ends_inside_a_character(TextChange::deletion(0, 1))]
    fn refuses_edits_that_do_not_fit_the_text(#[case] change: TextChange) {
        let snapshot = DocumentSnapshot::new(0, "ü@x");
        let before = snapshot.text.to_string();
        assert!(apply_edit(&snapshot, &change).is_err());
        assert_eq!(snapshot.text.to_string(), before);
    }

    #[test]
    fn applies_edits_on_character_boundaries() {
        let snapshot = DocumentSnapshot::new(0, "ü@x");
        let edited = apply_edit(&snapshot, &TextChange::insertion(2, "y")).unwrap();
        assert_eq!(edited.text.to_string(), "üy@x");
    }

    #[test]
    fn args_collect_repeated_edits() {
        let args = Args::try_parse_from([
            "razor-editor-cli",
            "page.cshtml",
            "--edit",
            "8:0:.",
            "--edit",
            "9:0:b",
            "--dump",
        ])
        .unwrap();
        assert_eq!(args.edits.len(), 2);
        assert!(args.dump);
        assert_eq!(args.config, None);
    }
}
