//! Text-to-path conversion with an invisible text overlay.
//!
//! # Process
//! 1. Sanitize: round trip through Inkscape so every element gets an `id`
//! 2. Export: round trip again with `--export-text-to-path`
//! 3. Merge: pair each `<text>` with the element carrying its `id` in the
//!    exported tree, wrapped as `<g><text style="…fill-opacity: 0;"/><path/></g>`
//! 4. Sanitize the merged document once more
//!
//! The three Inkscape runs are strictly sequential: the export relies on the
//! ids assigned by the first sanitize.

use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

use super::dom::{Document, IdIndex, NodeId, ParseError};
use super::style::hide_fill;
use crate::{
    debug,
    inkscape::{self, EXPORT_TEXT_TO_PATH_ARGS, InkscapeError, SANITIZE_ARGS},
    log,
};

/// Options for [`convert`].
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Inkscape executable. Discovered on `PATH` for every run when `None`.
    pub inkscape: Option<PathBuf>,
    /// Fail instead of leaving unmatched text elements as plain text.
    pub strict: bool,
}

/// Inkscape round trip kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Sanitize,
    Export,
}

impl Pass {
    fn args(self) -> &'static [&'static str] {
        match self {
            Self::Sanitize => SANITIZE_ARGS,
            Self::Export => EXPORT_TEXT_TO_PATH_ARGS,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sanitize => f.write_str("sanitize"),
            Self::Export => f.write_str("text-to-path export"),
        }
    }
}

/// A text element that was left as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    /// The element had no `id` to match on.
    MissingId,
    /// No element with this `id` exists in the exported document.
    NoMatch(String),
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => f.write_str("text element without id"),
            Self::NoMatch(id) => write!(f, "no path for text element `{id}`"),
        }
    }
}

/// Outcome of [`merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Text elements wrapped together with their path.
    pub converted: usize,
    /// Text elements left untouched, in document order.
    pub skipped: Vec<Skipped>,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Inkscape {pass} pass failed")]
    Inkscape {
        pass: Pass,
        #[source]
        source: InkscapeError,
    },

    #[error("Inkscape {pass} pass produced an unreadable document")]
    Parse {
        pass: Pass,
        #[source]
        source: ParseError,
    },

    #[error("text left unconverted: {}", join_skipped(.0))]
    Unmatched(Vec<Skipped>),
}

fn join_skipped(skipped: &[Skipped]) -> String {
    skipped
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convert every text element of `svg` to a path with an invisible text overlay.
///
/// `svg` itself is never modified.
pub async fn convert(svg: &Document, options: &ConvertOptions) -> Result<Document, ConvertError> {
    convert_with_report(svg, options)
        .await
        .map(|(document, _)| document)
}

/// Like [`convert`], also returning what happened to each text element.
pub async fn convert_with_report(
    svg: &Document,
    options: &ConvertOptions,
) -> Result<(Document, MergeReport), ConvertError> {
    let bin = options.inkscape.as_deref();

    let mut working = run_pass(svg, Pass::Sanitize, bin).await?;
    let mut converted = run_pass(&working, Pass::Export, bin).await?;

    let report = merge(&mut working, &mut converted);
    debug!(
        "convert";
        "{} text element(s) converted, {} skipped",
        report.converted,
        report.skipped.len()
    );

    if options.strict && !report.skipped.is_empty() {
        return Err(ConvertError::Unmatched(report.skipped));
    }

    let document = run_pass(&working, Pass::Sanitize, bin).await?;
    Ok((document, report))
}

async fn run_pass(doc: &Document, pass: Pass, bin: Option<&Path>) -> Result<Document, ConvertError> {
    let output = inkscape::invoke(pass.args(), &doc.to_bytes(), bin)
        .await
        .map_err(|source| ConvertError::Inkscape { pass, source })?;
    Document::from_bytes(&output).map_err(|source| ConvertError::Parse { pass, source })
}

/// Pair each text element of `doc` with its counterpart in `converted`.
///
/// Matched elements are moved out of `converted`, so one exported element
/// is never used twice. Unmatched text stays exactly as it was.
pub fn merge(doc: &mut Document, converted: &mut Document) -> MergeReport {
    let index = IdIndex::build(converted);
    let texts: Vec<NodeId> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|&id| doc.is_svg_element(id, "text"))
        .collect();

    let mut report = MergeReport::default();
    for text in texts {
        // Inside a text element that has already been wrapped
        if !doc.is_attached(text) {
            continue;
        }

        let Some(id) = doc.attr(text, "id").map(str::to_owned) else {
            log!("warning"; "text element is missing an id, left as text");
            report.skipped.push(Skipped::MissingId);
            continue;
        };
        let Some(path) = index.lookup(converted, &id) else {
            log!("warning"; "no path found for text element `{id}`, left as text");
            report.skipped.push(Skipped::NoMatch(id));
            continue;
        };
        let Some(parent) = doc.parent(text) else {
            continue;
        };

        wrap(doc, converted, parent, text, path);
        report.converted += 1;
    }
    report
}

/// Replace `text` with `<g>{hidden copy of text}{path}</g>`.
fn wrap(doc: &mut Document, converted: &mut Document, parent: NodeId, text: NodeId, path: NodeId) {
    let overlay = doc.clone_subtree(text);
    let style = hide_fill(doc.attr(overlay, "style"));
    doc.set_attr(overlay, "style", style);

    let path = doc.adopt(converted, path);
    let group = doc.create_element("g");
    doc.append_child(group, overlay);
    doc.append_child(group, path);
    doc.replace_child(parent, group, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(doc: &str, converted: &str) -> (String, String, MergeReport) {
        let mut doc = Document::parse(doc).unwrap();
        let mut converted = Document::parse(converted).unwrap();
        let report = merge(&mut doc, &mut converted);
        (doc.to_string(), converted.to_string(), report)
    }

    #[test]
    fn test_matched_text_is_wrapped() {
        let (out, rest, report) = merged(
            r#"<svg><text id="t1">Hi</text></svg>"#,
            r#"<svg><path id="t1" d="M0 0"/></svg>"#,
        );
        assert_eq!(
            out,
            r#"<svg><g><text id="t1" style="fill-opacity: 0;">Hi</text><path id="t1" d="M0 0"/></g></svg>"#
        );
        assert_eq!(rest, "<svg/>");
        assert_eq!(report.converted, 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_group_has_exactly_text_and_path() {
        let mut doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="a" style="fill:#000">A</text></svg>"#,
        )
        .unwrap();
        let mut converted =
            Document::parse(r#"<svg xmlns="http://www.w3.org/2000/svg"><path id="a" d="M1 1"/></svg>"#)
                .unwrap();
        merge(&mut doc, &mut converted);

        let root = doc.root_element().unwrap();
        let group = doc.child_elements(root)[0];
        assert_eq!(doc.element(group).unwrap().name, "g");
        assert!(doc.element(group).unwrap().attrs.is_empty());

        let kids = doc.children(group).to_vec();
        assert_eq!(kids.len(), 2);
        assert_eq!(doc.element(kids[0]).unwrap().name, "text");
        assert_eq!(doc.attr(kids[0], "style"), Some("fill:#000;fill-opacity: 0;"));
        assert_eq!(doc.element(kids[1]).unwrap().name, "path");
        assert_eq!(doc.attr(kids[1], "id"), Some("a"));
    }

    #[test]
    fn test_text_without_id_left_untouched() {
        let src = r#"<svg><text style="fill:red">Hi</text></svg>"#;
        let (out, _, report) = merged(src, r#"<svg><path id="t1" d=""/></svg>"#);
        assert_eq!(out, src);
        assert_eq!(report.skipped, vec![Skipped::MissingId]);
        assert_eq!(report.converted, 0);
    }

    #[test]
    fn test_text_without_match_left_untouched() {
        let src = r#"<svg><text id="t1">Hi</text></svg>"#;
        let (out, rest, report) = merged(src, r#"<svg><path id="other" d=""/></svg>"#);
        assert_eq!(out, src);
        assert_eq!(rest, r#"<svg><path id="other" d=""/></svg>"#);
        assert_eq!(report.skipped, vec![Skipped::NoMatch("t1".into())]);
    }

    #[test]
    fn test_position_among_siblings_kept() {
        let (out, _, report) = merged(
            r#"<svg><rect id="r"/><g id="layer"><text id="a">A</text><circle/></g><text id="b">B</text></svg>"#,
            r#"<svg><rect id="r"/><g id="layer"><path id="a" d="A"/><circle/></g><path id="b" d="B"/></svg>"#,
        );
        assert_eq!(
            out,
            concat!(
                r#"<svg><rect id="r"/><g id="layer">"#,
                r#"<g><text id="a" style="fill-opacity: 0;">A</text><path id="a" d="A"/></g>"#,
                r#"<circle/></g>"#,
                r#"<g><text id="b" style="fill-opacity: 0;">B</text><path id="b" d="B"/></g>"#,
                r#"</svg>"#
            )
        );
        assert_eq!(report.converted, 2);
    }

    #[test]
    fn test_mixed_outcomes_reported_in_order() {
        let (_, _, report) = merged(
            r#"<svg><text>x</text><text id="gone">y</text><text id="ok">z</text></svg>"#,
            r#"<svg><path id="ok" d=""/></svg>"#,
        );
        assert_eq!(report.converted, 1);
        assert_eq!(
            report.skipped,
            vec![Skipped::MissingId, Skipped::NoMatch("gone".into())]
        );
    }

    #[test]
    fn test_duplicate_ids_first_match_wins() {
        let (out, rest, _) = merged(
            r#"<svg><text id="t">T</text></svg>"#,
            r#"<svg><path id="t" d="first"/><path id="t" d="second"/></svg>"#,
        );
        assert!(out.contains(r#"<path id="t" d="first"/>"#));
        assert_eq!(rest, r#"<svg><path id="t" d="second"/></svg>"#);
    }

    #[test]
    fn test_exported_group_moved_with_children() {
        let (out, _, _) = merged(
            r#"<svg><text id="t"><tspan>a</tspan><tspan>b</tspan></text></svg>"#,
            r#"<svg><g id="t"><path d="a"/><path d="b"/></g></svg>"#,
        );
        assert_eq!(
            out,
            concat!(
                r#"<svg><g><text id="t" style="fill-opacity: 0;"><tspan>a</tspan><tspan>b</tspan></text>"#,
                r#"<g id="t"><path d="a"/><path d="b"/></g></g></svg>"#
            )
        );
    }

    #[test]
    fn test_prefixed_svg_text_is_converted() {
        let (out, _, report) = merged(
            r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:text id="t">T</svg:text></svg:svg>"#,
            r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:path id="t" d=""/></svg:svg>"#,
        );
        assert_eq!(report.converted, 1);
        assert!(out.contains(r#"<svg:text id="t" style="fill-opacity: 0;">T</svg:text><svg:path id="t" d=""/>"#));
    }

    #[test]
    fn test_foreign_text_is_ignored() {
        let src = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:x="urn:x"><x:text id="t">T</x:text></svg>"#;
        let (out, _, report) = merged(src, r#"<svg><path id="t" d=""/></svg>"#);
        assert_eq!(out, src);
        assert_eq!(report, MergeReport::default());
    }

    #[test]
    fn test_unmatched_error_lists_elements() {
        let err = ConvertError::Unmatched(vec![Skipped::MissingId, Skipped::NoMatch("t2".into())]);
        assert_eq!(
            err.to_string(),
            "text left unconverted: text element without id, no path for text element `t2`"
        );
    }
}
