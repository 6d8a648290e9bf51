//! HTML assembly for the cluster report
//!
//! Direct string building, no template engine: the report is a line vector
//! joined at the end, the document pages are a single pass over the text
//! with mention spans wrapped in anchors.

use super::{ReportOptions, ReportResult};
use crate::corpus::{Document, DocumentStore};
use crate::resolve::{ClusterGroup, ClusterRecord, Hypothesis, Justification};
use crate::graph::NodeId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

const STYLE_CSS: &str = "\
body {
  padding: 2.5%;
  font-family: sans-serif;
}

ul {
  padding-left: 20px;
}

pre {
  white-space: pre-wrap;
}

span.mention {
  background-color: #ffff00;
}

.warnings {
  color: #8a6d3b;
}
";

/// Mention spans to highlight, per document
pub type PageSpans = BTreeMap<String, (Document, BTreeSet<(usize, usize)>)>;

/// Renders a resolved hypothesis to an HTML report plus per-document pages
pub struct ReportWriter<'a, S: DocumentStore> {
    corpus: &'a S,
    options: ReportOptions,
}

impl<'a, S: DocumentStore> ReportWriter<'a, S> {
    /// Create a writer over the given document store
    pub fn new(corpus: &'a S, options: ReportOptions) -> Self {
        Self { corpus, options }
    }

    /// Write `report.html`, `style.css` and the `docs/` pages under `out_dir`
    ///
    /// Returns the path of the main report file.
    pub fn write_to_dir(&self, hypothesis: &Hypothesis, out_dir: &Path) -> ReportResult<PathBuf> {
        let (report, pages) = self.render(hypothesis)?;

        fs::create_dir_all(out_dir)?;
        let report_path = out_dir.join("report.html");
        fs::write(&report_path, report)?;
        fs::write(out_dir.join("style.css"), STYLE_CSS)?;

        let docs_dir = out_dir.join("docs");
        fs::create_dir_all(&docs_dir)?;
        for (doc_ref, (document, spans)) in &pages {
            let page = render_document_page(document, spans);
            fs::write(docs_dir.join(format!("{}.html", file_stem(doc_ref))), page)?;
        }
        Ok(report_path)
    }

    /// Render the main report, collecting the spans each document page needs
    pub fn render(&self, hypothesis: &Hypothesis) -> ReportResult<(String, PageSpans)> {
        let mut lines: Vec<String> = Vec::new();
        let mut pages = PageSpans::new();

        lines.push("<html>".into());
        lines.push("<head><link rel=\"stylesheet\" href=\"style.css\"></head>".into());
        lines.push("<body>".into());
        lines.push(format!(
            "<b>Hypothesis Name: </b>{}<br>",
            escape(&hypothesis.name)
        ));
        lines.push(format!(
            "<small>generated {}</small><br>",
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        ));
        lines.push("Note: Cluster handle is used when entity name is not found.<br>".into());

        for group in hypothesis.events_by_cluster() {
            lines.push(format!(
                "<br><u>Event: {}</u><ul>",
                escape(group.cluster_type.fragment())
            ));
            self.render_cluster(&group, &mut lines, &mut pages)?;
        }
        for group in hypothesis.relations_by_cluster() {
            lines.push(format!(
                "<br><u>Relation: {}</u><ul>",
                escape(group.cluster_type.fragment())
            ));
            self.render_cluster(&group, &mut lines, &mut pages)?;
        }

        if !hypothesis.warnings.is_empty() {
            lines.push("<br><div class=\"warnings\"><b>Warnings</b><ul>".into());
            for warning in &hypothesis.warnings {
                lines.push(format!("<li>{}</li>", escape(&warning.to_string())));
            }
            lines.push("</ul></div>".into());
        }

        lines.push("</body>".into());
        lines.push("</html>".into());
        Ok((lines.join("\n"), pages))
    }

    fn render_cluster(
        &self,
        group: &ClusterGroup<'_>,
        lines: &mut Vec<String>,
        pages: &mut PageSpans,
    ) -> ReportResult<()> {
        let mut records: Vec<&ClusterRecord> = group.records.clone();
        records.sort_by(|a, b| {
            (&a.member_id, &a.member_justification).cmp(&(&b.member_id, &b.member_justification))
        });

        let mut current_member: Option<&NodeId> = None;
        for record in records {
            // Each member opens its own sub-list
            if current_member != Some(&record.member_id) {
                if current_member.is_some() {
                    lines.push("</ul></li>".into());
                }
                current_member = Some(&record.member_id);
                let anchor = self.mention(&record.member_justification, pages)?;
                lines.push(format!(
                    "<li>ID: {}",
                    linked(escape(record.member_id.local_name()), anchor.href)
                ));
                lines.push("<ul>".into());
            }

            let mention = self.mention(&record.object_justification, pages)?;
            lines.push(format!("<li><u>{}:</u>", escape(record.predicate_label())));
            if self.options.verbose {
                lines.push("<ul>".into());
                lines.push(format!(
                    "<li><b>informativeJustification</b>: {}</li>",
                    linked(escape(&mention.text), mention.href)
                ));
                lines.push(format!(
                    "<li><b>hasName</b>: {}</li>",
                    list_or_nothing(&record.object_names)
                ));
                lines.push(format!(
                    "<li><b>handle</b>: {}</li>",
                    list_or_nothing(&record.object_handles)
                ));
                lines.push(format!(
                    "<li><b>type</b>: {}</li>",
                    list_or_nothing(&record.object_types)
                ));
                lines.push("</ul>".into());
            } else {
                let mut line = linked(escape(&mention.text), mention.href);
                let identifiers: BTreeSet<&String> = record
                    .object_names
                    .iter()
                    .chain(record.object_handles.iter())
                    .chain(record.object_types.iter())
                    .collect();
                for identifier in identifiers {
                    line.push_str(&format!(", {}", escape(identifier)));
                }
                lines.push(line);
            }
            lines.push("</li>".into());
        }
        if current_member.is_some() {
            lines.push("</ul></li>".into());
        }
        lines.push("</ul>".into());
        Ok(())
    }

    /// Resolve a justification to display text and (when possible) a link
    /// into its document page, registering the span for highlighting
    fn mention(
        &self,
        justification: &Option<Justification>,
        pages: &mut PageSpans,
    ) -> ReportResult<Mention> {
        let Some(justification) = justification else {
            return Ok(Mention::unlinked("no justification found"));
        };
        let Some(doc_ref) = justification.document_ref() else {
            return Ok(Mention::unlinked("no justification found"));
        };
        let Some(document) = self.corpus.lookup(doc_ref)? else {
            return Ok(Mention::unlinked(format!("[missing document {}]", doc_ref)));
        };

        let span = (justification.span_start, justification.span_end);
        pages
            .entry(doc_ref.to_string())
            .or_insert_with(|| (document.clone(), BTreeSet::new()))
            .1
            .insert(span);

        Ok(Mention {
            text: format!(
                "{} ({}:{})",
                document.excerpt(justification),
                justification.span_start,
                justification.span_end
            ),
            href: Some(format!(
                "docs/{}.html#m-{}-{}",
                file_stem(doc_ref),
                justification.span_start,
                justification.span_end
            )),
        })
    }
}

struct Mention {
    text: String,
    href: Option<String>,
}

impl Mention {
    fn unlinked(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
        }
    }
}

/// Render a document page with its mention spans highlighted
///
/// Spans that partially overlap produce crossed tags; fully nested or
/// disjoint spans render correctly.
fn render_document_page(document: &Document, spans: &BTreeSet<(usize, usize)>) -> String {
    let mut starts: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    let mut ends: HashMap<usize, usize> = HashMap::new();
    for &(start, end) in spans {
        starts.entry(start).or_default().push((start, end));
        *ends.entry(end).or_insert(0) += 1;
    }

    let mut out = String::new();
    out.push_str("<html>\n<head><link rel=\"stylesheet\" href=\"../style.css\"></head>\n<body>\n");
    out.push_str(&format!("<b>{}</b> ({})<br>\n", escape(&document.parent_id), escape(&document.child_id)));
    out.push_str("<pre>");

    let mut open = 0usize;
    for (position, ch) in document.full_text.chars().enumerate() {
        if let Some(opening) = starts.get(&position) {
            for (start, end) in opening {
                out.push_str(&format!("<span id=\"m-{}-{}\" class=\"mention\">", start, end));
                open += 1;
            }
        }
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
        if let Some(&closing) = ends.get(&position) {
            for _ in 0..closing.min(open) {
                out.push_str("</span>");
            }
            open = open.saturating_sub(closing);
        }
    }
    // Spans running past the end of the text still need closing
    for _ in 0..open {
        out.push_str("</span>");
    }

    out.push_str("</pre>\n</body>\n</html>\n");
    out
}

fn linked(text: String, href: Option<String>) -> String {
    match href {
        Some(href) => format!("<a href=\"{}\">{}</a>", href, text),
        None => text,
    }
}

fn list_or_nothing(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        "Nothing found".to_string()
    } else {
        escape(
            &values
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

fn file_stem(doc_ref: &str) -> String {
    doc_ref
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SqliteCorpus;
    use crate::resolve::PredicateRole;

    fn sample_document() -> Document {
        Document {
            parent_id: "DOC1".into(),
            child_id: "SEG1".into(),
            lang_id: "eng".into(),
            full_text: "The attack in Kyiv killed three.".into(),
        }
    }

    fn sample_record() -> ClusterRecord {
        let predicate = NodeId::new("https://example.org/ont#Conflict.Attack_Place");
        ClusterRecord {
            cluster_id: NodeId::from("cluster/1"),
            cluster_type: NodeId::new("https://example.org/ont#Conflict.Attack"),
            member_id: NodeId::from("event/1"),
            member_justification: Some(Justification {
                parent_id: Some("DOC1".into()),
                child_id: None,
                span_start: 4,
                span_end: 9,
            }),
            role: PredicateRole::of(&predicate),
            predicate,
            object_id: NodeId::from("entity/1"),
            object_types: ["GPE"].iter().map(|s| s.to_string()).collect(),
            object_names: ["Kyiv"].iter().map(|s| s.to_string()).collect(),
            object_handles: BTreeSet::new(),
            object_justification: Some(Justification {
                parent_id: Some("DOC1".into()),
                child_id: None,
                span_start: 14,
                span_end: 17,
            }),
        }
    }

    fn sample_hypothesis() -> Hypothesis {
        Hypothesis {
            name: "hypothesis/1".into(),
            events: vec![sample_record()],
            relations: Vec::new(),
            inferred_places: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_report_links_excerpt() {
        let corpus = SqliteCorpus::open_in_memory().unwrap();
        corpus.insert_documents(&[sample_document()]).unwrap();

        let writer = ReportWriter::new(&corpus, ReportOptions::default());
        let (report, pages) = writer.render(&sample_hypothesis()).unwrap();

        assert!(report.contains("Event: Conflict.Attack"));
        assert!(report.contains("Kyiv (14:17)"));
        assert!(report.contains("docs/DOC1.html#m-14-17"));
        assert!(pages.contains_key("DOC1"));
        assert_eq!(pages["DOC1"].1.len(), 2);
    }

    #[test]
    fn test_missing_justification_renders_unlinked() {
        let corpus = SqliteCorpus::open_in_memory().unwrap();
        corpus.insert_documents(&[sample_document()]).unwrap();

        let mut hypothesis = sample_hypothesis();
        hypothesis.events[0].object_justification = None;

        let writer = ReportWriter::new(&corpus, ReportOptions::default());
        let (report, _) = writer.render(&hypothesis).unwrap();
        assert!(report.contains("no justification found"));
    }

    #[test]
    fn test_document_page_highlights_span() {
        let document = sample_document();
        let spans: BTreeSet<(usize, usize)> = [(14, 17)].into_iter().collect();
        let page = render_document_page(&document, &spans);
        assert!(page.contains("<span id=\"m-14-17\" class=\"mention\">Kyiv</span>"));
    }

    #[test]
    fn test_document_page_escapes_markup() {
        let mut document = sample_document();
        document.full_text = "a < b & c".into();
        let page = render_document_page(&document, &BTreeSet::new());
        assert!(page.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_write_to_dir() {
        let corpus = SqliteCorpus::open_in_memory().unwrap();
        corpus.insert_documents(&[sample_document()]).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let writer = ReportWriter::new(&corpus, ReportOptions { verbose: true });
        let report_path = writer.write_to_dir(&sample_hypothesis(), dir.path()).unwrap();

        assert!(report_path.exists());
        assert!(dir.path().join("style.css").exists());
        assert!(dir.path().join("docs/DOC1.html").exists());
    }
}
