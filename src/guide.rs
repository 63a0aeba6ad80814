//! Root page of the user guide.
//!
//! The guide is built by an external documentation generator; this module
//! owns the ordered list of pages the root index references and can render
//! the index and check that every referenced page exists.

use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    /// A page of the guide, listed in the table of contents
    Section,
    /// An index page produced by the documentation generator
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuideEntry {
    pub name: &'static str,
    pub kind: EntryKind,
}

pub const SECTIONS: [&str; 5] = ["intro", "tutorial", "gridworlds", "data_formats", "mod_dumps"];

/// General index, module index, search page.
pub const GENERATED: [&str; 3] = ["genindex", "modindex", "search"];

pub fn entries() -> Vec<GuideEntry> {
    SECTIONS
        .iter()
        .map(|&name| GuideEntry {
            name,
            kind: EntryKind::Section,
        })
        .chain(GENERATED.iter().map(|&name| GuideEntry {
            name,
            kind: EntryKind::Generated,
        }))
        .collect()
}

/// reStructuredText source of the root page.
pub fn render_index() -> String {
    let mut out = String::from("TuLiP User's Guide\n==================\n\n");
    out.push_str(".. toctree::\n   :maxdepth: 2\n\n");
    for name in SECTIONS {
        out.push_str(&format!("   {name}\n"));
    }
    out.push_str("\nIndices and tables\n==================\n\n");
    for name in GENERATED {
        out.push_str(&format!("* :ref:`{name}`\n"));
    }
    out
}

/// Sections with no `<name>.rst` page in `dir`.
pub fn missing_sections(dir: &Path) -> Vec<&'static str> {
    SECTIONS
        .into_iter()
        .filter(|name| !dir.join(format!("{name}.rst")).is_file())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_five_sections_then_three_indices() {
        let all = entries();
        assert_eq!(all.len(), 8);
        let sections: Vec<&str> = all
            .iter()
            .filter(|e| e.kind == EntryKind::Section)
            .map(|e| e.name)
            .collect();
        assert_eq!(
            sections,
            ["intro", "tutorial", "gridworlds", "data_formats", "mod_dumps"]
        );
        assert!(all[5..].iter().all(|e| e.kind == EntryKind::Generated));
    }

    #[test]
    fn rendered_index_keeps_order() {
        let page = render_index();
        let toc: Vec<&str> = page
            .lines()
            .filter_map(|l| l.strip_prefix("   "))
            .filter(|l| !l.starts_with(':'))
            .collect();
        assert_eq!(toc, SECTIONS);
        assert!(page.ends_with("* :ref:`genindex`\n* :ref:`modindex`\n* :ref:`search`\n"));
    }

    #[test]
    fn finds_missing_pages() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["intro", "tutorial", "data_formats"] {
            std::fs::write(dir.path().join(format!("{name}.rst")), "").unwrap();
        }
        assert_eq!(missing_sections(dir.path()), vec!["gridworlds", "mod_dumps"]);
    }
}
