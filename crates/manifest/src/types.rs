use std::collections::BTreeMap;

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

// ── Skill manifest ───────────────────────────────────────────────────────────

/// Typed manifest for a single skill, produced only by
/// [`crate::validate::validate`]. Field names are camelCase on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillManifest {
    /// Skill name: lowercase, hyphens allowed, 1-64 chars.
    pub name: String,
    /// Semantic version of the skill.
    pub version: String,
    /// Relative path to the skill's entry point within the skill root.
    pub entry_point: String,
    /// Short human-readable description.
    #[serde(default)]
    pub description: String,
    /// Parameters the skill accepts when invoked.
    #[serde(default)]
    pub parameters: Vec<SkillParameter>,
    /// Extra variables fed into template rendering at package time.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Current page shape: ordered list of titled layouts (tab order is
    /// declaration order).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageEntry>,
    /// Legacy page shape: a single bare layout with no title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,
}

/// A declared parameter of a skill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillParameter {
    /// Parameter name; must be a valid identifier.
    pub name: String,
    /// Description shown in the UI.
    #[serde(default)]
    pub description: Option<String>,
    /// When true, the parameter accepts multiple arguments.
    #[serde(default)]
    pub is_multi: bool,
    /// When non-empty, limits valid arguments to this list.
    #[serde(default)]
    pub constrained_values: Vec<String>,
}

/// One `{title, layout}` entry in the current `pages` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub title: String,
    /// Opaque layout tree consumed by the external renderer.
    pub layout: Value,
}

// ── Page projections ─────────────────────────────────────────────────────────

/// Which page shape a manifest declares. The two shapes are distinguished by
/// payload structure, not a version tag; this union is resolved once at the
/// consumer boundary and the ambiguity never travels further.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclaredPages<'a> {
    /// No pages declared.
    None,
    /// Legacy shape: top-level bare `layout`.
    Legacy(&'a Value),
    /// Current shape: `pages` list in declaration order.
    Pages(&'a [PageEntry]),
}

/// One addressable preview unit, re-derived from the manifest on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDefinition {
    pub page_id: String,
    pub title: String,
    pub layout: Value,
}

impl SkillManifest {
    /// Resolve which page shape this manifest declares.
    pub fn declared_pages(&self) -> DeclaredPages<'_> {
        if let Some(layout) = &self.layout {
            return DeclaredPages::Legacy(layout);
        }
        if self.pages.is_empty() {
            DeclaredPages::None
        } else {
            DeclaredPages::Pages(&self.pages)
        }
    }

    /// Project the declared pages into a uniform list of [`PageDefinition`]s.
    ///
    /// A legacy bare layout wraps into a one-element list titled after the
    /// skill; the current shape maps in declaration order, with
    /// `pageId = "<name>/<index>"` so ordering is stable.
    pub fn page_definitions(&self) -> Vec<PageDefinition> {
        match self.declared_pages() {
            DeclaredPages::None => Vec::new(),
            DeclaredPages::Legacy(layout) => vec![PageDefinition {
                page_id: self.name.clone(),
                title: self.name.clone(),
                layout: layout.clone(),
            }],
            DeclaredPages::Pages(pages) => pages
                .iter()
                .enumerate()
                .map(|(idx, page)| PageDefinition {
                    page_id: format!("{}/{idx}", self.name),
                    title: page.title.clone(),
                    layout: page.layout.clone(),
                })
                .collect(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn manifest(pages: Vec<PageEntry>, layout: Option<Value>) -> SkillManifest {
        SkillManifest {
            name: "demo".into(),
            version: "1.0.0".into(),
            entry_point: "main.py".into(),
            description: String::new(),
            parameters: Vec::new(),
            variables: BTreeMap::new(),
            pages,
            layout,
        }
    }

    #[test]
    fn legacy_layout_wraps_into_single_titled_page() {
        let m = manifest(Vec::new(), Some(json!({"type": "Document"})));
        let pages = m.page_definitions();
        assert_eq!(pages.len(), 1);
        assert!(!pages[0].title.is_empty());
        assert_eq!(pages[0].title, "demo");
        assert_eq!(pages[0].layout, json!({"type": "Document"}));
    }

    #[test]
    fn pages_keep_declaration_order() {
        let m = manifest(
            vec![
                PageEntry {
                    title: "Overview".into(),
                    layout: json!({"n": 1}),
                },
                PageEntry {
                    title: "Detail".into(),
                    layout: json!({"n": 2}),
                },
            ],
            None,
        );
        let pages = m.page_definitions();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_id, "demo/0");
        assert_eq!(pages[1].page_id, "demo/1");
        assert_eq!(pages[0].title, "Overview");
        assert_eq!(pages[1].title, "Detail");
    }

    #[test]
    fn no_pages_yields_empty_projection() {
        let m = manifest(Vec::new(), None);
        assert_eq!(m.declared_pages(), DeclaredPages::None);
        assert!(m.page_definitions().is_empty());
    }

    #[test]
    fn manifest_parses_camel_case_fields() {
        let m: SkillManifest = serde_json::from_value(json!({
            "name": "sales-report",
            "version": "0.2.1",
            "entryPoint": "main.py",
            "parameters": [{"name": "metrics", "isMulti": true}],
            "pages": [{"title": "Report", "layout": {"type": "Grid"}}]
        }))
        .unwrap();
        assert_eq!(m.entry_point, "main.py");
        assert!(m.parameters[0].is_multi);
        assert_eq!(m.pages[0].title, "Report");
    }

    #[test]
    fn page_definition_serializes_page_id_camel_case() {
        let def = PageDefinition {
            page_id: "demo/0".into(),
            title: "Report".into(),
            layout: json!({}),
        };
        let v = serde_json::to_value(&def).unwrap();
        assert_eq!(v["pageId"], "demo/0");
    }
}
