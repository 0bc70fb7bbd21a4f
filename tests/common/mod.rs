#![allow(dead_code)]

//! In-memory fakes for the driver and layout seams.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use grev::driver::{Node, Page};
use grev::error::{GrevError, Result};
use grev::extract::{ExtractContext, Extracted};
use grev::layout::PageLayout;
use grev::params::SortBy;
use grev::record::{OverallRating, ReviewRecord};

/// A fake element tree. Selectors resolve against the `children` and
/// `child_lists` maps; anything missing resolves to an absent node whose
/// probes report false.
#[derive(Clone, Default)]
pub struct MockNode {
    pub text: Option<String>,
    pub texts: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub visible: bool,
    pub attached: bool,
    pub children: HashMap<String, MockNode>,
    pub child_lists: HashMap<String, Vec<MockNode>>,
}

impl MockNode {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            visible: true,
            attached: true,
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, node: MockNode) -> Self {
        self.children.insert(selector.to_string(), node);
        self
    }

    pub fn child_list(mut self, selector: &str, nodes: Vec<MockNode>) -> Self {
        self.child_lists.insert(selector.to_string(), nodes);
        self
    }
}

impl Node for MockNode {
    fn locate(&self, selector: &str) -> Result<Box<dyn Node>> {
        Ok(Box::new(
            self.children.get(selector).cloned().unwrap_or_default(),
        ))
    }

    fn locate_all(&self, selector: &str) -> Result<Vec<Box<dyn Node>>> {
        let nodes = self.child_lists.get(selector).cloned().unwrap_or_default();
        Ok(nodes
            .into_iter()
            .map(|n| Box::new(n) as Box<dyn Node>)
            .collect())
    }

    fn is_visible(&self, _timeout: Duration) -> bool {
        self.visible
    }

    fn is_attached(&self, _timeout: Duration) -> bool {
        self.attached
    }

    fn text(&self) -> Result<String> {
        self.text
            .clone()
            .ok_or_else(|| GrevError::Driver("absent node has no text".to_string()))
    }

    fn all_texts(&self) -> Result<Vec<String>> {
        Ok(self.texts.clone())
    }

    fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.attrs.get(name).cloned())
    }

    fn click(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

/// A page whose operations all succeed and locate nothing.
#[derive(Default)]
pub struct MockPage;

impl Page for MockPage {
    fn goto(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    fn locate(&self, _selector: &str) -> Result<Box<dyn Node>> {
        Ok(Box::new(MockNode::default()))
    }

    fn fill(&self, _selector: &str, _text: &str) -> Result<()> {
        Ok(())
    }

    fn press(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn scroll_by(&self, _dx: i64, _dy: i64) -> Result<()> {
        Ok(())
    }

    fn set_viewport(&self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn evaluate(&self, _script: &str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn sleep(&self, _duration: Duration) {}
}

/// What one scripted review slot yields when extracted.
#[derive(Clone)]
pub enum MockEntry {
    Record(ReviewRecord),
    Error,
    Stop,
}

/// A layout backed by scripted windows instead of a live page.
pub struct MockLayout {
    pub windows: Vec<Vec<MockEntry>>,
}

impl PageLayout for MockLayout {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn prepare(&self, _page: &dyn Page) -> Result<()> {
        Ok(())
    }

    fn overall_rating(&self, _page: &dyn Page, entity_name: &str) -> Result<OverallRating> {
        Ok(OverallRating {
            entity_name: entity_name.to_string(),
            ..Default::default()
        })
    }

    fn apply_sort(&self, _page: &dyn Page, _sort_by: SortBy) -> Result<()> {
        Ok(())
    }

    fn window_present(&self, _page: &dyn Page, idx: usize) -> bool {
        idx <= self.windows.len()
    }

    fn window_node(&self, _page: &dyn Page, idx: usize) -> Result<Box<dyn Node>> {
        // One "/5" per scripted entry, so the window reports the right count.
        let text = "/5".repeat(self.windows[idx - 1].len());
        Ok(Box::new(MockNode::with_text(&text)))
    }

    fn review_node(&self, _window: &dyn Node, _offset: usize) -> Result<Box<dyn Node>> {
        Ok(Box::new(MockNode::default()))
    }

    fn extract(&self, _node: &dyn Node, ctx: &ExtractContext) -> Result<Extracted> {
        match &self.windows[ctx.window_idx - 1][ctx.offset - 1] {
            MockEntry::Record(record) => Ok(Extracted::Record(Box::new(record.clone()))),
            MockEntry::Error => Err(GrevError::Extraction("scripted failure".to_string())),
            MockEntry::Stop => Ok(Extracted::StopCriterionMet),
        }
    }

    fn scroll_back(&self) -> i64 {
        -200
    }
}

pub fn record(username: &str) -> ReviewRecord {
    ReviewRecord {
        username: username.to_string(),
        posted_at_humanized: "2 weeks".to_string(),
        source_site: Some("Google".to_string()),
        rating_score: 4.0,
        rating_scale: 5.0,
        ..Default::default()
    }
}
