//! In-memory element tree for tests and headless embedding.
//!
//! Nodes are reference counted. A child holds only a weak link to its parent,
//! so detaching a subtree and dropping the last handle frees it.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use crate::model::MutationRecord;
use crate::ports::{ClickListener, ElementKey, HostDocument, HostElement, WeakElement};

enum NodeKind {
    Element(String),
    Text(String),
}

struct Node {
    kind: NodeKind,
    attrs: RwLock<Vec<(String, String)>>,
    children: RwLock<Vec<MemoryElement>>,
    parent: RwLock<Weak<Node>>,
    listeners: RwLock<Vec<(ClickListener<MemoryElement>, bool)>>,
}

#[derive(Clone)]
pub struct MemoryElement {
    node: Arc<Node>,
}

pub struct MemoryWeak(Weak<Node>);

impl WeakElement<MemoryElement> for MemoryWeak {
    fn upgrade(&self) -> Option<MemoryElement> {
        self.0.upgrade().map(|node| MemoryElement { node })
    }
}

impl std::fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node.kind {
            NodeKind::Element(tag) => write!(f, "<{tag}>#{:x}", self.key()),
            NodeKind::Text(text) => write!(f, "{text:?}"),
        }
    }
}

impl PartialEq for MemoryElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for MemoryElement {}

impl MemoryElement {
    fn from_kind(kind: NodeKind) -> Self {
        Self {
            node: Arc::new(Node {
                kind,
                attrs: RwLock::new(Vec::new()),
                children: RwLock::new(Vec::new()),
                parent: RwLock::new(Weak::new()),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn element(tag: &str) -> Self {
        Self::from_kind(NodeKind::Element(tag.to_ascii_lowercase()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_kind(NodeKind::Text(text.into()))
    }

    pub fn with_attr(self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_value(self, value: impl Into<String>) -> Self {
        self.with_attr("value", value)
    }

    /// Appends a text child.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(MemoryElement::text(text))
    }

    /// Appends a child without notifying any document.
    pub fn with_child(self, child: MemoryElement) -> Self {
        self.attach(child);
        self
    }

    pub fn set_attr(&self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        let mut attrs = self.node.attrs.write();
        match attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => attrs.push((name, value)),
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn children(&self) -> Vec<MemoryElement> {
        self.node.children.read().clone()
    }

    pub fn parent(&self) -> Option<MemoryElement> {
        self.node.parent.read().upgrade().map(|node| MemoryElement { node })
    }

    pub fn listener_count(&self) -> usize {
        self.node.listeners.read().len()
    }

    /// Dispatch a click targeted at this element.
    ///
    /// Capture listeners run from the root down to the target, then bubble
    /// listeners from the target back up. No lock is held while a listener
    /// runs.
    pub fn click(&self) {
        let mut path = vec![self.clone()];
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            cursor = node.parent();
            path.push(node);
        }

        for node in path.iter().rev() {
            node.fire(|capture| capture);
        }
        for node in path.iter() {
            node.fire(|capture| !capture);
        }
    }

    fn fire(&self, select: impl Fn(bool) -> bool) {
        let listeners: Vec<_> = self
            .node
            .listeners
            .read()
            .iter()
            .filter(|(_, capture)| select(*capture))
            .map(|(listener, _)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(self);
        }
    }

    fn attach(&self, child: MemoryElement) {
        child.detach();
        *child.node.parent.write() = Arc::downgrade(&self.node);
        self.node.children.write().push(child);
    }

    fn detach(&self) {
        let parent = std::mem::take(&mut *self.node.parent.write());
        if let Some(parent) = parent.upgrade() {
            parent
                .children
                .write()
                .retain(|sibling| !Arc::ptr_eq(&sibling.node, &self.node));
        }
    }

    fn is_inclusive_descendant_of(&self, ancestor: &MemoryElement) -> bool {
        let mut cursor = Some(self.clone());
        while let Some(node) = cursor {
            if node == *ancestor {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    fn collect_elements(&self, out: &mut Vec<MemoryElement>) {
        if !self.is_element() {
            return;
        }
        out.push(self.clone());
        for child in self.children() {
            child.collect_elements(out);
        }
    }

    fn entry_for(&self) -> Vec<(String, String)> {
        let Some(name) = self.attribute("name").filter(|name| !name.is_empty()) else {
            return Vec::new();
        };
        if self.has_attr("disabled") {
            return Vec::new();
        }
        match self.tag_name().as_str() {
            "input" => {
                let kind = self
                    .attribute("type")
                    .map(|kind| kind.trim().to_ascii_lowercase())
                    .unwrap_or_else(|| "text".to_string());
                match kind.as_str() {
                    "submit" | "button" | "reset" | "image" | "file" => Vec::new(),
                    "checkbox" | "radio" => {
                        if self.has_attr("checked") {
                            let value = self.attribute("value").unwrap_or_else(|| "on".into());
                            vec![(name, value)]
                        } else {
                            Vec::new()
                        }
                    }
                    _ => vec![(name, self.attribute("value").unwrap_or_default())],
                }
            }
            "textarea" => {
                let value = self
                    .attribute("value")
                    .unwrap_or_else(|| self.text_content());
                vec![(name, value)]
            }
            "select" => {
                let options: Vec<_> = self
                    .subtree()
                    .into_iter()
                    .filter(|node| node.tag_name() == "option")
                    .collect();
                let mut selected: Vec<_> = options
                    .iter()
                    .filter(|option| option.has_attr("selected"))
                    .cloned()
                    .collect();
                if selected.is_empty() && !self.has_attr("multiple") {
                    selected.extend(options.first().cloned());
                }
                selected
                    .into_iter()
                    .map(|option| {
                        let value = option
                            .attribute("value")
                            .unwrap_or_else(|| option.text_content().trim().to_string());
                        (name.clone(), value)
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

impl HostElement for MemoryElement {
    type Weak = MemoryWeak;

    fn key(&self) -> ElementKey {
        Arc::as_ptr(&self.node) as ElementKey
    }

    fn downgrade(&self) -> MemoryWeak {
        MemoryWeak(Arc::downgrade(&self.node))
    }

    fn is_element(&self) -> bool {
        matches!(self.node.kind, NodeKind::Element(_))
    }

    fn tag_name(&self) -> String {
        match &self.node.kind {
            NodeKind::Element(tag) => tag.clone(),
            NodeKind::Text(_) => String::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.node
            .attrs
            .read()
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    }

    fn value(&self) -> Option<String> {
        match self.tag_name().as_str() {
            "input" | "button" | "option" | "textarea" => self.attribute("value"),
            _ => None,
        }
    }

    fn text_content(&self) -> String {
        match &self.node.kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element(_) => self
                .children()
                .iter()
                .map(|child| child.text_content())
                .collect(),
        }
    }

    fn subtree(&self) -> Vec<Self> {
        let mut out = Vec::new();
        self.collect_elements(&mut out);
        out
    }

    fn closest(&self, tag: &str) -> Option<Self> {
        let mut cursor = Some(self.clone());
        while let Some(node) = cursor {
            if node.is_element() && node.tag_name().eq_ignore_ascii_case(tag) {
                return Some(node);
            }
            cursor = node.parent();
        }
        None
    }

    fn form_entries(&self) -> Vec<(String, String)> {
        self.subtree()
            .iter()
            .skip(1)
            .flat_map(MemoryElement::entry_for)
            .collect()
    }

    fn add_click_listener(&self, listener: ClickListener<Self>, capture: bool) {
        self.node.listeners.write().push((listener, capture));
    }
}

type MutationSender = mpsc::UnboundedSender<Vec<MutationRecord<MemoryElement>>>;

/// Document whose `body` is the root of everything observers can see.
pub struct MemoryDocument {
    body: MemoryElement,
    observers: Mutex<Vec<MutationSender>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::with_body(MemoryElement::element("body"))
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(body: MemoryElement) -> Self {
        Self {
            body,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Insert `child` under `parent`, notifying observers when `parent` is
    /// part of the document.
    pub fn append(&self, parent: &MemoryElement, child: MemoryElement) {
        self.append_all(parent, vec![child]);
    }

    /// Insert several children as one structural change.
    pub fn append_all(&self, parent: &MemoryElement, children: Vec<MemoryElement>) {
        for child in &children {
            parent.attach(child.clone());
        }
        if self.is_connected(parent) && !children.is_empty() {
            self.notify(vec![MutationRecord {
                added_nodes: children,
            }]);
        }
    }

    /// Detach `child` from its parent. Removals are not reported.
    pub fn remove(&self, child: &MemoryElement) {
        child.detach();
    }

    pub fn is_connected(&self, node: &MemoryElement) -> bool {
        node.is_inclusive_descendant_of(&self.body)
    }

    pub fn observer_count(&self) -> usize {
        let mut observers = self.observers.lock();
        observers.retain(|tx| !tx.is_closed());
        observers.len()
    }

    /// Close every observation channel, as when the page unloads.
    pub fn disconnect_observers(&self) {
        self.observers.lock().clear();
    }

    fn notify(&self, records: Vec<MutationRecord<MemoryElement>>) {
        self.observers
            .lock()
            .retain(|tx| tx.send(records.clone()).is_ok());
    }
}

impl HostDocument for MemoryDocument {
    type Element = MemoryElement;

    fn body(&self) -> MemoryElement {
        self.body.clone()
    }

    fn observe(&self) -> mpsc::UnboundedReceiver<Vec<MutationRecord<MemoryElement>>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().push(tx);
        rx
    }
}
