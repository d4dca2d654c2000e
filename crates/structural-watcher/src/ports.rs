//! Host DOM port.
//!
//! The watcher only needs a thin slice of the page's element API: reading a
//! control's label, walking a subtree, finding the enclosing form, attaching
//! click listeners, and a feed of structural changes.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::model::MutationRecord;

/// Identity of a live element. Only meaningful while the element is alive.
pub type ElementKey = usize;

/// Receives the element the listener was attached to.
pub type ClickListener<E> = Arc<dyn Fn(&E) + Send + Sync>;

pub trait WeakElement<E>: Send + Sync {
    fn upgrade(&self) -> Option<E>;
}

pub trait HostElement: Clone + Send + Sync + 'static {
    type Weak: WeakElement<Self>;

    fn key(&self) -> ElementKey;
    /// Handle that does not keep the element alive.
    fn downgrade(&self) -> Self::Weak;
    /// False for text and other non-element nodes.
    fn is_element(&self) -> bool;
    /// Lower-case tag name; empty for non-element nodes.
    fn tag_name(&self) -> String;
    fn attribute(&self, name: &str) -> Option<String>;
    fn value(&self) -> Option<String>;
    fn text_content(&self) -> String;
    /// This node followed by its element descendants, in document order.
    fn subtree(&self) -> Vec<Self>;
    /// Nearest inclusive ancestor with the given tag.
    fn closest(&self, tag: &str) -> Option<Self>;
    /// Submittable `(name, value)` pairs, as a form submission would send them.
    fn form_entries(&self) -> Vec<(String, String)>;
    fn add_click_listener(&self, listener: ClickListener<Self>, capture: bool);
}

pub trait HostDocument: Send + Sync + 'static {
    type Element: HostElement;

    /// Root of the observed subtree.
    fn body(&self) -> Self::Element;
    /// Subscribe to child-list changes anywhere under `body`.
    fn observe(&self) -> mpsc::UnboundedReceiver<Vec<MutationRecord<Self::Element>>>;
}
