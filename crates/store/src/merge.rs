//! The merge algorithm: pure, idempotent operations over an `Attachments`
//! value.
//!
//! Items arrive from multiple uncoordinated sources (editor mention parsing,
//! explicit user picks, tool results) and are merged without duplication.
//! Within one kind no two items share an identity key; on a collision a
//! priority function chooses the winner. All operations return a new value —
//! the input is never mutated.

use std::collections::HashSet;

use codeloom_core::attachment::{
    AttachmentItem, Attachments, CodeAttachment, CodebaseHit, ContextInfoSource, DocResult,
    DocSite, FileAttachment, FolderAttachment, GitCommitAttachment, GitDiffAttachment,
    GitPullRequestAttachment, ImageAttachment, ToolToggle, WebResult,
};

/// Conflict-resolution policy for identity-key collisions.
///
/// Entries whose source is in the de-prioritized set lose to any other
/// entry. Used so tool-derived or explicitly-picked items are not silently
/// evicted by transient editor-derived mentions.
#[derive(Debug, Clone, Default)]
pub struct MergePriority {
    deprioritized: HashSet<ContextInfoSource>,
}

impl MergePriority {
    /// A policy with no de-prioritized sources (incumbent always wins ties).
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a source to the de-prioritized set.
    pub fn deprioritize(mut self, source: ContextInfoSource) -> Self {
        self.deprioritized.insert(source);
        self
    }

    /// Whether `source` is in the de-prioritized set.
    pub fn is_deprioritized(&self, source: ContextInfoSource) -> bool {
        self.deprioritized.contains(&source)
    }

    /// Collision rule: the incoming item replaces the incumbent only when
    /// the incumbent is de-prioritized and the incoming item is not.
    /// Ties keep the incumbent, regardless of argument order.
    fn incoming_wins(&self, incumbent: ContextInfoSource, incoming: ContextInfoSource) -> bool {
        self.is_deprioritized(incumbent) && !self.is_deprioritized(incoming)
    }
}

/// Identity key + provenance for one kind's items.
///
/// The key determines dedup survivorship; the source feeds the priority
/// function. Composite keys join their parts with a NUL byte so that
/// `("a", "bc")` and `("ab", "c")` never collide.
pub(crate) trait Keyed {
    fn key(&self) -> String;
    fn source(&self) -> ContextInfoSource;
}

impl Keyed for FileAttachment {
    fn key(&self) -> String {
        self.full_path.clone()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for FolderAttachment {
    fn key(&self) -> String {
        self.full_path.clone()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for ImageAttachment {
    fn key(&self) -> String {
        self.url.clone()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for GitCommitAttachment {
    fn key(&self) -> String {
        self.sha.clone()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for GitDiffAttachment {
    fn key(&self) -> String {
        self.identity_key()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for GitPullRequestAttachment {
    fn key(&self) -> String {
        self.number.to_string()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for WebResult {
    fn key(&self) -> String {
        self.url.clone()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for DocSite {
    fn key(&self) -> String {
        self.name.clone()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for DocResult {
    fn key(&self) -> String {
        self.url.clone()
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for CodeAttachment {
    fn key(&self) -> String {
        format!("{}\u{0}{}", self.relative_path, self.code)
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

impl Keyed for CodebaseHit {
    fn key(&self) -> String {
        format!("{}\u{0}{}", self.path, self.snippet)
    }
    fn source(&self) -> ContextInfoSource {
        self.source
    }
}

/// Merge one item into a kind's collection under the dedup + priority rule.
///
/// A new key appends; a colliding key replaces the incumbent in place only
/// when the priority function says so, preserving the incumbent's position.
fn merge_into<T: Keyed + Clone>(collection: &mut Vec<T>, incoming: &T, priority: &MergePriority) {
    match collection.iter_mut().find(|e| e.key() == incoming.key()) {
        Some(existing) => {
            if priority.incoming_wins(existing.source(), incoming.source()) {
                *existing = incoming.clone();
            }
        }
        None => collection.push(incoming.clone()),
    }
}

/// Remove every entry sharing the item's identity key.
fn remove_keyed<T: Keyed>(collection: &mut Vec<T>, item: &T) {
    let key = item.key();
    collection.retain(|e| e.key() != key);
}

/// Setting a toggle overwrites flag and source; flags are not keyed items.
fn apply_toggle(slot: &mut ToolToggle, toggle: ToolToggle) {
    *slot = toggle;
}

/// Append each new item into its kind's collection, then deduplicate that
/// kind by identity key with `priority` resolving collisions.
///
/// Pure and idempotent: `add_items(add_items(a, x), x) == add_items(a, x)`,
/// and the surviving set does not depend on the order of `new_items`.
pub fn add_items(
    current: &Attachments,
    new_items: &[AttachmentItem],
    priority: &MergePriority,
) -> Attachments {
    let mut next = current.clone();
    for item in new_items {
        match item {
            AttachmentItem::File(a) => merge_into(&mut next.files, a, priority),
            AttachmentItem::Folder(a) => merge_into(&mut next.folders, a, priority),
            AttachmentItem::Image(a) => merge_into(&mut next.images, a, priority),
            AttachmentItem::GitCommit(a) => merge_into(&mut next.git_commits, a, priority),
            AttachmentItem::GitDiff(a) => merge_into(&mut next.git_diffs, a, priority),
            AttachmentItem::GitPullRequest(a) => {
                merge_into(&mut next.git_pull_requests, a, priority)
            }
            AttachmentItem::WebResult(a) => merge_into(&mut next.web.results, a, priority),
            AttachmentItem::WebTool(t) => apply_toggle(&mut next.web.tool, *t),
            AttachmentItem::DocSite(a) => merge_into(&mut next.docs.sites, a, priority),
            AttachmentItem::DocResult(a) => merge_into(&mut next.docs.results, a, priority),
            AttachmentItem::DocsTool(t) => apply_toggle(&mut next.docs.tool, *t),
            AttachmentItem::Code(a) => merge_into(&mut next.code, a, priority),
            AttachmentItem::CodebaseHit(a) => merge_into(&mut next.codebase.hits, a, priority),
            AttachmentItem::CodebaseTool(t) => apply_toggle(&mut next.codebase.tool, *t),
        }
    }
    next
}

/// Remove items by identity key, independent per kind.
///
/// A `*Tool` variant clears the corresponding enable flag.
pub fn remove_items(current: &Attachments, items: &[AttachmentItem]) -> Attachments {
    let mut next = current.clone();
    for item in items {
        match item {
            AttachmentItem::File(a) => remove_keyed(&mut next.files, a),
            AttachmentItem::Folder(a) => remove_keyed(&mut next.folders, a),
            AttachmentItem::Image(a) => remove_keyed(&mut next.images, a),
            AttachmentItem::GitCommit(a) => remove_keyed(&mut next.git_commits, a),
            AttachmentItem::GitDiff(a) => remove_keyed(&mut next.git_diffs, a),
            AttachmentItem::GitPullRequest(a) => remove_keyed(&mut next.git_pull_requests, a),
            AttachmentItem::WebResult(a) => remove_keyed(&mut next.web.results, a),
            AttachmentItem::WebTool(_) => next.web.tool = ToolToggle::default(),
            AttachmentItem::DocSite(a) => remove_keyed(&mut next.docs.sites, a),
            AttachmentItem::DocResult(a) => remove_keyed(&mut next.docs.results, a),
            AttachmentItem::DocsTool(_) => next.docs.tool = ToolToggle::default(),
            AttachmentItem::Code(a) => remove_keyed(&mut next.code, a),
            AttachmentItem::CodebaseHit(a) => remove_keyed(&mut next.codebase.hits, a),
            AttachmentItem::CodebaseTool(_) => next.codebase.tool = ToolToggle::default(),
        }
    }
    next
}

/// Replace everything the active source produced, keep everything else.
///
/// First strips every item whose `source == active` from every kind and
/// force-disables tool toggles scoped to that source, then adds `new_items`
/// with `active` de-prioritized so re-parsed mentions cannot evict items
/// attached through other means.
pub fn override_by_source(
    active: ContextInfoSource,
    current: &Attachments,
    new_items: &[AttachmentItem],
) -> Attachments {
    let mut stripped = current.clone();
    strip_source(&mut stripped, active);

    let priority = MergePriority::none().deprioritize(active);
    add_items(&stripped, new_items, &priority)
}

fn strip_source(attachments: &mut Attachments, source: ContextInfoSource) {
    attachments.files.retain(|a| a.source != source);
    attachments.folders.retain(|a| a.source != source);
    attachments.images.retain(|a| a.source != source);
    attachments.git_commits.retain(|a| a.source != source);
    attachments.git_diffs.retain(|a| a.source != source);
    attachments.git_pull_requests.retain(|a| a.source != source);
    attachments.web.results.retain(|a| a.source != source);
    attachments.docs.sites.retain(|a| a.source != source);
    attachments.docs.results.retain(|a| a.source != source);
    attachments.code.retain(|a| a.source != source);
    attachments.codebase.hits.retain(|a| a.source != source);

    if attachments.web.tool.source == Some(source) {
        attachments.web.tool = ToolToggle::default();
    }
    if attachments.docs.tool.source == Some(source) {
        attachments.docs.tool = ToolToggle::default();
    }
    if attachments.codebase.tool.source == Some(source) {
        attachments.codebase.tool = ToolToggle::default();
    }
}
