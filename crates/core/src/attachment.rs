//! Attachment domain types — the per-kind context collections on a turn.
//!
//! `Attachments` is a fixed record keyed by kind, each value an ordered
//! collection of kind-specific items. Merge semantics live in the store
//! crate; this module only defines the shapes and their provenance tags.

use serde::{Deserialize, Serialize};

/// Provenance tag recording how an item entered the store.
///
/// Used only for conflict resolution during merges, never for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextInfoSource {
    /// Parsed out of the live editor selection or an @-mention.
    EditorMention,
    /// Explicitly attached by the user through a picker.
    UserPicked,
    /// Folded in from a tool-call result.
    ToolResult,
}

/// The fixed set of attachment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentKind {
    Files,
    Folders,
    Images,
    GitCommits,
    GitDiffs,
    GitPullRequests,
    Web,
    Docs,
    Code,
    Codebase,
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Files => "Files",
            Self::Folders => "Folders",
            Self::Images => "Images",
            Self::GitCommits => "GitCommits",
            Self::GitDiffs => "GitDiffs",
            Self::GitPullRequests => "GitPullRequests",
            Self::Web => "Web",
            Self::Docs => "Docs",
            Self::Code => "Code",
            Self::Codebase => "Codebase",
        };
        write!(f, "{name}")
    }
}

// --- Per-kind items ---

/// A file attached with its full body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub full_path: String,
    pub content: String,
    pub source: ContextInfoSource,
}

/// A folder reference (path only; contents are resolved lazily by the editor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderAttachment {
    pub full_path: String,
    pub source: ContextInfoSource,
}

/// An image referenced by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub url: String,
    pub source: ContextInfoSource,
}

/// A git commit reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommitAttachment {
    pub sha: String,
    pub message: String,
    pub source: ContextInfoSource,
}

/// One hunk of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffChunk {
    pub content: String,
}

/// A diff between two revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitDiffAttachment {
    pub from: String,
    pub to: String,
    pub chunks: Vec<DiffChunk>,
    pub source: ContextInfoSource,
}

impl GitDiffAttachment {
    /// Composite identity key: `from|to|concat(chunk.content)`.
    pub fn identity_key(&self) -> String {
        let body: String = self.chunks.iter().map(|c| c.content.as_str()).collect();
        format!("{}|{}|{}", self.from, self.to, body)
    }
}

/// A pull request reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitPullRequestAttachment {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub source: ContextInfoSource,
}

/// A single web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub source: ContextInfoSource,
}

/// A searchable documentation site on the Docs allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocSite {
    pub name: String,
    pub base_url: String,
    pub source: ContextInfoSource,
}

/// A single doc search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocResult {
    pub site: String,
    pub url: String,
    pub excerpt: String,
    pub source: ContextInfoSource,
}

/// A code snippet pinned by the user or a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeAttachment {
    pub relative_path: String,
    pub code: String,
    pub source: ContextInfoSource,
}

/// A codebase-retrieval hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodebaseHit {
    pub path: String,
    pub snippet: String,
    pub source: ContextInfoSource,
}

/// A source-scoped "enable tool" flag.
///
/// `override_by_source` force-disables toggles whose source matches the
/// active source; toggles set through other means survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolToggle {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ContextInfoSource>,
}

impl ToolToggle {
    /// An enabled toggle scoped to the given source.
    pub fn on(source: ContextInfoSource) -> Self {
        Self {
            enabled: true,
            source: Some(source),
        }
    }
}

/// Web search context: the enable flag plus accumulated results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebAttachment {
    pub tool: ToolToggle,
    pub results: Vec<WebResult>,
}

/// Doc search context: flag, site allow-list, and accumulated results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocsAttachment {
    pub tool: ToolToggle,
    pub sites: Vec<DocSite>,
    pub results: Vec<DocResult>,
}

/// Codebase retrieval context: flag plus accumulated hits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodebaseAttachment {
    pub tool: ToolToggle,
    pub hits: Vec<CodebaseHit>,
}

/// The per-kind attachment record on a conversation turn.
///
/// Created empty on turn creation, populated by merge operations while the
/// turn is current, frozen once the turn is sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attachments {
    pub files: Vec<FileAttachment>,
    pub folders: Vec<FolderAttachment>,
    pub images: Vec<ImageAttachment>,
    pub git_commits: Vec<GitCommitAttachment>,
    pub git_diffs: Vec<GitDiffAttachment>,
    pub git_pull_requests: Vec<GitPullRequestAttachment>,
    pub web: WebAttachment,
    pub docs: DocsAttachment,
    pub code: Vec<CodeAttachment>,
    pub codebase: CodebaseAttachment,
}

impl Attachments {
    /// True when no kind holds any item and no tool toggle is set.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
            && !self.web.tool.enabled
            && !self.docs.tool.enabled
            && !self.codebase.tool.enabled
    }

    /// Total number of items across all kinds.
    pub fn item_count(&self) -> usize {
        self.files.len()
            + self.folders.len()
            + self.images.len()
            + self.git_commits.len()
            + self.git_diffs.len()
            + self.git_pull_requests.len()
            + self.web.results.len()
            + self.docs.sites.len()
            + self.docs.results.len()
            + self.code.len()
            + self.codebase.hits.len()
    }
}

/// The tagged union of items accepted by the merge operations.
///
/// Each variant routes into its kind's collection; the three `*Tool`
/// variants set the corresponding enable flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum AttachmentItem {
    File(FileAttachment),
    Folder(FolderAttachment),
    Image(ImageAttachment),
    GitCommit(GitCommitAttachment),
    GitDiff(GitDiffAttachment),
    GitPullRequest(GitPullRequestAttachment),
    WebResult(WebResult),
    WebTool(ToolToggle),
    DocSite(DocSite),
    DocResult(DocResult),
    DocsTool(ToolToggle),
    Code(CodeAttachment),
    CodebaseHit(CodebaseHit),
    CodebaseTool(ToolToggle),
}

impl AttachmentItem {
    /// Which kind's collection this item belongs to.
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Self::File(_) => AttachmentKind::Files,
            Self::Folder(_) => AttachmentKind::Folders,
            Self::Image(_) => AttachmentKind::Images,
            Self::GitCommit(_) => AttachmentKind::GitCommits,
            Self::GitDiff(_) => AttachmentKind::GitDiffs,
            Self::GitPullRequest(_) => AttachmentKind::GitPullRequests,
            Self::WebResult(_) | Self::WebTool(_) => AttachmentKind::Web,
            Self::DocSite(_) | Self::DocResult(_) | Self::DocsTool(_) => AttachmentKind::Docs,
            Self::Code(_) => AttachmentKind::Code,
            Self::CodebaseHit(_) | Self::CodebaseTool(_) => AttachmentKind::Codebase,
        }
    }

    /// The provenance of this item, if it carries one.
    pub fn source(&self) -> Option<ContextInfoSource> {
        match self {
            Self::File(a) => Some(a.source),
            Self::Folder(a) => Some(a.source),
            Self::Image(a) => Some(a.source),
            Self::GitCommit(a) => Some(a.source),
            Self::GitDiff(a) => Some(a.source),
            Self::GitPullRequest(a) => Some(a.source),
            Self::WebResult(a) => Some(a.source),
            Self::DocSite(a) => Some(a.source),
            Self::DocResult(a) => Some(a.source),
            Self::Code(a) => Some(a.source),
            Self::CodebaseHit(a) => Some(a.source),
            Self::WebTool(t) | Self::DocsTool(t) | Self::CodebaseTool(t) => t.source,
        }
    }
}
