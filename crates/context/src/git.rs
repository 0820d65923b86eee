//! Git artifact processors: commits, diffs, pull requests.
//!
//! Diffs are the expensive one; historical turns render a one-line summary
//! per diff instead of the chunk bodies.

use codeloom_core::attachment::{AttachmentKind, Attachments};
use codeloom_core::content::ContentBlock;
use codeloom_core::turn::ConversationTurn;

use crate::processor::{ContextProcessor, RenderContext, push_section};

pub struct GitCommitsProcessor;

impl ContextProcessor for GitCommitsProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::GitCommits
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        _cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        if attachments.git_commits.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Git Commits]\n");
        for commit in &attachments.git_commits {
            section.push_str(&format!("- {} {}\n", commit.sha, commit.message));
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}

pub struct GitDiffsProcessor;

impl ContextProcessor for GitDiffsProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::GitDiffs
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        if attachments.git_diffs.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Git Diffs]\n");
        for diff in &attachments.git_diffs {
            if cx.is_last_turn {
                section.push_str(&format!("{}..{}:\n", diff.from, diff.to));
                for chunk in &diff.chunks {
                    section.push_str(&chunk.content);
                    section.push('\n');
                }
            } else {
                section.push_str(&format!(
                    "- {}..{} ({} chunks)\n",
                    diff.from,
                    diff.to,
                    diff.chunks.len()
                ));
            }
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}

pub struct GitPullRequestsProcessor;

impl ContextProcessor for GitPullRequestsProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::GitPullRequests
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        _cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        if attachments.git_pull_requests.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Pull Requests]\n");
        for pr in &attachments.git_pull_requests {
            section.push_str(&format!("- #{} {} ({})\n", pr.number, pr.title, pr.url));
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}
