//! The per-turn tool registry.
//!
//! Built fresh for every turn from the tool-capable processors; which tools
//! exist depends on which attachment kinds are present and enabled. Tool
//! names must be globally unique across kinds in one turn — a collision is a
//! configuration error, never a silent shadow.

use std::collections::HashMap;

use tracing::debug;

use codeloom_core::attachment::AttachmentKind;
use codeloom_core::error::OrchestrationError;
use codeloom_core::model::ToolDescriptor;
use codeloom_core::tool::ToolConfig;
use codeloom_core::turn::ConversationTurn;
use codeloom_context::ProcessorSet;

/// One registered tool: the owning kind plus its config.
#[derive(Debug)]
pub struct RegistryEntry {
    pub kind: AttachmentKind,
    pub config: ToolConfig,
}

/// Tools advertised for one turn.
#[derive(Debug)]
pub struct ToolRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl ToolRegistry {
    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    /// All descriptors, sorted by name for deterministic advertisement.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> = self
            .entries
            .values()
            .map(|e| e.config.descriptor.clone())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the registry for a turn from every tool-capable processor.
///
/// Fails fast on a duplicate name or a missing input schema — programmer
/// errors, not recoverable at runtime.
pub fn build_tool_registry(
    processors: &ProcessorSet,
    turn: &ConversationTurn,
) -> Result<ToolRegistry, OrchestrationError> {
    let configs = processors
        .tool_capable()
        .map(|p| (p.kind(), p.build_agent_tools(&turn.attachments)));
    let registry = collect_registry(configs)?;

    debug!(
        turn_id = %turn.id,
        tools = registry.len(),
        "Built tool registry"
    );
    Ok(registry)
}

pub(crate) fn collect_registry(
    configs: impl Iterator<Item = (AttachmentKind, Vec<ToolConfig>)>,
) -> Result<ToolRegistry, OrchestrationError> {
    let mut entries: HashMap<String, RegistryEntry> = HashMap::new();
    for (kind, tools) in configs {
        for config in tools {
            let name = config.descriptor.name.clone();
            if config.descriptor.input_schema.is_null() {
                return Err(OrchestrationError::MissingSchema { name });
            }
            if let Some(existing) = entries.get(&name) {
                return Err(OrchestrationError::DuplicateToolName {
                    name,
                    first_kind: existing.kind.to_string(),
                    second_kind: kind.to_string(),
                });
            }
            entries.insert(name, RegistryEntry { kind, config });
        }
    }
    Ok(ToolRegistry { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use codeloom_core::attachment::{Attachments, ContextInfoSource, DocSite, ToolToggle};
    use codeloom_core::tool::boxed_callback;
    use codeloom_context::{DOCS_TOOL_NAME, RetrievalBackends, WEB_TOOL_NAME};

    fn test_config(name: &str) -> ToolConfig {
        ToolConfig::new(
            ToolDescriptor {
                name: name.into(),
                description: "test".into(),
                input_schema: serde_json::json!({"type": "object"}),
            },
            boxed_callback(|_, _| async { Ok(serde_json::Value::Null) }),
            Arc::new(|_, current| Ok(current.clone())),
        )
    }

    #[test]
    fn web_on_docs_off_registers_exactly_one_tool() {
        let processors = ProcessorSet::new(RetrievalBackends::noop());
        let mut attachments = Attachments::default();
        attachments.web.tool = ToolToggle::on(ContextInfoSource::UserPicked);
        attachments.docs.sites.push(DocSite {
            name: "rustdoc".into(),
            base_url: "https://doc.rust-lang.org".into(),
            source: ContextInfoSource::UserPicked,
        });
        // docs toggle stays off
        let turn = ConversationTurn::human("q").with_attachments(attachments);

        let registry = build_tool_registry(&processors, &turn).unwrap();
        assert_eq!(registry.names(), vec![WEB_TOOL_NAME]);
    }

    #[test]
    fn all_toggles_on_registers_three_tools() {
        let processors = ProcessorSet::new(RetrievalBackends::noop());
        let mut attachments = Attachments::default();
        attachments.web.tool = ToolToggle::on(ContextInfoSource::UserPicked);
        attachments.docs.tool = ToolToggle::on(ContextInfoSource::UserPicked);
        attachments.docs.sites.push(DocSite {
            name: "rustdoc".into(),
            base_url: "https://doc.rust-lang.org".into(),
            source: ContextInfoSource::UserPicked,
        });
        attachments.codebase.tool = ToolToggle::on(ContextInfoSource::UserPicked);
        let turn = ConversationTurn::human("q").with_attachments(attachments);

        let registry = build_tool_registry(&processors, &turn).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.get(DOCS_TOOL_NAME).is_some());
    }

    #[test]
    fn empty_turn_registers_no_tools() {
        let processors = ProcessorSet::new(RetrievalBackends::noop());
        let turn = ConversationTurn::human("q");
        let registry = build_tool_registry(&processors, &turn).unwrap();
        assert!(registry.is_empty());
        assert!(registry.descriptors().is_empty());
    }

    #[test]
    fn duplicate_name_is_a_configuration_error() {
        let configs = vec![
            (AttachmentKind::Web, vec![test_config("search")]),
            (AttachmentKind::Docs, vec![test_config("search")]),
        ];
        let err = collect_registry(configs.into_iter()).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::DuplicateToolName { ref name, .. } if name == "search"
        ));
    }

    #[test]
    fn null_schema_is_a_configuration_error() {
        let mut config = test_config("bad");
        config.descriptor.input_schema = serde_json::Value::Null;
        let err =
            collect_registry(vec![(AttachmentKind::Web, vec![config])].into_iter()).unwrap_err();
        assert!(matches!(err, OrchestrationError::MissingSchema { .. }));
    }

    #[test]
    fn descriptors_are_sorted_by_name() {
        let configs = vec![(
            AttachmentKind::Web,
            vec![test_config("zeta"), test_config("alpha")],
        )];
        let registry = collect_registry(configs.into_iter()).unwrap();
        let names: Vec<String> = registry.descriptors().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
