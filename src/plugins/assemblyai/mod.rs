//! AssemblyAI LeMUR nodes
//!
//! Each LeMUR node sends transcript ids plus node-specific parameters to one
//! LeMUR endpoint and maps the reply onto its output ports. The API key is
//! read from the processing context under [`API_KEY_CONFIG`].

pub mod action_items;
pub mod client;
pub mod collect_ids;
pub mod lemur;
pub mod question_answer;
pub mod summary;
pub mod task;

use std::sync::Arc;

pub use action_items::LemurActionItemsNode;
pub use client::{
    AssemblyAiClient, AssemblyAiConfig, LemurEndpoint, LemurRequest, LemurResponse, LemurService,
    API_KEY_CONFIG, BASE_URL_CONFIG,
};
pub use collect_ids::CollectTranscriptIdsNode;
pub use question_answer::LemurQuestionAnswerNode;
pub use summary::LemurSummaryNode;
pub use task::LemurTaskNode;

use crate::core::registry::{ConfigKind, Plugin, PluginConfigSpec};

pub const PLUGIN_ID: &str = "assemblyAi";

/// The AssemblyAI plugin, talking to the real API.
pub fn assemblyai_plugin() -> Plugin {
    assemblyai_plugin_with_service(Arc::new(AssemblyAiClient::new()))
}

/// The AssemblyAI plugin with every LeMUR node sharing `service`.
pub fn assemblyai_plugin_with_service(service: Arc<dyn LemurService>) -> Plugin {
    Plugin {
        id: PLUGIN_ID.to_string(),
        name: "AssemblyAI".to_string(),
        nodes: vec![
            action_items::lemur_action_items_node(service.clone()),
            summary::lemur_summary_node(service.clone()),
            task::lemur_task_node(service.clone()),
            question_answer::lemur_question_answer_node(service),
            collect_ids::collect_transcript_ids_node(),
        ],
        config_spec: vec![
            PluginConfigSpec {
                key: API_KEY_CONFIG.to_string(),
                kind: ConfigKind::Secret,
                label: "AssemblyAI API Key".to_string(),
                description: "The API key for the AssemblyAI service.".to_string(),
                env_var: Some("ASSEMBLYAI_API_KEY".to_string()),
            },
            PluginConfigSpec {
                key: BASE_URL_CONFIG.to_string(),
                kind: ConfigKind::String,
                label: "AssemblyAI Base URL".to_string(),
                description: "Overrides the AssemblyAI API host.".to_string(),
                env_var: Some("ASSEMBLYAI_BASE_URL".to_string()),
            },
        ],
    }
}
