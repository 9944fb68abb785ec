//! Prompt assembly for the upstream model.

use crate::agents::AgentDescriptor;
use crate::model_client::PromptPart;

/// Agent-independent answer format. Appended after the payload.
pub const RESPONSE_SCHEMA_INSTRUCTION: &str = concat!(
    "Format your response as a JSON object with the following keys: ",
    "\"status\": (\"verified\", \"warning\", or \"danger\"), ",
    "\"title\": (a concise title), ",
    "\"confidence\": (a float between 0.0 and 100.0), ",
    "\"summary\": (a brief summary of the finding), ",
    "\"details\": (a list of objects, each with \"agent\", \"finding\", and \"status\": (\"success\" or \"fail\")), ",
    "\"explanation\": (a detailed explanation of the anomaly if status is 'warning' or 'danger', otherwise null), ",
    "\"remediation\": (suggested steps for remediation if status is 'warning' or 'danger', otherwise null), ",
    "\"liveness_score\": (a float between 0.0 and 1.0 indicating liveness, or null), ",
    "\"spoof_detection_result\": (a string indicating spoofing detection outcome, e.g., \"live\", \"spoof\", or null)."
);

/// Render an agent template. Placeholders are substituted in a single pass,
/// so braces inside `object_class` are never expanded. Unknown `{...}`
/// sequences are kept literally.
pub fn render_instruction(agent: &AgentDescriptor, object_class: &str, input_type: &str) -> String {
    let template = agent.prompt_template;
    let mut out = String::with_capacity(template.len() + object_class.len() + input_type.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        match &tail[1..end] {
            "object_class" => out.push_str(object_class),
            "input_type" => out.push_str(input_type),
            _ => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Model request parts in submission order: instruction, payload, schema.
pub fn assemble(instruction: String, payload: PromptPart) -> Vec<PromptPart> {
    vec![
        PromptPart::Text(instruction),
        payload,
        PromptPart::Text(RESPONSE_SCHEMA_INSTRUCTION.to_string()),
    ]
}
