use crate::analysis::Analysis;

pub(super) fn render_text(analysis: &Analysis, show_links: bool) -> String {
    let implant = &analysis.implant;
    let mut output = format!("# {} {}\n", implant.manufacturer, implant.model);
    if let Some(lead) = &implant.lead {
        output.push_str(&format!("Lead: {lead}\n"));
    }
    if analysis.broadened {
        output.push_str("> Note: nothing found on manufacturer sites; results come from a broad web search.\n");
    }
    output.push('\n');

    if analysis.text.is_empty() {
        output.push_str("(The answer contained no confirmed information.)\n");
    } else {
        output.push_str(&analysis.text);
        output.push('\n');
    }

    if show_links {
        output.push_str(&format!("\n---\nSources searched ({}):\n", analysis.links.len()));
        for link in analysis.links.as_slice() {
            output.push_str(&format!("- {link}\n"));
        }
    }
    output
}

pub(super) fn render_json(analysis: &Analysis) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(analysis)
}
