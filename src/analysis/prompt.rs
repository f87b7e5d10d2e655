use super::engine::LookupRequest;
use crate::search::LinkSet;

/// Placeholder the model writes for fields it cannot source ("keine Angabe").
pub const NOT_AVAILABLE_MARKER: &str = "k.A.";

const NO_LINKS: &str = "Keine Links gefunden.";

const ANSWER_TEMPLATE: &str = "\
- MR-Status:
- Magnetfeldstärke:
- SAR-Werte:
  - Ganzkörper-SAR (W/kg):
  - Kopf-SAR (W/kg):
- B1+rms (µT):
- Max. Gradient (G/cm):
- Einschränkungen (Körperregionen/Positionierung/Scan-Modi):
- Vorbereitung (z. B. PM/ICD-Programmierung, Monitoring):
- Nachsorge:
- Quellen (URLs):";

/// Renders the German analysis prompt for one implant and its candidate sources.
pub fn build_prompt(request: &LookupRequest, links: &LinkSet) -> String {
    let links_block = if links.is_empty() {
        NO_LINKS.to_string()
    } else {
        links.as_slice().join("\n")
    };

    let subject = match &request.lead {
        Some(_) => "des folgenden Implantats und der zugehörigen Elektrode/Sonde",
        None => "des folgenden Implantats",
    };

    let mut identity = format!(
        "Hersteller: {}\nModell: {}",
        request.manufacturer, request.model
    );
    if let Some(lead) = &request.lead {
        identity.push_str(&format!("\nElektrode/Sonde: {lead}"));
    }

    format!(
        "Du bist ein medizinischer Assistent für bildgebende Diagnostik.
Analysiere die MR-Kompatibilität {subject} und antworte strukturiert in Deutsch.

{identity}

Nutze NUR validierte Informationen. Hier sind potenziell relevante Quellen:
{links_block}

Antworte im folgenden Format. Wenn eine Angabe nicht auffindbar ist, schreibe {NOT_AVAILABLE_MARKER}:

{ANSWER_TEMPLATE}

Wenn Informationen widersprüchlich oder nicht bestätigt sind, weise explizit darauf hin.
"
    )
}
