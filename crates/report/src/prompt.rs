use crate::context::GroundedContext;
use crate::sections::SectionSpec;
use evidence::Provenance;

/// Builds the grounded prompt for one report section. The citation and
/// no-fabrication rules are identical for every section; only the task
/// line changes.
pub fn build_section_prompt(section: &SectionSpec, context: &GroundedContext) -> String {
    let sources = context
        .excerpts
        .iter()
        .map(|(id, text)| format!("Source[Prot:{id}]:\n{text}"))
        .collect::<Vec<_>>()
        .join("\n\n---\n");

    let precedents = if context.precedents.is_empty() {
        "(no registry precedents found)".to_string()
    } else {
        context.precedents.join("\n")
    };

    let synthetic_note = if context.provenance == Provenance::Synthetic {
        "\n- The evidence feed below is synthetic placeholder data; present its figures as illustrative assumptions, never as sourced findings."
    } else {
        ""
    };

    format!(
        r#"Write a CRO-grade, detailed paragraph for **{title}** (minimum ~250 words).
Requirements:
- Base all claims on the provided sources. Use inline citations: [Evidence] for the evidence feed, [CTGov NCTxxxxxxxx] for registry trials, [Prot:i] for protocol excerpts.
- Include concrete numbers when present (rates/site/month, screen fail %, timelines, cost deltas).
- If evidence is missing, state exactly what is missing (e.g., 'Unknown: historical rate/region for ...').
- Close with a succinct recommendation sentence.{synthetic_note}

EVIDENCE FEED ({provenance}, excerpts):
{evidence}

REGISTRY PRECEDENTS (abbreviated listing):
{precedents}

Now, use these protocol excerpts as primary grounding:
{sources}

Task:
{ask}

Format:
- Single paragraph (no bullets).
- 6-10 sentences minimum.
- Dense with specifics and citations.

Answer:"#,
        title = section.title,
        synthetic_note = synthetic_note,
        provenance = context.provenance,
        evidence = context.evidence,
        precedents = precedents,
        sources = sources,
        ask = section.ask,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(provenance: Provenance) -> GroundedContext {
        GroundedContext {
            excerpts: vec![
                (0, "Primary endpoint is HbA1c change at week 26.".to_string()),
                (4, "Participants attend 12 scheduled visits.".to_string()),
            ],
            evidence: ">>> tool output".to_string(),
            provenance,
            precedents: vec!["[CTGov NCT01234567] Trial | status=RECRUITING | phase=PHASE3".to_string()],
        }
    }

    #[test]
    fn prompt_carries_citation_contract_and_sources() {
        let section = SectionSpec { title: "Enrollment Forecast", ask: "Quantify enrollment." };
        let prompt = build_section_prompt(&section, &context(Provenance::PrimaryTool));

        assert!(prompt.contains("**Enrollment Forecast**"));
        assert!(prompt.contains("[Evidence] for the evidence feed"));
        assert!(prompt.contains("Source[Prot:0]:\nPrimary endpoint"));
        assert!(prompt.contains("Source[Prot:4]:\nParticipants attend"));
        assert!(prompt.contains("EVIDENCE FEED (primary-tool, excerpts):"));
        assert!(prompt.contains("[CTGov NCT01234567] Trial"));
        assert!(prompt.contains("Task:\nQuantify enrollment."));
        assert!(prompt.trim_end().ends_with("Answer:"));
        assert!(!prompt.contains("synthetic placeholder data"));
    }

    #[test]
    fn synthetic_provenance_adds_illustrative_warning() {
        let section = SectionSpec { title: "DSMB Plan", ask: "Define cadence." };
        let prompt = build_section_prompt(&section, &context(Provenance::Synthetic));

        assert!(prompt.contains("EVIDENCE FEED (synthetic, excerpts):"));
        assert!(prompt.contains("synthetic placeholder data"));
    }

    #[test]
    fn empty_precedents_render_placeholder() {
        let mut ctx = context(Provenance::ProgrammaticTool);
        ctx.precedents.clear();
        let section = SectionSpec { title: "Rescue Sites Plan", ask: "Plan rescues." };
        let prompt = build_section_prompt(&section, &ctx);

        assert!(prompt.contains("(no registry precedents found)"));
    }
}
