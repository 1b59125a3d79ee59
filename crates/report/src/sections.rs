/// One report section: the heading plus the task instruction handed to the
/// generation backend. The grounding and citation rules are shared across
/// sections; only the ask varies.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub title: &'static str,
    pub ask: &'static str,
}

/// Every section of the operational report, in emission order.
pub const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        title: "Enrollment Forecast",
        ask: "Quantify total sites, startup lag, enrollment rate/site/month, screen fail %, and months to full enrollment; justify using the evidence feed and registry precedents; cite protocol constraints that influence rates.",
    },
    SectionSpec {
        title: "Enrollment Optimizations",
        ask: "Provide operational and I/E adjustments that increase accrual without compromising integrity; include pre-screening flows, referral networks, lab threshold tweaks, and digital outreach; quantify expected uplift.",
    },
    SectionSpec {
        title: "Inclusion/Exclusion Modifications",
        ask: "Recommend precise inclusion/exclusion edits linked to feasibility drivers; quantify likely accrual impact and safety tradeoffs.",
    },
    SectionSpec {
        title: "Screen Failure Reduction",
        ask: "Propose measures to reduce screen failure (central adjudication, run-in, lab re-tests) and estimate impact on randomization yield.",
    },
    SectionSpec {
        title: "Central Pre-Screening Pipeline",
        ask: "Design a central pre-screening pipeline with inclusion logic, ePRO capture, and referral handling; estimate throughput and hit rate.",
    },
    SectionSpec {
        title: "Site Selection & Regional Mix",
        ask: "Recommend site profiles/regions based on historic performance; propose initial allocation by region and ramp curve.",
    },
    SectionSpec {
        title: "Startup & Timeline",
        ask: "Lay out realistic milestones (FPI, 25%/50%, LPI, DB lock, CSR) with assumptions and gating risks; map to operational levers.",
    },
    SectionSpec {
        title: "Monitoring & SDV Strategy",
        ask: "Define on-site vs remote monitoring cadence with rationale and risk controls; include SDV strategy and cost impact.",
    },
    SectionSpec {
        title: "Central Labs & Diagnostics",
        ask: "Recommend central vs local labs, logistics/turnaround, reflex testing; quantify quality and cost effects.",
    },
    SectionSpec {
        title: "ePRO/eCOA Plan",
        ask: "Propose ePRO/eCOA plan including instrument schedule, reminders, compliance analytics; estimate data completeness gains.",
    },
    SectionSpec {
        title: "Decentralized Visits (DCT)",
        ask: "Define decentralized options (home nursing, tele-visits, mobile phlebotomy) and impact on retention/enrollment.",
    },
    SectionSpec {
        title: "IWRS/EDC Configuration",
        ask: "Optimize IWRS/EDC config (randomization blocks, kit buffers, edit checks) to reduce errors/stockouts/delays.",
    },
    SectionSpec {
        title: "Logistics & Courier Strategy",
        ask: "Plan courier/temperature lanes and weekend coverage to prevent visit cancellations; quantify avoided deviations.",
    },
    SectionSpec {
        title: "Drug Supply & Resupply",
        ask: "Design drug supply strategy (buffers, expiry, resupply rules) linked to ramp; compute risk to last-patient-in.",
    },
    SectionSpec {
        title: "Safety Monitoring",
        ask: "Detail safety monitoring schedule, lab triggers, SAE/AE flows; align with similar trials' event rates.",
    },
    SectionSpec {
        title: "DSMB Plan",
        ask: "Define DSMB cadence, stopping boundaries, unblinding safeguards; align with precedent trials.",
    },
    SectionSpec {
        title: "Risk Register & Mitigations",
        ask: "Enumerate top operational/statistical risks with mitigations tied to evidence; include backup vendors/sites.",
    },
    SectionSpec {
        title: "Protocol Simplification",
        ask: "Propose ways to simplify visits/procedures/forms while preserving endpoints; quantify staff time saved.",
    },
    SectionSpec {
        title: "Visit Schedule Optimization",
        ask: "Optimize visit windows/scheduling to reduce cancellations and burden; estimate retention improvement.",
    },
    SectionSpec {
        title: "Endpoint Clarity",
        ask: "Clarify endpoints/assessments to minimize ambiguity and deviations; cross-check with precedent measures.",
    },
    SectionSpec {
        title: "Statistical Power Assumptions",
        ask: "Discuss power assumptions based on historical variability and event rates; recommend adjustments.",
    },
    SectionSpec {
        title: "Sample Size Re-Estimation",
        ask: "Outline blinded sample-size re-estimation options and triggers; align with precedent feasibility.",
    },
    SectionSpec {
        title: "Rescue Sites Plan",
        ask: "Plan rescue sites activation criteria and rapid start-up playbook; estimate time saved to LPI.",
    },
    SectionSpec {
        title: "KOL Engagement",
        ask: "Propose KOL engagement and steering to boost screening/referrals and protocol adherence.",
    },
    SectionSpec {
        title: "Patient Advocacy & Outreach",
        ask: "Engage patient orgs for referral and retention; define materials and HIPAA-safe flows.",
    },
    SectionSpec {
        title: "Diversity & Inclusion Strategy",
        ask: "Diversity plan with region/site tactics, community partners, and metrics; tie to similar trials' demographics.",
    },
    SectionSpec {
        title: "Feasibility & Budgeting",
        ask: "Budget levers (bundled rates, pass-throughs), milestone-based payments; quantify % savings.",
    },
    SectionSpec {
        title: "Contracting & Start-up Acceleration",
        ask: "Accelerate startup via parallel submissions, template CDAs/CTAs, safety letters; estimate weeks saved.",
    },
    SectionSpec {
        title: "Regulatory Strategy",
        ask: "Regulatory engagement plan (scientific advice/pre-IND/type C), alignment with prior approvals; risk/benefit.",
    },
];
