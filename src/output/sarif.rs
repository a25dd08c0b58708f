use crate::error::Result;
use crate::evidence::format_evidence;
use crate::finding::{PitfallFinding, RepositoryReport, Severity};
use crate::rules::{all_rules, Rule};
use serde_sarif::sarif::{
    ArtifactLocation, Location, Message, MultiformatMessageString, PhysicalLocation,
    ReportingDescriptor, Result as SarifResult, ResultLevel, Run, Sarif, Tool, ToolComponent,
};
use std::collections::HashMap;

pub fn format(report: &RepositoryReport) -> Result<String> {
    let triggered: Vec<&PitfallFinding> = report.triggered().collect();

    // Catalogue entries that produced results, in catalogue order.
    let used: Vec<&Rule> = all_rules()
        .iter()
        .filter(|r| triggered.iter().any(|f| f.code == r.code))
        .collect();

    let rule_index: HashMap<&str, i64> = used
        .iter()
        .enumerate()
        .map(|(i, r)| (r.code, i as i64))
        .collect();

    let rules: Vec<ReportingDescriptor> = used
        .iter()
        .map(|r| {
            let mut rule = ReportingDescriptor::builder().id(r.code.to_string()).build();
            rule.short_description = Some(
                MultiformatMessageString::builder()
                    .text(r.description.to_string())
                    .build(),
            );
            rule.help = Some(
                MultiformatMessageString::builder()
                    .text(r.suggestion.to_string())
                    .build(),
            );
            rule
        })
        .collect();

    let results: Vec<SarifResult> = triggered
        .iter()
        .map(|f| {
            let level = match f.severity {
                Severity::Pitfall => ResultLevel::Error,
                Severity::Warning => ResultLevel::Warning,
            };

            let mut result = SarifResult::builder()
                .message(Message::builder().text(format_evidence(f)).build())
                .build();

            result.rule_id = Some(f.code.clone());
            result.level = Some(level);
            result.rule_index = rule_index.get(f.code.as_str()).copied();

            if let Some(file) = f.detail_str("source_file") {
                let mut location = Location::builder().build();
                let mut physical = PhysicalLocation::builder().build();
                physical.artifact_location =
                    Some(ArtifactLocation::builder().uri(file.to_string()).build());
                location.physical_location = Some(physical);
                result.locations = Some(vec![location]);
            }

            result
        })
        .collect();

    let driver = ToolComponent::builder()
        .name("metacheck")
        .version(env!("CARGO_PKG_VERSION").to_string())
        .rules(rules)
        .build();

    let tool = Tool::builder().driver(driver).build();

    let run = Run::builder().tool(tool).results(results).build();

    let sarif = Sarif::builder().version("2.1.0").runs(vec![run]).build();

    Ok(serde_json::to_string_pretty(&sarif)?)
}
