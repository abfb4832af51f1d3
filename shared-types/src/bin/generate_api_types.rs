use shared_types::*;
use std::fs;
use std::path::PathBuf;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut types = Vec::new();

    // Record types
    types.push(clean_type(Record::export_to_string()?));
    types.push(clean_type(NameComponents::export_to_string()?));
    types.push(clean_type(RecordsResponse::export_to_string()?));

    // Duplicate types
    types.push(clean_type(MatchType::export_to_string()?));
    types.push(clean_type(DuplicateGroup::export_to_string()?));
    types.push(clean_type(DuplicateGroupsResponse::export_to_string()?));

    // Merge types
    types.push(clean_type(MergedValue::export_to_string()?));
    types.push(clean_type(MergePlan::export_to_string()?));

    // Quality types
    types.push(clean_type(IssueType::export_to_string()?));
    types.push(clean_type(Severity::export_to_string()?));
    types.push(clean_type(DataQualityIssue::export_to_string()?));
    types.push(clean_type(DataQualitySummary::export_to_string()?));

    // Action types
    types.push(clean_type(ActionKind::export_to_string()?));
    types.push(clean_type(HealthIssueAction::export_to_string()?));
    types.push(clean_type(BulkOutcome::export_to_string()?));
    types.push(clean_type(BulkFailure::export_to_string()?));

    // Undo types
    types.push(clean_type(UndoEffect::export_to_string()?));
    types.push(clean_type(StoreOp::export_to_string()?));

    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("api-types"));
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Everything lands in one file, so cross-type imports are dropped
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
