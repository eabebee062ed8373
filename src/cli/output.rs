//! Output formatting for CLI

use crate::analysis::ModelAnalysis;
use crate::cache::CacheStats;
use crate::export::markdown::{pipe_table, yes_no};
use crate::models::{FieldSchema, ModelInfo, Record};
use crate::selection::Selection;

/// Model list with descriptions; `names` limits the rows when given
pub fn format_models(infos: &[ModelInfo], names: &[String], selection: &Selection) -> String {
    let rows: Vec<Vec<String>> = names
        .iter()
        .map(|name| {
            let info = infos.iter().find(|info| &info.model == name);
            vec![
                if selection.is_model_selected(name) { "*" } else { "" }.to_string(),
                name.clone(),
                info.and_then(|i| i.description.clone()).unwrap_or_default(),
                if info.is_some_and(|i| i.is_transient) { "transient" } else { "" }.to_string(),
            ]
        })
        .collect();

    let mut output = pipe_table(&["", "Model", "Description", "Kind"], &rows);
    output.push_str(&format!("\n\n{} model(s)\n", names.len()));
    output
}

/// Field table of one model, marking the fields the selection covers
pub fn format_fields(model: &str, fields: &FieldSchema, selection: &Selection) -> String {
    let wanted = selection.effective_fields(model, fields);
    let rows: Vec<Vec<String>> = fields
        .iter()
        .map(|(name, field)| {
            let field_type = match field.related_model() {
                Some(related) => format!("{} -> {}", field.type_name(), related),
                None => field.type_name().to_string(),
            };
            vec![
                if wanted.contains(name) { "*" } else { "" }.to_string(),
                name.clone(),
                field_type,
                field.label_or(name).to_string(),
                yes_no(field.required).to_string(),
                yes_no(field.readonly).to_string(),
            ]
        })
        .collect();

    let mut output = format!("Fields of {}:\n\n", model);
    output.push_str(&pipe_table(
        &["", "Field", "Type", "Label", "Required", "Readonly"],
        &rows,
    ));
    output.push('\n');
    output
}

pub fn format_analysis(analysis: &ModelAnalysis) -> String {
    let mut output = format!("\n📊 Analysis of {}\n", analysis.model);
    output.push_str(&format!("  Fields: {}\n", analysis.field_count));

    output.push_str("  Field types:\n");
    for (field_type, count) in &analysis.field_types {
        output.push_str(&format!("    {:<10} {}\n", field_type.as_str(), count));
    }

    if !analysis.required_fields.is_empty() {
        output.push_str(&format!(
            "  Required: {}\n",
            analysis.required_fields.join(", ")
        ));
    }
    if !analysis.common_fields.is_empty() {
        output.push_str(&format!("  Common: {}\n", analysis.common_fields.join(", ")));
    }
    if !analysis.computed_fields.is_empty() {
        output.push_str(&format!(
            "  Computed: {}\n",
            analysis.computed_fields.join(", ")
        ));
    }
    if !analysis.search_fields.is_empty() {
        output.push_str(&format!("  Searchable: {}\n", analysis.search_fields.join(", ")));
    }

    if analysis.relationships.is_empty() {
        output.push_str("  Relationships: none\n");
    } else {
        output.push_str(&format!(
            "  Relationships ({}):\n",
            analysis.relationships.len()
        ));
        for (kind, relationship) in analysis.relationships.iter() {
            output.push_str(&format!(
                "    {} {} -> {} ({})\n",
                kind, relationship.field, relationship.model, relationship.label
            ));
        }
    }

    output
}

pub fn format_record(model: &str, record: &Record) -> String {
    if record.is_empty() {
        return format!("⚠️  No sample record available for {}\n", model);
    }
    let body = serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string());
    format!("Sample record of {}:\n{}\n", model, body)
}

pub fn format_selection(selection: &Selection) -> String {
    if selection.is_empty() {
        return "No models selected\n".to_string();
    }

    let mut output = format!("Selected models ({}):\n", selection.model_count());
    for model in selection.selected_models() {
        match selection.selected_fields(model) {
            Some(fields) if !fields.is_empty() => {
                let names: Vec<&str> = fields.iter().map(String::as_str).collect();
                output.push_str(&format!("  - {} [{}]\n", model, names.join(", ")));
            }
            _ => output.push_str(&format!("  - {} [all fields]\n", model)),
        }
    }
    output
}

pub fn format_stats(stats: &CacheStats) -> String {
    format!(
        "Cache: {} remote fetch(es), {} disk hit(s), {} memory hit(s)\n",
        stats.remote_fetches, stats.disk_hits, stats.memory_hits
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_fields;
    use crate::models::{Field, ScalarType};

    fn schema() -> FieldSchema {
        let mut fields = FieldSchema::new();
        fields.insert(
            "name".to_string(),
            Field::scalar(ScalarType::Char).with_label("Name").with_required(true),
        );
        fields.insert("country_id".to_string(), Field::many2one("res.country"));
        fields
    }

    #[test]
    fn test_format_fields_marks_selection() {
        let mut selection = Selection::new();
        selection.set_fields("res.partner", ["name"], &schema());

        let output = format_fields("res.partner", &schema(), &selection);
        assert!(output.contains("| * | name"));
        assert!(output.contains("many2one -> res.country"));
    }

    #[test]
    fn test_format_analysis() {
        let output = format_analysis(&analyze_fields("res.partner", &schema()));
        assert!(output.contains("Fields: 2"));
        assert!(output.contains("many2one country_id -> res.country"));
        assert!(output.contains("Required: name"));
    }

    #[test]
    fn test_format_selection() {
        assert_eq!(format_selection(&Selection::new()), "No models selected\n");
    }
}
