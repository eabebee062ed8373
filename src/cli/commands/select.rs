//! Selection commands: choose models and the fields exported for them

use std::io::{BufRead, Write};

use super::Session;
use crate::cache::CacheOptions;
use crate::cli::error::CliError;
use crate::cli::output::format_selection;
use crate::selection::{FieldPicker, FieldToggle, PickerEvent, PickerOutcome};

/// Handle `select add`
pub fn handle_select_add(session: &mut Session, models: &[String]) -> Result<(), CliError> {
    let known = session.cache.model_names(CacheOptions::default());
    for model in models {
        if !known.contains(model) {
            return Err(CliError::ModelNotFound(model.clone()));
        }
        if session.selection.select_model(model, &known) {
            println!("✅ Selected {}", model);
        } else {
            println!("{} is already selected", model);
        }
    }
    session.save_selection()
}

/// Handle `select remove`
pub fn handle_select_remove(session: &mut Session, models: &[String]) -> Result<(), CliError> {
    for model in models {
        if session.selection.deselect_model(model) {
            println!("Removed {}", model);
        } else {
            println!("⚠️  {} was not selected", model);
        }
    }
    session.save_selection()
}

/// Handle `select clear`
pub fn handle_select_clear(session: &mut Session) -> Result<(), CliError> {
    session.selection.clear();
    println!("Selection cleared");
    session.save_selection()
}

/// Handle `select show`
pub fn handle_select_show(session: &Session) -> Result<(), CliError> {
    print!("{}", format_selection(&session.selection));
    Ok(())
}

/// What `select fields` should do with the model's field set
pub enum FieldsAction {
    Set(Vec<String>),
    Toggle(Vec<String>),
    All,
    None,
}

/// Handle `select fields`
pub fn handle_select_fields(
    session: &mut Session,
    model: &str,
    action: FieldsAction,
) -> Result<(), CliError> {
    session.require_model(model)?;
    let schema = session.cache.fields(model, CacheOptions::default());
    if schema.is_empty() {
        return Err(CliError::InvalidArgument(format!(
            "No field schema available for {}",
            model
        )));
    }

    match action {
        FieldsAction::Set(fields) => {
            if let Some(unknown) = fields.iter().find(|f| !schema.contains_key(*f)) {
                return Err(CliError::InvalidArgument(format!(
                    "{} has no field {}",
                    model, unknown
                )));
            }
            session.selection.set_fields(model, fields, &schema);
        }
        FieldsAction::Toggle(fields) => {
            for field in fields {
                match session.selection.toggle_field(model, &field, &schema) {
                    FieldToggle::Added => println!("+ {}", field),
                    FieldToggle::Removed => println!("- {}", field),
                    FieldToggle::RequiredKept => println!("! {} is required", field),
                }
            }
        }
        FieldsAction::All => session.selection.select_all_fields(model, &schema),
        FieldsAction::None => session.selection.select_no_fields(model, &schema),
    }
    session.selection.ensure_required_fields(model, &schema);

    let count = session
        .selection
        .selected_fields(model)
        .map_or(0, |fields| fields.len());
    println!("{} field(s) selected for {}", count, model);
    session.save_selection()
}

fn parse_key(line: &str) -> Option<PickerEvent> {
    match line.trim() {
        "k" | "up" => Some(PickerEvent::Up),
        "j" | "down" => Some(PickerEvent::Down),
        "u" | "pgup" => Some(PickerEvent::PageUp),
        "d" | "pgdn" => Some(PickerEvent::PageDown),
        "t" | "x" | "toggle" => Some(PickerEvent::Toggle),
        "a" | "all" => Some(PickerEvent::SelectAll),
        "n" | "none" => Some(PickerEvent::SelectNone),
        "" | "ok" => Some(PickerEvent::Confirm),
        "q" | "quit" => Some(PickerEvent::Cancel),
        _ => None,
    }
}

fn render_page(picker: &FieldPicker) -> String {
    let mut page = String::new();
    for index in picker.visible_range() {
        let item = &picker.items[index];
        page.push_str(&format!(
            "{} [{}] {} ({}, {}){}\n",
            if index == picker.cursor { ">" } else { " " },
            if item.selected { "x" } else { " " },
            item.label,
            item.name,
            item.type_name,
            if item.required { " *required" } else { "" },
        ));
    }
    page.push_str("j/k move, u/d page, t toggle, a all, n none, enter confirm, q cancel\n");
    page
}

/// Handle `select pick`: line-driven field picker on stdin
pub fn handle_select_pick(session: &mut Session, model: &str) -> Result<(), CliError> {
    session.require_model(model)?;
    let schema = session.cache.fields(model, CacheOptions::default());
    let mut picker = FieldPicker::new(model, &schema, &session.selection);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    while picker.outcome == PickerOutcome::Editing {
        print!("{}> ", render_page(&picker));
        std::io::stdout()
            .flush()
            .map_err(|e| CliError::InvalidArgument(format!("Failed to write prompt: {}", e)))?;

        let line = match lines.next() {
            Some(line) => line
                .map_err(|e| CliError::InvalidArgument(format!("Failed to read stdin: {}", e)))?,
            None => break,
        };
        match parse_key(&line) {
            Some(event) => picker = picker.apply(event),
            None => println!("Unknown key: {}", line.trim()),
        }
    }

    if picker.commit(&mut session.selection, &schema) {
        println!("{} field(s) selected for {}", picker.selected_names().len(), model);
        session.save_selection()
    } else {
        println!("Field selection cancelled");
        Ok(())
    }
}
