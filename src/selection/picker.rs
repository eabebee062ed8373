//! Field picker state machine
//!
//! Interactive field selection modelled as a pure transition function
//! `(FieldPicker, PickerEvent) -> FieldPicker`, independent of any terminal library.
//! Items are ordered required first, relations last, then by label.

use std::ops::Range;

use super::Selection;
use crate::models::FieldSchema;

const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerItem {
    pub name: String,
    pub label: String,
    pub type_name: String,
    pub required: bool,
    pub relational: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerEvent {
    Up,
    Down,
    PageUp,
    PageDown,
    Toggle,
    SelectAll,
    SelectNone,
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerOutcome {
    Editing,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPicker {
    pub model: String,
    pub items: Vec<PickerItem>,
    pub cursor: usize,
    pub page_size: usize,
    pub outcome: PickerOutcome,
}

impl FieldPicker {
    /// Build the picker for `model`, preselecting its current field set (required fields always)
    pub fn new(model: &str, schema: &FieldSchema, selection: &Selection) -> Self {
        let current = selection.selected_fields(model);

        let mut items: Vec<PickerItem> = schema
            .iter()
            .map(|(name, field)| PickerItem {
                name: name.clone(),
                label: field.label_or(name).to_string(),
                type_name: field.type_name().to_string(),
                required: field.required,
                relational: field.is_relational(),
                selected: field.required || current.is_some_and(|c| c.contains(name)),
            })
            .collect();

        items.sort_by(|a, b| {
            (!a.required, a.relational, &a.label, &a.name).cmp(&(
                !b.required,
                b.relational,
                &b.label,
                &b.name,
            ))
        });

        Self {
            model: model.to_string(),
            items,
            cursor: 0,
            page_size: DEFAULT_PAGE_SIZE,
            outcome: PickerOutcome::Editing,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Apply one event. Events after confirm or cancel are ignored.
    pub fn apply(mut self, event: PickerEvent) -> Self {
        if self.outcome != PickerOutcome::Editing {
            return self;
        }
        let last = self.items.len().saturating_sub(1);

        match event {
            PickerEvent::Up => self.cursor = self.cursor.saturating_sub(1),
            PickerEvent::Down => self.cursor = (self.cursor + 1).min(last),
            PickerEvent::PageUp => self.cursor = self.cursor.saturating_sub(self.page_size),
            PickerEvent::PageDown => self.cursor = (self.cursor + self.page_size).min(last),
            PickerEvent::Toggle => {
                if let Some(item) = self.items.get_mut(self.cursor)
                    && !item.required
                {
                    item.selected = !item.selected;
                }
            }
            PickerEvent::SelectAll => self.items.iter_mut().for_each(|i| i.selected = true),
            PickerEvent::SelectNone => self
                .items
                .iter_mut()
                .for_each(|i| i.selected = i.required),
            PickerEvent::Confirm => self.outcome = PickerOutcome::Confirmed,
            PickerEvent::Cancel => self.outcome = PickerOutcome::Cancelled,
        }
        self
    }

    /// Apply a sequence of events
    pub fn apply_all(self, events: impl IntoIterator<Item = PickerEvent>) -> Self {
        events.into_iter().fold(self, Self::apply)
    }

    /// Index range of the page containing the cursor
    pub fn visible_range(&self) -> Range<usize> {
        let start = (self.cursor / self.page_size) * self.page_size;
        start..(start + self.page_size).min(self.items.len())
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.name.clone())
            .collect()
    }

    /// Write the picked fields into `selection` if the picker was confirmed
    pub fn commit(&self, selection: &mut Selection, schema: &FieldSchema) -> bool {
        if self.outcome != PickerOutcome::Confirmed {
            return false;
        }
        selection.set_fields(&self.model, self.selected_names(), schema);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, ScalarType};

    fn schema() -> FieldSchema {
        let mut fields = FieldSchema::new();
        fields.insert(
            "name".to_string(),
            Field::scalar(ScalarType::Char).with_label("Name").with_required(true),
        );
        fields.insert(
            "country_id".to_string(),
            Field::many2one("res.country").with_label("Country"),
        );
        fields.insert(
            "email".to_string(),
            Field::scalar(ScalarType::Char).with_label("Email"),
        );
        fields.insert(
            "city".to_string(),
            Field::scalar(ScalarType::Char).with_label("City"),
        );
        fields
    }

    #[test]
    fn test_items_ordered_required_first_relations_last() {
        let picker = FieldPicker::new("res.partner", &schema(), &Selection::new());
        let names: Vec<&str> = picker.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["name", "city", "email", "country_id"]);
        assert!(picker.items[0].selected);
    }

    #[test]
    fn test_toggle_and_confirm() {
        let schema = schema();
        let mut selection = Selection::new();
        let picker = FieldPicker::new("res.partner", &schema, &selection).apply_all([
            PickerEvent::Toggle,
            PickerEvent::Down,
            PickerEvent::Toggle,
            PickerEvent::Confirm,
        ]);

        assert_eq!(picker.outcome, PickerOutcome::Confirmed);
        assert!(picker.commit(&mut selection, &schema));
        let fields = selection.effective_fields("res.partner", &schema);
        assert_eq!(fields.len(), 2);
        assert!(fields.contains("name"));
        assert!(fields.contains("city"));
    }

    #[test]
    fn test_cancel_leaves_selection_untouched() {
        let schema = schema();
        let mut selection = Selection::new();
        let picker = FieldPicker::new("res.partner", &schema, &selection)
            .apply_all([PickerEvent::SelectAll, PickerEvent::Cancel, PickerEvent::Confirm]);

        assert_eq!(picker.outcome, PickerOutcome::Cancelled);
        assert!(!picker.commit(&mut selection, &schema));
        assert!(selection.selected_fields("res.partner").is_none());
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let picker = FieldPicker::new("res.partner", &schema(), &Selection::new())
            .with_page_size(3)
            .apply_all([PickerEvent::Up, PickerEvent::PageDown, PickerEvent::PageDown]);
        assert_eq!(picker.cursor, 3);
        assert_eq!(picker.visible_range(), 3..4);

        let picker = picker.apply(PickerEvent::SelectNone);
        assert_eq!(picker.selected_names(), vec!["name".to_string()]);
    }
}
