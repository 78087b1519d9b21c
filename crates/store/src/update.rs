use model::{ITEM_ID, Item};
use serde_json::Value;

/// Assignment of a single field to its new value.
///
/// Placeholders are positional so any field name can be expressed,
/// whatever characters it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssignment {
    pub field: String,
    pub name_placeholder: String,
    pub value_placeholder: String,
    pub value: Value,
}

/// A sparse patch of an item: the fields to set, in payload order.
///
/// The primary key is never part of an instruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateInstruction {
    assignments: Vec<FieldAssignment>,
}

impl UpdateInstruction {
    /// Build an instruction assigning every field of `fields` except the primary key.
    pub fn from_fields(fields: &Item) -> Self {
        let mut instruction: UpdateInstruction = UpdateInstruction::default();

        for (field, value) in fields.iter().filter(|(field, _)| field.as_str() != ITEM_ID) {
            instruction.assign(field, value.clone());
        }

        instruction
    }

    fn assign(&mut self, field: &str, value: Value) {
        let position: usize = self.assignments.len();

        self.assignments.push(FieldAssignment {
            field: field.to_string(),
            name_placeholder: format!("#f{position}"),
            value_placeholder: format!(":v{position}"),
            value,
        });
    }

    pub fn assignments(&self) -> &[FieldAssignment] {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Render as a `SET` expression, e.g. `SET #f0 = :v0, #f1 = :v1`.
    pub fn set_expression(&self) -> String {
        let clauses: Vec<String> = self
            .assignments
            .iter()
            .map(|assignment| {
                format!(
                    "{} = {}",
                    assignment.name_placeholder, assignment.value_placeholder
                )
            })
            .collect();

        format!("SET {}", clauses.join(", "))
    }

    /// Apply the assignments to an item in place.
    pub fn apply_to(&self, item: &mut Item) {
        for assignment in &self.assignments {
            item.insert(assignment.field.clone(), assignment.value.clone());
        }
    }
}
