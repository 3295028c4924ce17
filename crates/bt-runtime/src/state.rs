use bt_core::{BtError, BtValue, Command, CommandKind, StateData};

use crate::expr::{evaluate, execute, parse_expression, parse_statements};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateStore {
    data: StateData,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: StateData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &StateData {
        &self.data
    }

    pub fn into_data(self) -> StateData {
        self.data
    }

    pub fn get(&self, key: &str) -> Option<&BtValue> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: BtValue) {
        self.data.insert(key.into(), value);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn apply_set_command(&mut self, statement: &str) -> Result<(), BtError> {
        let statements = parse_statements(statement)?;
        execute(&statements, &mut self.data)
    }

    pub fn apply_if_command(&self, expression: &str) -> Result<bool, BtError> {
        let expr = parse_expression(expression)?;
        Ok(evaluate(&expr, &self.data)?.is_truthy())
    }

    pub fn run_effect(&mut self, command: &Command) -> Result<(), BtError> {
        match (command.kind, command.parameter.as_deref()) {
            (CommandKind::Set, Some(statement)) => self.apply_set_command(statement),
            (CommandKind::Set, None) => Err(BtError::new(
                "EVAL_PARSE",
                "`set` command has no statement.",
            )),
            (kind, _) => Err(BtError::new(
                "EVAL_NOT_AN_EFFECT",
                format!("`{}` is not an effect command.", kind.as_word()),
            )),
        }
    }

    pub fn test_condition(&self, command: &Command) -> Result<bool, BtError> {
        match (command.kind, command.parameter.as_deref()) {
            (CommandKind::If, Some(expression)) => self.apply_if_command(expression),
            (CommandKind::If, None) => Err(BtError::new(
                "EVAL_PARSE",
                "`if` command has no condition.",
            )),
            (kind, _) => Err(BtError::new(
                "EVAL_NOT_A_CONDITION",
                format!("`{}` is not a condition command.", kind.as_word()),
            )),
        }
    }

    /// Records a visit to the line tagged `id`: `line.<id>` becomes true and
    /// `line.<id>.visits` counts up from 1.
    pub fn mark_visited(&mut self, id: &str) {
        self.data
            .insert(format!("line.{}", id), BtValue::Bool(true));
        let visits_key = format!("line.{}.visits", id);
        let visits = match self.data.get(&visits_key) {
            Some(BtValue::Number(count)) => count + 1.0,
            _ => 1.0,
        };
        self.data.insert(visits_key, BtValue::Number(visits));
    }
}
