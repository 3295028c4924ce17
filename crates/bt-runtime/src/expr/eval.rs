use std::cmp::Ordering;

use bt_core::{BtError, BtValue, StateData};

use super::parser::{BinaryOp, Expr, Statement, UnaryOp};

pub fn evaluate(expr: &Expr, state: &StateData) -> Result<BtValue, BtError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Key(key) => Ok(state.get(key).cloned().unwrap_or_default()),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, state)?;
            match op {
                UnaryOp::Not => Ok(BtValue::Bool(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    BtValue::Number(number) => Ok(BtValue::Number(-number)),
                    other => Err(type_mismatch("-", &other, None)),
                },
            }
        }
        Expr::Binary { op, left, right } => match op {
            BinaryOp::Or => {
                let left = evaluate(left, state)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    evaluate(right, state)
                }
            }
            BinaryOp::And => {
                let left = evaluate(left, state)?;
                if left.is_truthy() {
                    evaluate(right, state)
                } else {
                    Ok(left)
                }
            }
            _ => {
                let left = evaluate(left, state)?;
                let right = evaluate(right, state)?;
                apply_binary(*op, left, right)
            }
        },
    }
}

/// Runs statements in order against `state`. Stops at the first failure;
/// earlier statements stay applied, callers wanting all-or-nothing pass a copy.
pub fn execute(statements: &[Statement], state: &mut StateData) -> Result<(), BtError> {
    for statement in statements {
        match statement {
            Statement::Assign { key, op, value } => {
                let value = evaluate(value, state)?;
                let next = match op {
                    None => value,
                    Some(op) => {
                        let current = state.get(key).cloned().unwrap_or_default();
                        apply_binary(*op, current, value)?
                    }
                };
                state.insert(key.clone(), next);
            }
            Statement::Step { key, delta } => {
                let next = match state.get(key) {
                    None | Some(BtValue::Null) => *delta,
                    Some(BtValue::Number(current)) => current + delta,
                    Some(other) => {
                        let symbol = if *delta > 0.0 { "++" } else { "--" };
                        return Err(type_mismatch(symbol, other, None));
                    }
                };
                state.insert(key.clone(), BtValue::Number(next));
            }
        }
    }
    Ok(())
}

fn apply_binary(op: BinaryOp, left: BtValue, right: BtValue) -> Result<BtValue, BtError> {
    match op {
        BinaryOp::Eq => Ok(BtValue::Bool(left == right)),
        BinaryOp::Ne => Ok(BtValue::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let Some(ordering) = compare(op, &left, &right)? else {
                return Ok(BtValue::Bool(false));
            };
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(BtValue::Bool(result))
        }
        BinaryOp::Add => match (&left, &right) {
            (BtValue::String(_), _) | (_, BtValue::String(_)) => {
                Ok(BtValue::String(format!("{}{}", left, right)))
            }
            _ => arithmetic(op, &left, &right),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, &left, &right)
        }
        BinaryOp::Or => Ok(if left.is_truthy() { left } else { right }),
        BinaryOp::And => Ok(if left.is_truthy() { right } else { left }),
    }
}

fn compare(op: BinaryOp, left: &BtValue, right: &BtValue) -> Result<Option<Ordering>, BtError> {
    match (left, right) {
        (BtValue::Null, _) | (_, BtValue::Null) => Ok(None),
        (BtValue::Number(left), BtValue::Number(right)) => Ok(left.partial_cmp(right)),
        (BtValue::String(left), BtValue::String(right)) => Ok(Some(left.cmp(right))),
        _ => Err(type_mismatch(symbol(op), left, Some(right))),
    }
}

fn arithmetic(op: BinaryOp, left: &BtValue, right: &BtValue) -> Result<BtValue, BtError> {
    let (Some(lhs), Some(rhs)) = (left.as_number(), right.as_number()) else {
        return Err(type_mismatch(symbol(op), left, Some(right)));
    };
    let value = match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::Mul => lhs * rhs,
        BinaryOp::Div | BinaryOp::Mod if rhs == 0.0 => {
            return Err(BtError::new(
                "EVAL_DIVISION_BY_ZERO",
                format!("Cannot apply \"{}\" with a zero divisor.", symbol(op)),
            ));
        }
        BinaryOp::Div => lhs / rhs,
        _ => lhs % rhs,
    };
    Ok(BtValue::Number(value))
}

fn type_mismatch(symbol: &str, left: &BtValue, right: Option<&BtValue>) -> BtError {
    let operands = match right {
        Some(right) => format!("{} and {}", left.type_name(), right.type_name()),
        None => left.type_name().to_string(),
    };
    BtError::new(
        "EVAL_TYPE_MISMATCH",
        format!("Operator \"{}\" cannot be applied to {}.", symbol, operands),
    )
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "||",
        BinaryOp::And => "&&",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
    }
}
