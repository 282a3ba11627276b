//! Style expression evaluation.
//!
//! Technique fields may hold JSON array expressions such as
//! `["interpolate", ["linear"], ["zoom"], 10, 1, 16, 4]`. Evaluation is pure.
//! A missing attribute or a type gap yields `Ok(None)`; an unknown operator
//! or a wrong argument count is a `MalformedExpression` error.
//!
//! Supported operators:
//! - Lookup: `get`, `has`, `zoom`, `geometry-type`, `literal`
//! - Branching: `match`, `case`, `coalesce`, `step`, `interpolate`
//! - Comparison: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - Logic: `all`, `any`, `!`
//! - Math: `+`, `-`, `*`, `/`, `%`, `^`, `abs`, `floor`, `ceil`, `round`,
//!   `sqrt`, `min`, `max`
//! - Conversion: `to-number`, `to-string`, `to-boolean`, `concat`,
//!   `upcase`, `downcase`, `rgb`, `rgba`

use serde_json::{Map, Number, Value};

use crate::error::{LabelError, LabelResult};
use crate::style::types::{parse_color_string, StyleValue};

/// Evaluation environment bound to one feature occurrence.
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    /// Feature attributes.
    pub properties: &'a Map<String, Value>,
    /// Current zoom level.
    pub zoom: f64,
    /// Geometry type (optional).
    pub geometry_type: Option<&'a str>,
}

impl<'a> Env<'a> {
    pub fn new(properties: &'a Map<String, Value>, zoom: f64) -> Self {
        Self {
            properties,
            zoom,
            geometry_type: None,
        }
    }

    pub fn with_geometry_type(mut self, geometry_type: &'a str) -> Self {
        self.geometry_type = Some(geometry_type);
        self
    }
}

/// Resolves a technique field against an environment.
///
/// The typed helpers treat `null` results as unset and reject defined values
/// of the wrong type.
pub trait ExpressionResolver: Send + Sync {
    /// Resolve a field value. `Ok(None)` means "no value in this environment".
    fn resolve(&self, value: &StyleValue, env: &Env<'_>) -> LabelResult<Option<Value>>;

    /// Resolve an optional field to a number.
    fn resolve_number(
        &self,
        field: &'static str,
        value: Option<&StyleValue>,
        env: &Env<'_>,
    ) -> LabelResult<Option<f64>> {
        let Some(value) = value else {
            return Ok(None);
        };
        match self.resolve(value, env)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(LabelError::invalid(field, "number", other)),
        }
    }

    /// Resolve an optional field to a boolean.
    fn resolve_bool(
        &self,
        field: &'static str,
        value: Option<&StyleValue>,
        env: &Env<'_>,
    ) -> LabelResult<Option<bool>> {
        let Some(value) = value else {
            return Ok(None);
        };
        match self.resolve(value, env)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(LabelError::invalid(field, "boolean", other)),
        }
    }

    /// Resolve an optional field to any non-null JSON value.
    fn resolve_value(
        &self,
        value: Option<&StyleValue>,
        env: &Env<'_>,
    ) -> LabelResult<Option<Value>> {
        let Some(value) = value else {
            return Ok(None);
        };
        Ok(self.resolve(value, env)?.filter(|v| !v.is_null()))
    }
}

/// Default resolver backed by [`evaluate_expression`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleExpressionResolver;

impl ExpressionResolver for StyleExpressionResolver {
    fn resolve(&self, value: &StyleValue, env: &Env<'_>) -> LabelResult<Option<Value>> {
        match value {
            StyleValue::Expression(expr) => evaluate_expression(expr, env),
            literal => Ok(Some(literal.to_json())),
        }
    }
}

/// Evaluate a JSON expression.
pub fn evaluate_expression(expr: &Value, env: &Env<'_>) -> LabelResult<Option<Value>> {
    match expr {
        Value::Null => Ok(None),
        Value::Array(arr) => evaluate_array_expression(arr, env),
        other => Ok(Some(other.clone())),
    }
}

fn evaluate_array_expression(arr: &[Value], env: &Env<'_>) -> LabelResult<Option<Value>> {
    let Some((head, args)) = arr.split_first() else {
        return Err(LabelError::malformed("empty expression"));
    };
    // Arrays that do not start with an operator name are literal arrays.
    let Some(op) = head.as_str() else {
        return Ok(Some(Value::Array(arr.to_vec())));
    };

    match op {
        "get" => {
            arity(op, args, 1, Some(1))?;
            let key = args[0]
                .as_str()
                .ok_or_else(|| LabelError::malformed("`get` expects a string key"))?;
            Ok(env.properties.get(key).filter(|v| !v.is_null()).cloned())
        }
        "has" => {
            arity(op, args, 1, Some(1))?;
            let key = args[0]
                .as_str()
                .ok_or_else(|| LabelError::malformed("`has` expects a string key"))?;
            Ok(Some(Value::Bool(env.properties.contains_key(key))))
        }
        "zoom" => {
            arity(op, args, 0, Some(0))?;
            Ok(number(env.zoom))
        }
        "geometry-type" => {
            arity(op, args, 0, Some(0))?;
            Ok(env.geometry_type.map(|s| Value::String(s.to_string())))
        }
        "literal" => {
            arity(op, args, 1, Some(1))?;
            Ok(Some(args[0].clone()))
        }

        "match" => eval_match(args, env),
        "case" => eval_case(args, env),
        "coalesce" => {
            arity(op, args, 1, None)?;
            for expr in args {
                if let Some(v) = evaluate_expression(expr, env)?.filter(|v| !v.is_null()) {
                    return Ok(Some(v));
                }
            }
            Ok(None)
        }
        "step" => eval_step(args, env),
        "interpolate" => eval_interpolate(args, env),

        "==" | "!=" => {
            arity(op, args, 2, Some(2))?;
            let a = evaluate_expression(&args[0], env)?.unwrap_or(Value::Null);
            let b = evaluate_expression(&args[1], env)?.unwrap_or(Value::Null);
            let equal = values_equal(&a, &b);
            Ok(Some(Value::Bool(if op == "==" { equal } else { !equal })))
        }
        "<" | "<=" | ">" | ">=" => {
            arity(op, args, 2, Some(2))?;
            let (Some(a), Some(b)) = (num_arg(args, 0, env)?, num_arg(args, 1, env)?) else {
                return Ok(None);
            };
            let result = match op {
                "<" => a < b,
                "<=" => a <= b,
                ">" => a > b,
                _ => a >= b,
            };
            Ok(Some(Value::Bool(result)))
        }

        "all" => {
            for expr in args {
                if !truthy(evaluate_expression(expr, env)?.as_ref()) {
                    return Ok(Some(Value::Bool(false)));
                }
            }
            Ok(Some(Value::Bool(true)))
        }
        "any" => {
            for expr in args {
                if truthy(evaluate_expression(expr, env)?.as_ref()) {
                    return Ok(Some(Value::Bool(true)));
                }
            }
            Ok(Some(Value::Bool(false)))
        }
        "!" => {
            arity(op, args, 1, Some(1))?;
            let value = evaluate_expression(&args[0], env)?;
            Ok(Some(Value::Bool(!truthy(value.as_ref()))))
        }

        "+" | "*" | "min" | "max" => {
            arity(op, args, 1, None)?;
            let mut values = Vec::with_capacity(args.len());
            for i in 0..args.len() {
                let Some(v) = num_arg(args, i, env)? else {
                    return Ok(None);
                };
                values.push(v);
            }
            let result: f64 = match op {
                "+" => values.iter().sum(),
                "*" => values.iter().product(),
                "min" => values.iter().copied().fold(f64::INFINITY, f64::min),
                _ => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            };
            Ok(number(result))
        }
        "-" => {
            arity(op, args, 1, Some(2))?;
            let Some(a) = num_arg(args, 0, env)? else {
                return Ok(None);
            };
            if args.len() == 1 {
                return Ok(number(-a));
            }
            Ok(num_arg(args, 1, env)?.and_then(|b| number(a - b)))
        }
        "/" | "%" | "^" => {
            arity(op, args, 2, Some(2))?;
            let (Some(a), Some(b)) = (num_arg(args, 0, env)?, num_arg(args, 1, env)?) else {
                return Ok(None);
            };
            match op {
                "/" if b == 0.0 => Ok(None),
                "/" => Ok(number(a / b)),
                "%" if b == 0.0 => Ok(None),
                "%" => Ok(number(a % b)),
                _ => Ok(number(a.powf(b))),
            }
        }
        "abs" | "floor" | "ceil" | "round" | "sqrt" => {
            arity(op, args, 1, Some(1))?;
            let Some(a) = num_arg(args, 0, env)? else {
                return Ok(None);
            };
            let result = match op {
                "abs" => a.abs(),
                "floor" => a.floor(),
                "ceil" => a.ceil(),
                "round" => a.round(),
                _ => a.sqrt(),
            };
            Ok(number(result))
        }

        "to-number" => {
            arity(op, args, 1, None)?;
            for expr in args {
                let converted = match evaluate_expression(expr, env)? {
                    Some(Value::Number(n)) => n.as_f64(),
                    Some(Value::String(s)) => s.trim().parse().ok(),
                    Some(Value::Bool(b)) => Some(if b { 1.0 } else { 0.0 }),
                    _ => None,
                };
                if let Some(n) = converted {
                    return Ok(number(n));
                }
            }
            Ok(None)
        }
        "to-string" => {
            arity(op, args, 1, Some(1))?;
            let value = evaluate_expression(&args[0], env)?;
            Ok(Some(Value::String(
                value.as_ref().map(value_to_string).unwrap_or_default(),
            )))
        }
        "to-boolean" => {
            arity(op, args, 1, Some(1))?;
            let value = evaluate_expression(&args[0], env)?;
            Ok(Some(Value::Bool(truthy(value.as_ref()))))
        }
        "concat" => {
            let mut result = String::new();
            for expr in args {
                if let Some(v) = evaluate_expression(expr, env)? {
                    result.push_str(&value_to_string(&v));
                }
            }
            Ok(Some(Value::String(result)))
        }
        "upcase" | "downcase" => {
            arity(op, args, 1, Some(1))?;
            let value = evaluate_expression(&args[0], env)?;
            Ok(value.as_ref().and_then(Value::as_str).map(|s| {
                Value::String(if op == "upcase" {
                    s.to_uppercase()
                } else {
                    s.to_lowercase()
                })
            }))
        }
        "rgb" | "rgba" => {
            let channels = if op == "rgb" { 3 } else { 4 };
            arity(op, args, channels, Some(channels))?;
            let mut rgba = [1.0; 4];
            for (i, slot) in rgba.iter_mut().enumerate().take(channels) {
                let Some(v) = num_arg(args, i, env)? else {
                    return Ok(None);
                };
                *slot = if i < 3 { v / 255.0 } else { v };
            }
            Ok(Some(Value::Array(rgba.iter().filter_map(|c| number(*c)).collect())))
        }

        _ => Err(LabelError::malformed(format!("unknown operator `{op}`"))),
    }
}

fn eval_match(args: &[Value], env: &Env<'_>) -> LabelResult<Option<Value>> {
    // ["match", input, label1, output1, ..., default]
    if args.len() < 4 || args.len() % 2 != 0 {
        return Err(LabelError::malformed(
            "`match` expects an input, label/output pairs and a default",
        ));
    }

    let input = evaluate_expression(&args[0], env)?.unwrap_or(Value::Null);
    let default = &args[args.len() - 1];

    for pair in args[1..args.len() - 1].chunks(2) {
        let matches = match &pair[0] {
            Value::Array(labels) => labels.iter().any(|l| values_equal(&input, l)),
            label => values_equal(&input, label),
        };
        if matches {
            return evaluate_expression(&pair[1], env);
        }
    }

    evaluate_expression(default, env)
}

fn eval_case(args: &[Value], env: &Env<'_>) -> LabelResult<Option<Value>> {
    // ["case", cond1, output1, ..., default]
    if args.len() < 3 || args.len() % 2 == 0 {
        return Err(LabelError::malformed(
            "`case` expects condition/output pairs and a default",
        ));
    }

    for pair in args[..args.len() - 1].chunks(2) {
        if truthy(evaluate_expression(&pair[0], env)?.as_ref()) {
            return evaluate_expression(&pair[1], env);
        }
    }

    evaluate_expression(&args[args.len() - 1], env)
}

fn eval_step(args: &[Value], env: &Env<'_>) -> LabelResult<Option<Value>> {
    // ["step", input, default, stop1, value1, ...]
    if args.len() < 2 || args.len() % 2 != 0 {
        return Err(LabelError::malformed(
            "`step` expects an input, a default and stop/value pairs",
        ));
    }

    let Some(input) = num_arg(args, 0, env)? else {
        return Ok(None);
    };

    let mut result = &args[1];
    for pair in args[2..].chunks(2) {
        let stop = pair[0]
            .as_f64()
            .ok_or_else(|| LabelError::malformed("`step` stops must be numbers"))?;
        if input < stop {
            break;
        }
        result = &pair[1];
    }

    evaluate_expression(result, env)
}

fn eval_interpolate(args: &[Value], env: &Env<'_>) -> LabelResult<Option<Value>> {
    // ["interpolate", ["linear"] | ["exponential", base], input, stop1, value1, ...]
    if args.len() < 4 || args.len() % 2 != 0 {
        return Err(LabelError::malformed(
            "`interpolate` expects a type, an input and stop/value pairs",
        ));
    }

    let base = match args[0].as_array().and_then(|a| a.first()).and_then(Value::as_str) {
        Some("linear") | Some("cubic-bezier") => 1.0,
        Some("exponential") => args[0]
            .as_array()
            .and_then(|a| a.get(1))
            .and_then(Value::as_f64)
            .unwrap_or(1.0),
        _ => return Err(LabelError::malformed("unknown interpolation type")),
    };

    let Some(input) = num_arg(args, 1, env)? else {
        return Ok(None);
    };

    let mut stops = Vec::with_capacity((args.len() - 2) / 2);
    for pair in args[2..].chunks(2) {
        let stop = pair[0]
            .as_f64()
            .ok_or_else(|| LabelError::malformed("`interpolate` stops must be numbers"))?;
        let Some(value) = evaluate_expression(&pair[1], env)? else {
            return Ok(None);
        };
        stops.push((stop, value));
    }

    let (first, last) = (&stops[0], &stops[stops.len() - 1]);
    if input <= first.0 {
        return Ok(Some(first.1.clone()));
    }
    if input >= last.0 {
        return Ok(Some(last.1.clone()));
    }

    for window in stops.windows(2) {
        let (low, high) = (&window[0], &window[1]);
        if input >= low.0 && input <= high.0 {
            let range = high.0 - low.0;
            let t = if range == 0.0 {
                0.0
            } else if base != 1.0 {
                (base.powf(input - low.0) - 1.0) / (base.powf(range) - 1.0)
            } else {
                (input - low.0) / range
            };
            return Ok(interpolate_values(&low.1, &high.1, t));
        }
    }

    Ok(None)
}

fn interpolate_values(a: &Value, b: &Value, t: f64) -> Option<Value> {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => {
            let (va, vb) = (na.as_f64()?, nb.as_f64()?);
            number(va + (vb - va) * t)
        }
        (Value::Array(aa), Value::Array(ab)) if aa.len() == ab.len() => aa
            .iter()
            .zip(ab)
            .map(|(ea, eb)| interpolate_values(ea, eb, t))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (Value::String(sa), Value::String(sb)) => {
            match (parse_color_string(sa), parse_color_string(sb)) {
                (Some(ca), Some(cb)) => Some(Value::Array(
                    ca.iter()
                        .zip(cb.iter())
                        .filter_map(|(x, y)| number((*x + (*y - *x) * t as f32) as f64))
                        .collect(),
                )),
                _ => Some(if t < 0.5 { a.clone() } else { b.clone() }),
            }
        }
        _ => Some(if t < 0.5 { a.clone() } else { b.clone() }),
    }
}

fn arity(op: &str, args: &[Value], min: usize, max: Option<usize>) -> LabelResult<()> {
    let too_few = args.len() < min;
    let too_many = max.map(|m| args.len() > m).unwrap_or(false);
    if too_few || too_many {
        return Err(LabelError::malformed(format!(
            "`{op}` called with {} argument(s)",
            args.len()
        )));
    }
    Ok(())
}

fn num_arg(args: &[Value], index: usize, env: &Env<'_>) -> LabelResult<Option<f64>> {
    Ok(evaluate_expression(&args[index], env)?.and_then(|v| v.as_f64()))
}

fn number(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

fn value_to_string(val: &Value) -> String {
    match val {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
